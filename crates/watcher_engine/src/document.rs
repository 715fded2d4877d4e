use scraper::{ElementRef, Html, Selector};
use watcher_logging::watch_warn;

/// A parsed page that rules are evaluated against.
///
/// Wraps `scraper::Html`, which is not `Send`; keep it inside synchronous code.
pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// Text under `sub_path` for every subtree matching `selector`, in document order.
    ///
    /// Each entry is the concatenated text of all descendants of one subtree
    /// that match `sub_path`, trimmed. A subtree without such descendants
    /// yields an empty string. A `selector` that does not parse matches
    /// nothing; a `sub_path` that does not parse yields empty text.
    pub fn query_text(&self, selector: &str, sub_path: &str) -> Vec<String> {
        let Some(selector) = parse_selector(selector) else {
            return Vec::new();
        };
        let sub_path = parse_selector(sub_path);

        self.html
            .select(&selector)
            .map(|subtree| match sub_path.as_ref() {
                Some(sub_path) => child_text(subtree, sub_path),
                None => String::new(),
            })
            .collect()
    }
}

fn child_text(subtree: ElementRef<'_>, sub_path: &Selector) -> String {
    subtree
        .select(sub_path)
        .flat_map(|element| element.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn parse_selector(raw: &str) -> Option<Selector> {
    if raw.trim().is_empty() {
        return None;
    }
    match Selector::parse(raw) {
        Ok(selector) => Some(selector),
        Err(err) => {
            watch_warn!("Ignoring unparsable selector {:?}: {}", raw, err);
            None
        }
    }
}
