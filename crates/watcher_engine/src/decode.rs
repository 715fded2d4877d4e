use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding: &'static str,
    /// Some byte sequences were invalid and replaced with U+FFFD.
    pub replaced_malformed: bool,
}

/// Turns a fetched body into text.
///
/// Encoding is picked from the BOM, then the Content-Type charset, then by
/// sniffing the bytes (which also honours `<meta charset>`). Decoding is lossy:
/// invalid sequences become U+FFFD so one stray byte does not hide the page.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> DecodedPage {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(charset_param)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| sniff(bytes));

    // `decode` strips a matching BOM itself.
    let (text, used, malformed) = encoding.decode(bytes);
    DecodedPage {
        html: text.into_owned(),
        encoding: used.name(),
        replaced_malformed: malformed,
    }
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(&['"', '\''][..]))
    })
}

fn sniff(bytes: &[u8]) -> &'static Encoding {
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}
