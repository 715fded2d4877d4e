/// One declarative extraction rule.
///
/// `selector` picks the subtrees to scan, `target_path` picks the descendants
/// whose text is read inside each subtree. The expected values are compared
/// against the trimmed text with exact string equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRule {
    selector: String,
    target_path: String,
    positive_value: String,
    negative_value: String,
}

impl ExtractionRule {
    pub fn new(
        selector: impl Into<String>,
        target_path: impl Into<String>,
        positive_value: impl Into<String>,
        negative_value: impl Into<String>,
    ) -> Self {
        Self {
            selector: selector.into(),
            target_path: target_path.into(),
            positive_value: positive_value.into(),
            negative_value: negative_value.into(),
        }
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn positive_value(&self) -> &str {
        &self.positive_value
    }

    pub fn negative_value(&self) -> &str {
        &self.negative_value
    }
}

/// Ordered rules bound to one monitored URL and one notification recipient.
///
/// Rules are only ever appended; insertion order is evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    target_url: String,
    recipient: String,
    interval_hours: u64,
    rules: Vec<ExtractionRule>,
}

impl RuleSet {
    pub fn new(
        target_url: impl Into<String>,
        recipient: impl Into<String>,
        interval_hours: u64,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            recipient: recipient.into(),
            interval_hours,
            rules: Vec::new(),
        }
    }

    /// Appends a rule. Nothing is validated; empty strings are accepted as is.
    pub fn add_rule(
        &mut self,
        selector: impl Into<String>,
        target_path: impl Into<String>,
        positive_value: impl Into<String>,
        negative_value: impl Into<String>,
    ) {
        self.rules.push(ExtractionRule::new(
            selector,
            target_path,
            positive_value,
            negative_value,
        ));
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn interval_hours(&self) -> u64 {
        self.interval_hours
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
