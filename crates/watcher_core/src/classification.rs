use std::fmt;

use crate::ExtractionRule;

/// Three-way verdict for one rule against one matching subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Positive,
    Negative,
    Unknown,
}

impl Classification {
    /// Classifies extracted text against a rule.
    ///
    /// The text is trimmed first. Positive is checked before negative. An
    /// empty expected value never matches, so an extraction that came back
    /// empty (missing element, wrong selector) is always `Unknown`.
    pub fn from_text(text: &str, rule: &ExtractionRule) -> Self {
        let text = text.trim();
        if matches_expected(text, rule.positive_value()) {
            Classification::Positive
        } else if matches_expected(text, rule.negative_value()) {
            Classification::Negative
        } else {
            Classification::Unknown
        }
    }

    pub fn is_positive(self) -> bool {
        self == Classification::Positive
    }
}

fn matches_expected(text: &str, expected: &str) -> bool {
    !expected.is_empty() && text == expected
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Positive => write!(f, "positive"),
            Classification::Negative => write!(f, "negative"),
            Classification::Unknown => write!(f, "unknown"),
        }
    }
}

/// Outcome of one rule on one matching subtree during a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleVerdict {
    /// Position of the rule in its `RuleSet`.
    pub rule_index: usize,
    /// Trimmed text that was compared.
    pub extracted: String,
    pub classification: Classification,
}

impl RuleVerdict {
    pub fn new(rule_index: usize, extracted: impl Into<String>, rule: &ExtractionRule) -> Self {
        let extracted = extracted.into().trim().to_string();
        let classification = Classification::from_text(&extracted, rule);
        Self {
            rule_index,
            extracted,
            classification,
        }
    }
}
