use watcher_core::{Classification, ExtractionRule, RuleSet, RuleVerdict};

use crate::PageDocument;

/// Evaluates rules against a fetched page.
pub trait Classifier: Send + Sync {
    /// One verdict per subtree matching the rule's selector.
    fn verdicts(&self, document: &PageDocument, rule_index: usize, rule: &ExtractionRule)
        -> Vec<RuleVerdict>;

    /// Classification of every subtree matching the rule's selector.
    ///
    /// No matching subtree means no classification, not an error.
    fn classify(&self, document: &PageDocument, rule: &ExtractionRule) -> Vec<Classification> {
        self.verdicts(document, 0, rule)
            .into_iter()
            .map(|verdict| verdict.classification)
            .collect()
    }

    /// Runs every rule of the set, in insertion order.
    fn evaluate(&self, document: &PageDocument, rules: &RuleSet) -> Vec<RuleVerdict> {
        rules
            .rules()
            .iter()
            .enumerate()
            .flat_map(|(index, rule)| self.verdicts(document, index, rule))
            .collect()
    }
}

/// Reads the `target_path` text inside each `selector` match and compares it exactly.
#[derive(Debug, Default)]
pub struct SelectorClassifier;

impl Classifier for SelectorClassifier {
    fn verdicts(
        &self,
        document: &PageDocument,
        rule_index: usize,
        rule: &ExtractionRule,
    ) -> Vec<RuleVerdict> {
        document
            .query_text(rule.selector(), rule.target_path())
            .into_iter()
            .map(|text| RuleVerdict::new(rule_index, text, rule))
            .collect()
    }
}
