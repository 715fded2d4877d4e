use crate::{CycleId, RuleVerdict};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    ArmTimer,
    FetchPage { cycle: CycleId },
    EvaluateRules { cycle: CycleId },
    /// Log-only record of a verdict; emitted for every verdict.
    Report { cycle: CycleId, verdict: RuleVerdict },
    Notify {
        cycle: CycleId,
        rule_index: usize,
        recipient: String,
        context: String,
    },
    Stop,
}
