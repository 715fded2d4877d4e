#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Poller was started; arm the recurring timer.
    Started,
    /// The recurring timer ticked.
    TimerFired,
    /// Page was fetched and parsed.
    FetchSucceeded,
    /// Page could not be fetched.
    FetchFailed { message: String },
    /// Every rule was run against the fetched page, in rule order.
    RulesEvaluated { verdicts: Vec<crate::RuleVerdict> },
    /// Notification for a positive verdict was delivered.
    NotificationSent { rule_index: usize },
    /// Notification for a positive verdict could not be delivered.
    NotificationFailed { rule_index: usize, message: String },
    /// External cancellation.
    CancelRequested,
}
