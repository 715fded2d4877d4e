//! Watcher core: rule definitions, classification and the pure polling state machine.
mod classification;
mod effect;
mod msg;
mod rule;
mod state;
mod update;

pub use classification::{Classification, RuleVerdict};
pub use effect::Effect;
pub use msg::Msg;
pub use rule::{ExtractionRule, RuleSet};
pub use state::{CycleId, PollPhase, PollState, PollStats};
pub use update::update;
