use crate::{Classification, RuleVerdict};

pub type CycleId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Waiting,
    Fetching,
    Evaluating,
    /// Alerts for positive verdicts are being delivered.
    Notifying,
    /// Cancel arrived mid-cycle; the cycle finishes, then the poller stops.
    Stopping,
    Stopped,
}

/// Running counters over the lifetime of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollStats {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub fetch_failures: u64,
    pub skipped_ticks: u64,
    pub positives: u64,
    pub negatives: u64,
    pub unknowns: u64,
    pub notifications_sent: u64,
    pub notifications_failed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollState {
    target_url: String,
    recipient: String,
    phase: PollPhase,
    /// Set while a cycle is in flight and a cancel has been requested.
    stop_after_cycle: bool,
    pending_notifications: usize,
    cycle: CycleId,
    stats: PollStats,
}

impl PollState {
    pub fn new(target_url: impl Into<String>, recipient: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            recipient: recipient.into(),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> PollPhase {
        if self.stop_after_cycle {
            PollPhase::Stopping
        } else {
            self.phase
        }
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn is_stopped(&self) -> bool {
        self.phase == PollPhase::Stopped
    }

    pub(crate) fn raw_phase(&self) -> PollPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: PollPhase) {
        self.phase = phase;
    }

    pub(crate) fn begin_cycle(&mut self) -> CycleId {
        self.cycle += 1;
        self.stats.cycles_started += 1;
        self.phase = PollPhase::Fetching;
        self.cycle
    }

    /// Closes the current cycle. Returns `true` if the poller should stop.
    pub(crate) fn end_cycle(&mut self) -> bool {
        self.stats.cycles_completed += 1;
        if self.stop_after_cycle {
            self.stop_after_cycle = false;
            self.phase = PollPhase::Stopped;
            true
        } else {
            self.phase = PollPhase::Waiting;
            false
        }
    }

    pub(crate) fn await_notifications(&mut self, count: usize) {
        self.pending_notifications = count;
        self.phase = PollPhase::Notifying;
    }

    /// Marks one alert as resolved. Returns `true` once none are outstanding.
    pub(crate) fn resolve_notification(&mut self) -> bool {
        self.pending_notifications = self.pending_notifications.saturating_sub(1);
        self.pending_notifications == 0
    }

    pub(crate) fn request_stop_after_cycle(&mut self) {
        self.stop_after_cycle = true;
    }

    pub(crate) fn record_skipped_tick(&mut self) {
        self.stats.skipped_ticks += 1;
    }

    pub(crate) fn record_fetch_failure(&mut self) {
        self.stats.fetch_failures += 1;
    }

    pub(crate) fn record_verdict(&mut self, verdict: &RuleVerdict) {
        match verdict.classification {
            Classification::Positive => self.stats.positives += 1,
            Classification::Negative => self.stats.negatives += 1,
            Classification::Unknown => self.stats.unknowns += 1,
        }
    }

    pub(crate) fn record_notification(&mut self, delivered: bool) {
        if delivered {
            self.stats.notifications_sent += 1;
        } else {
            self.stats.notifications_failed += 1;
        }
    }
}
