use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use watcher_core::{
    update, Classification, CycleId, Effect, Msg, PollPhase, PollState, PollStats, RuleSet,
    RuleVerdict,
};
use watcher_logging::{watch_debug, watch_error, watch_info, watch_warn};

use crate::{decode_page, Classifier, Fetcher, Notifier, PageDocument, SelectorClassifier};

const SECS_PER_HOUR: u64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct PollSettings {
    pub interval: Duration,
    /// Floor applied to `interval`; a zero period is never armed.
    pub min_interval: Duration,
    /// Run the first cycle right away instead of one period after start.
    pub fetch_on_start: bool,
}

impl PollSettings {
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn from_hours(hours: u64) -> Self {
        Self::every(Duration::from_secs(hours.saturating_mul(SECS_PER_HOUR)))
    }

    pub fn effective_interval(&self) -> Duration {
        self.interval.max(self.min_interval).max(Duration::from_millis(1))
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(SECS_PER_HOUR),
            min_interval: Duration::from_secs(1),
            fetch_on_start: false,
        }
    }
}

/// Drives fetch, evaluate and notify cycles for one `RuleSet`.
///
/// Cycles run one at a time. The timer and the cancel token are watched while
/// a cycle is in flight: ticks that fall due mid-cycle are counted as skipped
/// rather than queued, and a cancel lets the running cycle finish before the
/// poller stops.
pub struct Poller {
    rules: RuleSet,
    fetcher: Arc<dyn Fetcher>,
    notifier: Arc<dyn Notifier>,
    classifier: Box<dyn Classifier>,
    settings: PollSettings,
}

/// Slow effect waiting to be run, one at a time.
#[derive(Debug)]
enum Job {
    Fetch {
        cycle: CycleId,
    },
    Notify {
        cycle: CycleId,
        rule_index: usize,
        recipient: String,
        context: String,
    },
}

/// Result of a finished job: the message for the core, plus the page body for fetches.
struct Outcome {
    msg: Msg,
    page: Option<String>,
}

enum Event {
    Cancel,
    Tick,
    Done(Outcome),
}

type InFlight<'a> = Pin<Box<dyn Future<Output = Outcome> + Send + 'a>>;

impl Poller {
    pub fn new(
        rules: RuleSet,
        fetcher: Arc<dyn Fetcher>,
        notifier: Arc<dyn Notifier>,
        settings: PollSettings,
    ) -> Self {
        Self {
            rules,
            fetcher,
            notifier,
            classifier: Box::new(SelectorClassifier),
            settings,
        }
    }

    pub fn with_classifier(mut self, classifier: Box<dyn Classifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Polls until `cancel` fires. A cycle in flight when it fires is finished first.
    pub async fn run(&self, cancel: CancellationToken) -> PollStats {
        let stats = self
            .drive(VecDeque::from([Msg::Started]), cancel, true)
            .await;
        watch_info!(
            "Stopped watching {} after {} cycle(s), {} tick(s) skipped",
            self.rules.target_url(),
            stats.cycles_completed,
            stats.skipped_ticks
        );
        stats
    }

    /// Runs exactly one cycle immediately, without arming a timer.
    pub async fn run_once(&self) -> PollStats {
        let inbox = VecDeque::from([Msg::Started, Msg::TimerFired, Msg::CancelRequested]);
        self.drive(inbox, CancellationToken::new(), false).await
    }

    /// Feeds messages through the state machine and executes the effects.
    ///
    /// Fetches and notifications run one at a time as the in-flight job, raced
    /// against the cancel token and the ticker so both reach the core mid-cycle.
    async fn drive(
        &self,
        mut inbox: VecDeque<Msg>,
        cancel: CancellationToken,
        arm_timer: bool,
    ) -> PollStats {
        let mut state = PollState::new(self.rules.target_url(), self.rules.recipient());
        let mut ticker: Option<Interval> = None;
        let mut jobs: VecDeque<Job> = VecDeque::new();
        let mut in_flight: Option<InFlight<'_>> = None;
        let mut page: Option<String> = None;
        let mut cancel_seen = false;

        loop {
            while let Some(msg) = inbox.pop_front() {
                let (next, effects) = update(state, msg);
                state = next;
                for effect in effects {
                    match effect {
                        Effect::ArmTimer => {
                            if arm_timer {
                                ticker = Some(self.arm_timer());
                            }
                        }
                        Effect::FetchPage { cycle } => jobs.push_back(Job::Fetch { cycle }),
                        Effect::EvaluateRules { cycle } => {
                            let verdicts = page
                                .take()
                                .map(|html| self.evaluate(cycle, &html))
                                .unwrap_or_default();
                            inbox.push_back(Msg::RulesEvaluated { verdicts });
                        }
                        Effect::Report { cycle, verdict } => self.report(cycle, &verdict),
                        Effect::Notify {
                            cycle,
                            rule_index,
                            recipient,
                            context,
                        } => jobs.push_back(Job::Notify {
                            cycle,
                            rule_index,
                            recipient,
                            context,
                        }),
                        Effect::Stop => return state.stats(),
                    }
                }
            }

            if in_flight.is_none() {
                if let Some(job) = jobs.pop_front() {
                    in_flight = Some(Box::pin(self.run_job(job)));
                }
            }
            if in_flight.is_none() && ticker.is_none() {
                return state.stats();
            }

            let event = tokio::select! {
                biased;
                _ = cancel.cancelled(), if !cancel_seen => Event::Cancel,
                outcome = async {
                    match in_flight.as_mut() {
                        Some(job) => job.await,
                        None => std::future::pending().await,
                    }
                } => Event::Done(outcome),
                _ = async {
                    match ticker.as_mut() {
                        Some(ticker) => {
                            ticker.tick().await;
                        }
                        None => std::future::pending::<()>().await,
                    }
                } => Event::Tick,
            };

            match event {
                Event::Cancel => {
                    cancel_seen = true;
                    watch_debug!("Cancel requested in phase {:?}", state.phase());
                    inbox.push_back(Msg::CancelRequested);
                }
                Event::Tick => {
                    if state.phase() != PollPhase::Waiting {
                        watch_debug!(
                            "Cycle {}: tick landed mid-cycle ({:?}), skipping",
                            state.cycle(),
                            state.phase()
                        );
                    }
                    inbox.push_back(Msg::TimerFired);
                }
                Event::Done(outcome) => {
                    in_flight = None;
                    if outcome.page.is_some() {
                        page = outcome.page;
                    }
                    inbox.push_back(outcome.msg);
                }
            }
        }
    }

    fn arm_timer(&self) -> Interval {
        let period = self.settings.effective_interval();
        let first_tick = if self.settings.fetch_on_start {
            Instant::now()
        } else {
            Instant::now() + period
        };
        let mut ticker = interval_at(first_tick, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        watch_info!(
            "Watching {} with {} rule(s) every {:?}",
            self.rules.target_url(),
            self.rules.len(),
            period
        );
        ticker
    }

    async fn run_job(&self, job: Job) -> Outcome {
        match job {
            Job::Fetch { cycle } => self.fetch_page(cycle).await,
            Job::Notify {
                cycle,
                rule_index,
                recipient,
                context,
            } => Outcome {
                msg: self.notify(cycle, rule_index, &recipient, &context).await,
                page: None,
            },
        }
    }

    async fn fetch_page(&self, cycle: CycleId) -> Outcome {
        let url = self.rules.target_url();
        watch_debug!("Cycle {}: fetching {}", cycle, url);

        match self.fetcher.fetch(url).await {
            Ok(output) => {
                let decoded = decode_page(&output.bytes, output.metadata.content_type.as_deref());
                if decoded.replaced_malformed {
                    watch_warn!(
                        "Cycle {}: {} is not valid {}; invalid bytes replaced",
                        cycle,
                        output.metadata.final_url,
                        decoded.encoding
                    );
                }
                watch_debug!(
                    "Cycle {}: fetched {} bytes ({})",
                    cycle,
                    decoded.html.len(),
                    decoded.encoding
                );
                Outcome {
                    msg: Msg::FetchSucceeded,
                    page: Some(decoded.html),
                }
            }
            Err(err) => {
                watch_error!("Cycle {}: fetching {} failed: {}", cycle, url, err);
                Outcome {
                    msg: Msg::FetchFailed {
                        message: err.to_string(),
                    },
                    page: None,
                }
            }
        }
    }

    fn evaluate(&self, cycle: CycleId, html: &str) -> Vec<RuleVerdict> {
        let document = PageDocument::parse(html);
        let verdicts = self.classifier.evaluate(&document, &self.rules);
        watch_debug!(
            "Cycle {}: {} verdict(s) from {} rule(s)",
            cycle,
            verdicts.len(),
            self.rules.len()
        );
        verdicts
    }

    fn report(&self, cycle: CycleId, verdict: &RuleVerdict) {
        let url = self.rules.target_url();
        let Some(rule) = self.rules.rules().get(verdict.rule_index) else {
            return;
        };
        match verdict.classification {
            Classification::Positive => watch_info!(
                "Cycle {}: website {}: positive value detected - {}",
                cycle,
                url,
                rule.positive_value()
            ),
            Classification::Negative => watch_info!(
                "Cycle {}: website {}: negative value detected - {}",
                cycle,
                url,
                rule.negative_value()
            ),
            Classification::Unknown => watch_warn!(
                "Cycle {}: website {}: unknown response for {:?} - {:?}",
                cycle,
                url,
                rule.selector(),
                verdict.extracted
            ),
        }
    }

    async fn notify(&self, cycle: CycleId, rule_index: usize, recipient: &str, context: &str) -> Msg {
        match self.notifier.notify(recipient, context).await {
            Ok(()) => Msg::NotificationSent { rule_index },
            Err(err) => {
                watch_warn!(
                    "Cycle {}: alert to {} for rule {} failed: {}",
                    cycle,
                    recipient,
                    rule_index,
                    err
                );
                Msg::NotificationFailed {
                    rule_index,
                    message: err.to_string(),
                }
            }
        }
    }
}
