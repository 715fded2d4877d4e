use crate::{Effect, Msg, PollPhase, PollState};

/// Pure update function: applies a message to state and returns any effects.
///
/// Effects are returned in the order the runner must execute them.
pub fn update(mut state: PollState, msg: Msg) -> (PollState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => {
            if state.raw_phase() == PollPhase::Idle {
                state.set_phase(PollPhase::Waiting);
                vec![Effect::ArmTimer]
            } else {
                Vec::new()
            }
        }
        Msg::TimerFired => match state.raw_phase() {
            PollPhase::Waiting => {
                let cycle = state.begin_cycle();
                vec![Effect::FetchPage { cycle }]
            }
            // Cycles never overlap: a tick that lands mid-cycle is dropped.
            PollPhase::Fetching | PollPhase::Evaluating | PollPhase::Notifying => {
                state.record_skipped_tick();
                Vec::new()
            }
            PollPhase::Idle | PollPhase::Stopping | PollPhase::Stopped => Vec::new(),
        },
        Msg::FetchSucceeded => {
            if state.raw_phase() == PollPhase::Fetching {
                state.set_phase(PollPhase::Evaluating);
                vec![Effect::EvaluateRules {
                    cycle: state.cycle(),
                }]
            } else {
                Vec::new()
            }
        }
        Msg::FetchFailed { .. } => {
            if state.raw_phase() == PollPhase::Fetching {
                state.record_fetch_failure();
                finish_cycle(&mut state, Vec::new())
            } else {
                Vec::new()
            }
        }
        Msg::RulesEvaluated { verdicts } => {
            if state.raw_phase() == PollPhase::Evaluating {
                let cycle = state.cycle();
                let mut effects = Vec::with_capacity(verdicts.len() + 1);
                let mut alerts = 0;
                for verdict in verdicts {
                    state.record_verdict(&verdict);
                    let notify = verdict.classification.is_positive().then(|| Effect::Notify {
                        cycle,
                        rule_index: verdict.rule_index,
                        recipient: state.recipient().to_string(),
                        context: state.target_url().to_string(),
                    });
                    alerts += usize::from(notify.is_some());
                    effects.push(Effect::Report { cycle, verdict });
                    effects.extend(notify);
                }
                if alerts == 0 {
                    finish_cycle(&mut state, effects)
                } else {
                    // The cycle stays open until every alert has been resolved.
                    state.await_notifications(alerts);
                    effects
                }
            } else {
                Vec::new()
            }
        }
        Msg::NotificationSent { .. } => notification_resolved(&mut state, true),
        Msg::NotificationFailed { .. } => notification_resolved(&mut state, false),
        Msg::CancelRequested => match state.raw_phase() {
            PollPhase::Idle | PollPhase::Waiting => {
                state.set_phase(PollPhase::Stopped);
                vec![Effect::Stop]
            }
            PollPhase::Fetching | PollPhase::Evaluating | PollPhase::Notifying => {
                state.request_stop_after_cycle();
                Vec::new()
            }
            PollPhase::Stopping | PollPhase::Stopped => Vec::new(),
        },
    };

    (state, effects)
}

fn notification_resolved(state: &mut PollState, delivered: bool) -> Vec<Effect> {
    if state.raw_phase() != PollPhase::Notifying {
        return Vec::new();
    }
    state.record_notification(delivered);
    if state.resolve_notification() {
        finish_cycle(state, Vec::new())
    } else {
        Vec::new()
    }
}

fn finish_cycle(state: &mut PollState, mut effects: Vec<Effect>) -> Vec<Effect> {
    if state.end_cycle() {
        effects.push(Effect::Stop);
    }
    effects
}
