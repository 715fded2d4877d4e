use pretty_assertions::assert_eq;
use watcher_core::{
    update, Classification, Effect, ExtractionRule, Msg, PollPhase, PollState, RuleVerdict,
};

const URL: &str = "https://shop.example.com/item/42";
const RECIPIENT: &str = "me@example.com";

fn init_logging() {
    watcher_logging::initialize_for_tests();
}

fn waiting_state() -> PollState {
    let (state, effects) = update(PollState::new(URL, RECIPIENT), Msg::Started);
    assert_eq!(effects, vec![Effect::ArmTimer]);
    assert_eq!(state.phase(), PollPhase::Waiting);
    state
}

fn evaluating_state() -> PollState {
    let (state, _) = update(waiting_state(), Msg::TimerFired);
    let (state, _) = update(state, Msg::FetchSucceeded);
    assert_eq!(state.phase(), PollPhase::Evaluating);
    state
}

fn verdict(rule_index: usize, text: &str) -> RuleVerdict {
    let rule = ExtractionRule::new(".price", ".status", "In Stock", "Sold Out");
    RuleVerdict::new(rule_index, text, &rule)
}

fn notify_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Notify { .. }))
        .count()
}

#[test]
fn started_twice_arms_timer_once() {
    init_logging();
    let (state, effects) = update(waiting_state(), Msg::Started);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Waiting);
}

#[test]
fn tick_starts_fetch_for_next_cycle() {
    init_logging();
    let (state, effects) = update(waiting_state(), Msg::TimerFired);
    assert_eq!(effects, vec![Effect::FetchPage { cycle: 1 }]);
    assert_eq!(state.phase(), PollPhase::Fetching);
    assert_eq!(state.stats().cycles_started, 1);

    let (state, effects) = update(state, Msg::FetchSucceeded);
    assert_eq!(effects, vec![Effect::EvaluateRules { cycle: 1 }]);
    assert_eq!(state.phase(), PollPhase::Evaluating);
}

#[test]
fn positive_verdict_notifies_once_with_target_url() {
    init_logging();
    let (state, effects) = update(
        evaluating_state(),
        Msg::RulesEvaluated {
            verdicts: vec![verdict(0, "In Stock")],
        },
    );

    assert_eq!(
        effects,
        vec![
            Effect::Report {
                cycle: 1,
                verdict: verdict(0, "In Stock"),
            },
            Effect::Notify {
                cycle: 1,
                rule_index: 0,
                recipient: RECIPIENT.to_string(),
                context: URL.to_string(),
            },
        ]
    );
    assert_eq!(state.phase(), PollPhase::Notifying);
    assert_eq!(state.stats().positives, 1);
    assert_eq!(state.stats().cycles_completed, 0);

    let (state, effects) = update(state, Msg::NotificationSent { rule_index: 0 });
    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Waiting);
    assert_eq!(state.stats().notifications_sent, 1);
    assert_eq!(state.stats().cycles_completed, 1);
}

#[test]
fn cycle_stays_open_until_every_alert_resolves() {
    init_logging();
    let verdicts = vec![verdict(0, "In Stock"), verdict(1, "In Stock")];
    let (state, _) = update(evaluating_state(), Msg::RulesEvaluated { verdicts });

    let (state, _) = update(
        state,
        Msg::NotificationFailed {
            rule_index: 0,
            message: "timeout".to_string(),
        },
    );
    assert_eq!(state.phase(), PollPhase::Notifying);

    let (state, effects) = update(state, Msg::TimerFired);
    assert!(effects.is_empty());
    assert_eq!(state.stats().skipped_ticks, 1);

    let (state, _) = update(state, Msg::NotificationSent { rule_index: 1 });
    assert_eq!(state.phase(), PollPhase::Waiting);
    let stats = state.stats();
    assert_eq!((stats.notifications_sent, stats.notifications_failed), (1, 1));
    assert_eq!(stats.cycles_completed, 1);
}

#[test]
fn late_notification_results_are_ignored() {
    init_logging();
    let (state, effects) = update(waiting_state(), Msg::NotificationSent { rule_index: 0 });
    assert!(effects.is_empty());
    assert_eq!(state.stats().notifications_sent, 0);
    assert_eq!(state.phase(), PollPhase::Waiting);
}

#[test]
fn negative_and_unknown_verdicts_only_report() {
    init_logging();
    let (state, effects) = update(
        evaluating_state(),
        Msg::RulesEvaluated {
            verdicts: vec![verdict(0, "Sold Out"), verdict(1, "Limited")],
        },
    );

    assert_eq!(notify_count(&effects), 0);
    assert_eq!(effects.len(), 2);
    assert_eq!(state.stats().negatives, 1);
    assert_eq!(state.stats().unknowns, 1);
}

#[test]
fn each_positive_match_notifies_in_rule_order() {
    init_logging();
    let verdicts = vec![
        verdict(0, "In Stock"),
        verdict(1, "Sold Out"),
        verdict(2, "In Stock"),
    ];
    let (_, effects) = update(evaluating_state(), Msg::RulesEvaluated { verdicts });

    let notified: Vec<_> = effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Notify { rule_index, .. } => Some(*rule_index),
            _ => None,
        })
        .collect();
    assert_eq!(notified, vec![0, 2]);
}

#[test]
fn empty_rule_set_completes_cycle_without_effects() {
    init_logging();
    let (state, effects) = update(
        evaluating_state(),
        Msg::RulesEvaluated {
            verdicts: Vec::new(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Waiting);

    let (state, effects) = update(state, Msg::TimerFired);
    assert_eq!(effects, vec![Effect::FetchPage { cycle: 2 }]);
    assert_eq!(state.stats().cycles_started, 2);
}

#[test]
fn fetch_failure_returns_to_waiting_without_evaluation() {
    init_logging();
    let (state, _) = update(waiting_state(), Msg::TimerFired);
    let (state, effects) = update(
        state,
        Msg::FetchFailed {
            message: "network error".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Waiting);
    assert_eq!(state.stats().fetch_failures, 1);
    assert_eq!(state.stats().cycles_completed, 1);

    let (_, effects) = update(state, Msg::TimerFired);
    assert_eq!(effects, vec![Effect::FetchPage { cycle: 2 }]);
}

#[test]
fn ticks_during_a_cycle_are_skipped() {
    init_logging();
    let (state, _) = update(waiting_state(), Msg::TimerFired);
    let (state, effects) = update(state, Msg::TimerFired);
    assert!(effects.is_empty());
    let (state, _) = update(state, Msg::FetchSucceeded);
    let (state, effects) = update(state, Msg::TimerFired);
    assert!(effects.is_empty());

    assert_eq!(state.stats().skipped_ticks, 2);
    assert_eq!(state.stats().cycles_started, 1);
    assert_eq!(state.cycle(), 1);
}

#[test]
fn notification_failure_still_closes_cycle() {
    init_logging();
    let (state, _) = update(
        evaluating_state(),
        Msg::RulesEvaluated {
            verdicts: vec![verdict(0, "In Stock")],
        },
    );
    let (state, effects) = update(
        state,
        Msg::NotificationFailed {
            rule_index: 0,
            message: "connection refused".to_string(),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Waiting);
    assert_eq!(state.stats().notifications_failed, 1);

    let (_, effects) = update(state, Msg::TimerFired);
    assert_eq!(effects, vec![Effect::FetchPage { cycle: 2 }]);
}

#[test]
fn cancel_while_waiting_stops_immediately() {
    init_logging();
    let (state, effects) = update(waiting_state(), Msg::CancelRequested);
    assert_eq!(effects, vec![Effect::Stop]);
    assert!(state.is_stopped());

    let (state, effects) = update(state, Msg::TimerFired);
    assert!(effects.is_empty());
    assert_eq!(state.stats().cycles_started, 0);
}

#[test]
fn cancel_mid_cycle_finishes_cycle_then_stops() {
    init_logging();
    let (state, _) = update(waiting_state(), Msg::TimerFired);
    let (state, effects) = update(state, Msg::CancelRequested);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), PollPhase::Stopping);

    let (state, effects) = update(state, Msg::FetchSucceeded);
    assert_eq!(effects, vec![Effect::EvaluateRules { cycle: 1 }]);

    let (state, effects) = update(
        state,
        Msg::RulesEvaluated {
            verdicts: vec![verdict(0, "In Stock")],
        },
    );
    assert_eq!(notify_count(&effects), 1);
    assert!(!effects.contains(&Effect::Stop));
    assert_eq!(state.phase(), PollPhase::Stopping);

    let (state, effects) = update(state, Msg::NotificationSent { rule_index: 0 });
    assert_eq!(effects, vec![Effect::Stop]);
    assert!(state.is_stopped());
    assert_eq!(state.stats().cycles_completed, 1);
    assert_eq!(state.stats().notifications_sent, 1);
}

#[test]
fn cancel_mid_fetch_stops_after_failed_fetch() {
    init_logging();
    let (state, _) = update(waiting_state(), Msg::TimerFired);
    let (state, _) = update(state, Msg::CancelRequested);
    let (state, effects) = update(
        state,
        Msg::FetchFailed {
            message: "timeout".to_string(),
        },
    );
    assert_eq!(effects, vec![Effect::Stop]);
    assert!(state.is_stopped());
}

#[test]
fn verdict_counters_match_classifications() {
    init_logging();
    let verdicts = vec![verdict(0, "In Stock"), verdict(0, "Limited")];
    assert_eq!(verdicts[1].classification, Classification::Unknown);
    let (state, _) = update(evaluating_state(), Msg::RulesEvaluated { verdicts });
    let stats = state.stats();
    assert_eq!((stats.positives, stats.negatives, stats.unknowns), (1, 0, 1));
}
