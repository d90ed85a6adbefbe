//! Property-based tests for the conversation reducer
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::*;
use proptest::prelude::*;
use serde_json::json;
use std::collections::{HashMap, HashSet};

// ============================================================================
// Test Helpers
// ============================================================================

fn fresh_thread() -> ConversationThread {
    ConversationThread::new("prop-thread", MessageContent::text("question"))
}

fn fold(events: &[StreamEvent]) -> ConversationThread {
    let terminal = TerminalCondition::default();
    events
        .iter()
        .fold(fresh_thread(), |thread, event| reduce(&thread, event, &terminal))
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_agent() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("generate_query".to_string()),
        Just("web_research".to_string()),
        Just("reflection".to_string()),
        Just("finalize_answer".to_string()),
    ]
}

fn arb_item_id() -> impl Strategy<Value = String> {
    "i[0-3]".prop_map(String::from)
}

fn arb_fragment() -> impl Strategy<Value = Option<MessageContent>> {
    prop_oneof![
        4 => "[a-z ]{0,6}".prop_map(|s| Some(MessageContent::Text(s))),
        1 => Just(None),
        1 => "[a-z]{1,4}".prop_map(|s| Some(MessageContent::Structured(json!({ "k": s })))),
    ]
}

fn arb_finish_reason() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        6 => Just(None),
        1 => Just(Some("stop".to_string())),
    ]
}

fn arb_event() -> impl Strategy<Value = StreamEvent> {
    (arb_agent(), arb_item_id(), arb_fragment(), arb_finish_reason()).prop_map(
        |(agent, item_id, content, finish_reason)| {
            let mut event = StreamEvent::new(agent, item_id);
            event.content = content;
            event.finish_reason = finish_reason;
            event
        },
    )
}

/// Text-only event targeting one of a few (agent, item) pairs
fn arb_text_event() -> impl Strategy<Value = StreamEvent> {
    (arb_agent(), arb_item_id(), "[a-z]{1,5}")
        .prop_map(|(agent, item_id, text)| StreamEvent::new(agent, item_id).with_text(text))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Invariant 1: at most one group per agent and one item per id within a group
    #[test]
    fn prop_identity_is_unique(events in proptest::collection::vec(arb_event(), 0..40)) {
        let thread = fold(&events);

        let mut agents = HashSet::new();
        for group in &thread.assistant_groups {
            prop_assert!(agents.insert(group.agent.clone()), "duplicate group {}", group.agent);
            let mut ids = HashSet::new();
            for item in &group.items {
                prop_assert!(ids.insert(item.id.clone()), "duplicate item {}", item.id);
            }
        }
    }

    // Invariant 2: text fragments for one (agent, item) concatenate in arrival
    // order regardless of interleaving with other pairs
    #[test]
    fn prop_text_is_append_only(events in proptest::collection::vec(arb_text_event(), 1..60)) {
        let mut expected: HashMap<(String, String), String> = HashMap::new();
        for event in &events {
            let text = event.content.as_ref().and_then(MessageContent::as_text).unwrap_or_default();
            expected
                .entry((event.agent.clone(), event.item_id.clone()))
                .or_default()
                .push_str(text);
        }

        let thread = fold(&events);
        for ((agent, item_id), text) in expected {
            let item = thread.group(&agent).and_then(|g| g.item(&item_id));
            prop_assert_eq!(item.map(|i| i.content.clone()), Some(MessageContent::Text(text)));
        }
    }

    // Invariant 3: group order is first-seen order of agent names
    #[test]
    fn prop_groups_in_first_seen_order(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut seen = Vec::new();
        for event in &events {
            if !seen.contains(&event.agent) {
                seen.push(event.agent.clone());
            }
        }

        let thread = fold(&events);
        let order: Vec<String> = thread.assistant_groups.iter().map(|g| g.agent.clone()).collect();
        prop_assert_eq!(order, seen);
    }

    // Invariant 4: item order within a group is first-seen order of ids that
    // carried content
    #[test]
    fn prop_items_in_first_seen_order(events in proptest::collection::vec(arb_event(), 0..40)) {
        let mut seen: HashMap<String, Vec<String>> = HashMap::new();
        for event in &events {
            if event.fragment().is_none() {
                continue;
            }
            let ids = seen.entry(event.agent.clone()).or_default();
            if !ids.contains(&event.item_id) {
                ids.push(event.item_id.clone());
            }
        }

        let thread = fold(&events);
        for group in &thread.assistant_groups {
            let order: Vec<String> = group.items.iter().map(|i| i.id.clone()).collect();
            prop_assert_eq!(order, seen.remove(&group.agent).unwrap_or_default());
        }
    }

    // Invariant 5: a content-less replay of any event never changes items
    #[test]
    fn prop_empty_replay_is_noop(events in proptest::collection::vec(arb_event(), 1..30)) {
        let thread = fold(&events);
        let terminal = TerminalCondition::default();

        for event in &events {
            let mut replay = event.clone();
            replay.content = None;
            let replayed = reduce(&thread, &replay, &terminal);
            prop_assert_eq!(&replayed.assistant_groups, &thread.assistant_groups);
        }
    }

    // Invariant 6: current agent is the last event's agent unless that event
    // was terminal
    #[test]
    fn prop_current_agent_tracks_last_event(events in proptest::collection::vec(arb_event(), 1..30)) {
        let thread = fold(&events);
        let last = events.last().unwrap();

        if TerminalCondition::default().matches(last) {
            prop_assert!(thread.is_idle());
        } else {
            prop_assert_eq!(&thread.current_agent, &last.agent);
        }
    }

    // Invariant 7: the reducer never removes content; item count is monotone
    #[test]
    fn prop_item_count_monotone(events in proptest::collection::vec(arb_event(), 0..40)) {
        let terminal = TerminalCondition::default();
        let mut thread = fresh_thread();
        let mut previous = 0;

        for event in &events {
            thread = reduce(&thread, event, &terminal);
            let count = thread.item_count();
            prop_assert!(count >= previous);
            previous = count;
        }
    }
}
