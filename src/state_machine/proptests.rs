//! Property-based tests for the state machine
//!
//! These tests drive random action sequences through `transition` and check
//! the log and session invariants after every step.

use super::state::*;
use super::transition::*;
use super::*;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

/// A user action or backend completion, resolved against the live state
#[derive(Debug, Clone)]
enum Action {
    Stage(Vec<String>),
    Process,
    ProcessOk { session: String, files: usize },
    ProcessErr(String),
    Draft(String),
    Ask(String),
    Answer { stale: bool, sources: usize },
    AskErr { stale: bool },
}

fn stamp(n: usize) -> TurnStamp {
    TurnStamp {
        id: format!("turn-{n}"),
        at: Utc.timestamp_opt(1_700_000_000 + i64::try_from(n).unwrap(), 0).unwrap(),
    }
}

/// A tag that can never match the live session
fn stale_tag(state: &AppState) -> RequestTag {
    RequestTag {
        session_id: SessionId::new("stale"),
        generation: state.generation + 100,
    }
}

/// Pick the tag a completion would carry; `stale` falls back to a dead tag
fn completion_tag(state: &AppState, stale: bool) -> RequestTag {
    match (&state.conversation.in_flight, stale) {
        (Some(tag), false) => tag.clone(),
        _ => stale_tag(state),
    }
}

fn to_event(state: &AppState, action: &Action, n: usize) -> Event {
    match action {
        Action::Stage(names) => Event::StageFiles {
            files: names
                .iter()
                .map(|name| StagedFile::new(name.clone(), format!("/docs/{name}")))
                .collect(),
        },
        Action::Process => Event::ProcessRequested,
        Action::ProcessOk { session, files } => Event::ProcessSucceeded {
            result: ProcessResult {
                session_id: SessionId::new(session.clone()),
                files: (0..*files).map(|i| format!("f{i}.pdf")).collect(),
                message: None,
            },
        },
        Action::ProcessErr(message) => Event::ProcessFailed {
            message: message.clone(),
        },
        Action::Draft(text) => Event::DraftChanged { text: text.clone() },
        Action::Ask(text) => Event::AskRequested {
            text: text.clone(),
            stamp: stamp(n),
        },
        Action::Answer { stale, sources } => Event::AnswerReceived {
            tag: completion_tag(state, *stale),
            answer: format!("answer-{n}"),
            sources: (0..*sources)
                .map(|p| SourceCitation {
                    source: "f0.pdf".into(),
                    page_label: u32::try_from(p).unwrap() + 1,
                })
                .collect(),
            stamp: stamp(n),
        },
        Action::AskErr { stale } => Event::AskFailed {
            tag: completion_tag(state, *stale),
            message: "request failed with status 500".into(),
        },
    }
}

/// Every assistant turn directly follows a user turn
fn log_is_well_formed(turns: &[ChatTurn]) -> bool {
    turns
        .iter()
        .enumerate()
        .all(|(i, t)| t.is_user() || (i > 0 && turns[i - 1].is_user()))
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_query() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z ?]{1,30}",
        Just(String::new()),
        Just("   ".to_string()),
        Just("  padded question  ".to_string()),
    ]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        proptest::collection::vec("[a-c]\\.pdf", 0..3).prop_map(Action::Stage),
        Just(Action::Process),
        (prop_oneof![Just("s1"), Just("s2")], 0usize..3).prop_map(|(session, files)| {
            Action::ProcessOk {
                session: session.to_string(),
                files,
            }
        }),
        "[a-z ]{0,20}".prop_map(Action::ProcessErr),
        "[a-z ]{0,20}".prop_map(Action::Draft),
        arb_query().prop_map(Action::Ask),
        (any::<bool>(), 0usize..3).prop_map(|(stale, sources)| Action::Answer { stale, sources }),
        any::<bool>().prop_map(|stale| Action::AskErr { stale }),
    ]
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn invariants_hold_for_any_sequence(actions in proptest::collection::vec(arb_action(), 1..40)) {
        let mut state = AppState::default();

        for (n, action) in actions.iter().enumerate() {
            let event = to_event(&state, action, n);
            let was_current = event.completion_tag().map(|t| state.is_current(t));
            let before = state.clone();

            let Ok(result) = transition(&state, event) else {
                continue;
            };
            let after = &result.new_state;

            prop_assert!(log_is_well_formed(&after.conversation.turns));
            prop_assert!(after.generation >= before.generation);
            prop_assert!(result.effects.iter().filter(|e| e.is_request()).count() <= 1);

            if after.generation > before.generation {
                // Adopt: fresh log, draft and error, same outstanding request
                prop_assert_eq!(after.generation, before.generation + 1);
                prop_assert!(after.conversation.turns.is_empty());
                prop_assert!(after.conversation.draft.is_empty());
                prop_assert!(after.conversation.last_error.is_none());
                prop_assert_eq!(&after.conversation.in_flight, &before.conversation.in_flight);
            } else {
                // Append-only within a session
                let old = &before.conversation.turns;
                prop_assert!(after.conversation.turns.len() >= old.len());
                prop_assert_eq!(&after.conversation.turns[..old.len()], old.as_slice());
                prop_assert!(after.conversation.turns.len() - old.len() <= 1);
                prop_assert_eq!(&after.session, &before.session);
            }

            if was_current == Some(false) {
                // Superseded completions change nothing but the busy flag
                prop_assert_eq!(&after.conversation.turns, &before.conversation.turns);
                prop_assert_eq!(&after.conversation.last_error, &before.conversation.last_error);
                prop_assert!(!after.conversation.is_busy());
            }

            state = result.new_state;
        }
    }

    #[test]
    fn accepted_question_is_logged_before_request(query in arb_query(), files in 0usize..3) {
        let mut state = AppState {
            session: Some(Session {
                id: SessionId::new("s1"),
                files: (0..files).map(|i| format!("f{i}.pdf")).collect(),
                message: None,
            }),
            generation: 1,
            ..AppState::default()
        };
        state.conversation.draft = query.clone();

        let event = Event::AskRequested {
            text: query.clone(),
            stamp: stamp(0),
        };
        let result = transition(&state, event);
        let trimmed = query.trim();

        if trimmed.is_empty() {
            prop_assert_eq!(result.unwrap_err(), TransitionError::EmptyQuery);
        } else {
            let result = result.unwrap();
            let turns = &result.new_state.conversation.turns;
            prop_assert_eq!(turns.len(), 1);
            prop_assert!(turns[0].is_user());
            prop_assert_eq!(turns[0].content(), trimmed);
            prop_assert!(result.new_state.conversation.draft.is_empty());
            prop_assert_eq!(
                result.effects,
                vec![Effect::AskQuestion {
                    tag: state.current_tag().unwrap(),
                    query: trimmed.to_string(),
                }]
            );
        }
    }

    #[test]
    fn process_rejected_exactly_when_disabled(
        staged in proptest::collection::vec("[a-c]\\.pdf", 0..3),
        busy in any::<bool>(),
    ) {
        let mut state = AppState::default();
        state.intake.staged = staged
            .iter()
            .map(|n| StagedFile::new(n.clone(), n.clone()))
            .collect();
        state.intake.busy = busy;

        let result = transition(&state, Event::ProcessRequested);
        prop_assert_eq!(result.is_ok(), state.can_process());
        if let Ok(r) = result {
            let files = state.intake.staged.clone();
            prop_assert_eq!(r.effects, vec![Effect::ProcessDocuments { files }]);
        }
    }

    #[test]
    fn status_matches_session(
        files in proptest::collection::vec("[a-z]{1,8}\\.pdf", 0..5),
        present in any::<bool>(),
    ) {
        let state = AppState {
            session: present.then(|| Session {
                id: SessionId::new("s"),
                files: files.clone(),
                message: None,
            }),
            ..AppState::default()
        };
        let status = state.status().to_string();
        match (present, files.len()) {
            (false, _) => prop_assert_eq!(status, "no documents processed"),
            (true, 0) => prop_assert_eq!(status, "ready, no files confirmed"),
            (true, n) => prop_assert_eq!(status, format!("ready, {n} file(s)")),
        }
    }
}
