//! Dialogue engine for the viewing-booking conversation.
//!
//! A turn is a pure function of `(utterance, state)`: extract whatever slots
//! the utterance carries, advance along the step table, and compose the next
//! prompt. The caller owns the state between turns and swaps in the returned
//! value after each call.

pub mod extract;
pub mod flow;
pub mod reply;

use crate::models::{AgentState, AgentStep, AppointmentDraft, DraftField, TurnResponse};

use self::reply::TurnContext;

#[derive(Debug, Clone, Copy, Default)]
pub struct DialogueEngine {
    /// Read the summary back and wait for a yes before completing.
    pub confirm_before_complete: bool,
}

impl DialogueEngine {
    pub fn new(confirm_before_complete: bool) -> Self {
        Self {
            confirm_before_complete,
        }
    }

    pub fn initial_state(&self) -> AgentState {
        AgentState {
            step: AgentStep::Greeting,
            draft: AppointmentDraft::default(),
        }
    }

    pub fn handle(&self, utterance: &str, state: &AgentState) -> TurnResponse {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return TurnResponse {
                reply: reply::clarify(state),
                state: state.clone(),
            };
        }

        match state.step {
            AgentStep::Complete => self.after_completion(utterance, state),
            AgentStep::Confirm => self.confirm(utterance, state),
            _ => self.collect(utterance, state),
        }
    }

    fn collect(&self, utterance: &str, state: &AgentState) -> TurnResponse {
        let mut next = state.clone();
        let extracted = extract::extract_turn(utterance, state.step);
        for extraction in &extracted.found {
            next.draft.fill(extraction.field, &extraction.value);
        }

        let expected_still_open = flow::pending_field(state.step, &next.draft).is_some();
        let unclaimed = if extracted.found.is_empty() {
            !extract::is_filler(utterance)
        } else {
            extract::is_remark(&extracted.leftover)
        };
        let noted = expected_still_open && unclaimed;
        if noted {
            next.draft.add_note(utterance);
        }

        let filled = DraftField::ALL
            .into_iter()
            .filter(|f| !state.draft.is_filled(*f) && next.draft.is_filled(*f))
            .collect();

        next.step = flow::advance(state.step, &next.draft, self.confirm_before_complete);
        TurnResponse {
            reply: reply::compose(&next, &TurnContext { noted, filled }),
            state: next,
        }
    }

    fn confirm(&self, utterance: &str, state: &AgentState) -> TurnResponse {
        let mut next = state.clone();
        if !extract::is_acknowledgement(utterance) {
            return TurnResponse {
                reply: reply::confirm_again(&next),
                state: next,
            };
        }
        next.step = AgentStep::Complete;
        TurnResponse {
            reply: reply::compose(&next, &TurnContext::default()),
            state: next,
        }
    }

    fn after_completion(&self, utterance: &str, state: &AgentState) -> TurnResponse {
        let mut next = state.clone();
        let noted = !extract::is_filler(utterance);
        if noted {
            next.draft.add_note(utterance);
        }
        TurnResponse {
            reply: reply::compose(
                &next,
                &TurnContext {
                    noted,
                    ..TurnContext::default()
                },
            ),
            state: next,
        }
    }
}

/// Fresh conversation: greeting step, empty draft.
pub fn create_initial_state() -> AgentState {
    DialogueEngine::default().initial_state()
}

/// One turn with the default engine (no confirmation step).
pub fn handle_user_utterance(utterance: &str, state: &AgentState) -> TurnResponse {
    DialogueEngine::default().handle(utterance, state)
}

/// Opening line spoken before the first turn.
pub fn greeting_message() -> &'static str {
    reply::GREETING_MESSAGE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(turns: &[&str]) -> TurnResponse {
        let mut state = create_initial_state();
        let mut last = None;
        for turn in turns {
            let response = handle_user_utterance(turn, &state);
            state = response.state.clone();
            last = Some(response);
        }
        last.expect("at least one turn")
    }

    const BOOKING: &[&str] = &[
        "Hi, I'm Jordan and I'm looking for a condo",
        "somewhere near downtown, budget around 400k",
        "next Tuesday at 3pm",
        "email me at jordan@example.com",
    ];

    #[test]
    fn test_initial_state() {
        let state = create_initial_state();
        assert_eq!(state.step, AgentStep::Greeting);
        assert_eq!(state.draft, AppointmentDraft::default());
    }

    #[test]
    fn test_introduction_fills_name_and_property() {
        let response = run(&BOOKING[..1]);
        assert_eq!(response.state.draft.prospect_name, "Jordan");
        assert_eq!(response.state.draft.property_type, "condo");
        assert_eq!(response.state.step, AgentStep::CollectLocation);
        assert!(response.reply.contains("neighborhood"));
    }

    #[test]
    fn test_location_and_budget_in_one_turn() {
        let response = run(&BOOKING[..2]);
        assert!(response.state.draft.location.contains("downtown"));
        assert_eq!(response.state.draft.budget, "400k");
        assert_eq!(response.state.step, AgentStep::CollectDatetime);
    }

    #[test]
    fn test_date_and_time() {
        let response = run(&BOOKING[..3]);
        assert!(response.state.draft.preferred_date.contains("Tuesday"));
        assert!(response.state.draft.preferred_time.contains('3'));
        assert_eq!(response.state.step, AgentStep::CollectContact);
    }

    #[test]
    fn test_contact_completes_booking() {
        let response = run(BOOKING);
        let draft = &response.state.draft;
        assert!(draft.contact_channel.contains("email"));
        assert!(draft.contact_channel.contains("jordan@example.com"));
        assert_eq!(response.state.step, AgentStep::Complete);
        assert!(response.reply.starts_with("You're all set, Jordan!"));
        assert!(response.reply.contains("400k"));
    }

    #[test]
    fn test_unrecognized_remark_becomes_note() {
        let state = run(&BOOKING[..1]).state;
        let response = handle_user_utterance("also the dog needs to be allowed", &state);
        assert_eq!(
            response.state.draft.additional_notes,
            vec!["also the dog needs to be allowed".to_string()]
        );
        assert_eq!(response.state.step, AgentStep::CollectLocation);
        assert!(response.reply.contains("notes"));
    }

    #[test]
    fn test_answer_to_expected_field_is_not_noted() {
        let state = run(&BOOKING[..1]).state;
        let response = handle_user_utterance("in Brooklyn", &state);
        assert_eq!(response.state.draft.location, "Brooklyn");
        assert!(response.state.draft.additional_notes.is_empty());
    }

    #[test]
    fn test_budget_is_first_write_wins() {
        let state = run(&BOOKING[..2]).state;
        let response = handle_user_utterance("actually make the budget 650k, next Friday", &state);
        assert_eq!(response.state.draft.budget, "400k");
        assert_eq!(response.state.draft.preferred_date, "next Friday");
    }

    #[test]
    fn test_completion_is_idempotent() {
        let done = run(BOOKING).state;
        for utterance in ["a house in Queens for 900k tomorrow", "please bring the floor plans", "thanks!"] {
            let response = handle_user_utterance(utterance, &done);
            assert_eq!(response.state.step, AgentStep::Complete);
            for field in DraftField::ALL {
                assert_eq!(response.state.draft.get(field), done.draft.get(field));
            }
        }
    }

    #[test]
    fn test_completed_remarks_are_noted_but_filler_is_not() {
        let done = run(BOOKING).state;
        let response = handle_user_utterance("please bring the floor plans", &done);
        assert_eq!(
            response.state.draft.additional_notes,
            vec!["please bring the floor plans".to_string()]
        );
        let response = handle_user_utterance("thanks!", &done);
        assert!(response.state.draft.additional_notes.is_empty());
        assert!(!response.reply.is_empty());
    }

    #[test]
    fn test_blank_utterance_is_a_no_op() {
        let state = run(&BOOKING[..1]).state;
        let response = handle_user_utterance("   ", &state);
        assert_eq!(response.state, state);
        assert!(response.reply.starts_with("Sorry, I didn't catch that."));
    }

    #[test]
    fn test_steps_never_move_backward() {
        let utterances = [
            "hello",
            "I'm Sam",
            "the weather is nice",
            "a loft",
            "around the old harbor",
            "$2,000 to $2,500",
            "tomorrow",
            "at 10:00",
            "hmm",
            "text me at 415 555 0101",
        ];
        let mut state = create_initial_state();
        for utterance in utterances {
            let response = handle_user_utterance(utterance, &state);
            assert!(response.state.step >= state.step, "{utterance}");
            state = response.state;
        }
        assert_eq!(state.step, AgentStep::Complete);
        assert_eq!(state.draft.contact_channel, "text: 415 555 0101");
    }

    #[test]
    fn test_complete_iff_draft_complete() {
        let mut state = create_initial_state();
        for utterance in BOOKING {
            state = handle_user_utterance(utterance, &state).state;
            assert_eq!(state.step == AgentStep::Complete, state.draft.is_complete());
        }
    }

    #[test]
    fn test_volunteered_information_skips_steps() {
        let response = run(&["This is Priya, I want a 3 bedroom house in Austin under 600k next Saturday morning"]);
        let draft = &response.state.draft;
        assert_eq!(draft.prospect_name, "Priya");
        assert_eq!(draft.property_type, "house");
        assert_eq!(draft.location, "Austin");
        assert_eq!(draft.budget, "600k");
        assert_eq!(draft.preferred_date, "next Saturday");
        assert_eq!(draft.preferred_time, "morning");
        assert_eq!(response.state.step, AgentStep::CollectContact);
    }

    #[test]
    fn test_confirmation_step_waits_for_yes() {
        let engine = DialogueEngine::new(true);
        let mut state = engine.initial_state();
        for utterance in BOOKING {
            state = engine.handle(utterance, &state).state;
        }
        assert_eq!(state.step, AgentStep::Confirm);

        let response = engine.handle("hold on, no", &state);
        assert_eq!(response.state.step, AgentStep::Confirm);
        assert!(response.reply.contains("budget 400k"));

        let response = engine.handle("yes, sounds good", &response.state);
        assert_eq!(response.state.step, AgentStep::Complete);
        assert!(response.reply.starts_with("You're all set"));
    }

    #[test]
    fn test_activity_after_in_leaves_location_open() {
        let response = run(&["Hi, I'm Jordan and I'm interested in buying a condo"]);
        assert_eq!(response.state.draft.location, "");
        assert_eq!(response.state.draft.property_type, "condo");
        assert_eq!(response.state.step, AgentStep::CollectLocation);
    }

    #[test]
    fn test_time_span_after_in_leaves_location_open() {
        let response = run(&["I'm Sam", "I'd like to see a house in a couple of weeks"]);
        assert_eq!(response.state.draft.location, "");
        assert_eq!(response.state.step, AgentStep::CollectLocation);

        let response = handle_user_utterance("hoping to move in a few months", &response.state);
        assert_eq!(response.state.draft.location, "");
        assert_eq!(response.state.step, AgentStep::CollectLocation);
        assert_eq!(
            response.state.draft.additional_notes,
            vec!["hoping to move in a few months".to_string()]
        );
    }

    #[test]
    fn test_remark_beside_other_field_is_noted() {
        let state = run(&BOOKING[..1]).state;
        let response =
            handle_user_utterance("the dog needs to be allowed, and tomorrow works", &state);
        assert_eq!(response.state.draft.preferred_date, "tomorrow");
        assert_eq!(
            response.state.draft.additional_notes,
            vec!["the dog needs to be allowed, and tomorrow works".to_string()]
        );
        assert_eq!(response.state.step, AgentStep::CollectLocation);
    }

    #[test]
    fn test_plain_answer_for_other_field_is_not_noted() {
        let state = run(&BOOKING[..1]).state;
        let response = handle_user_utterance("next Tuesday at 3pm", &state);
        assert_eq!(response.state.draft.preferred_date, "next Tuesday");
        assert!(response.state.draft.additional_notes.is_empty());
    }

    #[test]
    fn test_accented_name_is_kept_whole() {
        let response = run(&["Hi, I'm José"]);
        assert_eq!(response.state.draft.prospect_name, "José");
        assert_eq!(response.state.step, AgentStep::CollectProperty);
    }

    #[test]
    fn test_nice_to_meet_you_is_said_once() {
        let response = run(&["I'm Sam"]);
        assert!(response.reply.starts_with("Nice to meet you, Sam!"));

        let response = handle_user_utterance("hmm", &response.state);
        assert_eq!(response.state.step, AgentStep::CollectProperty);
        assert!(!response.reply.contains("Nice to meet you"));
    }
}
