//! Reply templates, one per resulting step.

use crate::models::{AgentState, AgentStep, AppointmentDraft, DraftField};

use super::flow;

pub const GREETING_MESSAGE: &str =
    "Hey there, I'm your EstateVoice assistant. I can book a property viewing for you. Who do I have the pleasure of speaking with?";

/// What happened during the turn. Fields filled on this turn are
/// acknowledged once; a re-prompt at the same step stays plain.
#[derive(Debug, Default)]
pub struct TurnContext {
    pub noted: bool,
    pub filled: Vec<DraftField>,
}

impl TurnContext {
    fn just_filled(&self, field: DraftField) -> bool {
        self.filled.contains(&field)
    }
}

pub fn compose(state: &AgentState, turn: &TurnContext) -> String {
    let prompt = prompt(state, turn);
    if turn.noted {
        format!("Thanks, I've added that to your notes. {prompt}")
    } else {
        prompt
    }
}

/// Used when the utterance was blank.
pub fn clarify(state: &AgentState) -> String {
    format!(
        "Sorry, I didn't catch that. {}",
        prompt(state, &TurnContext::default())
    )
}

/// The confirmation step did not get a yes.
pub fn confirm_again(state: &AgentState) -> String {
    format!(
        "No problem. Here's what I have so far: {}. Just say yes when it looks right.",
        recap(&state.draft)
    )
}

fn prompt(state: &AgentState, turn: &TurnContext) -> String {
    let draft = &state.draft;
    let name = draft.prospect_name.as_str();

    match state.step {
        AgentStep::Greeting => {
            "Before we get started, could I get your name?".to_string()
        }
        AgentStep::CollectProperty if turn.just_filled(DraftField::ProspectName) => format!(
            "Nice to meet you, {}! What type of property would you like to see, like a house, condo, or townhouse?",
            or_there(name)
        ),
        AgentStep::CollectProperty => format!(
            "What type of property would you like to see, {}? A house, condo, townhouse, or something else.",
            or_there(name)
        ),
        AgentStep::CollectLocation => {
            if turn.just_filled(DraftField::PropertyType) {
                format!(
                    "Great, {} it is. What neighborhood or area are you interested in, {}?",
                    with_article(&draft.property_type),
                    or_there(name)
                )
            } else {
                format!(
                    "What neighborhood or area are you interested in, {}?",
                    or_there(name)
                )
            }
        }
        AgentStep::CollectBudget => {
            if turn.just_filled(DraftField::Location) {
                format!(
                    "{} sounds lovely. What budget range are you working with?",
                    capitalize_first(&draft.location)
                )
            } else {
                "What budget range are you working with?".to_string()
            }
        }
        AgentStep::CollectDatetime => {
            match flow::pending_field(AgentStep::CollectDatetime, draft) {
                Some(DraftField::PreferredTime) => format!(
                    "And what time works best for you {}?",
                    date_phrase(&draft.preferred_date)
                ),
                _ => "What day would you like to schedule the viewing?".to_string(),
            }
        }
        AgentStep::CollectContact => {
            "Almost done. How should we confirm the appointment: phone, text, or email?"
                .to_string()
        }
        AgentStep::Confirm => format!(
            "Here's what I have: {}. Shall I go ahead and book it?",
            recap(draft)
        ),
        AgentStep::Complete => closing(draft),
    }
}

fn closing(draft: &AppointmentDraft) -> String {
    format!(
        "You're all set, {}! I've booked a viewing for {} in {} {} {}, with a budget of {}. We'll confirm by {}.",
        or_there(&draft.prospect_name),
        with_article(&draft.property_type),
        draft.location,
        date_phrase(&draft.preferred_date),
        time_phrase(&draft.preferred_time),
        draft.budget,
        draft.contact_channel,
    )
}

fn recap(draft: &AppointmentDraft) -> String {
    DraftField::ALL
        .iter()
        .filter(|f| draft.is_filled(**f))
        .map(|f| format!("{} {}", f.label().to_lowercase(), draft.get(*f)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_there(name: &str) -> &str {
    if name.is_empty() {
        "there"
    } else {
        name
    }
}

fn with_article(property: &str) -> String {
    match property {
        "" => "a property".to_string(),
        "land" => "land".to_string(),
        p if p.starts_with(|c: char| "aeiou".contains(c)) => format!("an {p}"),
        p => format!("a {p}"),
    }
}

fn date_phrase(date: &str) -> String {
    let lower = date.to_lowercase();
    let relative = ["today", "tomorrow", "day after", "next ", "this ", "coming "]
        .iter()
        .any(|prefix| lower.starts_with(prefix));
    if relative {
        date.to_string()
    } else {
        format!("on {date}")
    }
}

fn time_phrase(time: &str) -> String {
    if time == "tonight" {
        time.to_string()
    } else if ["morning", "afternoon", "evening"]
        .iter()
        .any(|part| time.ends_with(part))
    {
        format!("in the {time}")
    } else {
        format!("at {time}")
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
