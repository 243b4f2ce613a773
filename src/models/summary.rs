use serde::Serialize;

use super::agent::{AgentState, DraftField};

pub const PENDING: &str = "Pending";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SummaryItem {
    pub label: &'static str,
    pub value: String,
    pub pending: bool,
}

/// Appointment card as the caller renders it.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentSummary {
    pub status: &'static str,
    pub items: Vec<SummaryItem>,
    pub notes: Vec<String>,
}

impl AppointmentSummary {
    pub fn from_state(state: &AgentState) -> Self {
        let items = DraftField::ALL
            .iter()
            .map(|field| {
                let value = state.draft.get(*field);
                SummaryItem {
                    label: field.label(),
                    value: if value.is_empty() {
                        PENDING.to_string()
                    } else {
                        value.to_string()
                    },
                    pending: value.is_empty(),
                }
            })
            .collect();

        Self {
            status: if state.step.is_complete() { "Ready" } else { "Draft" },
            items,
            notes: state.draft.additional_notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentStep, AppointmentDraft};

    #[test]
    fn test_empty_draft_is_all_pending() {
        let state = AgentState {
            step: AgentStep::Greeting,
            draft: AppointmentDraft::default(),
        };
        let summary = AppointmentSummary::from_state(&state);
        assert_eq!(summary.status, "Draft");
        assert_eq!(summary.items.len(), 7);
        assert!(summary.items.iter().all(|i| i.pending && i.value == PENDING));
        assert_eq!(summary.items[0].label, "Prospect");
        assert_eq!(summary.items[6].label, "Contact");
    }

    #[test]
    fn test_ready_only_when_complete() {
        let mut draft = AppointmentDraft::default();
        draft.fill(DraftField::ProspectName, "Jordan");
        let state = AgentState {
            step: AgentStep::CollectProperty,
            draft: draft.clone(),
        };
        let summary = AppointmentSummary::from_state(&state);
        assert_eq!(summary.status, "Draft");
        assert_eq!(summary.items[0].value, "Jordan");
        assert!(!summary.items[0].pending);

        let done = AgentState {
            step: AgentStep::Complete,
            draft,
        };
        assert_eq!(AppointmentSummary::from_state(&done).status, "Ready");
    }
}
