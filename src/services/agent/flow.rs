//! Booking sequence as an ordered step table.
//!
//! Each collection step owns the draft fields it is responsible for. The
//! current step is always the first row whose fields are not all filled, so
//! the sequence can only move forward as long as filled fields stay filled.

use crate::models::{AgentStep, AppointmentDraft, DraftField};

pub const STEP_TABLE: &[(AgentStep, &[DraftField])] = &[
    (AgentStep::Greeting, &[DraftField::ProspectName]),
    (AgentStep::CollectProperty, &[DraftField::PropertyType]),
    (AgentStep::CollectLocation, &[DraftField::Location]),
    (AgentStep::CollectBudget, &[DraftField::Budget]),
    (
        AgentStep::CollectDatetime,
        &[DraftField::PreferredDate, DraftField::PreferredTime],
    ),
    (AgentStep::CollectContact, &[DraftField::ContactChannel]),
];

/// Fields a step collects. Empty for `Confirm` and `Complete`.
pub fn fields_for(step: AgentStep) -> &'static [DraftField] {
    STEP_TABLE
        .iter()
        .find(|(s, _)| *s == step)
        .map(|(_, fields)| *fields)
        .unwrap_or(&[])
}

/// First still-empty field the step is responsible for.
pub fn pending_field(step: AgentStep, draft: &AppointmentDraft) -> Option<DraftField> {
    fields_for(step)
        .iter()
        .copied()
        .find(|f| !draft.is_filled(*f))
}

/// Step the draft calls for, or `None` once every field is filled.
pub fn first_open_step(draft: &AppointmentDraft) -> Option<AgentStep> {
    STEP_TABLE
        .iter()
        .find(|(_, fields)| fields.iter().any(|f| !draft.is_filled(*f)))
        .map(|(step, _)| *step)
}

/// Next step after a turn. `Complete` is absorbing and nothing moves backward.
pub fn advance(current: AgentStep, draft: &AppointmentDraft, confirm: bool) -> AgentStep {
    if current == AgentStep::Complete {
        return AgentStep::Complete;
    }
    let next = match first_open_step(draft) {
        Some(step) => step,
        None if confirm => AgentStep::Confirm,
        None => AgentStep::Complete,
    };
    next.max(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_with(fields: &[DraftField]) -> AppointmentDraft {
        let mut draft = AppointmentDraft::default();
        for f in fields {
            draft.fill(*f, "x");
        }
        draft
    }

    #[test]
    fn test_empty_draft_starts_at_greeting() {
        let draft = AppointmentDraft::default();
        assert_eq!(first_open_step(&draft), Some(AgentStep::Greeting));
        assert_eq!(
            advance(AgentStep::Greeting, &draft, false),
            AgentStep::Greeting
        );
    }

    #[test]
    fn test_skips_volunteered_fields() {
        let draft = draft_with(&[
            DraftField::ProspectName,
            DraftField::PropertyType,
            DraftField::Location,
            DraftField::Budget,
        ]);
        assert_eq!(
            advance(AgentStep::Greeting, &draft, false),
            AgentStep::CollectDatetime
        );
    }

    #[test]
    fn test_datetime_needs_both_fields() {
        let draft = draft_with(&[
            DraftField::ProspectName,
            DraftField::PropertyType,
            DraftField::Location,
            DraftField::Budget,
            DraftField::PreferredDate,
        ]);
        assert_eq!(first_open_step(&draft), Some(AgentStep::CollectDatetime));
        assert_eq!(
            pending_field(AgentStep::CollectDatetime, &draft),
            Some(DraftField::PreferredTime)
        );
    }

    #[test]
    fn test_full_draft_completes_or_confirms() {
        let draft = draft_with(&DraftField::ALL);
        assert_eq!(
            advance(AgentStep::CollectContact, &draft, false),
            AgentStep::Complete
        );
        assert_eq!(
            advance(AgentStep::CollectContact, &draft, true),
            AgentStep::Confirm
        );
    }

    #[test]
    fn test_complete_is_absorbing() {
        let draft = AppointmentDraft::default();
        assert_eq!(
            advance(AgentStep::Complete, &draft, false),
            AgentStep::Complete
        );
    }

    #[test]
    fn test_never_moves_backward() {
        let draft = draft_with(&[DraftField::ProspectName]);
        assert_eq!(
            advance(AgentStep::CollectBudget, &draft, false),
            AgentStep::CollectBudget
        );
    }

    #[test]
    fn test_table_covers_every_field_once() {
        let mut seen: Vec<DraftField> = STEP_TABLE
            .iter()
            .flat_map(|(_, fields)| fields.iter().copied())
            .collect();
        assert_eq!(seen.len(), DraftField::ALL.len());
        seen.dedup();
        assert_eq!(seen, DraftField::ALL.to_vec());
    }

    #[test]
    fn test_terminal_steps_own_no_fields() {
        assert!(fields_for(AgentStep::Confirm).is_empty());
        assert!(fields_for(AgentStep::Complete).is_empty());
    }
}
