use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentStep {
    Greeting,
    CollectProperty,
    CollectLocation,
    CollectBudget,
    CollectDatetime,
    CollectContact,
    Confirm,
    Complete,
}

impl AgentStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStep::Greeting => "greeting",
            AgentStep::CollectProperty => "collect_property",
            AgentStep::CollectLocation => "collect_location",
            AgentStep::CollectBudget => "collect_budget",
            AgentStep::CollectDatetime => "collect_datetime",
            AgentStep::CollectContact => "collect_contact",
            AgentStep::Confirm => "confirm",
            AgentStep::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "collect_property" => AgentStep::CollectProperty,
            "collect_location" => AgentStep::CollectLocation,
            "collect_budget" => AgentStep::CollectBudget,
            "collect_datetime" => AgentStep::CollectDatetime,
            "collect_contact" => AgentStep::CollectContact,
            "confirm" => AgentStep::Confirm,
            "complete" => AgentStep::Complete,
            _ => AgentStep::Greeting,
        }
    }

    pub fn is_complete(&self) -> bool {
        *self == AgentStep::Complete
    }
}

/// One of the scalar slots of an [`AppointmentDraft`], in collection order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    ProspectName,
    PropertyType,
    Location,
    Budget,
    PreferredDate,
    PreferredTime,
    ContactChannel,
}

impl DraftField {
    pub const ALL: [DraftField; 7] = [
        DraftField::ProspectName,
        DraftField::PropertyType,
        DraftField::Location,
        DraftField::Budget,
        DraftField::PreferredDate,
        DraftField::PreferredTime,
        DraftField::ContactChannel,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DraftField::ProspectName => "Prospect",
            DraftField::PropertyType => "Property",
            DraftField::Location => "Location",
            DraftField::Budget => "Budget",
            DraftField::PreferredDate => "Date",
            DraftField::PreferredTime => "Time",
            DraftField::ContactChannel => "Contact",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentDraft {
    pub prospect_name: String,
    pub property_type: String,
    pub location: String,
    pub budget: String,
    pub preferred_date: String,
    pub preferred_time: String,
    pub contact_channel: String,
    #[serde(default)]
    pub additional_notes: Vec<String>,
}

impl AppointmentDraft {
    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::ProspectName => &self.prospect_name,
            DraftField::PropertyType => &self.property_type,
            DraftField::Location => &self.location,
            DraftField::Budget => &self.budget,
            DraftField::PreferredDate => &self.preferred_date,
            DraftField::PreferredTime => &self.preferred_time,
            DraftField::ContactChannel => &self.contact_channel,
        }
    }

    fn slot_mut(&mut self, field: DraftField) -> &mut String {
        match field {
            DraftField::ProspectName => &mut self.prospect_name,
            DraftField::PropertyType => &mut self.property_type,
            DraftField::Location => &mut self.location,
            DraftField::Budget => &mut self.budget,
            DraftField::PreferredDate => &mut self.preferred_date,
            DraftField::PreferredTime => &mut self.preferred_time,
            DraftField::ContactChannel => &mut self.contact_channel,
        }
    }

    pub fn is_filled(&self, field: DraftField) -> bool {
        !self.get(field).is_empty()
    }

    /// Writes `value` into an empty slot. Returns false when the slot was
    /// already set or the trimmed value is empty.
    pub fn fill(&mut self, field: DraftField, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || self.is_filled(field) {
            return false;
        }
        *self.slot_mut(field) = value.to_string();
        true
    }

    pub fn add_note(&mut self, note: &str) {
        let note = note.trim();
        if !note.is_empty() {
            self.additional_notes.push(note.to_string());
        }
    }

    pub fn is_complete(&self) -> bool {
        DraftField::ALL.iter().all(|f| self.is_filled(*f))
    }

    pub fn missing_fields(&self) -> Vec<DraftField> {
        DraftField::ALL
            .iter()
            .copied()
            .filter(|f| !self.is_filled(*f))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentState {
    pub step: AgentStep,
    pub draft: AppointmentDraft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub reply: String,
    pub state: AgentState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_is_first_write_wins() {
        let mut draft = AppointmentDraft::default();
        assert!(draft.fill(DraftField::Budget, " 500k "));
        assert!(!draft.fill(DraftField::Budget, "300k"));
        assert_eq!(draft.budget, "500k");
    }

    #[test]
    fn test_fill_rejects_blank() {
        let mut draft = AppointmentDraft::default();
        assert!(!draft.fill(DraftField::Location, "   "));
        assert!(draft.location.is_empty());
    }

    #[test]
    fn test_missing_fields_in_order() {
        let mut draft = AppointmentDraft::default();
        draft.fill(DraftField::ProspectName, "Jordan");
        draft.fill(DraftField::Budget, "400k");
        let missing = draft.missing_fields();
        assert_eq!(missing[0], DraftField::PropertyType);
        assert_eq!(missing.len(), 5);
        assert!(!draft.is_complete());
    }

    #[test]
    fn test_step_round_trips_through_str() {
        for step in [
            AgentStep::Greeting,
            AgentStep::CollectDatetime,
            AgentStep::Confirm,
            AgentStep::Complete,
        ] {
            assert_eq!(AgentStep::parse(step.as_str()), step);
        }
        assert_eq!(AgentStep::parse("bogus"), AgentStep::Greeting);
    }

    #[test]
    fn test_step_serializes_snake_case() {
        let json = serde_json::to_string(&AgentStep::CollectProperty).unwrap();
        assert_eq!(json, "\"collect_property\"");
    }
}
