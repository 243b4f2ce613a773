use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::agent::AgentState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub state: AgentState,
    pub created_at: NaiveDateTime,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

/// One processed turn, enough to replay the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub session_id: String,
    pub turn_index: i64,
    pub utterance: String,
    pub state_before: AgentState,
    pub state_after: AgentState,
    pub reply: String,
    pub created_at: NaiveDateTime,
}
