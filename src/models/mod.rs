pub mod agent;
pub mod session;
pub mod summary;

pub use agent::{AgentState, AgentStep, AppointmentDraft, DraftField, TurnResponse};
pub use session::{Session, TurnRecord};
pub use summary::{AppointmentSummary, SummaryItem};
