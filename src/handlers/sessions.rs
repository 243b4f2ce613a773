use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{AgentState, AppointmentSummary, TurnRecord};
use crate::services::session::{self, TurnOutcome};
use crate::state::AppState;

const MAX_UTTERANCE_CHARS: usize = 2000;

// POST /api/sessions
#[derive(Serialize)]
pub struct SessionStarted {
    pub session_id: String,
    pub reply: String,
    pub state: AgentState,
    pub summary: AppointmentSummary,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionStarted>), AppError> {
    let (session, greeting) = session::start_session(&state)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionStarted {
            summary: AppointmentSummary::from_state(&session.state),
            session_id: session.id,
            reply: greeting,
            state: session.state,
        }),
    ))
}

// GET /api/sessions/:id
#[derive(Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub state: AgentState,
    pub summary: AppointmentSummary,
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, AppError> {
    let session = session::load_session(&state, &id)?;
    Ok(Json(SessionView {
        summary: AppointmentSummary::from_state(&session.state),
        session_id: session.id,
        state: session.state,
    }))
}

// POST /api/sessions/:id/turns
#[derive(Deserialize)]
pub struct TurnRequest {
    pub utterance: String,
}

pub async fn post_turn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<TurnRequest>,
) -> Result<Json<TurnOutcome>, AppError> {
    if payload.utterance.chars().count() > MAX_UTTERANCE_CHARS {
        return Err(AppError::BadRequest(format!(
            "utterance longer than {MAX_UTTERANCE_CHARS} characters"
        )));
    }
    let outcome = session::process_turn(&state, &id, &payload.utterance)?;
    Ok(Json(outcome))
}

// GET /api/sessions/:id/turns
pub async fn get_turns(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TurnRecord>>, AppError> {
    Ok(Json(session::transcript(&state, &id)?))
}
