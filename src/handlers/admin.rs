use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AgentStep, AppointmentSummary};
use crate::services::session;
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/sessions
#[derive(Deserialize)]
pub struct SessionsQuery {
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct SessionRow {
    pub session_id: String,
    pub step: AgentStep,
    pub status: &'static str,
    pub prospect_name: String,
    pub missing: Vec<&'static str>,
    pub notes: usize,
    pub last_activity: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Serialize)]
pub struct StepCount {
    pub step: AgentStep,
    pub count: i64,
}

#[derive(Serialize)]
pub struct SessionsResponse {
    pub completed: i64,
    pub by_step: Vec<StepCount>,
    pub sessions: Vec<SessionRow>,
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SessionsQuery>,
) -> Result<Json<SessionsResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let (sessions, counts) = {
        let db = state
            .db
            .lock()
            .map_err(|_| AppError::Internal("session database lock poisoned".to_string()))?;
        (
            queries::list_sessions(&db, limit)?,
            queries::count_sessions_by_step(&db)?,
        )
    };

    let sessions = sessions
        .into_iter()
        .map(|s| SessionRow {
            status: AppointmentSummary::from_state(&s.state).status,
            step: s.state.step,
            prospect_name: s.state.draft.prospect_name.clone(),
            missing: s
                .state
                .draft
                .missing_fields()
                .into_iter()
                .map(|f| f.label())
                .collect(),
            notes: s.state.draft.additional_notes.len(),
            session_id: s.id,
            last_activity: s.last_activity,
            expires_at: s.expires_at,
        })
        .collect();

    let completed = counts
        .iter()
        .filter(|(step, _)| step.is_complete())
        .map(|(_, count)| count)
        .sum::<i64>();
    let by_step = counts
        .into_iter()
        .map(|(step, count)| StepCount { step, count })
        .collect();

    Ok(Json(SessionsResponse {
        completed,
        by_step,
        sessions,
    }))
}

// POST /api/admin/sessions/expire
#[derive(Serialize)]
pub struct ExpireResponse {
    pub purged: usize,
}

pub async fn expire_sessions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ExpireResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    let purged = session::expire_sessions(&state)?;
    Ok(Json(ExpireResponse { purged }))
}
