use std::sync::{Arc, MutexGuard};

use anyhow::Context;
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AgentState, AppointmentSummary, Session, TurnRecord};
use crate::services::agent::{greeting_message, DialogueEngine};
use crate::state::AppState;

/// What the caller gets back for each turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub reply: String,
    pub state: AgentState,
    pub summary: AppointmentSummary,
}

/// Result of re-running the engine over a stored transcript.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReplayReport {
    pub turns: usize,
    /// Index of the first turn whose recorded `state_after` was not reproduced.
    pub diverged_at: Option<i64>,
}

impl ReplayReport {
    pub fn is_consistent(&self) -> bool {
        self.diverged_at.is_none()
    }
}

fn lock_db(state: &AppState) -> anyhow::Result<MutexGuard<'_, Connection>> {
    state
        .db
        .lock()
        .map_err(|_| anyhow::anyhow!("session database lock poisoned"))
}

fn not_found(session_id: &str) -> anyhow::Error {
    AppError::NotFound(format!("session {session_id}")).into()
}

pub fn start_session(state: &Arc<AppState>) -> anyhow::Result<(Session, String)> {
    let now = Utc::now().naive_utc();
    let session = Session {
        id: uuid::Uuid::new_v4().to_string(),
        state: state.engine.initial_state(),
        created_at: now,
        last_activity: now,
        expires_at: now + state.config.session_ttl(),
    };

    {
        let db = lock_db(state)?;
        queries::save_session(&db, &session).context("failed to create session")?;
    }

    tracing::info!(session = %session.id, "session started");
    Ok((session, greeting_message().to_string()))
}

pub fn load_session(state: &Arc<AppState>, session_id: &str) -> anyhow::Result<Session> {
    let db = lock_db(state)?;
    queries::get_session(&db, session_id)?.ok_or_else(|| not_found(session_id))
}

/// Runs one turn. The lock is held from load to save so turns on the same
/// session are applied strictly in order.
pub fn process_turn(
    state: &Arc<AppState>,
    session_id: &str,
    utterance: &str,
) -> anyhow::Result<TurnOutcome> {
    let db = lock_db(state)?;

    let mut session = queries::get_session(&db, session_id)?.ok_or_else(|| not_found(session_id))?;
    let utterance = utterance.trim();
    let before = session.state.clone();

    let response = state.engine.handle(utterance, &before);

    tracing::info!(
        session = session_id,
        from = before.step.as_str(),
        to = response.state.step.as_str(),
        notes = response.state.draft.additional_notes.len(),
        "processing turn"
    );

    let now = Utc::now().naive_utc();
    session.state = response.state.clone();
    session.last_activity = now;
    session.expires_at = now + state.config.session_ttl();
    queries::save_session(&db, &session).context("failed to save session")?;

    let turn_index = queries::next_turn_index(&db, session_id)?;
    queries::insert_turn(
        &db,
        &TurnRecord {
            session_id: session_id.to_string(),
            turn_index,
            utterance: utterance.to_string(),
            state_before: before,
            state_after: response.state.clone(),
            reply: response.reply.clone(),
            created_at: now,
        },
    )
    .context("failed to record turn")?;

    Ok(TurnOutcome {
        summary: AppointmentSummary::from_state(&response.state),
        reply: response.reply,
        state: response.state,
    })
}

pub fn transcript(state: &Arc<AppState>, session_id: &str) -> anyhow::Result<Vec<TurnRecord>> {
    let db = lock_db(state)?;
    if queries::get_session(&db, session_id)?.is_none() {
        return Err(not_found(session_id));
    }
    queries::get_turns(&db, session_id)
}

/// Feeds each recorded utterance through the engine, starting from the first
/// record's `state_before`, and checks every `state_after` comes out the same.
pub fn replay(engine: &DialogueEngine, records: &[TurnRecord]) -> ReplayReport {
    let mut current = match records.first() {
        Some(first) => first.state_before.clone(),
        None => engine.initial_state(),
    };

    for record in records {
        let response = engine.handle(&record.utterance, &current);
        if response.state != record.state_after {
            return ReplayReport {
                turns: records.len(),
                diverged_at: Some(record.turn_index),
            };
        }
        current = response.state;
    }

    ReplayReport {
        turns: records.len(),
        diverged_at: None,
    }
}

pub fn expire_sessions(state: &Arc<AppState>) -> anyhow::Result<usize> {
    let db = lock_db(state)?;
    let purged = queries::expire_old_sessions(&db).context("failed to expire sessions")?;
    if purged > 0 {
        tracing::info!(purged, "expired idle sessions");
    }
    Ok(purged)
}
