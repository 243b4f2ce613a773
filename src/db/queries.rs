use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::models::{AgentState, AgentStep, Session, TurnRecord};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Sessions ──

pub fn get_session(conn: &Connection, id: &str) -> anyhow::Result<Option<Session>> {
    let now = format_ts(&Utc::now().naive_utc());
    let row = conn
        .query_row(
            "SELECT id, state, created_at, last_activity, expires_at FROM sessions WHERE id = ?1 AND expires_at > ?2",
            params![id, now],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, state_json, created_at, last_activity, expires_at)) => {
            let state: AgentState = serde_json::from_str(&state_json)?;
            Ok(Some(Session {
                id,
                state,
                created_at: parse_ts(&created_at),
                last_activity: parse_ts(&last_activity),
                expires_at: parse_ts(&expires_at),
            }))
        }
        None => Ok(None),
    }
}

pub fn save_session(conn: &Connection, session: &Session) -> anyhow::Result<()> {
    let state_json = serde_json::to_string(&session.state)?;
    conn.execute(
        "INSERT INTO sessions (id, state, step, created_at, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
           state = excluded.state,
           step = excluded.step,
           last_activity = excluded.last_activity,
           expires_at = excluded.expires_at",
        params![
            session.id,
            state_json,
            session.state.step.as_str(),
            format_ts(&session.created_at),
            format_ts(&session.last_activity),
            format_ts(&session.expires_at),
        ],
    )?;
    Ok(())
}

pub fn list_sessions(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Session>> {
    let mut stmt = conn.prepare(
        "SELECT id, state, created_at, last_activity, expires_at FROM sessions
         ORDER BY last_activity DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut sessions = vec![];
    for row in rows {
        let (id, state_json, created_at, last_activity, expires_at) = row?;
        let state: AgentState = match serde_json::from_str(&state_json) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(session = %id, error = %e, "skipping session with unreadable state");
                continue;
            }
        };
        sessions.push(Session {
            id,
            state,
            created_at: parse_ts(&created_at),
            last_activity: parse_ts(&last_activity),
            expires_at: parse_ts(&expires_at),
        });
    }
    Ok(sessions)
}

/// Live and expired sessions grouped by the step they are parked on.
pub fn count_sessions_by_step(conn: &Connection) -> anyhow::Result<Vec<(AgentStep, i64)>> {
    let mut stmt = conn.prepare("SELECT step, COUNT(*) FROM sessions GROUP BY step ORDER BY step")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = vec![];
    for row in rows {
        let (step, count) = row?;
        counts.push((AgentStep::parse(&step), count));
    }
    counts.sort_by_key(|(step, _)| *step);
    Ok(counts)
}

pub fn expire_old_sessions(conn: &Connection) -> anyhow::Result<usize> {
    let now = format_ts(&Utc::now().naive_utc());
    conn.execute(
        "DELETE FROM turns WHERE session_id IN (SELECT id FROM sessions WHERE expires_at <= ?1)",
        params![now],
    )?;
    let count = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", params![now])?;
    Ok(count)
}

// ── Turns ──

pub fn next_turn_index(conn: &Connection, session_id: &str) -> anyhow::Result<i64> {
    let index = conn.query_row(
        "SELECT COALESCE(MAX(turn_index) + 1, 0) FROM turns WHERE session_id = ?1",
        params![session_id],
        |row| row.get(0),
    )?;
    Ok(index)
}

pub fn insert_turn(conn: &Connection, turn: &TurnRecord) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO turns (session_id, turn_index, utterance, state_before, state_after, reply, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            turn.session_id,
            turn.turn_index,
            turn.utterance,
            serde_json::to_string(&turn.state_before)?,
            serde_json::to_string(&turn.state_after)?,
            turn.reply,
            format_ts(&turn.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_turns(conn: &Connection, session_id: &str) -> anyhow::Result<Vec<TurnRecord>> {
    let mut stmt = conn.prepare(
        "SELECT session_id, turn_index, utterance, state_before, state_after, reply, created_at
         FROM turns WHERE session_id = ?1 ORDER BY turn_index ASC",
    )?;

    let rows = stmt.query_map(params![session_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    let mut turns = vec![];
    for row in rows {
        let (session_id, turn_index, utterance, before, after, reply, created_at) = row?;
        turns.push(TurnRecord {
            session_id,
            turn_index,
            utterance,
            state_before: serde_json::from_str(&before)?,
            state_after: serde_json::from_str(&after)?,
            reply,
            created_at: parse_ts(&created_at),
        });
    }
    Ok(turns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::services::agent::create_initial_state;
    use chrono::Duration;

    fn session(id: &str, ttl_minutes: i64) -> Session {
        let now = Utc::now().naive_utc();
        Session {
            id: id.to_string(),
            state: create_initial_state(),
            created_at: now,
            last_activity: now,
            expires_at: now + Duration::minutes(ttl_minutes),
        }
    }

    #[test]
    fn test_session_round_trip() {
        let conn = db::init_db(":memory:").unwrap();
        let mut s = session("abc", 30);
        s.state.draft.fill(crate::models::DraftField::Budget, "400k");
        save_session(&conn, &s).unwrap();

        let loaded = get_session(&conn, "abc").unwrap().unwrap();
        assert_eq!(loaded.state, s.state);
        assert_eq!(
            count_sessions_by_step(&conn).unwrap(),
            vec![(AgentStep::Greeting, 1)]
        );
    }

    #[test]
    fn test_expired_session_is_hidden_and_purged() {
        let conn = db::init_db(":memory:").unwrap();
        save_session(&conn, &session("old", -5)).unwrap();
        save_session(&conn, &session("new", 30)).unwrap();

        assert!(get_session(&conn, "old").unwrap().is_none());
        assert_eq!(expire_old_sessions(&conn).unwrap(), 1);
        assert_eq!(list_sessions(&conn, 10).unwrap().len(), 1);
    }

    #[test]
    fn test_turn_indices_increase() {
        let conn = db::init_db(":memory:").unwrap();
        save_session(&conn, &session("s1", 30)).unwrap();
        assert_eq!(next_turn_index(&conn, "s1").unwrap(), 0);

        let state = create_initial_state();
        insert_turn(
            &conn,
            &TurnRecord {
                session_id: "s1".to_string(),
                turn_index: 0,
                utterance: "hi".to_string(),
                state_before: state.clone(),
                state_after: state,
                reply: "hello".to_string(),
                created_at: Utc::now().naive_utc(),
            },
        )
        .unwrap();

        assert_eq!(next_turn_index(&conn, "s1").unwrap(), 1);
        let turns = get_turns(&conn, "s1").unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].utterance, "hi");
    }
}
