pub mod migrations;
pub mod queries;

use std::path::Path;

use anyhow::Context;
use rusqlite::Connection;

/// Directory of `NNN_name.sql` files, relative to the working directory.
pub const MIGRATIONS_DIR: &str = "migrations";

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("failed to open session database at {path}"))?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    let applied = migrations::run_migrations(&conn, Path::new(MIGRATIONS_DIR))?;
    tracing::debug!(applied, path, "session database ready");

    Ok(conn)
}
