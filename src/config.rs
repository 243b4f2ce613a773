use std::env;

use chrono::Duration;

/// One week. Larger values would overflow timestamp arithmetic.
pub const MAX_SESSION_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    /// Sliding idle timeout for a conversation.
    pub session_ttl_minutes: i64,
    pub confirm_before_complete: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "estatevoice.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| parse_ttl_minutes(&v))
                .unwrap_or(30),
            confirm_before_complete: env::var("CONFIRM_BEFORE_COMPLETE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }
}

impl AppConfig {
    /// Idle timeout, kept within `1..=MAX_SESSION_TTL_MINUTES` even when the
    /// struct was built by hand.
    pub fn session_ttl(&self) -> Duration {
        Duration::minutes(self.session_ttl_minutes.clamp(1, MAX_SESSION_TTL_MINUTES))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "estatevoice.db".to_string(),
            admin_token: "changeme".to_string(),
            session_ttl_minutes: 30,
            confirm_before_complete: false,
        }
    }
}

fn parse_ttl_minutes(raw: &str) -> Option<i64> {
    let minutes: i64 = raw.trim().parse().ok()?;
    (minutes > 0).then(|| minutes.min(MAX_SESSION_TTL_MINUTES))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
