pub mod admin;
pub mod dev;
pub mod health;
pub mod sessions;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/dev", get(dev::dev_page))
        .route("/api/dev/config", get(dev::dev_config))
        .route("/api/sessions", post(sessions::create_session))
        .route("/api/sessions/:id", get(sessions::get_session))
        .route(
            "/api/sessions/:id/turns",
            get(sessions::get_turns).post(sessions::post_turn),
        )
        .route("/api/admin/sessions", get(admin::list_sessions))
        .route("/api/admin/sessions/expire", post(admin::expire_sessions))
        .with_state(state)
}
