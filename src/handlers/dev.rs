use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

pub async fn dev_page() -> Html<&'static str> {
    Html(include_str!("../web/dev_chat.html"))
}

#[derive(Serialize)]
pub struct DevConfig {
    pub confirm_before_complete: bool,
    pub session_ttl_minutes: i64,
}

/// Lets the chat page show how the engine is configured.
pub async fn dev_config(State(state): State<Arc<AppState>>) -> Json<DevConfig> {
    Json(DevConfig {
        confirm_before_complete: state.engine.confirm_before_complete,
        session_ttl_minutes: state.config.session_ttl().num_minutes(),
    })
}
