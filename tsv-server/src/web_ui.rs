//! Embedded web UI
//!
//! The page is a single HTML file; the track geometry is spliced in at
//! serve time so the drawing matches the configured ring.

use crate::state::AppState;
use axum::{extract::State, response::Html};

const UI_TEMPLATE: &str = include_str!("ui.html");
const GEOMETRY_PLACEHOLDER: &str = "/* __GEOMETRY__ */";

/// Serve the embedded web UI
pub async fn serve_ui(State(state): State<AppState>) -> Html<String> {
    let geometry = serde_json::to_string(&state.config.geometry).unwrap_or_else(|_| "{}".to_string());
    Html(UI_TEMPLATE.replace(GEOMETRY_PLACEHOLDER, &geometry))
}
