use axum::response::{IntoResponse, Json};

/// `GET /health` — lightweight liveness probe (public, no auth).
///
/// Does not touch the accounting source; use `/metrics` for that.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
