//! Bearer-token gate in front of `/metrics`.
//!
//! The collector exposes memory figures for the whole container, so the
//! endpoint sits behind the same token the host hands its users. The token
//! comes from the env var named by `server.api_token_env`; bootstrap hashes
//! it once and [`AppState::api_token_hash`] carries only the digest. With no
//! token configured the gate is open and bootstrap has already warned.
//! `/health` is mounted outside the gate.
//!
//! [`AppState::api_token_hash`]: crate::state::AppState::api_token_hash

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::state::AppState;

/// Token presented in `Authorization: Bearer <token>`, or `""` when absent
/// or not a bearer credential.
fn presented_token(req: &Request<Body>) -> &str {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or("")
}

/// Route layer for the metrics routes; see [`super::router`].
pub async fn require_api_token(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_token_hash.as_deref() else {
        return next.run(req).await;
    };

    // Digests have a fixed length, so the comparison time says nothing
    // about the token.
    let presented = Sha256::digest(presented_token(&req).as_bytes());
    if bool::from(presented.ct_eq(expected)) {
        return next.run(req).await;
    }

    tracing::debug!(path = %req.uri().path(), "metrics request rejected: bad bearer token");
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "invalid or missing API token" })),
    )
        .into_response()
}
