//! Memory metrics endpoint.
//!
//! - `GET /metrics` — fresh usage and limit from the accounting source

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use ru_domain::config::DisplayConfig;
use ru_domain::Error;
use ru_usage::AccountingSnapshot;
use serde::Serialize;

use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Body of a successful `/metrics` response:
/// `{ "rss": u64, "limits": { "memory": { "rss": u64, "warn"?: bool } } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsReport {
    pub rss: u64,
    pub limits: Limits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Limits {
    pub memory: MemoryLimits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryLimits {
    /// The hierarchical limit, verbatim from the accounting file.
    pub rss: u64,
    /// Present only when a warning threshold is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warn: Option<bool>,
}

impl MetricsReport {
    /// The display limit (`mem_limit`) is startup config only and never
    /// appears in the body.
    pub fn build(snapshot: &AccountingSnapshot, display: &DisplayConfig) -> Self {
        let usage = snapshot.total_rss;
        let limit = snapshot.hierarchical_memory_limit;

        let warn = display
            .warning_enabled()
            .then(|| headroom_below(usage, limit, display.mem_warning_threshold));

        Self {
            rss: usage,
            limits: Limits {
                memory: MemoryLimits {
                    rss: limit,
                    warn,
                },
            },
        }
    }
}

/// `(limit - usage) < limit * threshold`, comparing the integer headroom
/// exactly against the floating-point bound. Usage above the limit is
/// negative headroom and always below the threshold.
fn headroom_below(usage: u64, limit: u64, threshold: f64) -> bool {
    let Some(headroom) = limit.checked_sub(usage) else {
        return true;
    };
    // For an integer h and finite x: h < x  <=>  h < ceil(x).
    let bound = (limit as f64 * threshold).ceil();
    if bound >= u64::MAX as f64 {
        return true;
    }
    headroom < bound as u64
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build a standardized JSON error response: `{ "error": "<message>" }`.
fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Map a failed read to its HTTP status. Never yields a partial body.
fn read_error_response(err: &Error) -> Response {
    match err {
        Error::SourceUnavailable(_) => {
            tracing::warn!(error = %err, "memory accounting unavailable");
            api_error(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        Error::MalformedData(_) => {
            tracing::error!(error = %err, "memory accounting data does not match the expected layout");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "metrics request failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// GET /metrics
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `GET /metrics` — re-reads the accounting source and reports usage.
pub async fn get_metrics(State(state): State<AppState>) -> Response {
    match state.usage.read().await {
        Ok(snapshot) => Json(MetricsReport::build(&snapshot, &state.config.display)).into_response(),
        Err(e) => read_error_response(&e),
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
