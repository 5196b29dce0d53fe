//! Startup wiring: turn a validated [`Config`] into an [`AppState`].

use std::sync::Arc;

use ru_domain::config::Config;
use ru_usage::{CgroupUsageSource, UsageSource};

use crate::state::AppState;

/// Build the shared state. Reads the API token env var exactly once.
pub fn build_app_state(config: Arc<Config>) -> AppState {
    let usage: Arc<dyn UsageSource> =
        Arc::new(CgroupUsageSource::new(config.accounting.stat_path.clone()));

    let token = std::env::var(&config.server.api_token_env).ok();
    match token.as_deref() {
        Some(t) if !t.is_empty() => {
            tracing::info!(env = %config.server.api_token_env, "API token auth enabled");
        }
        _ => {
            tracing::warn!(
                env = %config.server.api_token_env,
                "API token not set; /metrics is served without authentication"
            );
        }
    }

    tracing::info!(
        source = %usage.describe(),
        "memory accounting source configured"
    );
    tracing::info!(
        timeout_ms = config.accounting.read_timeout_ms,
        warning_threshold = config.display.mem_warning_threshold,
        display_limit = config.display.display_limit(),
        "display settings loaded"
    );

    AppState::new(config, usage, token.as_deref())
}
