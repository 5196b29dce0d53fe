pub mod auth;
pub mod health;
pub mod metrics;

use axum::middleware;
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Build the API router with routes relative to the base URL.
///
/// Routes are split into **public** (no auth required) and **protected**
/// (gated behind the bearer-token middleware).
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/health", get(health::health));

    let protected = Router::new()
        .route("/metrics", get(metrics::get_metrics))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::require_api_token,
        ));

    public.merge(protected)
}

/// Mount the API under `config.server.base_url` and attach state.
///
/// This is the single entry point a host needs: it returns a ready router
/// whose paths are `{base_url}metrics` and `{base_url}health`.
pub fn mount(state: AppState) -> Router {
    let prefix = state.config.server.base_url.trim_end_matches('/').to_owned();
    let api = router(state.clone());

    let app = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    };
    app.with_state(state)
}
