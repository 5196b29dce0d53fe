use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use ru_domain::config::Config;
use ru_domain::{Error, Result};
use ru_gateway::api;
use ru_gateway::state::AppState;
use ru_usage::{AccountingSnapshot, CgroupUsageSource, UsageSource};
use tower::ServiceExt;

fn write_stat(path: &Path, rss: u64, limit: u64) {
    std::fs::write(
        path,
        format!("cache 4096\nrss {rss}\nhierarchical_memory_limit {limit}\ntotal_rss {rss}\n"),
    )
    .unwrap();
}

fn config(threshold: f64, base_url: &str) -> Arc<Config> {
    let mut config = Config::default();
    config.display.mem_warning_threshold = threshold;
    config.display.mem_limit = Some(0);
    config.server.base_url = base_url.into();
    Arc::new(config)
}

fn app_for(path: &Path, config: Arc<Config>, token: Option<&str>) -> Router {
    let usage: Arc<dyn UsageSource> = Arc::new(CgroupUsageSource::new(path));
    api::mount(AppState::new(config, usage, token))
}

async fn get(app: &Router, uri: &str, bearer: Option<&str>) -> (StatusCode, serde_json::Value) {
    let mut req = Request::builder().uri(uri);
    if let Some(token) = bearer {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let resp = app
        .clone()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn reports_usage_and_limit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.stat");
    write_stat(&path, 104_857_600, 1_073_741_824);
    let app = app_for(&path, config(0.2, "/"), None);

    let (status, body) = get(&app, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({"rss":104857600,"limits":{"memory":{"rss":1073741824,"warn":false}}})
    );
}

#[tokio::test]
async fn warns_when_headroom_is_low() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.stat");
    write_stat(&path, 900_000_000, 1_073_741_824);
    let app = app_for(&path, config(0.2, "/"), None);

    let (status, body) = get(&app, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limits"]["memory"]["warn"], true);
}

#[tokio::test]
async fn zero_threshold_has_no_warn_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.stat");
    write_stat(&path, 1_000_000_000, 1_073_741_824);
    let app = app_for(&path, config(0.0, "/"), None);

    let (_, body) = get(&app, "/metrics", None).await;
    assert_eq!(
        body,
        serde_json::json!({"rss":1000000000u64,"limits":{"memory":{"rss":1073741824u64}}})
    );
}

#[tokio::test]
async fn repeated_calls_are_identical_until_the_file_changes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.stat");
    write_stat(&path, 100, 1_000);
    let app = app_for(&path, config(0.2, "/"), None);

    let (_, first) = get(&app, "/metrics", None).await;
    let (_, second) = get(&app, "/metrics", None).await;
    assert_eq!(first, second);

    write_stat(&path, 950, 1_000);
    let (_, third) = get(&app, "/metrics", None).await;
    assert_eq!(third["rss"], 950);
    assert_eq!(third["limits"]["memory"]["warn"], true);
}

#[tokio::test]
async fn missing_source_is_503() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_for(&dir.path().join("memory.stat"), config(0.2, "/"), None);

    let (status, body) = get(&app, "/metrics", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("unavailable"));
    assert!(body.get("rss").is_none());
}

#[tokio::test]
async fn missing_key_is_500_not_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.stat");
    std::fs::write(&path, "cache 0\nhierarchical_memory_limit 1073741824\n").unwrap();
    let app = app_for(&path, config(0.2, "/"), None);

    let (status, body) = get(&app, "/metrics", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("total_rss"));
    assert!(body.get("rss").is_none());
}

#[tokio::test]
async fn non_utf8_file_is_500() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.stat");
    std::fs::write(&path, b"total_rss 1\nhierarchical_memory_limit \xff\xfe\n").unwrap();
    let app = app_for(&path, config(0.2, "/"), None);

    let (status, body) = get(&app, "/metrics", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("malformed"));
}

#[tokio::test]
async fn display_limit_from_env_keeps_documented_body() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.stat");
    write_stat(&path, 104_857_600, 1_073_741_824);

    let mut cfg = Config::default();
    cfg.display.apply_env_default(Some("2147483648")).unwrap();
    let app = app_for(&path, Arc::new(cfg), None);

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        std::str::from_utf8(&bytes).unwrap(),
        r#"{"rss":104857600,"limits":{"memory":{"rss":1073741824,"warn":false}}}"#
    );
}

struct StuckSource;

impl UsageSource for StuckSource {
    fn read_snapshot(&self) -> Result<AccountingSnapshot> {
        std::thread::sleep(std::time::Duration::from_millis(500));
        Err(Error::Other("should have timed out first".into()))
    }

    fn describe(&self) -> String {
        "stuck".into()
    }
}

#[tokio::test]
async fn stuck_read_is_503_within_timeout() {
    let mut cfg = Config::default();
    cfg.accounting.read_timeout_ms = 50;
    let app = api::mount(AppState::new(Arc::new(cfg), Arc::new(StuckSource), None));

    let started = std::time::Instant::now();
    let (status, _) = get(&app, "/metrics", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(started.elapsed() < std::time::Duration::from_millis(400));
}

#[tokio::test]
async fn token_is_required_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.stat");
    write_stat(&path, 1, 2);
    let app = app_for(&path, config(0.2, "/"), Some("s3cret"));

    let (status, _) = get(&app, "/metrics", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&app, "/metrics", Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = get(&app, "/metrics", Some("s3cret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rss"], 1);
}

#[tokio::test]
async fn health_is_public() {
    let dir = tempfile::tempdir().unwrap();
    let app = app_for(&dir.path().join("memory.stat"), config(0.2, "/"), Some("s3cret"));

    let (status, body) = get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn routes_live_under_base_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memory.stat");
    write_stat(&path, 10, 20);
    let app = app_for(&path, config(0.2, "/user/alice/"), None);

    let (status, body) = get(&app, "/user/alice/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limits"]["memory"]["rss"], 20);

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
