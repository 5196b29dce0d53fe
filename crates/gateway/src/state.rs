use std::sync::Arc;

use ru_domain::config::Config;
use ru_usage::{BoundedReader, UsageSource};
use sha2::{Digest, Sha256};

/// Shared application state passed to all API handlers.
///
/// Everything here is fixed at startup; handlers only read it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Accounting reader, re-queried on every request, bounded by
    /// `accounting.read_timeout_ms`.
    pub usage: BoundedReader,
    /// SHA-256 hash of the API bearer token (read once at startup).
    /// `None` = dev mode (no auth enforced).
    pub api_token_hash: Option<Vec<u8>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, usage: Arc<dyn UsageSource>, api_token: Option<&str>) -> Self {
        let api_token_hash = api_token
            .filter(|t| !t.is_empty())
            .map(|t| Sha256::digest(t.as_bytes()).to_vec());
        let usage = BoundedReader::new(usage, config.accounting.read_timeout());
        Self {
            config,
            usage,
            api_token_hash,
        }
    }
}
