use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ru_domain::{Error, Result};
use tokio::sync::Semaphore;

use crate::snapshot::AccountingSnapshot;

/// Produces a fresh [`AccountingSnapshot`] on every call.
///
/// Implementations must not cache: two calls separated by a change to the
/// underlying data have to observe that change.
pub trait UsageSource: Send + Sync {
    fn read_snapshot(&self) -> Result<AccountingSnapshot>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Reads a cgroup v1 `memory.stat` file from a fixed path.
#[derive(Debug, Clone)]
pub struct CgroupUsageSource {
    path: PathBuf,
}

impl CgroupUsageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UsageSource for CgroupUsageSource {
    /// Open/read failures are `SourceUnavailable`; anything wrong with the
    /// bytes once they are in hand (including invalid UTF-8) is
    /// `MalformedData`.
    fn read_snapshot(&self) -> Result<AccountingSnapshot> {
        let raw = std::fs::read(&self.path).map_err(|e| {
            Error::SourceUnavailable(format!("reading {}: {e}", self.path.display()))
        })?;
        let contents = std::str::from_utf8(&raw).map_err(|e| {
            Error::MalformedData(format!("{} is not UTF-8: {e}", self.path.display()))
        })?;
        AccountingSnapshot::from_stat(contents)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Runs [`UsageSource::read_snapshot`] on the blocking pool under a timeout.
///
/// At most one read is in flight at a time. File reads cannot be
/// interrupted, so a read that outlives its timeout keeps its blocking
/// thread until the kernel returns; while it does, later calls wait for the
/// permit (inside their own timeout) instead of parking another thread. A
/// stuck mount therefore costs one blocking thread, not one per request.
#[derive(Clone)]
pub struct BoundedReader {
    source: Arc<dyn UsageSource>,
    timeout: Duration,
    in_flight: Arc<Semaphore>,
}

impl BoundedReader {
    pub fn new(source: Arc<dyn UsageSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            in_flight: Arc::new(Semaphore::new(1)),
        }
    }

    pub fn describe(&self) -> String {
        self.source.describe()
    }

    /// Read a fresh snapshot, or fail with [`Error::SourceUnavailable`] once
    /// `timeout` has elapsed (waiting for the permit counts toward it).
    pub async fn read(&self) -> Result<AccountingSnapshot> {
        let started = Instant::now();
        let source = self.source.clone();
        let in_flight = self.in_flight.clone();

        let attempt = async move {
            let permit = in_flight
                .acquire_owned()
                .await
                .map_err(|_| Error::SourceUnavailable("accounting reader closed".into()))?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                source.read_snapshot()
            })
            .await
            .map_err(|join_err| {
                Error::SourceUnavailable(format!("accounting read task failed: {join_err}"))
            })?
        };

        let snapshot = match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    source = %self.source.describe(),
                    "accounting read timed out"
                );
                return Err(Error::SourceUnavailable(format!(
                    "read timed out after {} ms",
                    self.timeout.as_millis()
                )));
            }
        };

        tracing::debug!(
            total_rss = snapshot.total_rss,
            limit = snapshot.hierarchical_memory_limit,
            elapsed_us = started.elapsed().as_micros() as u64,
            "accounting snapshot read"
        );
        Ok(snapshot)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
