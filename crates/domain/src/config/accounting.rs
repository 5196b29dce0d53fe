use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Accounting source
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where and how the memory accounting file is read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountingConfig {
    /// cgroup v1 `memory.stat` file. The cgroup is configured for the whole
    /// container, not per user.
    #[serde(default = "d_stat_path")]
    pub stat_path: PathBuf,
    /// Upper bound on a single read before it counts as unavailable.
    #[serde(default = "d_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            stat_path: d_stat_path(),
            read_timeout_ms: d_read_timeout_ms(),
        }
    }
}

impl AccountingConfig {
    pub fn read_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.read_timeout_ms)
    }
}

fn d_stat_path() -> PathBuf {
    PathBuf::from("/sys/fs/cgroup/memory/memory.stat")
}
fn d_read_timeout_ms() -> u64 {
    1_000
}
