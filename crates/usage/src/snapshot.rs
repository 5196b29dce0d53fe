use std::collections::HashMap;

use ru_domain::{Error, Result};
use serde::Serialize;

/// Key holding the resident memory charged to the cgroup, in bytes.
pub const TOTAL_RSS_KEY: &str = "total_rss";
/// Key holding the effective limit including parent cgroups, in bytes.
pub const HIERARCHICAL_LIMIT_KEY: &str = "hierarchical_memory_limit";

/// Smallest value the kernel uses to mean "no limit".
///
/// cgroup v1 reports an unlimited group as `PAGE_COUNTER_MAX` pages, which
/// comes out to `0x7FFF_FFFF_FFFF_F000` with 4 KiB pages and a little
/// higher on larger page sizes. Anything at or above this is unbounded.
pub const UNBOUNDED_LIMIT_FLOOR: u64 = 0x7FFF_FFFF_FFFF_F000;

/// Usage and limit read from one pass over the accounting file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccountingSnapshot {
    /// Resident bytes currently charged to the group.
    pub total_rss: u64,
    /// Configured ceiling in bytes. Reported verbatim, including the
    /// unbounded sentinel; see [`limit_is_unbounded`](Self::limit_is_unbounded).
    pub hierarchical_memory_limit: u64,
}

impl AccountingSnapshot {
    /// Build a snapshot from the raw text of a `memory.stat` file.
    pub fn from_stat(contents: &str) -> Result<Self> {
        Self::from_stat_map(&parse_stat(contents)?)
    }

    /// Pick the two required keys out of a parsed stat map.
    /// Any other keys are ignored.
    pub fn from_stat_map(stats: &HashMap<String, u64>) -> Result<Self> {
        Ok(Self {
            total_rss: required(stats, TOTAL_RSS_KEY)?,
            hierarchical_memory_limit: required(stats, HIERARCHICAL_LIMIT_KEY)?,
        })
    }

    pub fn limit_is_unbounded(&self) -> bool {
        self.hierarchical_memory_limit >= UNBOUNDED_LIMIT_FLOOR
    }
}

fn required(stats: &HashMap<String, u64>, key: &str) -> Result<u64> {
    stats
        .get(key)
        .copied()
        .ok_or_else(|| Error::MalformedData(format!("missing required key `{key}`")))
}

/// Parse `<key><whitespace><integer>` lines into a map.
///
/// Blank lines are skipped and tokens after the value are ignored. A line
/// without a value, or with a value that is not an unsigned 64-bit integer,
/// fails the whole parse: a half-read file is never reported.
pub fn parse_stat(contents: &str) -> Result<HashMap<String, u64>> {
    let mut stats = HashMap::new();

    for (idx, line) in contents.lines().enumerate() {
        let mut fields = line.split_whitespace();
        let Some(key) = fields.next() else {
            continue;
        };
        let raw = fields.next().ok_or_else(|| {
            Error::MalformedData(format!("line {}: `{key}` has no value", idx + 1))
        })?;
        let value = raw.parse::<u64>().map_err(|e| {
            Error::MalformedData(format!(
                "line {}: `{key}` value {raw:?} is not an integer: {e}",
                idx + 1
            ))
        })?;
        stats.insert(key.to_owned(), value);
    }

    Ok(stats)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
