//! Memory accounting reader.
//!
//! Reads the cgroup v1 `memory.stat` file on demand and extracts the two
//! values the collector reports: resident usage and the hierarchical limit.
//! Nothing is cached; every call goes back to the file.

pub mod snapshot;
pub mod source;

pub use snapshot::{parse_stat, AccountingSnapshot, UNBOUNDED_LIMIT_FLOOR};
pub use source::{BoundedReader, CgroupUsageSource, UsageSource};
