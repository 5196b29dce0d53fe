//! `resuse snapshot` — one-shot read, same code path as `GET /metrics`.

use std::sync::Arc;

use anyhow::Context;
use ru_domain::config::Config;
use ru_usage::{BoundedReader, CgroupUsageSource};

use crate::api::metrics::MetricsReport;

pub async fn run(config: &Config, config_path: &str, json: bool) -> anyhow::Result<()> {
    super::config::ensure_valid(config, config_path)?;

    let reader = BoundedReader::new(
        Arc::new(CgroupUsageSource::new(config.accounting.stat_path.clone())),
        config.accounting.read_timeout(),
    );

    let snapshot = reader
        .read()
        .await
        .with_context(|| format!("reading {}", config.accounting.stat_path.display()))?;
    let report = MetricsReport::build(&snapshot, &config.display);

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!(
            "{}",
            summary_line(&report, snapshot.limit_is_unbounded(), config.display.display_limit())
        );
    }
    Ok(())
}

fn summary_line(report: &MetricsReport, unbounded: bool, display_limit: u64) -> String {
    let limit = if unbounded {
        "unlimited".to_owned()
    } else {
        format_mib(report.limits.memory.rss)
    };
    let mut line = format!("rss {} / limit {limit}", format_mib(report.rss));
    if display_limit != 0 {
        line.push_str(&format!(" (display limit {})", format_mib(display_limit)));
    }
    if report.limits.memory.warn == Some(true) {
        line.push_str(" [WARN]");
    }
    line
}

fn format_mib(bytes: u64) -> String {
    format!("{:.1} MiB", bytes as f64 / (1024.0 * 1024.0))
}
