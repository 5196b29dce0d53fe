use ru_domain::config::{Config, ConfigSeverity};

/// Parse and validate the config, printing any issues.
///
/// Returns `false` when at least one error-severity issue was found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!(
        "\n{} error(s), {} warning(s) in {config_path}",
        error_count, warning_count,
    );

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<()> {
    let output = toml::to_string_pretty(config)?;
    print!("{output}");
    Ok(())
}

/// Log every issue and refuse to continue when any has error severity.
///
/// Shared by `serve` and `snapshot` so both reject the same configs.
pub fn ensure_valid(config: &Config, config_path: &str) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        tracing::warn!(%issue, "config issue");
    }
    if Config::has_errors(&issues) {
        anyhow::bail!("invalid configuration in {config_path}; refusing to start");
    }
    Ok(())
}
