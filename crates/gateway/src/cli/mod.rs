pub mod config;
pub mod snapshot;

use clap::{Parser, Subcommand};

/// resuse — report container memory usage over HTTP.
#[derive(Debug, Parser)]
#[command(name = "resuse", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the metrics server (default when no subcommand is given).
    Serve,
    /// Read the accounting source once and print the metrics report.
    Snapshot {
        /// Print the raw JSON body instead of a summary line.
        #[arg(long)]
        json: bool,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `RU_CONFIG` (or
/// `config.toml` by default), then fill environment-derived defaults.
/// Returns the parsed [`Config`] and the path that was used.
///
/// A missing file is not an error: every option has a default.
///
/// [`Config`]: ru_domain::config::Config
pub fn load_config() -> anyhow::Result<(ru_domain::config::Config, String)> {
    let config_path = std::env::var("RU_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let mut config: ru_domain::config::Config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        ru_domain::config::Config::default()
    };

    config.apply_env()?;

    Ok((config, config_path))
}
