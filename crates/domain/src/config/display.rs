use serde::{Deserialize, Serialize};

/// Environment variable consulted once at startup for the display limit.
pub const MEM_LIMIT_ENV: &str = "MEM_LIMIT";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Display
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How usage is presented to the client. Never enforces anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Warn when remaining headroom drops below this fraction of the limit.
    ///
    /// With a 128 MiB limit and a threshold of 0.1, the warning flag turns
    /// on once usage passes 128 - 12.8 MiB. `0` disables the flag entirely.
    #[serde(default = "d_threshold")]
    pub mem_warning_threshold: f64,
    /// Memory limit to show the user, in bytes. `0` means "don't show one".
    /// When absent, filled from `MEM_LIMIT` by [`apply_env_default`].
    ///
    /// [`apply_env_default`]: DisplayConfig::apply_env_default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_limit: Option<u64>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            mem_warning_threshold: d_threshold(),
            mem_limit: None,
        }
    }
}

impl DisplayConfig {
    /// Whether responses should carry the `warn` flag at all.
    pub fn warning_enabled(&self) -> bool {
        self.mem_warning_threshold != 0.0
    }

    /// The display limit in bytes, `0` when none is configured.
    pub fn display_limit(&self) -> u64 {
        self.mem_limit.unwrap_or(0)
    }

    /// Resolve `mem_limit` from the raw `MEM_LIMIT` value when the config
    /// file did not set it. An explicit file value always wins.
    pub fn apply_env_default(&mut self, raw: Option<&str>) -> crate::Result<()> {
        if self.mem_limit.is_some() {
            return Ok(());
        }
        let value = match raw.map(str::trim) {
            None | Some("") => 0,
            Some(v) => v.parse::<u64>().map_err(|e| {
                crate::Error::Config(format!("{MEM_LIMIT_ENV}={v:?} is not a byte count: {e}"))
            })?,
        };
        self.mem_limit = Some(value);
        Ok(())
    }
}

fn d_threshold() -> f64 {
    0.2
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
