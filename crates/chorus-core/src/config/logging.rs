//! Log output configuration.

use serde::{Deserialize, Serialize};

/// Tracing subscriber settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter directive, e.g. `"info"` or `"chorus_realtime=debug"`.
    #[serde(default = "default_level")]
    pub level: String,
    /// `"json"` for structured output, anything else for pretty output.
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "info".into()
}

fn default_format() -> String {
    "pretty".into()
}
