//! Trace file configuration from TOML (`[trace]` section)

use crate::logging::FileTraceOptions;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Raw trace configuration from TOML
///
/// # Example
///
/// ```toml
/// [trace]
/// dir = "/var/log/agent-fleet/traces"   # omit to disable per-run traces
/// write_timeout_ms = 2000
/// buffer = 256
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTraceConfig {
    /// Directory for per-run trace files. `run --trace` overrides it.
    pub dir: Option<PathBuf>,
    /// Upper bound on a single line write
    pub write_timeout_ms: u64,
    /// Records queued for the writer before new ones are dropped
    pub buffer: usize,
}

impl Default for FileTraceConfig {
    fn default() -> Self {
        Self {
            dir: None,
            write_timeout_ms: 2_000,
            buffer: 256,
        }
    }
}

impl FileTraceConfig {
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn to_options(&self) -> FileTraceOptions {
        FileTraceOptions {
            buffer: self.buffer,
            write_timeout: self.write_timeout(),
        }
    }
}
