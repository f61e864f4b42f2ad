//! Backend configuration from TOML (`[backend]` section)

use crate::backend::ProcessBackendConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw backend configuration from TOML
///
/// # Example
///
/// ```toml
/// [backend]
/// command = "claude"
/// args = ["-p", "--output-format", "stream-json", "--verbose"]
/// cancel_grace_ms = 5000
/// stderr_tail_bytes = 4096
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Executable spawned once per session
    pub command: String,
    /// Arguments placed before the per-session flags
    pub args: Vec<String>,
    /// How long cancellation may take before the engine stops waiting
    pub cancel_grace_ms: u64,
    /// How much of the child's stderr to keep for fault messages
    pub stderr_tail_bytes: usize,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            args: vec![
                "-p".to_string(),
                "--output-format".to_string(),
                "stream-json".to_string(),
                "--verbose".to_string(),
            ],
            cancel_grace_ms: 5_000,
            stderr_tail_bytes: 4_096,
        }
    }
}

impl FileBackendConfig {
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }

    pub fn to_process_config(&self) -> ProcessBackendConfig {
        ProcessBackendConfig::new(self.command.trim())
            .with_args(self.args.iter().cloned())
            .with_stderr_tail_bytes(self.stderr_tail_bytes)
    }
}
