//! Status configuration from TOML (`[status]` section)

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw status configuration from TOML
///
/// # Example
///
/// ```toml
/// [status]
/// capacity = 1024     # agents tracked in the activity cache
/// ttl_secs = 3600     # older activity reads as "no recent activity"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStatusConfig {
    pub capacity: usize,
    pub ttl_secs: u64,
}

impl Default for FileStatusConfig {
    fn default() -> Self {
        Self {
            capacity: 1_024,
            ttl_secs: 3_600,
        }
    }
}

impl FileStatusConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
