//! Configuration file loading for agent-fleet
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `FLEET_<SECTION>__<KEY>` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./fleet.toml` or `./.fleet.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/agent-fleet/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileBackendConfig, FileConfig, FileRecoveryConfig, FileRegistryConfig,
    FileStatusConfig, FileTraceConfig,
};
pub use loader::ConfigLoader;
