//! Infrastructure layer for agent-fleet
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod activity;
pub mod backend;
pub mod config;
pub mod logging;
pub mod registry;

// Re-export commonly used types
pub use activity::InMemoryActivityStore;
pub use backend::{ProcessBackend, ProcessBackendConfig, ProcessBackendError};
pub use config::{
    ConfigLoader, ConfigValidationError, FileBackendConfig, FileConfig, FileRecoveryConfig,
    FileRegistryConfig, FileStatusConfig, FileTraceConfig,
};
pub use logging::{FileTraceOptions, FileTraceSink, trace_path};
pub use registry::YamlRegistrySource;
