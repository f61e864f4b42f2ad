//! Subprocess inference backend
//!
//! Implements the [`InferenceBackend`](fleet_application::InferenceBackend)
//! port by spawning one child per session and reading its stream-json output.

pub mod error;
pub mod process;
pub mod protocol;

pub use error::ProcessBackendError;
pub use process::{ProcessBackend, ProcessBackendConfig, ProcessSession};
