//! Error types for the process backend

use fleet_application::BackendError;
use thiserror::Error;

/// Errors that can occur while driving a backend child process
#[derive(Error, Debug)]
pub enum ProcessBackendError {
    #[error("Failed to spawn backend '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to capture backend {0}")]
    MissingPipe(&'static str),

    #[error("Failed to write prompt: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("Failed to read backend output: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to wait for backend: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Backend exited with {status} before reporting a result{}", stderr_suffix(.stderr))]
    Exited { status: String, stderr: String },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!(": {}", stderr.trim())
    }
}

impl From<ProcessBackendError> for BackendError {
    fn from(error: ProcessBackendError) -> Self {
        match &error {
            // A missing or broken executable is a setup problem, not a
            // network blip worth retrying
            ProcessBackendError::Spawn { .. } | ProcessBackendError::MissingPipe(_) => {
                BackendError::Other(error.to_string())
            }
            ProcessBackendError::Stdin(_) | ProcessBackendError::Read(_) => {
                BackendError::Connection(error.to_string())
            }
            ProcessBackendError::Wait(_) | ProcessBackendError::Exited { .. } => {
                BackendError::Session(error.to_string())
            }
        }
    }
}
