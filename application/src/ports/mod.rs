//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod activity_store;
pub mod inference_backend;
pub mod progress;
pub mod registry_source;
pub mod trace_sink;
