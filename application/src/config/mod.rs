//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`EngineParams`]: execution engine control (cancellation grace)
//! - [`DispatchParams`]: dispatch loop control (attempts, inline backoff, streak window)

pub mod dispatch_params;
pub mod engine_params;

pub use dispatch_params::DispatchParams;
pub use engine_params::EngineParams;
