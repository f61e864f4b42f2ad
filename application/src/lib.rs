//! Application layer for agent-fleet
//!
//! This crate contains use cases, port definitions, the agent registry and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod registry;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::{DispatchParams, EngineParams};
pub use ports::{
    activity_store::{ActivityStore, NoActivityStore},
    inference_backend::{BackendError, BackendSession, InferenceBackend, SessionSpec},
    progress::{ExecutionProgress, NoProgress},
    registry_source::{
        AgentDefaults, RegistryDocument, RegistrySource, RegistrySourceError, StaticRegistrySource,
    },
    trace_sink::{NoTrace, TraceRecord, TraceSink},
};
pub use registry::{AgentRegistry, RegistryError, UnknownAgentPolicy};
pub use use_cases::dispatch::{
    DispatchAgentUseCase, DispatchDecision, DispatchError, DispatchInput, DispatchOutcome,
    StreakTracker,
};
pub use use_cases::execute_agent::{ExecuteAgentUseCase, ExecutionRequest};
pub use use_cases::report_status::ReportStatusUseCase;
