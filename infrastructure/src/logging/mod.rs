//! Logging infrastructure: per-run trace files.
//!
//! Provides [`FileTraceSink`], which implements the
//! [`TraceSink`](fleet_application::TraceSink) port. Diagnostic logging goes
//! through `tracing` and is configured by the binary.

mod trace_file;

pub use trace_file::{FileTraceOptions, FileTraceSink, trace_path};
