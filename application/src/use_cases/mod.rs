//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dispatch;
pub mod execute_agent;
pub mod report_status;
