//! Agent identity: configuration, capability scope, and config validation.

pub mod capability;
pub mod config;
pub mod validation;
