//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`]: domain-level errors (invalid requests and configs)
//! - [`string::truncate`]: UTF-8 safe truncation for bounded diagnostics

pub mod error;
pub mod string;
