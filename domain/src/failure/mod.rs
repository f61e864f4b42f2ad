//! Failure classification and recovery policy.
//!
//! A failed execution carries a [`raw::RawFailure`]. The
//! [`classifier::FailureClassifier`] evaluates a fixed, ordered rule list
//! ([`signatures`]) against it, and the [`policy::RecoveryPolicy`] turns the
//! matched category plus the caller's streak counter into a
//! [`category::RecoveryAction`].
//!
//! The classifier is stateless. Streak counters belong to the caller.

pub mod category;
pub mod classifier;
pub mod policy;
pub mod raw;
pub mod signatures;
