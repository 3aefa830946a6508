//! Core components shared across the crate.
//!
//! This module contains the foundational building blocks:
//! - The primary [`NseError`] type and its stable [`ErrorKind`] classification.
//! - The retry/backoff orchestrator ([`RetryConfig`]).
//! - Default endpoint and timing constants.

pub(crate) mod constants;
/// The primary error type (`NseError`) for the crate.
pub mod error;
/// Bounded exponential-backoff retry, parameterized by error retryability.
pub mod retry;

pub use error::{ErrorKind, NseError};
pub use retry::RetryConfig;
