#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the ratchet dependency-update manager
//!
//! This crate provides fine-grained error types organized by domain, unified
//! by a root [`Error`] enum for crate boundaries. All error types implement
//! `Clone` so they can be attached to scan/executor result records without
//! moving the original failure out of scope.

use std::borrow::Cow;

pub mod adapter;
pub mod config;
pub mod executor;
pub mod planner;
pub mod policy;
pub mod risk;
pub mod scan;
pub mod store;

pub use adapter::AdapterError;
pub use config::ConfigError;
pub use executor::ExecutorError;
pub use planner::PlannerError;
pub use policy::PolicyError;
pub use risk::RiskError;
pub use scan::ScanError;
pub use store::StoreError;

use thiserror::Error;

/// Common trait for surfacing actionable errors to a caller-facing layer
/// (CLI, HTTP) without the core depending on either.
pub trait UserFacingError {
    /// Human-readable description of what went wrong.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str>;

    /// Whether the caller may reasonably retry the operation unchanged.
    fn is_retryable(&self) -> bool;
}

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Error {
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("risk error: {0}")]
    Risk(#[from] RiskError),

    #[error("planner error: {0}")]
    Planner(#[from] PlannerError),

    #[error("policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {message}")]
    Io {
        #[cfg_attr(feature = "serde", serde(with = "io_kind_as_str"))]
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<semver::Error> for Error {
    fn from(err: semver::Error) -> Self {
        Self::Internal(format!("version parse error: {err}"))
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::DatabaseError {
            message: err.to_string(),
        })
    }
}

/// Result type alias for ratchet operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "serde")]
mod io_kind_as_str {
    use serde::{Deserialize, Deserializer, Serializer};
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S>(kind: &std::io::ErrorKind, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&format!("{kind:?}"))
    }
    pub fn deserialize<'de, D>(deserializer: D) -> Result<std::io::ErrorKind, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(match s.as_str() {
            "NotFound" => std::io::ErrorKind::NotFound,
            "PermissionDenied" => std::io::ErrorKind::PermissionDenied,
            "TimedOut" => std::io::ErrorKind::TimedOut,
            "Interrupted" => std::io::ErrorKind::Interrupted,
            "UnexpectedEof" => std::io::ErrorKind::UnexpectedEof,
            _ => std::io::ErrorKind::Other,
        })
    }
}
