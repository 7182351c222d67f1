//! Adapter-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum AdapterError {
    #[error("no adapter registered for ecosystem {ecosystem}")]
    NotRegistered { ecosystem: String },

    #[error("adapter for {ecosystem} is unavailable: {reason}")]
    Unavailable { ecosystem: String, reason: String },

    #[error("upstream fetch failed for {package}: {message}")]
    UpstreamFetch { package: String, message: String },

    #[error("failed to parse project config at {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("project at {path} failed validation: {reason}")]
    InvalidProject { path: String, reason: String },

    #[error("apply_update refused for {package} {to_version}: {message}")]
    ApplyRefused {
        package: String,
        to_version: String,
        message: String,
    },
}

impl UserFacingError for AdapterError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotRegistered { .. } => Some("Register an adapter for this ecosystem kind."),
            Self::Unavailable { .. } => {
                Some("Install the package manager toolchain this adapter wraps.")
            }
            Self::UpstreamFetch { .. } => {
                Some("The registry may be temporarily unreachable; the scan continues.")
            }
            Self::ParseError { .. } => Some("Fix the project's manifest syntax."),
            Self::ApplyRefused { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::UpstreamFetch { .. })
    }
}
