//! Scan engine error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ScanError {
    #[error("project {0} not found")]
    ProjectNotFound(i64),

    #[error("project {0} is disabled")]
    ProjectDisabled(i64),

    #[error("scan timed out after {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("scan cancelled")]
    Cancelled,
}

impl UserFacingError for ScanError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ProjectNotFound(_) => Some("Check the project id and retry."),
            Self::ProjectDisabled(_) => Some("Enable the project before scanning it."),
            Self::TimedOut { .. } => Some("Raise scan_timeout or reduce max_concurrency load."),
            Self::Cancelled => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}
