//! Executor and rollback engine error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ExecutorError {
    #[error("update {0} not found")]
    UpdateNotFound(i64),

    #[error("update {0} is not pending")]
    NotPending(i64),

    #[error("apply failed for update {update_id}: {message}")]
    ApplyFailed { update_id: i64, message: String },

    #[error("rollback plan {0} not found")]
    RollbackPlanNotFound(i64),

    #[error("execution cancelled")]
    Cancelled,
}

impl UserFacingError for ExecutorError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::UpdateNotFound(_) | Self::RollbackPlanNotFound(_) => {
                Some("Re-run the plan generation step.")
            }
            Self::NotPending(_) => Some("The update was already applied, failed, or skipped."),
            Self::ApplyFailed { .. } => {
                Some("Inspect the adapter's reported error and retry with force if appropriate.")
            }
            Self::Cancelled => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ApplyFailed { .. })
    }
}
