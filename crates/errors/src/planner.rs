//! Planner error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum PlannerError {
    #[error("project {0} has no pending updates to plan")]
    NothingToPlan(i64),
}

impl UserFacingError for PlannerError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        Some("Run a scan first to populate pending updates.")
    }

    fn is_retryable(&self) -> bool {
        false
    }
}
