//! Risk analyzer error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum RiskError {
    #[error("malformed changelog: {message}")]
    MalformedChangelog { message: String },
}

impl UserFacingError for RiskError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        Some("The analyzer degrades to a low-confidence unknown classification; no action required.")
    }

    fn is_retryable(&self) -> bool {
        false
    }
}
