//! Policy evaluator error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum PolicyError {
    #[error("policy {name} has an invalid regex in {field}: {message}")]
    InvalidRegex {
        name: String,
        field: String,
        message: String,
    },

    #[error("policy {name} has an out-of-range value for {field}: {value}")]
    OutOfRange {
        name: String,
        field: String,
        value: String,
    },

    #[error("policy name {0} is already in use")]
    DuplicateName(String),

    #[error("policy {0} not found")]
    NotFound(String),
}

impl UserFacingError for PolicyError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidRegex { .. } => Some("Fix the regex pattern and resubmit the policy."),
            Self::OutOfRange { .. } => Some("Use a value within the documented range."),
            Self::DuplicateName(_) => Some("Choose a unique policy name."),
            Self::NotFound(_) => Some("Check the policy name and retry."),
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }
}
