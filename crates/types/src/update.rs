//! Pending and realized upgrade proposals

use crate::common::{RiskLevel, UpdateStatus, UpdateType};
use chrono::{DateTime, Utc};
use ratchet_errors::{Error, ExecutorError};
use semver::Version;
use serde::{Deserialize, Serialize};

/// A pending or realized upgrade proposal.
///
/// Invariants: `from_version != to_version`; exactly one `Update` row per
/// `(dependency_id, to_version)` is in `Pending` state at any time (enforced
/// by the store's read-check-insert transaction, not this type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub id: i64,
    pub dependency_id: i64,
    pub from_version: Version,
    pub to_version: Version,
    pub update_type: UpdateType,
    pub severity: RiskLevel,
    pub breaking: bool,
    pub security_fix: bool,
    pub status: UpdateStatus,
    pub applied_at: Option<DateTime<Utc>>,
}

impl Update {
    /// Construct a new pending update, rejecting a no-op version delta.
    ///
    /// # Errors
    ///
    /// Returns an error if `from_version == to_version`.
    pub fn new(
        dependency_id: i64,
        from_version: Version,
        to_version: Version,
        update_type: UpdateType,
        severity: RiskLevel,
        breaking: bool,
        security_fix: bool,
    ) -> Result<Self, Error> {
        if from_version == to_version {
            return Err(Error::internal(format!(
                "update from_version and to_version are both {from_version}"
            )));
        }
        Ok(Self {
            id: 0,
            dependency_id,
            from_version,
            to_version,
            update_type,
            severity,
            breaking,
            security_fix,
            status: UpdateStatus::Pending,
            applied_at: None,
        })
    }

    /// Transition to `Applied`, stamping the current time.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is not currently `Pending`.
    pub fn mark_applied(&mut self, at: DateTime<Utc>) -> Result<(), Error> {
        if self.status != UpdateStatus::Pending {
            return Err(ExecutorError::NotPending(self.id).into());
        }
        self.status = UpdateStatus::Applied;
        self.applied_at = Some(at);
        Ok(())
    }

    /// Transition to `Failed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is not currently `Pending`.
    pub fn mark_failed(&mut self) -> Result<(), Error> {
        if self.status != UpdateStatus::Pending {
            return Err(ExecutorError::NotPending(self.id).into());
        }
        self.status = UpdateStatus::Failed;
        Ok(())
    }

    /// Transition to `Skipped` (policy block / require-approval without authorization).
    ///
    /// # Errors
    ///
    /// Returns an error if the update is not currently `Pending`.
    pub fn mark_skipped(&mut self) -> Result<(), Error> {
        if self.status != UpdateStatus::Pending {
            return Err(ExecutorError::NotPending(self.id).into());
        }
        self.status = UpdateStatus::Skipped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn rejects_noop_version_delta() {
        let err = Update::new(
            1,
            v("1.0.0"),
            v("1.0.0"),
            UpdateType::Patch,
            RiskLevel::Low,
            false,
            false,
        );
        assert!(err.is_err());
    }

    #[test]
    fn applied_transition_requires_pending() {
        let mut u = Update::new(
            1,
            v("1.0.0"),
            v("1.0.1"),
            UpdateType::Patch,
            RiskLevel::Low,
            false,
            false,
        )
        .unwrap();
        assert!(u.mark_applied(Utc::now()).is_ok());
        assert!(u.mark_applied(Utc::now()).is_err());
    }
}
