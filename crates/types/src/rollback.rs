//! Rollback plans and their items

use crate::common::{RollbackItemStatus, RollbackPlanStatus};
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

/// Reverse of one applied [`crate::Update`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackItem {
    pub id: i64,
    pub plan_id: i64,
    pub dependency_name: String,
    pub from_version: Version,
    pub to_version: Version,
    pub status: RollbackItemStatus,
    pub error: Option<String>,
    pub executed_at: Option<DateTime<Utc>>,
}

impl RollbackItem {
    /// Build the reverse item for an applied update: `from` = the update's
    /// `to_version`, `to` = the update's `from_version`.
    #[must_use]
    pub fn reverse_of(
        plan_id: i64,
        dependency_name: impl Into<String>,
        update_from: Version,
        update_to: Version,
    ) -> Self {
        Self {
            id: 0,
            plan_id,
            dependency_name: dependency_name.into(),
            from_version: update_to,
            to_version: update_from,
            status: RollbackItemStatus::Pending,
            error: None,
            executed_at: None,
        }
    }
}

/// Created at the moment an executor begins applying a non-dry-run plan;
/// owns an ordered list of [`RollbackItem`]s appended as updates succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackPlan {
    pub id: i64,
    pub project_id: i64,
    pub status: RollbackPlanStatus,
    pub created_at: DateTime<Utc>,
    pub executed_at: Option<DateTime<Utc>>,
    pub items: Vec<RollbackItem>,
}

impl RollbackPlan {
    #[must_use]
    pub fn new(project_id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            project_id,
            status: RollbackPlanStatus::Pending,
            created_at,
            executed_at: None,
            items: Vec::new(),
        }
    }
}
