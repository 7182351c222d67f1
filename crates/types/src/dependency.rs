//! Declared dependencies inside a project

use crate::common::{DependencyClass, DependencyStatus};
use chrono::{DateTime, Utc};
use semver::Version;
use serde::{Deserialize, Serialize};

/// A declared package inside a [`crate::Project`].
///
/// Invariant: `(project_id, name)` is unique — enforced by the store, not
/// this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub declared_constraint: String,
    pub current_version: Option<Version>,
    pub latest_version: Option<Version>,
    pub class: DependencyClass,
    pub registry: String,
    pub status: DependencyStatus,
    pub last_checked: Option<DateTime<Utc>>,
}

impl Dependency {
    #[must_use]
    pub fn new(
        project_id: i64,
        name: impl Into<String>,
        declared_constraint: impl Into<String>,
        class: DependencyClass,
        registry: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            project_id,
            name: name.into(),
            declared_constraint: declared_constraint.into(),
            current_version: None,
            latest_version: None,
            class,
            registry: registry.into(),
            status: DependencyStatus::Unknown,
            last_checked: None,
        }
    }

    /// Classify against a freshly fetched latest version.
    #[must_use]
    pub fn classify(current: Option<&Version>, latest: &Version) -> DependencyStatus {
        match current {
            None => DependencyStatus::Unknown,
            Some(current) if current == latest => DependencyStatus::UpToDate,
            Some(_) => DependencyStatus::Outdated,
        }
    }
}
