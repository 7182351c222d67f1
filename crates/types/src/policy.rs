//! Structured policy rules matched against candidate updates

use crate::common::{EcosystemKind, UpdateStrategy, UpdateType};
use serde::{Deserialize, Serialize};

/// Day-of-week + time-of-day window a policy's actions are restricted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TimeWindow {
    /// 0 = Sunday .. 6 = Saturday, as in `chrono::Weekday::num_days_from_sunday`.
    pub days_of_week: Option<Vec<u8>>,
    /// `HH:MM` in `timezone`.
    pub start_time: Option<String>,
    /// `HH:MM` in `timezone`.
    pub end_time: Option<String>,
    /// IANA timezone name, e.g. `"UTC"`.
    pub timezone: Option<String>,
}

/// All fields optional; a populated field narrows the match, an absent one
/// means "any". A policy matches a candidate update when at least half of
/// its *populated* fields hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicyConditions {
    pub package_names: Option<Vec<String>>,
    pub package_patterns: Option<Vec<String>>,
    pub package_types: Option<Vec<EcosystemKind>>,
    pub current_version_pattern: Option<String>,
    pub target_version_pattern: Option<String>,
    pub version_change_type: Option<UpdateType>,
    pub update_types: Option<Vec<UpdateType>>,
    pub security_risk: Option<bool>,
    pub breaking_change: Option<bool>,
    pub risk_score_min: Option<f64>,
    pub risk_score_max: Option<f64>,
    pub confidence_min: Option<f64>,
    pub confidence_max: Option<f64>,
    pub update_lag_days_min: Option<u32>,
    pub update_lag_days_max: Option<u32>,
    pub time_window: Option<TimeWindow>,
    pub project_names: Option<Vec<String>>,
    pub project_patterns: Option<Vec<String>>,
    pub project_tags: Option<Vec<String>>,
}

/// Action a matching policy prescribes. Tri-state booleans are `Option<bool>`
/// so "unset" is distinguishable from an explicit `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PolicyActions {
    pub auto_update: Option<bool>,
    pub require_approval: Option<bool>,
    pub block_update: Option<bool>,
    pub update_strategy: Option<UpdateStrategy>,
    pub max_risk_score: Option<f64>,
    pub schedule: Option<String>,
    pub delay_days: Option<u32>,
    pub batch_size: Option<u32>,
    pub batch_interval: Option<String>,
    pub notify_channels: Option<Vec<String>>,
    pub notify_level: Option<String>,
    pub notify_message: Option<String>,
    pub run_tests: Option<bool>,
    pub test_commands: Option<Vec<String>>,
    pub rollback_on_fail: Option<bool>,
    pub pre_hook: Option<String>,
    pub post_hook: Option<String>,
}

/// A structured (Conditions, Actions, priority) matching rule.
///
/// Invariant: `name` is unique; `priority` ∈ `[0,100]` (higher wins).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePolicy {
    pub id: i64,
    pub name: String,
    /// `None` means a global policy, applicable to every project.
    pub project_id: Option<i64>,
    pub priority: u8,
    pub enabled: bool,
    pub conditions: PolicyConditions,
    pub actions: PolicyActions,
}

impl UpdatePolicy {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        project_id: Option<i64>,
        priority: u8,
        conditions: PolicyConditions,
        actions: PolicyActions,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            project_id,
            priority: priority.min(100),
            enabled: true,
            conditions,
            actions,
        }
    }
}
