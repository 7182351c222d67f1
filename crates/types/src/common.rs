//! Shared enumerations used across the data model

use serde::{Deserialize, Serialize};
use std::fmt;

/// The package-manager family a [`crate::Project`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EcosystemKind {
    Npm,
    Pip,
    Maven,
}

impl fmt::Display for EcosystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Npm => "npm",
            Self::Pip => "pip",
            Self::Maven => "maven",
        };
        write!(f, "{s}")
    }
}

/// How a dependency is declared within its project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyClass {
    Direct,
    Dev,
    Peer,
    Optional,
}

/// Reconciliation status assigned by the scan engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyStatus {
    UpToDate,
    Outdated,
    Unknown,
    Vulnerable,
}

/// Classification of a version delta.
///
/// `Unknown` sits alongside `major|minor|patch|prerelease|security` as the
/// analyzer's fallback when a changelog parse failure degrades risk
/// analysis instead of failing the scan outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    Major,
    Minor,
    Patch,
    Prerelease,
    Security,
    Unknown,
}

/// Coarse risk/severity tag, ordered `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// The maximum of a (possibly empty) set of risk levels, defaulting to `Low`.
    #[must_use]
    pub fn max_of(levels: impl IntoIterator<Item = Self>) -> Self {
        levels.into_iter().max().unwrap_or(Self::Low)
    }
}

/// Lifecycle status of an [`crate::Update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Pending,
    Applied,
    Failed,
    Skipped,
}

/// Lifecycle status of a [`crate::RollbackPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollbackPlanStatus {
    Pending,
    Executing,
    Completed,
    Failed,
    PartiallyExecuted,
}

/// Lifecycle status of a single [`crate::RollbackItem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollbackItemStatus {
    Pending,
    Completed,
    Failed,
}

/// What a [`crate::RiskPrediction`] is a prediction of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionType {
    BreakingChange,
    SecurityRisk,
    RiskLevel,
}

/// Status of a recorded [`crate::SecurityCheck`] finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityCheckStatus {
    Detected,
    Resolved,
    Ignored,
}

/// Coarse config-level filter on auto-update eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AutoUpdateLevel {
    #[default]
    None,
    Security,
    Minor,
    Major,
}

/// `update_strategy` field of a policy's Actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStrategy {
    Conservative,
    Balanced,
    Aggressive,
}

/// Final decision produced by the policy evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    Allow,
    Block,
    RequireApproval,
    AutoUpdate,
}
