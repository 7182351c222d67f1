//! Stored security findings about a (package, version) pair

use crate::common::{RiskLevel, SecurityCheckStatus};
use semver::Version;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityCheck {
    pub id: i64,
    pub package_name: String,
    pub version: Version,
    pub kind: String,
    pub severity: RiskLevel,
    pub status: SecurityCheckStatus,
    pub source: String,
    pub detail: serde_json::Value,
}
