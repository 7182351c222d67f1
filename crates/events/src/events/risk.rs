//! Risk analyzer events

use ratchet_types::{RiskLevel, UpdateType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RiskEvent {
    Analyzed {
        dependency_name: String,
        update_type: UpdateType,
        risk_level: RiskLevel,
        breaking: bool,
        security_fix: bool,
        confidence: f64,
    },
    Degraded {
        dependency_name: String,
        reason: String,
    },
}
