//! Planner events

use ratchet_types::RiskLevel;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlannerEvent {
    PlanGenerated {
        project_id: i64,
        group_count: usize,
        update_count: usize,
        overall_risk: RiskLevel,
        #[serde(with = "crate::duration")]
        estimated_time: Duration,
    },
}
