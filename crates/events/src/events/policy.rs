//! Policy evaluator events

use ratchet_types::PolicyDecision;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PolicyEvent {
    Evaluated {
        dependency_name: String,
        decision: PolicyDecision,
        matched_policy: Option<String>,
        rationale: String,
    },
    PolicySkipped {
        policy_name: String,
        reason: String,
    },
}
