use serde::{Deserialize, Serialize};

pub mod executor;
pub mod general;
pub mod planner;
pub mod policy;
pub mod risk;
pub mod scan;

pub use executor::ExecutorEvent;
pub use general::GeneralEvent;
pub use planner::PlannerEvent;
pub use policy::PolicyEvent;
pub use risk::RiskEvent;
pub use scan::ScanEvent;

/// Top-level application event enum that aggregates all domain-specific events.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    Scan(ScanEvent),
    Risk(RiskEvent),
    Planner(PlannerEvent),
    Policy(PolicyEvent),
    Executor(ExecutorEvent),
    General(GeneralEvent),
}
