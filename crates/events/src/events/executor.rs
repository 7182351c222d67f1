//! Executor and rollback engine events

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecutorEvent {
    PhaseStarted {
        project_id: i64,
        group: String,
        update_count: usize,
        parallel: bool,
    },
    UpdateApplied {
        project_id: i64,
        dependency_name: String,
        to_version: String,
    },
    UpdateFailed {
        project_id: i64,
        dependency_name: String,
        message: String,
    },
    UpdateSkipped {
        project_id: i64,
        dependency_name: String,
        reason: String,
    },
    PlanCompleted {
        project_id: i64,
        successful: usize,
        failed: usize,
        skipped: usize,
        #[serde(with = "crate::duration")]
        duration: Duration,
    },
    RollbackStarted {
        plan_id: i64,
        item_count: usize,
    },
    RollbackItemCompleted {
        plan_id: i64,
        dependency_name: String,
    },
    RollbackItemFailed {
        plan_id: i64,
        dependency_name: String,
        message: String,
    },
    RollbackCompleted {
        plan_id: i64,
        partially_executed: bool,
    },
}
