//! Scan engine events

use ratchet_types::EcosystemKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    Started {
        project_id: i64,
        ecosystem: EcosystemKind,
        dependency_count: usize,
    },
    DependencyChecked {
        project_id: i64,
        dependency_name: String,
        outdated: bool,
    },
    DependencyErrored {
        project_id: i64,
        dependency_name: String,
        message: String,
    },
    Completed {
        project_id: i64,
        updates_found: usize,
        errors: usize,
        #[serde(with = "crate::duration")]
        duration: Duration,
    },
    TimedOut {
        project_id: i64,
    },
}
