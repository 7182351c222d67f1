//! Project and per-project settings

use crate::common::{AutoUpdateLevel, EcosystemKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A tracked codebase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub path: PathBuf,
    pub ecosystem: EcosystemKind,
    pub config_file: PathBuf,
    pub enabled: bool,
    pub last_scan: Option<DateTime<Utc>>,
}

impl Project {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        ecosystem: EcosystemKind,
        config_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: 0,
            name: name.into(),
            path: path.into(),
            ecosystem,
            config_file: config_file.into(),
            enabled: true,
            last_scan: None,
        }
    }
}

/// Per-project overrides layered on top of the global `Config`.
///
/// Kept conservative: only the fields the core actually consults
/// (concurrency and auto-update overrides, notification routing) rather
/// than invented configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectSettings {
    pub project_id: i64,
    pub max_concurrency_override: Option<u32>,
    pub auto_update_level_override: Option<AutoUpdateLevel>,
    pub notify_channels: Vec<String>,
}

impl ProjectSettings {
    #[must_use]
    pub fn for_project(project_id: i64) -> Self {
        Self {
            project_id,
            ..Self::default()
        }
    }
}
