#![deny(clippy::pedantic, unsafe_code)]
#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::missing_panics_doc
)]

//! Persistence for the ratchet data model
//!
//! Two implementations share the [`Store`] trait: [`SqliteStore`] for
//! production use and [`MemoryStore`] for tests that don't want a database
//! on disk. Neither is favored by the trait itself — `ratchet-core` decides
//! which to construct.

mod codec;
pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ratchet_errors::Error;
use ratchet_types::{
    Dependency, Project, ProjectSettings, RiskPrediction, RollbackItemStatus, RollbackPlan,
    RollbackPlanStatus, SecurityCheck, Update, UpdatePolicy, UpdateStatus,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;

/// Open a connection pool to a `SQLite` database file, creating it if absent.
///
/// # Errors
///
/// Returns an error if the database cannot be opened.
pub async fn create_pool(db_path: &Path) -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| {
            ratchet_errors::StoreError::DatabaseError {
                message: e.to_string(),
            }
            .into()
        })
}

/// Run pending migrations against `pool`.
///
/// # Errors
///
/// Returns an error if any migration fails to apply.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        ratchet_errors::StoreError::MigrationFailed {
            message: e.to_string(),
        }
        .into()
    })
}

/// The query/mutation surface the rest of the workspace needs over the
/// data model.
///
/// Every entity carries its own surrogate `id`; a value passed in with
/// `id == 0` is an insert, anything else an update (mirrored by each
/// `upsert_*` method).
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, Error>;
    async fn get_project(&self, id: i64) -> Result<Project, Error>;
    async fn upsert_project(&self, project: &Project) -> Result<i64, Error>;
    async fn touch_project_scan(&self, id: i64, at: DateTime<Utc>) -> Result<(), Error>;

    async fn get_project_settings(&self, project_id: i64) -> Result<Option<ProjectSettings>, Error>;
    async fn upsert_project_settings(&self, settings: &ProjectSettings) -> Result<(), Error>;

    async fn list_dependencies(&self, project_id: i64) -> Result<Vec<Dependency>, Error>;
    async fn get_dependency(&self, id: i64) -> Result<Dependency, Error>;
    async fn upsert_dependency(&self, dependency: &Dependency) -> Result<i64, Error>;

    async fn create_update(&self, update: &Update) -> Result<i64, Error>;

    /// Insert `update` unless a pending update already exists for the same
    /// `(dependency_id, to_version)`, as a single atomic call — the
    /// check-then-insert a caller would otherwise do across two separate
    /// awaits is race-prone under concurrent scans of the same project.
    /// Returns `None` (nothing inserted) when such a duplicate is found.
    async fn create_update_if_absent(&self, update: &Update) -> Result<Option<i64>, Error>;

    async fn get_update(&self, id: i64) -> Result<Update, Error>;
    async fn list_pending_updates(&self, project_id: i64) -> Result<Vec<Update>, Error>;
    async fn set_update_status(
        &self,
        id: i64,
        status: UpdateStatus,
        applied_at: Option<DateTime<Utc>>,
    ) -> Result<(), Error>;

    async fn create_risk_prediction(&self, prediction: &RiskPrediction) -> Result<i64, Error>;
    async fn list_risk_predictions(&self, update_id: i64) -> Result<Vec<RiskPrediction>, Error>;

    async fn create_rollback_plan(&self, plan: &RollbackPlan) -> Result<i64, Error>;
    async fn get_rollback_plan(&self, id: i64) -> Result<RollbackPlan, Error>;
    async fn append_rollback_item(
        &self,
        plan_id: i64,
        item: &ratchet_types::RollbackItem,
    ) -> Result<i64, Error>;
    async fn set_rollback_plan_status(
        &self,
        id: i64,
        status: RollbackPlanStatus,
        executed_at: Option<DateTime<Utc>>,
    ) -> Result<(), Error>;
    async fn set_rollback_item_status(
        &self,
        item_id: i64,
        status: RollbackItemStatus,
        error: Option<String>,
    ) -> Result<(), Error>;

    async fn list_policies(&self, project_id: Option<i64>) -> Result<Vec<UpdatePolicy>, Error>;
    async fn upsert_policy(&self, policy: &UpdatePolicy) -> Result<i64, Error>;
    async fn delete_policy(&self, id: i64) -> Result<(), Error>;

    async fn create_security_check(&self, check: &SecurityCheck) -> Result<i64, Error>;
    async fn list_security_checks(&self, package_name: &str) -> Result<Vec<SecurityCheck>, Error>;
}
