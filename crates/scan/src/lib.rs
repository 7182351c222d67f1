#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::too_many_lines)]

//! Reconciling one project's declared dependencies against the adapter's
//! view of the registry.

mod concurrency;

use chrono::Utc;
use ratchet_adapter::{AdapterRegistry, PackageAdapter};
use ratchet_errors::{Error, ScanError};
use ratchet_events::{AppEvent, EventEmitter, EventSender, ScanEvent};
use ratchet_risk::{analyze, RiskInput};
use ratchet_store::Store;
use ratchet_types::{
    Dependency, DependencyStatus, PredictionType, Project, RiskPrediction, Update, UpdateStatus,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Coarse lifecycle status of a completed (or abandoned) scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Completed,
    Failed,
}

/// Outcome of one `scan_project` call.
///
/// Not a stored entity — like [`ratchet_planner::UpdatePlan`] and
/// [`ratchet_executor`]'s `UpdateResult`, it is a report handed back to the
/// caller and mirrored onto the event bus, not a table of its own.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub project_id: i64,
    pub status: ScanStatus,
    pub dependencies_found: usize,
    pub updates_found: usize,
    pub new_dependencies: usize,
    pub updated_dependencies: usize,
    pub available_updates: Vec<Update>,
    pub errors: Vec<String>,
    pub duration: Duration,
}

/// Options controlling one scan.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    pub max_concurrency: usize,
    pub timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            timeout: Duration::from_secs(300),
        }
    }
}

/// Reconciles declared dependencies against a registered [`PackageAdapter`].
pub struct ScanEngine {
    store: Arc<dyn Store>,
    registry: AdapterRegistry,
    tx: Option<EventSender>,
}

impl EventEmitter for ScanEngine {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl ScanEngine {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, registry: AdapterRegistry) -> Self {
        Self { store, registry, tx: None }
    }

    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Scan `project_id`'s dependencies, creating pending `Update`s for
    /// anything outdated.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::ProjectNotFound`] / [`ScanError::ProjectDisabled`]
    /// if the precondition fails, or a [`ratchet_errors::StoreError`]-wrapped
    /// [`Error`] on a fatal store I/O failure. Per-dependency adapter errors
    /// are not fatal — they accumulate in the returned [`ScanResult`].
    pub async fn scan_project(&self, project_id: i64, options: ScanOptions) -> Result<ScanResult, Error> {
        let started = Instant::now();
        let project = self
            .store
            .get_project(project_id)
            .await
            .map_err(|_| ScanError::ProjectNotFound(project_id))?;
        if !project.enabled {
            return Err(ScanError::ProjectDisabled(project_id).into());
        }

        let adapter = self.registry.get_available(project.ecosystem).await?;
        adapter.validate_project(&project.path).await?;
        let entries = adapter.parse_dependencies(&project.path).await?;

        self.emit(AppEvent::Scan(ScanEvent::Started {
            project_id,
            ecosystem: project.ecosystem,
            dependency_count: entries.len(),
        }));

        let existing = self.store.list_dependencies(project_id).await?;

        let work = async {
            let semaphore = concurrency::create_semaphore(options.max_concurrency.max(1));
            let mut joins = JoinSet::new();

            for entry in entries {
                let permit = concurrency::acquire_semaphore_permit(&semaphore).await?;
                let store = Arc::clone(&self.store);
                let adapter = Arc::clone(&adapter);
                let project = project.clone();
                let existing_dependency = existing.iter().find(|d| d.name == entry.name).cloned();
                let tx = self.tx.clone();

                joins.spawn(async move {
                    let _permit = permit;
                    scan_one(&store, &adapter, &project, existing_dependency, entry, tx.as_ref()).await
                });
            }

            let mut outcomes = Vec::new();
            while let Some(joined) = joins.join_next().await {
                match joined {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => return Err(Error::internal(format!("scan task panicked: {e}"))),
                }
            }
            Ok::<_, Error>(outcomes)
        };

        let outcomes = match tokio::time::timeout(options.timeout, work).await {
            Ok(result) => result?,
            Err(_) => {
                self.emit(AppEvent::Scan(ScanEvent::TimedOut { project_id }));
                return Ok(ScanResult {
                    project_id,
                    status: ScanStatus::Failed,
                    dependencies_found: existing.len(),
                    updates_found: 0,
                    new_dependencies: 0,
                    updated_dependencies: 0,
                    available_updates: Vec::new(),
                    errors: vec![format!("scan timed out after {}s", options.timeout.as_secs())],
                    duration: started.elapsed(),
                });
            }
        };

        let mut result = ScanResult {
            project_id,
            status: ScanStatus::Completed,
            dependencies_found: outcomes.len(),
            updates_found: 0,
            new_dependencies: 0,
            updated_dependencies: 0,
            available_updates: Vec::new(),
            errors: Vec::new(),
            duration: Duration::ZERO,
        };

        for outcome in outcomes {
            match outcome {
                Ok(dep_outcome) => {
                    if dep_outcome.is_new {
                        result.new_dependencies += 1;
                    } else {
                        result.updated_dependencies += 1;
                    }
                    if let Some(update) = dep_outcome.update {
                        result.updates_found += 1;
                        result.available_updates.push(update);
                    }
                }
                Err(message) => result.errors.push(message),
            }
        }

        // Per-dependency adapter errors accumulate but do not fail the scan
        // as a whole — only a timeout or a store I/O failure does.
        self.store.touch_project_scan(project_id, Utc::now()).await?;
        result.duration = started.elapsed();
        self.emit(AppEvent::Scan(ScanEvent::Completed {
            project_id,
            updates_found: result.updates_found,
            errors: result.errors.len(),
            duration: result.duration,
        }));

        Ok(result)
    }
}

struct DependencyOutcome {
    is_new: bool,
    update: Option<Update>,
}

async fn scan_one(
    store: &Arc<dyn Store>,
    adapter: &Arc<dyn PackageAdapter>,
    project: &Project,
    existing: Option<Dependency>,
    entry: ratchet_adapter::DependencyEntry,
    tx: Option<&EventSender>,
) -> Result<DependencyOutcome, String> {
    let is_new = existing.is_none();
    let mut dependency = existing.unwrap_or_else(|| {
        Dependency::new(project.id, entry.name.clone(), entry.declared_constraint.clone(), entry.class, "registry")
    });
    dependency.current_version = entry.resolved_version.clone();

    let latest = match adapter.latest_version(&entry.name).await {
        Ok(latest) => latest,
        Err(e) => {
            dependency.status = DependencyStatus::Unknown;
            dependency.last_checked = Some(Utc::now());
            if let Err(store_err) = store.upsert_dependency(&dependency).await {
                return Err(store_err.to_string());
            }
            emit(tx, ScanEvent::DependencyErrored {
                project_id: project.id,
                dependency_name: entry.name.clone(),
                message: e.to_string(),
            });
            return Err(e.to_string());
        }
    };

    dependency.latest_version = Some(latest.version.clone());
    dependency.status = Dependency::classify(dependency.current_version.as_ref(), &latest.version);
    dependency.last_checked = Some(Utc::now());

    dependency.id = store.upsert_dependency(&dependency).await.map_err(|e| e.to_string())?;

    let mut created_update = None;
    if dependency.status == DependencyStatus::Outdated {
        let current = dependency.current_version.clone().unwrap_or_else(|| latest.version.clone());
        let changelog = adapter
            .changelog(&entry.name, &latest.version)
            .await
            .unwrap_or_default();

        let from_str = current.to_string();
        let to_str = latest.version.to_string();
        let analysis = analyze(&RiskInput {
            from_version: &from_str,
            to_version: &to_str,
            changelog: &changelog.description,
            release_notes: "",
        })
        .map_err(|e| e.to_string())?;

        let mut update = Update::new(
            dependency.id,
            current,
            latest.version.clone(),
            analysis.update_type,
            analysis.severity,
            analysis.breaking,
            analysis.security_fix,
        )
        .map_err(|e| e.to_string())?;

        // Check-then-insert across two awaits would race two concurrent
        // scans of the same project; create_update_if_absent does both in
        // one store call.
        if let Some(update_id) = store.create_update_if_absent(&update).await.map_err(|e| e.to_string())? {
            update.id = update_id;

            let predictions = [
                RiskPrediction::new(
                    update.id,
                    PredictionType::RiskLevel,
                    analysis.confidence,
                    format!("{:?}", analysis.risk_level),
                    analysis.rationale.clone(),
                ),
                RiskPrediction::new(
                    update.id,
                    PredictionType::BreakingChange,
                    analysis.confidence,
                    analysis.breaking.to_string(),
                    analysis.rationale.clone(),
                ),
                RiskPrediction::new(
                    update.id,
                    PredictionType::SecurityRisk,
                    analysis.confidence,
                    analysis.security_fix.to_string(),
                    analysis.rationale.clone(),
                ),
            ];
            for prediction in predictions {
                store.create_risk_prediction(&prediction).await.map_err(|e| e.to_string())?;
            }

            created_update = Some(update);
        }
    }

    emit(tx, ScanEvent::DependencyChecked {
        project_id: project.id,
        dependency_name: entry.name,
        outdated: dependency.status == DependencyStatus::Outdated,
    });

    Ok(DependencyOutcome { is_new, update: created_update })
}

fn emit(tx: Option<&EventSender>, event: ScanEvent) {
    if let Some(tx) = tx {
        let _ = tx.send(AppEvent::Scan(event));
    }
}
