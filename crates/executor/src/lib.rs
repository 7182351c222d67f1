#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::too_many_lines)]

//! Applying an [`UpdatePlan`](ratchet_planner::UpdatePlan) phase-by-phase
//! against package-manager adapters, and reversing it via `RollbackEngine`.

mod concurrency;
pub mod rollback;

pub use rollback::{RollbackEngine, RollbackOptions, RollbackResult};

use chrono::Utc;
use ratchet_adapter::PackageAdapter;
use ratchet_errors::Error;
use ratchet_events::{AppEvent, EventEmitter, EventSender, ExecutorEvent};
use ratchet_planner::{Candidate, UpdatePlan};
use ratchet_policy::{evaluate, ConfigOverlay, EvaluationInput};
use ratchet_store::Store;
use ratchet_types::{Dependency, PolicyDecision, Project, SecurityCheckStatus, UpdatePolicy, UpdateStatus};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Options controlling one `apply` call.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub dry_run: bool,
    /// Continue past an `ApplyFailed` error instead of aborting the rest of
    /// the plan.
    pub force: bool,
    /// Concurrency cap within a parallel group; defaults to the configured
    /// `max_concurrency` when `None`.
    pub batch_size: Option<usize>,
    /// Update ids pre-authorized to proceed despite a `require_approval`
    /// policy decision (e.g. a human clicked "approve" out of band).
    pub pre_authorized: HashSet<i64>,
}

/// Outcome of one `apply` call.
#[derive(Debug, Clone, Default)]
pub struct UpdateResult {
    pub successful: Vec<i64>,
    pub failed: Vec<(i64, String)>,
    pub skipped: Vec<i64>,
    pub duration: Duration,
    pub rollback_plan_id: Option<i64>,
}

/// Applies update plans against a package adapter, persisting every
/// transition through a [`Store`].
pub struct Executor {
    store: Arc<dyn Store>,
    tx: Option<EventSender>,
}

impl EventEmitter for Executor {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl Executor {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, tx: None }
    }

    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Apply `plan` phase-by-phase.
    ///
    /// # Errors
    ///
    /// Returns a [`ratchet_errors::StoreError`]-wrapped [`Error`] if a
    /// persistence call fails; that is the only fatal condition — adapter
    /// failures are recorded in the returned [`UpdateResult`] instead.
    pub async fn apply(
        &self,
        plan: &UpdatePlan,
        project: &Project,
        adapter: Arc<dyn PackageAdapter>,
        policies: &[UpdatePolicy],
        overlay: &ConfigOverlay,
        options: &ApplyOptions,
    ) -> Result<UpdateResult, Error> {
        let started = Instant::now();
        let mut result = UpdateResult::default();

        let rollback_plan_id = if options.dry_run {
            None
        } else {
            Some(self.store.create_rollback_plan(&plan.rollback_plan).await?)
        };
        result.rollback_plan_id = rollback_plan_id;

        let default_batch = options.batch_size.unwrap_or(5);
        let mut aborted = false;

        for group in &plan.update_groups {
            if aborted {
                break;
            }
            self.emit(AppEvent::Executor(ExecutorEvent::PhaseStarted {
                project_id: project.id,
                group: format!("{:?}", group.key),
                update_count: group.candidates.len(),
                parallel: group.parallel,
            }));

            if group.parallel {
                let any_failed = self
                    .apply_group_parallel(
                        &group.candidates,
                        project,
                        &adapter,
                        policies,
                        overlay,
                        options,
                        rollback_plan_id,
                        default_batch,
                        &mut result,
                    )
                    .await?;
                if any_failed && !options.force {
                    aborted = true;
                }
            } else {
                for candidate in &group.candidates {
                    let outcome = self
                        .apply_one(candidate, project, &adapter, policies, overlay, options, rollback_plan_id)
                        .await?;
                    record(&mut result, outcome);
                    if matches!(result.failed.last(), Some((id, _)) if *id == candidate.update.id) && !options.force {
                        aborted = true;
                        break;
                    }
                }
            }
        }

        result.duration = started.elapsed();
        self.emit(AppEvent::Executor(ExecutorEvent::PlanCompleted {
            project_id: project.id,
            successful: result.successful.len(),
            failed: result.failed.len(),
            skipped: result.skipped.len(),
            duration: result.duration,
        }));

        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_group_parallel(
        &self,
        candidates: &[Candidate],
        project: &Project,
        adapter: &Arc<dyn PackageAdapter>,
        policies: &[UpdatePolicy],
        overlay: &ConfigOverlay,
        options: &ApplyOptions,
        rollback_plan_id: Option<i64>,
        batch_size: usize,
        result: &mut UpdateResult,
    ) -> Result<bool, Error> {
        let semaphore = concurrency::create_semaphore(batch_size);
        let mut joins = JoinSet::new();

        for candidate in candidates {
            let permit = concurrency::acquire_semaphore_permit(&semaphore).await?;
            let candidate = candidate.clone();
            let project = project.clone();
            let adapter = Arc::clone(adapter);
            let store = Arc::clone(&self.store);
            let policies = policies.to_vec();
            let overlay = *overlay;
            let options = options.clone();
            let tx = self.tx.clone();

            joins.spawn(async move {
                let _permit = permit;
                let executor = Executor { store, tx };
                executor
                    .apply_one(&candidate, &project, &adapter, &policies, &overlay, &options, rollback_plan_id)
                    .await
            });
        }

        let mut any_failed = false;
        while let Some(joined) = joins.join_next().await {
            let outcome = joined.map_err(|e| Error::internal(format!("executor task panicked: {e}")))??;
            if matches!(outcome, Outcome::Failed(..)) {
                any_failed = true;
            }
            record(result, outcome);
        }
        Ok(any_failed)
    }

    #[allow(clippy::too_many_arguments)]
    async fn apply_one(
        &self,
        candidate: &Candidate,
        project: &Project,
        adapter: &Arc<dyn PackageAdapter>,
        policies: &[UpdatePolicy],
        overlay: &ConfigOverlay,
        options: &ApplyOptions,
        rollback_plan_id: Option<i64>,
    ) -> Result<Outcome, Error> {
        let update = &candidate.update;
        let dependency = &candidate.dependency;

        if update.status != UpdateStatus::Pending {
            return Ok(Outcome::NoOp);
        }

        let security_check_detected = self
            .store
            .list_security_checks(&dependency.name)
            .await?
            .iter()
            .any(|check| check.version == update.to_version && check.status == SecurityCheckStatus::Detected);

        let evaluation = evaluate(
            policies,
            &EvaluationInput {
                update,
                dependency,
                project,
                confidence: None,
                security_check_detected,
                now: Utc::now(),
            },
            overlay,
        );

        let authorized = options.pre_authorized.contains(&update.id);
        let blocked = matches!(evaluation.decision, PolicyDecision::Block)
            || (matches!(evaluation.decision, PolicyDecision::RequireApproval) && !authorized);

        if blocked {
            self.store.set_update_status(update.id, UpdateStatus::Skipped, None).await?;
            self.emit(AppEvent::Executor(ExecutorEvent::UpdateSkipped {
                project_id: project.id,
                dependency_name: dependency.name.clone(),
                reason: evaluation.rationale.clone(),
            }));
            return Ok(Outcome::Skipped(update.id));
        }

        if options.dry_run {
            return Ok(Outcome::Applied(update.id));
        }

        match adapter
            .apply_update(&project.path, &dependency.name, &update.to_version, false)
            .await
        {
            Ok(()) => {
                let applied_at = Utc::now();
                self.store
                    .set_update_status(update.id, UpdateStatus::Applied, Some(applied_at))
                    .await?;

                let mut updated_dependency = dependency.clone();
                updated_dependency.current_version = Some(update.to_version.clone());
                let reference = updated_dependency.latest_version.clone().unwrap_or_else(|| update.to_version.clone());
                updated_dependency.status = Dependency::classify(updated_dependency.current_version.as_ref(), &reference);
                updated_dependency.last_checked = Some(applied_at);
                self.store.upsert_dependency(&updated_dependency).await?;

                if let Some(plan_id) = rollback_plan_id {
                    let item = ratchet_types::RollbackItem::reverse_of(
                        plan_id,
                        dependency.name.clone(),
                        update.from_version.clone(),
                        update.to_version.clone(),
                    );
                    self.store.append_rollback_item(plan_id, &item).await?;
                }

                self.emit(AppEvent::Executor(ExecutorEvent::UpdateApplied {
                    project_id: project.id,
                    dependency_name: dependency.name.clone(),
                    to_version: update.to_version.to_string(),
                }));
                Ok(Outcome::Applied(update.id))
            }
            Err(e) => {
                let message = e.to_string();
                self.store.set_update_status(update.id, UpdateStatus::Failed, None).await?;
                self.emit(AppEvent::Executor(ExecutorEvent::UpdateFailed {
                    project_id: project.id,
                    dependency_name: dependency.name.clone(),
                    message: message.clone(),
                }));
                Ok(Outcome::Failed(update.id, message))
            }
        }
    }
}

enum Outcome {
    Applied(i64),
    Failed(i64, String),
    Skipped(i64),
    NoOp,
}

fn record(result: &mut UpdateResult, outcome: Outcome) {
    match outcome {
        Outcome::Applied(id) => result.successful.push(id),
        Outcome::Failed(id, message) => result.failed.push((id, message)),
        Outcome::Skipped(id) => result.skipped.push(id),
        Outcome::NoOp => {}
    }
}
