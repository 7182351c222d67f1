//! Reversing an already-applied [`ratchet_types::RollbackPlan`].

use chrono::Utc;
use ratchet_adapter::PackageAdapter;
use ratchet_errors::Error;
use ratchet_events::{AppEvent, EventEmitter, EventSender, ExecutorEvent};
use ratchet_store::Store;
use ratchet_types::{Dependency, Project, RollbackItemStatus, RollbackPlanStatus};
use semver::Version;
use std::sync::Arc;

/// Options controlling one rollback run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollbackOptions {
    /// Keep applying the remaining items after one fails, instead of
    /// stopping the plan in place.
    pub force: bool,
}

/// Outcome of one rollback run.
#[derive(Debug, Clone)]
pub struct RollbackResult {
    pub completed: Vec<i64>,
    pub failed: Vec<(i64, String)>,
    pub status: RollbackPlanStatus,
}

/// Reverses rollback plans item-by-item, in the order they were recorded.
pub struct RollbackEngine {
    store: Arc<dyn Store>,
    tx: Option<EventSender>,
}

impl EventEmitter for RollbackEngine {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl RollbackEngine {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store, tx: None }
    }

    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    async fn restore_dependency_version(&self, project_id: i64, dependency_name: &str, to_version: &Version) -> Result<(), Error> {
        let dependencies = self.store.list_dependencies(project_id).await?;
        let Some(mut dependency) = dependencies.into_iter().find(|d| d.name == dependency_name) else {
            return Ok(());
        };
        dependency.current_version = Some(to_version.clone());
        let reference = dependency.latest_version.clone().unwrap_or_else(|| to_version.clone());
        dependency.status = Dependency::classify(dependency.current_version.as_ref(), &reference);
        self.store.upsert_dependency(&dependency).await?;
        Ok(())
    }

    /// Reverse every still-pending item of `plan_id`, in creation order.
    /// Items already `Completed` are skipped (idempotent re-run).
    ///
    /// # Errors
    ///
    /// Returns an error if the plan does not exist or a persistence call
    /// fails; adapter failures are recorded per-item instead.
    pub async fn execute(
        &self,
        plan_id: i64,
        project: &Project,
        adapter: Arc<dyn PackageAdapter>,
        options: RollbackOptions,
    ) -> Result<RollbackResult, Error> {
        let plan = self.store.get_rollback_plan(plan_id).await?;
        let pending: Vec<_> = plan
            .items
            .iter()
            .filter(|item| item.status == RollbackItemStatus::Pending)
            .collect();

        self.emit(AppEvent::Executor(ExecutorEvent::RollbackStarted {
            plan_id,
            item_count: pending.len(),
        }));
        self.store
            .set_rollback_plan_status(plan_id, RollbackPlanStatus::Executing, None)
            .await?;

        let mut completed = Vec::new();
        let mut failed = Vec::new();
        let mut stopped_early = false;

        for item in plan.items.iter().filter(|i| i.status == RollbackItemStatus::Pending) {
            if stopped_early {
                break;
            }
            match adapter
                .apply_update(&project.path, &item.dependency_name, &item.to_version, false)
                .await
            {
                Ok(()) => {
                    self.store
                        .set_rollback_item_status(item.id, RollbackItemStatus::Completed, None)
                        .await?;
                    self.restore_dependency_version(project.id, &item.dependency_name, &item.to_version)
                        .await?;
                    completed.push(item.id);
                    self.emit(AppEvent::Executor(ExecutorEvent::RollbackItemCompleted {
                        plan_id,
                        dependency_name: item.dependency_name.clone(),
                    }));
                }
                Err(e) => {
                    let message = e.to_string();
                    self.store
                        .set_rollback_item_status(item.id, RollbackItemStatus::Failed, Some(message.clone()))
                        .await?;
                    failed.push((item.id, message.clone()));
                    self.emit(AppEvent::Executor(ExecutorEvent::RollbackItemFailed {
                        plan_id,
                        dependency_name: item.dependency_name.clone(),
                        message,
                    }));
                    if !options.force {
                        stopped_early = true;
                    }
                }
            }
        }

        let all_done = completed.len() + failed.len() == pending.len();
        let final_status = if failed.is_empty() && all_done {
            RollbackPlanStatus::Completed
        } else if !completed.is_empty() && (options.force || all_done) {
            RollbackPlanStatus::PartiallyExecuted
        } else {
            RollbackPlanStatus::Failed
        };

        self.store
            .set_rollback_plan_status(plan_id, final_status, Some(Utc::now()))
            .await?;
        self.emit(AppEvent::Executor(ExecutorEvent::RollbackCompleted {
            plan_id,
            partially_executed: final_status == RollbackPlanStatus::PartiallyExecuted,
        }));

        Ok(RollbackResult {
            completed,
            failed,
            status: final_status,
        })
    }
}
