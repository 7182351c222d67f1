//! Apply and rollback orchestration

use crate::RatchetCtx;
use ratchet_errors::Error;
use ratchet_executor::{ApplyOptions, Executor, RollbackEngine, RollbackOptions, RollbackResult, UpdateResult};
use ratchet_policy::ConfigOverlay;
use ratchet_planner::UpdatePlan;
use ratchet_types::ProjectSettings;

/// Narrow the global `Config` by a project's own overrides.
#[must_use]
pub fn config_overlay(config: &ratchet_config::Config, settings: Option<&ProjectSettings>) -> ConfigOverlay {
    let auto_update_level = settings
        .and_then(|s| s.auto_update_level_override)
        .unwrap_or(config.auto_update_level);
    ConfigOverlay {
        auto_update_level,
        require_confirmation: config.require_confirmation,
        whitelist_enabled: config.whitelist_enabled,
    }
}

/// Apply `plan` against `project_id`'s registered adapter.
///
/// # Errors
///
/// Returns an error if the project has no registered/available adapter, or
/// a persistence call fails.
pub async fn apply_plan(
    ctx: &RatchetCtx,
    project_id: i64,
    plan: &UpdatePlan,
    options: &ApplyOptions,
) -> Result<UpdateResult, Error> {
    let project = ctx.store.get_project(project_id).await?;
    let adapter = ctx.adapters.get_available(project.ecosystem).await?;
    let policies = ctx.store.list_policies(Some(project_id)).await?;
    let settings = ctx.store.get_project_settings(project_id).await?;
    let overlay = config_overlay(&ctx.config, settings.as_ref());

    let mut executor = Executor::new(ctx.store.clone());
    if let Some(tx) = &ctx.tx {
        executor = executor.with_events(tx.clone());
    }

    executor.apply(plan, &project, adapter, &policies, &overlay, options).await
}

/// Reverse an applied plan's rollback items.
///
/// # Errors
///
/// Returns an error if the rollback plan does not exist, the project has no
/// available adapter, or a persistence call fails.
pub async fn rollback_plan(
    ctx: &RatchetCtx,
    project_id: i64,
    rollback_plan_id: i64,
    options: RollbackOptions,
) -> Result<RollbackResult, Error> {
    let project = ctx.store.get_project(project_id).await?;
    let adapter = ctx.adapters.get_available(project.ecosystem).await?;

    let mut engine = RollbackEngine::new(ctx.store.clone());
    if let Some(tx) = &ctx.tx {
        engine = engine.with_events(tx.clone());
    }

    engine.execute(rollback_plan_id, &project, adapter, options).await
}
