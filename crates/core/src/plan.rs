//! Plan orchestration: gathers pending updates into an `UpdatePlan`

use crate::RatchetCtx;
use ratchet_errors::Error;
use ratchet_planner::{generate_plan, Candidate, UpdatePlan};

/// Build an [`UpdatePlan`] from every `pending` update currently recorded
/// for `project_id`.
///
/// # Errors
///
/// Returns [`ratchet_errors::PlannerError::NothingToPlan`] if there are no
/// pending updates, or a store error if a lookup fails.
pub async fn plan_updates(ctx: &RatchetCtx, project_id: i64) -> Result<UpdatePlan, Error> {
    let pending = ctx.store.list_pending_updates(project_id).await?;
    let mut candidates = Vec::with_capacity(pending.len());
    for update in pending {
        let dependency = ctx.store.get_dependency(update.dependency_id).await?;
        candidates.push(Candidate { dependency, update });
    }
    generate_plan(project_id, candidates)
}
