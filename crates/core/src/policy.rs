//! Policy management passthroughs, validating before they reach the store

use crate::RatchetCtx;
use ratchet_errors::Error;
use ratchet_policy::validate_policy;
use ratchet_types::UpdatePolicy;

/// Validate and persist `policy`.
///
/// # Errors
///
/// Returns [`ratchet_errors::PolicyError`] if a regex or numeric-range field
/// is invalid, or a store error on a unique-name conflict.
pub async fn upsert_policy(ctx: &RatchetCtx, policy: &UpdatePolicy) -> Result<i64, Error> {
    validate_policy(policy)?;
    ctx.store.upsert_policy(policy).await
}

/// List policies visible to `project_id` (global policies plus any scoped
/// to that project), highest priority first.
///
/// # Errors
///
/// Returns an error if the store lookup fails.
pub async fn list_policies(ctx: &RatchetCtx, project_id: Option<i64>) -> Result<Vec<UpdatePolicy>, Error> {
    ctx.store.list_policies(project_id).await
}

/// # Errors
///
/// Returns an error if the store lookup fails.
pub async fn delete_policy(ctx: &RatchetCtx, id: i64) -> Result<(), Error> {
    ctx.store.delete_policy(id).await
}
