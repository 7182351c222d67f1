//! Bounded worker pool helpers, generalized from the teacher's semaphore
//! utilities: a plain `Arc<Semaphore>` plus an acquire that turns a closed
//! semaphore into a proper `Error` instead of panicking.

use ratchet_errors::Error;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[must_use]
pub fn create_semaphore(permits: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(permits.max(1)))
}

/// # Errors
///
/// Returns an error if the semaphore has been closed (never done by this
/// crate, but kept fallible to avoid a panic on a future misuse).
pub async fn acquire_semaphore_permit(semaphore: &Arc<Semaphore>) -> Result<OwnedSemaphorePermit, Error> {
    semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| Error::internal("worker-pool semaphore was closed"))
}
