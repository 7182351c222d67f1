//! Scan orchestration: wires `Config` into a `ratchet_scan::ScanOptions`

use crate::RatchetCtx;
use ratchet_config::effective_max_concurrency;
use ratchet_errors::Error;
use ratchet_scan::{ScanEngine, ScanOptions, ScanResult};

/// Scan one project, creating pending updates for anything outdated.
///
/// # Errors
///
/// See [`ratchet_scan::ScanEngine::scan_project`].
pub async fn scan_project(ctx: &RatchetCtx, project_id: i64) -> Result<ScanResult, Error> {
    let settings = ctx.store.get_project_settings(project_id).await?;
    let max_concurrency = effective_max_concurrency(
        ctx.config.max_concurrency,
        settings.as_ref().and_then(|s| s.max_concurrency_override),
    );

    let mut engine = ScanEngine::new(ctx.store.clone(), ctx.adapters.clone());
    if let Some(tx) = &ctx.tx {
        engine = engine.with_events(tx.clone());
    }

    engine
        .scan_project(
            project_id,
            ScanOptions {
                max_concurrency,
                timeout: ctx.config.scan_timeout,
            },
        )
        .await
}
