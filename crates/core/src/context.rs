//! Dependency-injection context shared by every orchestration function

use ratchet_adapter::AdapterRegistry;
use ratchet_config::Config;
use ratchet_errors::Error;
use ratchet_events::EventSender;
use ratchet_store::Store;
use std::sync::Arc;

/// Everything one pipeline run (scan → plan → apply) needs.
///
/// Built once by [`RatchetCtxBuilder`] and shared (by reference) across
/// however many projects a caller processes in one session.
pub struct RatchetCtx {
    pub store: Arc<dyn Store>,
    pub adapters: AdapterRegistry,
    pub config: Config,
    pub tx: Option<EventSender>,
}

/// Builds a [`RatchetCtx`] from its collaborators.
#[derive(Default)]
pub struct RatchetCtxBuilder {
    store: Option<Arc<dyn Store>>,
    adapters: AdapterRegistry,
    config: Config,
    tx: Option<EventSender>,
}

impl RatchetCtxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn adapters(mut self, adapters: AdapterRegistry) -> Self {
        self.adapters = adapters;
        self
    }

    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// # Errors
    ///
    /// Returns an error if no store was supplied.
    pub fn build(self) -> Result<RatchetCtx, Error> {
        let store = self
            .store
            .ok_or_else(|| Error::internal("RatchetCtxBuilder requires a store"))?;
        Ok(RatchetCtx {
            store,
            adapters: self.adapters,
            config: self.config,
            tx: self.tx,
        })
    }
}
