//! Dispatch of adapters by ecosystem kind

use crate::PackageAdapter;
use ratchet_errors::{AdapterError, Error};
use ratchet_types::EcosystemKind;
use std::collections::HashMap;
use std::sync::Arc;

/// Looks up the registered adapter for a project's ecosystem kind.
///
/// No inheritance is involved — dispatch is a plain map lookup keyed by
/// ecosystem.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<EcosystemKind, Arc<dyn PackageAdapter>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn PackageAdapter>) {
        self.adapters.insert(adapter.ecosystem(), adapter);
    }

    /// Look up the adapter for `ecosystem`.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotRegistered` if no adapter was registered
    /// for this ecosystem kind.
    pub fn get(&self, ecosystem: EcosystemKind) -> Result<Arc<dyn PackageAdapter>, Error> {
        self.adapters
            .get(&ecosystem)
            .cloned()
            .ok_or_else(|| {
                AdapterError::NotRegistered {
                    ecosystem: ecosystem.to_string(),
                }
                .into()
            })
    }

    /// Look up the adapter and confirm it reports itself available.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::NotRegistered` or `AdapterError::Unavailable`.
    pub async fn get_available(&self, ecosystem: EcosystemKind) -> Result<Arc<dyn PackageAdapter>, Error> {
        let adapter = self.get(ecosystem)?;
        if !adapter.is_available().await {
            return Err(AdapterError::Unavailable {
                ecosystem: ecosystem.to_string(),
                reason: "toolchain not detected on host".to_string(),
            }
            .into());
        }
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockAdapter;

    #[tokio::test]
    async fn unregistered_ecosystem_errors() {
        let registry = AdapterRegistry::new();
        let err = registry.get(EcosystemKind::Npm);
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn registered_adapter_is_returned() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(MockAdapter::new(EcosystemKind::Npm)));
        assert!(registry.get_available(EcosystemKind::Npm).await.is_ok());
    }
}
