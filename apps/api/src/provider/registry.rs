//! Runtime-switchable active provider.
//!
//! Callers clone the active adapter at call start, so a switch is atomic from
//! their perspective: in-flight calls keep the adapter they started with,
//! only subsequent calls see the replacement.

use tokio::sync::RwLock;
use tracing::info;

use crate::errors::AppError;
use crate::provider::ProviderAdapter;

pub struct ProviderRegistry {
    active: RwLock<Option<ProviderAdapter>>,
}

impl ProviderRegistry {
    pub fn new(initial: Option<ProviderAdapter>) -> Self {
        Self {
            active: RwLock::new(initial),
        }
    }

    /// Snapshot of the active adapter for the duration of one logical call.
    pub async fn current(&self) -> Result<ProviderAdapter, AppError> {
        self.active.read().await.clone().ok_or_else(|| {
            AppError::ProviderUnavailable(
                "No AI provider is configured. Set AI_PROVIDER and the matching API key."
                    .to_string(),
            )
        })
    }

    pub async fn switch(&self, adapter: ProviderAdapter) {
        info!(
            "Switching active AI provider to {} (model: {})",
            adapter.name(),
            adapter.model()
        );
        *self.active.write().await = Some(adapter);
    }

    /// (provider, model) of the active adapter, if one is configured.
    pub async fn descriptor(&self) -> Option<(String, String)> {
        self.active
            .read()
            .await
            .as_ref()
            .map(|a| (a.name().to_string(), a.model()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_registry_reports_unavailable() {
        let registry = ProviderRegistry::new(None);
        assert!(matches!(
            registry.current().await,
            Err(AppError::ProviderUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_switch_does_not_disturb_snapshots() {
        let registry = ProviderRegistry::new(Some(ProviderAdapter::new(Arc::new(MockBackend))));

        // A caller snapshots the adapter before the switch...
        let in_flight = registry.current().await.unwrap();
        assert_eq!(in_flight.name(), "mock");

        registry
            .switch(ProviderAdapter::new(Arc::new(MockBackend)))
            .await;

        // ...and keeps using it unchanged afterwards.
        assert_eq!(in_flight.name(), "mock");
        assert_eq!(registry.current().await.unwrap().name(), "mock");
    }

    #[tokio::test]
    async fn test_descriptor_reflects_active() {
        let registry = ProviderRegistry::new(Some(ProviderAdapter::new(Arc::new(MockBackend))));
        let (name, model) = registry.descriptor().await.unwrap();
        assert_eq!(name, "mock");
        assert_eq!(model, "mock-v1");
    }
}
