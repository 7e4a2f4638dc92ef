//! Shared application state for the HTTP service.

use std::sync::Arc;

use specflow_core::{CloudInventory, DiscoveryService, SpecApplier, VersionControl};

/// Shared state accessible from all request handlers.
pub struct AppState<V, C> {
    pub applier: Arc<SpecApplier<V>>,
    pub discovery: Arc<DiscoveryService<C>>,
}

impl<V, C> Clone for AppState<V, C> {
    fn clone(&self) -> Self {
        Self {
            applier: Arc::clone(&self.applier),
            discovery: Arc::clone(&self.discovery),
        }
    }
}

impl<V: VersionControl, C: CloudInventory> AppState<V, C> {
    pub fn new(applier: SpecApplier<V>, discovery: DiscoveryService<C>) -> Self {
        Self {
            applier: Arc::new(applier),
            discovery: Arc::new(discovery),
        }
    }
}
