//! Ordered registry of binder strategies.

use std::sync::Arc;

use tracing::debug;

use crate::strategies::{
    BucketBinderStrategy, DatabaseBinderStrategy, QueueBinderStrategy, TableBinderStrategy,
};
use crate::strategy::BinderStrategy;

/// Strategies in registration order.
///
/// Lookup is a linear scan returning the first strategy whose
/// `can_handle` matches, so registration order decides between overlapping
/// strategies.
#[derive(Default)]
pub struct BinderRegistry {
    strategies: Vec<Arc<dyn BinderStrategy>>,
}

impl BinderRegistry {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// A registry holding the queue, database, bucket and table strategies.
    pub fn with_builtin_strategies() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(QueueBinderStrategy::new()));
        registry.register(Arc::new(DatabaseBinderStrategy::new()));
        registry.register(Arc::new(BucketBinderStrategy::new()));
        registry.register(Arc::new(TableBinderStrategy::new()));
        registry
    }

    pub fn register(&mut self, strategy: Arc<dyn BinderStrategy>) {
        debug!(
            "Registering binder strategy '{}' for {}",
            strategy.name(),
            strategy.capability()
        );
        self.strategies.push(strategy);
    }

    /// First strategy able to bind `source_type` to `capability`.
    pub fn find(&self, source_type: &str, capability: &str) -> Option<Arc<dyn BinderStrategy>> {
        self.strategies
            .iter()
            .find(|s| s.can_handle(source_type, capability))
            .cloned()
    }

    /// Every `(source type, capability)` pair, in registration order.
    pub fn registered_pairs(&self) -> Vec<(String, String)> {
        self.strategies
            .iter()
            .flat_map(|s| s.supported_pairs())
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl std::fmt::Debug for BinderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinderRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}
