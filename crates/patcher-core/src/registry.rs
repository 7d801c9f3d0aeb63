//! Strategy registry
//!
//! Provides [`StrategyRegistry`] for mapping target names to patch strategies.

use crate::error::PatchError;
use crate::strategies::LocalLegalNamePatch;
use crate::strategy::PatchStrategy;
use patcher_lookup::LookupClient;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Target name to strategy
///
/// Resolving a name does not validate readiness.
#[derive(Default, Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn PatchStrategy>>,
}

impl StrategyRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Create registry with built-in strategies
    #[must_use]
    pub fn with_defaults(lookup: Arc<dyn LookupClient>) -> Self {
        let mut registry = Self::new();
        let local_legal_name = LocalLegalNamePatch::new(lookup);
        registry.register(local_legal_name.name(), Arc::new(local_legal_name));
        registry
    }

    /// Register a strategy; a later registration under the same name wins
    pub fn register(
        &mut self,
        name: &str,
        strategy: Arc<dyn PatchStrategy>,
    ) -> Option<Arc<dyn PatchStrategy>> {
        self.strategies.insert(name.to_string(), strategy)
    }

    /// Strategy registered under `name`
    ///
    /// # Errors
    /// `PatchError::UnknownTarget` if nothing is registered under `name`
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn PatchStrategy>, PatchError> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| PatchError::UnknownTarget {
                target: name.to_string(),
                known: self.names().into_iter().map(str::to_string).collect(),
            })
    }

    /// Check if strategy exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get number of registered strategies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("strategies", &self.names())
            .finish()
    }
}
