//! Orchestrator configuration

use std::num::NonZeroUsize;

/// Maximum number of records patched at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyBudget {
    /// At most this many in flight
    Bounded(NonZeroUsize),
    /// One task per record
    Unbounded,
}

impl ConcurrencyBudget {
    /// Sequential processing
    pub const SEQUENTIAL: Self = Self::Bounded(NonZeroUsize::MIN);

    /// Budget from a CLI count; zero means unbounded
    #[must_use]
    pub fn from_count(count: usize) -> Self {
        NonZeroUsize::new(count).map_or(Self::Unbounded, Self::Bounded)
    }

    /// Semaphore permits needed to patch `records` records
    #[must_use]
    pub fn permits(self, records: usize) -> usize {
        match self {
            Self::Bounded(limit) => limit.get(),
            Self::Unbounded => records.max(1),
        }
    }
}

impl Default for ConcurrencyBudget {
    fn default() -> Self {
        Self::SEQUENTIAL
    }
}

/// Patch orchestrator configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchConfig {
    /// Concurrency budget per tenant
    pub budget: ConcurrencyBudget,
}

impl PatchConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With budget
    #[inline]
    #[must_use]
    pub fn with_budget(mut self, budget: ConcurrencyBudget) -> Self {
        self.budget = budget;
        self
    }

    /// With budget from a count; zero means unbounded
    #[inline]
    #[must_use]
    pub fn with_concurrency(self, count: usize) -> Self {
        self.with_budget(ConcurrencyBudget::from_count(count))
    }
}
