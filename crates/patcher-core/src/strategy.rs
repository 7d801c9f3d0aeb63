//! Patch strategy trait
//!
//! A strategy owns its lookup collaborators and receives the per-tenant
//! write path through [`PatchContext`]. Construction is pure; anything that
//! depends on the process environment is checked by
//! [`PatchStrategy::validate_readiness`].

use crate::cancel::CancelToken;
use crate::error::ReadinessError;
use crate::outcome::PatchOutcome;
use async_trait::async_trait;
use patcher_store::RecordStore;
use patcher_types::{Record, Tenant};
use std::fmt;
use std::sync::Arc;

/// Everything a strategy may touch while patching one tenant
#[derive(Clone)]
pub struct PatchContext {
    /// Tenant being patched
    pub tenant: Tenant,
    /// Store write path
    pub store: Arc<dyn RecordStore>,
    /// Run cancellation
    pub cancel: CancelToken,
}

impl PatchContext {
    /// Create context
    #[inline]
    #[must_use]
    pub fn new(tenant: Tenant, store: Arc<dyn RecordStore>, cancel: CancelToken) -> Self {
        Self {
            tenant,
            store,
            cancel,
        }
    }
}

impl fmt::Debug for PatchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchContext")
            .field("tenant", &self.tenant)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Repairs one attribute of a record
#[async_trait]
pub trait PatchStrategy: Send + Sync {
    /// Target name this strategy is registered under
    fn name(&self) -> &'static str;

    /// Check collaborators are configured
    ///
    /// # Errors
    /// `ReadinessError` describing the first missing piece
    fn validate_readiness(&self) -> Result<(), ReadinessError>;

    /// Patch one record
    ///
    /// Never fails: lookup and write errors are logged and reported as
    /// [`PatchOutcome::Failed`]. Must be idempotent.
    async fn apply(&self, ctx: &PatchContext, record: &Record) -> PatchOutcome;
}
