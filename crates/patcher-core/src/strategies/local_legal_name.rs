//! Local legal name repair
//!
//! `local_legal_name` is sourced from the vendor service's
//! `account_name_localized`.

use crate::error::ReadinessError;
use crate::outcome::{FailureKind, PatchOutcome};
use crate::strategy::{PatchContext, PatchStrategy};
use async_trait::async_trait;
use patcher_lookup::LookupClient;
use patcher_store::StoreError;
use patcher_types::{Record, RecordAttribute};
use std::fmt;
use std::sync::Arc;

/// Target name of [`LocalLegalNamePatch`]
pub const LOCAL_LEGAL_NAME: &str = "local_legal_name";

const ATTRIBUTE: RecordAttribute = RecordAttribute::LocalLegalName;

/// Fills empty `local_legal_name` attributes from the vendor service
#[derive(Clone)]
pub struct LocalLegalNamePatch {
    lookup: Arc<dyn LookupClient>,
}

impl LocalLegalNamePatch {
    /// Create strategy
    #[inline]
    #[must_use]
    pub fn new(lookup: Arc<dyn LookupClient>) -> Self {
        Self { lookup }
    }
}

impl fmt::Debug for LocalLegalNamePatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalLegalNamePatch").finish_non_exhaustive()
    }
}

#[async_trait]
impl PatchStrategy for LocalLegalNamePatch {
    fn name(&self) -> &'static str {
        LOCAL_LEGAL_NAME
    }

    fn validate_readiness(&self) -> Result<(), ReadinessError> {
        self.lookup.validate_readiness().map_err(ReadinessError::from)
    }

    async fn apply(&self, ctx: &PatchContext, record: &Record) -> PatchOutcome {
        if record.is_repaired(ATTRIBUTE) {
            tracing::info!(vendor_code = %record.code, "local legal name already set, skipping");
            return PatchOutcome::AlreadyRepaired;
        }

        let value = match self.lookup.lookup(&ctx.tenant, &record.code).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                tracing::info!(vendor_code = %record.code, "vendor does not have local legal name");
                return PatchOutcome::NoData;
            }
            Err(e) => {
                let kind = FailureKind::from(&e);
                tracing::warn!(
                    vendor_code = %record.code,
                    kind = %kind,
                    error = %e,
                    "failed to get vendor local legal name"
                );
                return PatchOutcome::Failed(kind);
            }
        };

        if ctx.cancel.is_cancelled() {
            return PatchOutcome::NotAttempted;
        }

        match ctx
            .store
            .conditional_update(&ctx.tenant, &record.code, ATTRIBUTE, &value)
            .await
        {
            Ok(_) => {
                tracing::info!(
                    vendor_code = %record.code,
                    name = %record.name,
                    local_legal_name = %value,
                    "patched local legal name"
                );
                PatchOutcome::Updated
            }
            Err(StoreError::ConditionFailed { .. }) => {
                tracing::info!(
                    vendor_code = %record.code,
                    "local legal name set concurrently, skipping"
                );
                PatchOutcome::AlreadyRepaired
            }
            Err(e) => {
                let kind = FailureKind::from(&e);
                tracing::warn!(
                    vendor_code = %record.code,
                    kind = %kind,
                    error = %e,
                    "failed to update local legal name"
                );
                PatchOutcome::Failed(kind)
            }
        }
    }
}
