//! Patch orchestrator
//!
//! Per tenant: enumerate every record, then fan the records out across a
//! semaphore-gated [`JoinSet`]. A permit is acquired before each spawn and
//! moved into the task, so capacity is released on every exit path. The
//! join barrier waits for every admitted task before the tenant report is
//! taken.

use crate::cancel::CancelToken;
use crate::config::PatchConfig;
use crate::error::PatchError;
use crate::outcome::{FailureKind, PatchOutcome};
use crate::registry::StrategyRegistry;
use crate::report::{RunReport, Tally, TenantFailure, TenantReport};
use crate::strategy::{PatchContext, PatchStrategy};
use patcher_store::RecordStore;
use patcher_types::{Record, Tenant};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;
use ulid::Ulid;

/// Unique run identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(pub Ulid);

impl RunId {
    /// Generate new run ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Drives a patch target across tenants
pub struct PatchOrchestrator {
    store: Arc<dyn RecordStore>,
    registry: StrategyRegistry,
    config: PatchConfig,
    cancel: CancelToken,
}

impl fmt::Debug for PatchOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchOrchestrator")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl PatchOrchestrator {
    /// Create orchestrator with its own cancellation token
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, registry: StrategyRegistry, config: PatchConfig) -> Self {
        Self {
            store,
            registry,
            config,
            cancel: CancelToken::new(),
        }
    }

    /// With an externally owned cancellation token
    #[inline]
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that cancels this orchestrator's runs
    #[inline]
    #[must_use]
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Resolve `target` and validate its readiness
    ///
    /// # Errors
    /// - `PatchError::UnknownTarget` if no strategy is registered under `target`
    /// - `PatchError::NotReady` if the strategy's collaborators are not configured
    pub fn prepare(&self, target: &str) -> Result<Arc<dyn PatchStrategy>, PatchError> {
        let strategy = self.registry.resolve(target)?;
        strategy
            .validate_readiness()
            .map_err(|source| PatchError::NotReady {
                target: target.to_string(),
                source,
            })?;
        Ok(strategy)
    }

    /// Patch every tenant in order
    ///
    /// A tenant whose enumeration fails is recorded in the report and the
    /// run moves on. After cancellation the remaining tenants are skipped.
    ///
    /// # Errors
    /// Only run-fatal errors: unknown target or failed readiness
    pub async fn run(&self, target: &str, tenants: &[Tenant]) -> Result<RunReport, PatchError> {
        let run_id = RunId::new();
        let span = tracing::info_span!("patch_run", run_id = %run_id, target = %target);

        async move {
            let strategy = self
                .prepare(target)
                .inspect_err(|e| tracing::error!(error = %e, "patch run aborted"))?;

            let mut report = RunReport {
                run_id: run_id.to_string(),
                target: target.to_string(),
                ..RunReport::default()
            };

            for (index, tenant) in tenants.iter().enumerate() {
                if self.cancel.is_cancelled() {
                    report
                        .skipped_tenants
                        .extend(tenants[index..].iter().map(|t| t.id().to_string()));
                    break;
                }

                match self.patch_tenant(&strategy, tenant).await {
                    Ok(tenant_report) => report.tenants.push(tenant_report),
                    Err(PatchError::Cancelled) => {
                        report.skipped_tenants.push(tenant.id().to_string());
                    }
                    Err(e) => {
                        tracing::error!(tenant = %tenant, error = %e, "tenant patch failed");
                        report.failed_tenants.push(TenantFailure {
                            tenant: tenant.id().to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }

            report.cancelled = self.cancel.is_cancelled();
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Patch a single tenant
    ///
    /// # Errors
    /// - `PatchError::UnknownTarget` / `PatchError::NotReady` from [`Self::prepare`]
    /// - `PatchError::Enumeration` if the record scan fails
    /// - `PatchError::Cancelled` if cancelled before enumeration finished
    pub async fn run_tenant(&self, target: &str, tenant: &Tenant) -> Result<TenantReport, PatchError> {
        let strategy = self.prepare(target)?;
        self.patch_tenant(&strategy, tenant).await
    }

    async fn patch_tenant(
        &self,
        strategy: &Arc<dyn PatchStrategy>,
        tenant: &Tenant,
    ) -> Result<TenantReport, PatchError> {
        let span = tracing::info_span!("patch_tenant", tenant = %tenant);

        async move {
            let records = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Err(PatchError::Cancelled),
                scanned = self.store.scan_all(tenant) => {
                    scanned.map_err(|source| PatchError::Enumeration {
                        tenant: tenant.id().to_string(),
                        source,
                    })?
                }
            };
            tracing::info!(vendors = records.len(), "enumerated vendors");

            let report = self.dispatch(strategy, tenant, records).await;
            tracing::info!(
                updated = report.updated,
                already_repaired = report.already_repaired,
                no_data = report.no_data,
                failed = report.failed_total(),
                not_attempted = report.not_attempted,
                "completed patching {} vendors in {}",
                report.total,
                tenant
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        strategy: &Arc<dyn PatchStrategy>,
        tenant: &Tenant,
        records: Vec<Record>,
    ) -> TenantReport {
        let total = records.len();
        let tally = Arc::new(Tally::new(tenant.id(), total));
        let permits = self.config.budget.permits(total).min(Semaphore::MAX_PERMITS);
        let gate = Arc::new(Semaphore::new(permits));
        let ctx = Arc::new(PatchContext::new(
            tenant.clone(),
            self.store.clone(),
            self.cancel.clone(),
        ));

        let mut tasks = JoinSet::new();
        let mut in_flight = HashMap::new();
        let mut pending = records.into_iter();

        for record in pending.by_ref() {
            let permit = tokio::select! {
                biased;
                () = self.cancel.cancelled() => None,
                permit = gate.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                tally.record(PatchOutcome::NotAttempted);
                break;
            };

            let code = record.code.clone();
            let strategy = strategy.clone();
            let ctx = ctx.clone();
            let tally = tally.clone();
            let handle = tasks.spawn(
                async move {
                    let _permit = permit;
                    let outcome = if ctx.cancel.is_cancelled() {
                        PatchOutcome::NotAttempted
                    } else {
                        strategy.apply(&ctx, &record).await
                    };
                    tally.record(outcome);
                }
                .in_current_span(),
            );
            in_flight.insert(handle.id(), code);
        }
        tally.record_n(PatchOutcome::NotAttempted, pending.len());

        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, ())) => {
                    in_flight.remove(&id);
                }
                Err(e) => {
                    let code = in_flight.remove(&e.id()).unwrap_or_default();
                    tracing::error!(vendor_code = %code, error = %e, "patch task did not complete");
                    tally.abandon(code);
                }
            }
        }

        tally.snapshot()
    }
}
