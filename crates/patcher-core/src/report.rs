//! Aggregate patch reporting

use crate::outcome::{FailureKind, PatchOutcome};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome counts for one tenant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenantReport {
    /// Tenant id
    pub tenant: String,
    /// Records enumerated
    pub total: usize,
    /// Records written
    pub updated: usize,
    /// Records already carrying a value
    pub already_repaired: usize,
    /// Records the lookup service had nothing for
    pub no_data: usize,
    /// Records abandoned, by failure kind
    pub failed: BTreeMap<FailureKind, usize>,
    /// Records skipped by cancellation
    pub not_attempted: usize,
    /// Vendor codes whose patch task died before reporting an outcome
    pub abandoned: Vec<String>,
}

impl TenantReport {
    /// Empty report for `tenant` with `total` enumerated records
    #[must_use]
    pub fn new(tenant: impl Into<String>, total: usize) -> Self {
        Self {
            tenant: tenant.into(),
            total,
            ..Self::default()
        }
    }

    /// Count one outcome
    pub fn record(&mut self, outcome: PatchOutcome) {
        self.record_n(outcome, 1);
    }

    /// Count `n` identical outcomes
    pub fn record_n(&mut self, outcome: PatchOutcome, n: usize) {
        match outcome {
            PatchOutcome::Updated => self.updated += n,
            PatchOutcome::AlreadyRepaired => self.already_repaired += n,
            PatchOutcome::NoData => self.no_data += n,
            PatchOutcome::Failed(kind) => *self.failed.entry(kind).or_insert(0) += n,
            PatchOutcome::NotAttempted => self.not_attempted += n,
        }
    }

    /// Abandoned records across all kinds
    #[must_use]
    pub fn failed_total(&self) -> usize {
        self.failed.values().sum()
    }

    /// Records that received a patch attempt
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.updated + self.already_repaired + self.no_data + self.failed_total()
    }

    fn absorb(&mut self, other: &Self) {
        self.total += other.total;
        self.updated += other.updated;
        self.already_repaired += other.already_repaired;
        self.no_data += other.no_data;
        self.not_attempted += other.not_attempted;
        for (kind, count) in &other.failed {
            *self.failed.entry(*kind).or_insert(0) += count;
        }
        self.abandoned.extend(other.abandoned.iter().cloned());
    }
}

/// Shared tally written by concurrent patch tasks
#[derive(Debug)]
pub(crate) struct Tally {
    report: Mutex<TenantReport>,
}

impl Tally {
    pub(crate) fn new(tenant: &str, total: usize) -> Self {
        Self {
            report: Mutex::new(TenantReport::new(tenant, total)),
        }
    }

    pub(crate) fn record(&self, outcome: PatchOutcome) {
        self.report.lock().record(outcome);
    }

    pub(crate) fn record_n(&self, outcome: PatchOutcome, n: usize) {
        if n > 0 {
            self.report.lock().record_n(outcome, n);
        }
    }

    /// Count a record whose task died, keeping its code
    pub(crate) fn abandon(&self, code: String) {
        let mut report = self.report.lock();
        report.record(PatchOutcome::Failed(FailureKind::Panicked));
        report.abandoned.push(code);
    }

    pub(crate) fn snapshot(&self) -> TenantReport {
        self.report.lock().clone()
    }
}

/// A tenant whose records could not be enumerated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantFailure {
    /// Tenant id
    pub tenant: String,
    /// Rendered cause
    pub error: String,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Run identifier
    pub run_id: String,
    /// Target patched
    pub target: String,
    /// Tenants patched, in run order
    pub tenants: Vec<TenantReport>,
    /// Tenants that failed enumeration
    pub failed_tenants: Vec<TenantFailure>,
    /// Tenants never started because the run was cancelled
    pub skipped_tenants: Vec<String>,
    /// Whether the run was cancelled
    pub cancelled: bool,
}

impl RunReport {
    /// Sum over all patched tenants
    #[must_use]
    pub fn totals(&self) -> TenantReport {
        let mut totals = TenantReport::new("total", 0);
        for tenant in &self.tenants {
            totals.absorb(tenant);
        }
        totals
    }

    /// Check if any tenant failed enumeration
    #[inline]
    #[must_use]
    pub fn has_tenant_failures(&self) -> bool {
        !self.failed_tenants.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run {} target {}", self.run_id, self.target)?;
        writeln!(
            f,
            "{:<10} {:>8} {:>8} {:>9} {:>8} {:>7} {:>14}",
            "tenant", "total", "updated", "repaired", "no_data", "failed", "not_attempted"
        )?;
        let totals = self.totals();
        for row in self.tenants.iter().chain(std::iter::once(&totals)) {
            writeln!(
                f,
                "{:<10} {:>8} {:>8} {:>9} {:>8} {:>7} {:>14}",
                row.tenant,
                row.total,
                row.updated,
                row.already_repaired,
                row.no_data,
                row.failed_total(),
                row.not_attempted
            )?;
        }
        if !totals.failed.is_empty() {
            let kinds: Vec<String> = totals
                .failed
                .iter()
                .map(|(kind, count)| format!("{kind}={count}"))
                .collect();
            writeln!(f, "failures: {}", kinds.join(", "))?;
        }
        for row in &self.tenants {
            for code in &row.abandoned {
                writeln!(f, "ABANDONED {} {code}", row.tenant)?;
            }
        }
        for failure in &self.failed_tenants {
            writeln!(f, "FAILED {}: {}", failure.tenant, failure.error)?;
        }
        for tenant in &self.skipped_tenants {
            writeln!(f, "SKIPPED {tenant}")?;
        }
        if self.cancelled {
            writeln!(f, "run cancelled")?;
        }
        Ok(())
    }
}
