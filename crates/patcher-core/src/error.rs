//! Error types for the patch pipeline
//!
//! Only run-level and tenant-level failures are errors. Per-record failures
//! are [`crate::PatchOutcome`]s and never reach these types.

use patcher_lookup::LookupError;
use patcher_store::StoreError;

/// Fatal pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// No strategy registered under the target name
    #[error("unsupported target: {target} (known: {})", known.join(", "))]
    UnknownTarget {
        /// Requested target
        target: String,
        /// Registered targets
        known: Vec<String>,
    },

    /// Strategy collaborators are not configured
    #[error("environment for target {target} is not ready: {source}")]
    NotReady {
        /// Target being validated
        target: String,
        /// Readiness failure
        #[source]
        source: ReadinessError,
    },

    /// Record enumeration failed; fatal for this tenant only
    #[error("failed to get vendor list for {tenant}: {source}")]
    Enumeration {
        /// Tenant being enumerated
        tenant: String,
        /// Store failure
        #[source]
        source: StoreError,
    },

    /// Cancelled before completion
    #[error("operation cancelled")]
    Cancelled,
}

impl PatchError {
    /// Check if error aborts the whole run
    #[inline]
    #[must_use]
    pub fn is_run_fatal(&self) -> bool {
        matches!(self, Self::UnknownTarget { .. } | Self::NotReady { .. })
    }

    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Enumeration { source, .. } => source.is_retryable(),
            Self::UnknownTarget { .. } | Self::NotReady { .. } | Self::Cancelled => false,
        }
    }
}

/// Strategy readiness failures
#[derive(Debug, thiserror::Error)]
pub enum ReadinessError {
    /// Lookup client is missing configuration
    #[error(transparent)]
    Lookup(#[from] LookupError),
}
