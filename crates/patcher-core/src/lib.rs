//! Patch Pipeline Core
//!
//! Repairs missing vendor attributes for one or more tenants:
//! - [`PatchStrategy`]: what attribute to repair and how
//! - [`StrategyRegistry`]: target name to strategy, resolved once per run
//! - [`PatchOrchestrator`]: enumerate, dispatch under a concurrency budget, join, report
//! - [`CancelToken`]: run-level cancellation
//!
//! # Example
//!
//! ```rust,ignore
//! use patcher_core::{PatchConfig, PatchOrchestrator, StrategyRegistry};
//!
//! let registry = StrategyRegistry::with_defaults(lookup);
//! let orchestrator = PatchOrchestrator::new(store, registry, PatchConfig::new().with_concurrency(8));
//! let report = orchestrator.run("local_legal_name", &tenants).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cancel;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod outcome;
pub mod registry;
pub mod report;
pub mod strategies;
pub mod strategy;

pub use cancel::CancelToken;
pub use config::{ConcurrencyBudget, PatchConfig};
pub use error::{PatchError, ReadinessError};
pub use orchestrator::{PatchOrchestrator, RunId};
pub use outcome::{FailureKind, PatchOutcome};
pub use registry::StrategyRegistry;
pub use report::{RunReport, TenantFailure, TenantReport};
pub use strategies::{LocalLegalNamePatch, LOCAL_LEGAL_NAME};
pub use strategy::{PatchContext, PatchStrategy};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
