//! Patcher Types
//!
//! Shared vocabulary for the vendor patcher workspace:
//! - [`Tenant`]: a validated global entity and its country code
//! - [`Record`]: one vendor row as read from the ordering table
//! - [`Environment`] / [`EnvironmentConfig`]: per-deployment settings
//!
//! # Example
//!
//! ```rust
//! use patcher_types::{Environment, EnvironmentConfig, Tenant};
//!
//! let tenant = Tenant::new("FP_SG").unwrap();
//! assert_eq!(tenant.country_code(), "sg");
//!
//! let config = EnvironmentConfig::for_env(Environment::Staging);
//! assert_eq!(config.store.region, "eu-central-1");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod env;
pub mod error;
pub mod record;
pub mod tenant;

pub use config::{
    ConfigOverrides, EnvironmentConfig, LookupConfig, LookupOverrides, StoreConfig,
    StoreOverrides,
};
pub use env::Environment;
pub use error::{ConfigError, TenantError};
pub use record::{Record, RecordAttribute};
pub use tenant::Tenant;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
