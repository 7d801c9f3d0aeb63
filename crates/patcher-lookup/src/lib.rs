//! Lookup Service Client
//!
//! Reads authoritative vendor attributes from the vendor service.
//! - [`LookupClient`]: the seam used by patch strategies
//! - [`VendorServiceClient`]: HTTP implementation over reqwest
//! - [`Credentials`]: service token and operator identity, read from the environment
//!   or a `.env` file
//!
//! # Example
//!
//! ```rust,ignore
//! use patcher_lookup::{Credentials, LookupClient, VendorServiceClient};
//!
//! let client = VendorServiceClient::new(&config.lookup, Credentials::from_env())?;
//! client.validate_readiness()?;
//! let legal_name = client.lookup(&tenant, "v1ab").await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
pub mod credentials;
pub mod error;

pub use client::{LookupClient, VendorServiceClient};
pub use credentials::{Credentials, DOTENV_FILE, OPERATOR_EMAIL_VAR, SERVICE_TOKEN_VAR};
pub use error::LookupError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
