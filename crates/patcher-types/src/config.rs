//! Environment configuration
//!
//! Each [`Environment`] has a built-in [`EnvironmentConfig`]. An optional TOML
//! file can override any subset of it:
//!
//! ```toml
//! [store]
//! endpoint_url = "http://localhost:8000"
//!
//! [lookup]
//! timeout_secs = 30
//! ```

use crate::env::Environment;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Placeholder for the tenant country code in lookup templates
pub const COUNTRY_PLACEHOLDER: &str = "{country}";

/// Placeholder for the vendor code in lookup templates
pub const VENDOR_PLACEHOLDER: &str = "{vendor}";

/// Record store (DynamoDB) settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// AWS region
    pub region: String,
    /// Shared-config credentials profile
    pub profile: String,
    /// Ordering table name
    pub table_name: String,
    /// Endpoint override (DynamoDB Local, LocalStack)
    pub endpoint_url: Option<String>,
}

/// Vendor service settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    /// URL template containing `{country}` and `{vendor}`
    pub endpoint_template: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl LookupConfig {
    /// Render the endpoint for one country, up to the vendor path segment
    ///
    /// The vendor code is appended by the client as an escaped segment.
    #[must_use]
    pub fn endpoint_base(&self, country_code: &str) -> String {
        let template = self
            .endpoint_template
            .strip_suffix(VENDOR_PLACEHOLDER)
            .unwrap_or(&self.endpoint_template);
        template.replace(COUNTRY_PLACEHOLDER, country_code)
    }
}

/// Complete per-deployment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// Environment these settings belong to
    pub environment: Environment,
    /// Record store settings
    pub store: StoreConfig,
    /// Vendor service settings
    pub lookup: LookupConfig,
}

impl EnvironmentConfig {
    /// Built-in settings for an environment
    #[must_use]
    pub fn for_env(environment: Environment) -> Self {
        match environment {
            Environment::Staging => Self {
                environment,
                store: StoreConfig {
                    region: "eu-central-1".to_string(),
                    profile: "pd-staging".to_string(),
                    table_name: "asia-staging-table-ordering".to_string(),
                    endpoint_url: None,
                },
                lookup: LookupConfig {
                    endpoint_template:
                        "https://{country}-st.fd-api.com/api/v1/vendor-service/vendors/{vendor}"
                            .to_string(),
                    timeout_secs: 10,
                },
            },
            Environment::Prod => Self {
                environment,
                store: StoreConfig {
                    region: "ap-southeast-1".to_string(),
                    profile: "pd-production".to_string(),
                    table_name: "asia-prod-table-ordering".to_string(),
                    endpoint_url: None,
                },
                lookup: LookupConfig {
                    endpoint_template:
                        "https://{country}.fd-api.com/api/v1/vendor-service/vendors/{vendor}"
                            .to_string(),
                    timeout_secs: 10,
                },
            },
        }
    }

    /// Built-in settings, optionally overridden by a TOML file, then validated
    ///
    /// # Errors
    /// - `ConfigError::Read` / `ConfigError::Parse` for a bad override file
    /// - `ConfigError::Invalid` if the merged result fails [`Self::validate`]
    pub fn load(environment: Environment, overrides: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::for_env(environment);

        if let Some(path) = overrides {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            config = config.with_overrides(raw.parse()?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides field by field
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        let ConfigOverrides { store, lookup } = overrides;

        if let Some(region) = store.region {
            self.store.region = region;
        }
        if let Some(profile) = store.profile {
            self.store.profile = profile;
        }
        if let Some(table_name) = store.table_name {
            self.store.table_name = table_name;
        }
        if store.endpoint_url.is_some() {
            self.store.endpoint_url = store.endpoint_url;
        }
        if let Some(template) = lookup.endpoint_template {
            self.lookup.endpoint_template = template;
        }
        if let Some(timeout_secs) = lookup.timeout_secs {
            self.lookup.timeout_secs = timeout_secs;
        }
        self
    }

    /// Check the merged settings
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.region.trim().is_empty() {
            return Err(ConfigError::invalid("store.region", "must not be empty"));
        }
        if self.store.table_name.trim().is_empty() {
            return Err(ConfigError::invalid("store.table_name", "must not be empty"));
        }
        for placeholder in [COUNTRY_PLACEHOLDER, VENDOR_PLACEHOLDER] {
            if !self.lookup.endpoint_template.contains(placeholder) {
                return Err(ConfigError::invalid(
                    "lookup.endpoint_template",
                    format!("missing {placeholder} placeholder"),
                ));
            }
        }
        if !self.lookup.endpoint_template.ends_with(&format!("/{VENDOR_PLACEHOLDER}")) {
            return Err(ConfigError::invalid(
                "lookup.endpoint_template",
                format!("{VENDOR_PLACEHOLDER} must be the last path segment"),
            ));
        }
        if self.lookup.timeout_secs == 0 {
            return Err(ConfigError::invalid("lookup.timeout_secs", "must be positive"));
        }
        Ok(())
    }
}

/// Partial configuration read from an override file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    /// `[store]` table
    #[serde(default)]
    pub store: StoreOverrides,
    /// `[lookup]` table
    #[serde(default)]
    pub lookup: LookupOverrides,
}

/// Overrides for [`StoreConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreOverrides {
    /// AWS region
    pub region: Option<String>,
    /// Credentials profile
    pub profile: Option<String>,
    /// Table name
    pub table_name: Option<String>,
    /// Endpoint override
    pub endpoint_url: Option<String>,
}

/// Overrides for [`LookupConfig`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupOverrides {
    /// URL template
    pub endpoint_template: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl FromStr for ConfigOverrides {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}
