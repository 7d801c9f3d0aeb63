//! Error types for tenant resolution and configuration loading

use std::path::PathBuf;

/// Tenant resolution errors
#[derive(Debug, thiserror::Error)]
pub enum TenantError {
    /// Identifier is not in the global entity catalog
    #[error("invalid global entity id: {0}")]
    Unknown(String),

    /// No tenant was selected
    #[error("no global entity selected")]
    Empty,
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment name is neither `staging` nor `prod`
    #[error("invalid env: {0} (expected staging or prod)")]
    UnknownEnvironment(String),

    /// Override file could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Override file is not valid TOML for [`crate::ConfigOverrides`]
    #[error("failed to parse config overrides: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field failed validation after overrides were applied
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Dotted field name, e.g. `lookup.endpoint_template`
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
