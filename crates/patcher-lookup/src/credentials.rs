//! Vendor service credentials

use crate::error::LookupError;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Dotenv file read from the working directory at startup
pub const DOTENV_FILE: &str = ".env";

/// Environment variable holding the service-to-service token
pub const SERVICE_TOKEN_VAR: &str = "VENDOR_SERVICE_TOKEN";

/// Environment variable holding the operator email
pub const OPERATOR_EMAIL_VAR: &str = "EMAIL";

/// Service token plus the identity of the operator running the patch
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    service_token: String,
    operator_email: String,
}

impl Credentials {
    /// Create from explicit values
    #[inline]
    #[must_use]
    pub fn new(service_token: impl Into<String>, operator_email: impl Into<String>) -> Self {
        Self {
            service_token: service_token.into(),
            operator_email: operator_email.into(),
        }
    }

    /// Read from process environment; absent variables become empty
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read from process environment, falling back to a dotenv file
    ///
    /// Process variables win over file entries. A missing file is the same
    /// as an empty one.
    ///
    /// # Errors
    /// `LookupError::EnvFile` if the file exists but cannot be read or parsed
    pub fn from_env_file(path: &Path) -> Result<Self, LookupError> {
        Self::from_file_over(path, |name| std::env::var(name).ok())
    }

    fn from_file_over<F>(path: &Path, process: F) -> Result<Self, LookupError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = read_dotenv(path)?;
        Ok(Self::from_vars(|name| {
            process(name)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file.get(name).cloned())
        }))
    }

    /// Read through an arbitrary variable source
    #[must_use]
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name| lookup(name).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            service_token: read(SERVICE_TOKEN_VAR),
            operator_email: read(OPERATOR_EMAIL_VAR),
        }
    }

    /// Token sent as `Authorization: Bearer`
    #[inline]
    #[must_use]
    pub fn service_token(&self) -> &str {
        &self.service_token
    }

    /// Email sent as `X-Pandora-Username`
    #[inline]
    #[must_use]
    pub fn operator_email(&self) -> &str {
        &self.operator_email
    }

    /// Both values must be present
    ///
    /// # Errors
    /// `LookupError::MissingCredential` naming the first missing variable
    pub fn validate(&self) -> Result<(), LookupError> {
        if self.service_token.is_empty() {
            return Err(LookupError::MissingCredential(SERVICE_TOKEN_VAR));
        }
        if self.operator_email.is_empty() {
            return Err(LookupError::MissingCredential(OPERATOR_EMAIL_VAR));
        }
        Ok(())
    }
}

fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, LookupError> {
    let env_file_error = |e: dotenvy::Error| LookupError::EnvFile {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(env_file_error(e)),
    };
    entries
        .map(|entry| entry.map_err(env_file_error))
        .collect()
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("service_token", &if self.service_token.is_empty() { "" } else { "***" })
            .field("operator_email", &self.operator_email)
            .finish()
    }
}
