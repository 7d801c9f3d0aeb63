//! Lookup errors

/// Errors raised by a [`crate::LookupClient`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// A required credential is not configured
    #[error("{0} env variable is required, export it or add it to the .env file")]
    MissingCredential(&'static str),

    /// The dotenv file exists but is unreadable or malformed
    #[error("failed to load {path}: {message}")]
    EnvFile {
        /// File path
        path: String,
        /// Loader message
        message: String,
    },

    /// The HTTP client could not be built
    #[error("failed to build http client: {0}")]
    Client(String),

    /// The configured endpoint does not form a valid vendor URL
    #[error("invalid vendor service url for {code}: {message}")]
    Endpoint {
        /// Vendor code being looked up
        code: String,
        /// Parser message
        message: String,
    },

    /// Transport failure: connect, timeout, reset
    #[error("unable to invoke vendor service for {code}: {message}")]
    Unavailable {
        /// Vendor code being looked up
        code: String,
        /// Transport message
        message: String,
    },

    /// Non-success status
    #[error("vendor service rejected {code} with status {status}: {body}")]
    Rejected {
        /// Vendor code being looked up
        code: String,
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Payload is not the expected JSON
    #[error("unable to decode vendor service response for {code}: {message}")]
    Decode {
        /// Vendor code being looked up
        code: String,
        /// Decoder message
        message: String,
    },
}

impl LookupError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::MissingCredential(_)
            | Self::EnvFile { .. }
            | Self::Client(_)
            | Self::Endpoint { .. }
            | Self::Decode { .. } => false,
        }
    }

    /// Short failure kind for logs and reports
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential(_) => "missing_credential",
            Self::EnvFile { .. } => "env_file",
            Self::Client(_) => "client",
            Self::Endpoint { .. } => "endpoint",
            Self::Unavailable { .. } => "unavailable",
            Self::Rejected { .. } => "rejected",
            Self::Decode { .. } => "decode",
        }
    }
}
