//! Per-record patch outcomes

use patcher_lookup::LookupError;
use patcher_store::StoreError;
use std::fmt;

/// Result of one patch attempt on one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchOutcome {
    /// Attribute written
    Updated,
    /// Attribute was already set, locally or by a concurrent writer
    AlreadyRepaired,
    /// Lookup service has no value
    NoData,
    /// Record abandoned
    Failed(FailureKind),
    /// Skipped because the run was cancelled
    NotAttempted,
}

impl PatchOutcome {
    /// Report column name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Updated => "updated",
            Self::AlreadyRepaired => "already_repaired",
            Self::NoData => "no_data",
            Self::Failed(_) => "failed",
            Self::NotAttempted => "not_attempted",
        }
    }
}

/// Why a record was abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// Lookup transport failure
    LookupUnavailable,
    /// Lookup returned a non-success status
    LookupRejected,
    /// Lookup or store payload could not be decoded
    Decode,
    /// Store rejected the write
    Write,
    /// Store accepted the write but returned nothing
    EmptyWrite,
    /// The patch task panicked
    Panicked,
}

impl FailureKind {
    /// Snake-case name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LookupUnavailable => "lookup_unavailable",
            Self::LookupRejected => "lookup_rejected",
            Self::Decode => "decode",
            Self::Write => "write",
            Self::EmptyWrite => "empty_write",
            Self::Panicked => "panicked",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&LookupError> for FailureKind {
    fn from(err: &LookupError) -> Self {
        match err {
            LookupError::Rejected { .. } | LookupError::Endpoint { .. } => Self::LookupRejected,
            LookupError::Decode { .. } => Self::Decode,
            LookupError::Unavailable { .. }
            | LookupError::Client(_)
            | LookupError::EnvFile { .. }
            | LookupError::MissingCredential(_) => Self::LookupUnavailable,
        }
    }
}

impl From<&StoreError> for FailureKind {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::EmptyResult { .. } => Self::EmptyWrite,
            StoreError::Decode(_) => Self::Decode,
            StoreError::Query { .. } | StoreError::Write { .. } | StoreError::ConditionFailed { .. } => {
                Self::Write
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_errors_map_to_kinds() {
        let rejected = LookupError::Rejected {
            code: "v".to_string(),
            status: 404,
            body: String::new(),
        };
        assert_eq!(FailureKind::from(&rejected), FailureKind::LookupRejected);

        let decode = LookupError::Decode {
            code: "v".to_string(),
            message: "eof".to_string(),
        };
        assert_eq!(FailureKind::from(&decode), FailureKind::Decode);
    }

    #[test]
    fn empty_store_result_is_empty_write() {
        let err = StoreError::EmptyResult { key: "k".to_string() };
        assert_eq!(FailureKind::from(&err), FailureKind::EmptyWrite);
        assert_eq!(FailureKind::EmptyWrite.to_string(), "empty_write");
    }
}
