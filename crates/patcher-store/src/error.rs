//! Store gateway errors

/// Errors raised by a [`crate::RecordStore`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A page request failed
    #[error("fail to query {partition_key}: {message}")]
    Query {
        /// Partition that was being scanned
        partition_key: String,
        /// Transport or service message
        message: String,
        /// Whether a later attempt could succeed
        retryable: bool,
    },

    /// A raw item could not be mapped onto a record
    #[error("failed to decode item: {0}")]
    Decode(String),

    /// An update was rejected by transport or permissions
    #[error("failed to update {key}: {message}")]
    Write {
        /// Sort key of the targeted record
        key: String,
        /// Transport or service message
        message: String,
        /// Whether a later attempt could succeed
        retryable: bool,
    },

    /// The record is missing or its attribute is already set
    #[error("update condition failed for {key}")]
    ConditionFailed {
        /// Sort key of the targeted record
        key: String,
    },

    /// The store acknowledged the update but returned no attributes
    #[error("update of {key} returned no attributes")]
    EmptyResult {
        /// Sort key of the targeted record
        key: String,
    },
}

impl StoreError {
    /// Check if error is retryable
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Query { retryable, .. } | Self::Write { retryable, .. } => *retryable,
            Self::Decode(_) | Self::ConditionFailed { .. } | Self::EmptyResult { .. } => false,
        }
    }
}
