//! Vendor records as stored in the ordering table

use std::fmt;

/// One vendor row scoped to a tenant
///
/// A read snapshot: changing a field here does not change the table. Writes
/// go through the store gateway's conditional update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    /// Vendor code, the sort-key suffix
    pub code: String,
    /// Display name
    pub name: String,
    /// Local legal name; empty until repaired
    pub local_legal_name: String,
}

impl Record {
    /// Create a record with no repaired attributes
    #[inline]
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            local_legal_name: String::new(),
        }
    }

    /// With local legal name
    #[inline]
    #[must_use]
    pub fn with_local_legal_name(mut self, value: impl Into<String>) -> Self {
        self.local_legal_name = value.into();
        self
    }

    /// Current value of a repairable attribute
    #[inline]
    #[must_use]
    pub fn attribute(&self, attribute: RecordAttribute) -> &str {
        match attribute {
            RecordAttribute::LocalLegalName => &self.local_legal_name,
        }
    }

    /// Repair is monotonic: a non-empty attribute is never written again
    #[inline]
    #[must_use]
    pub fn is_repaired(&self, attribute: RecordAttribute) -> bool {
        !self.attribute(attribute).is_empty()
    }
}

/// Attributes a patch strategy may repair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordAttribute {
    /// `local_legal_name`, sourced from `account_name_localized`
    LocalLegalName,
}

impl RecordAttribute {
    /// Attribute name in the table
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LocalLegalName => "local_legal_name",
        }
    }
}

impl fmt::Display for RecordAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
