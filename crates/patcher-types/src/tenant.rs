//! Global entities (tenants)
//!
//! A [`Tenant`] is only constructed from an identifier present in the
//! catalog below, so every downstream request path and table key is built
//! from a known country code.

use crate::error::TenantError;
use std::fmt;
use std::str::FromStr;

/// Global entities the dine-in service is deployed to, with their country codes
const CATALOG: &[(&str, &str)] = &[
    ("FP_BD", "bd"),
    ("FP_HK", "hk"),
    ("FP_MY", "my"),
    ("FP_PH", "ph"),
    ("FP_PK", "pk"),
    ("FP_SG", "sg"),
    ("FP_TH", "th"),
    ("FP_TW", "tw"),
];

/// A logical customer/region partition of the ordering table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tenant {
    id: String,
    country_code: String,
}

impl Tenant {
    /// Resolve a global entity id against the catalog
    ///
    /// # Errors
    /// - `TenantError::Unknown` if the id is not a deployed global entity
    pub fn new(id: &str) -> Result<Self, TenantError> {
        let id = id.trim();
        CATALOG
            .iter()
            .find(|(known, _)| *known == id)
            .map(|(known, country)| Self::with_country(*known, *country))
            .ok_or_else(|| TenantError::Unknown(id.to_string()))
    }

    /// Build a tenant without consulting the catalog
    ///
    /// Used by fixtures and by callers that carry their own entity list.
    #[inline]
    #[must_use]
    pub fn with_country(id: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            country_code: country_code.into(),
        }
    }

    /// Every catalogued tenant, in catalog order
    #[must_use]
    pub fn all() -> Vec<Self> {
        CATALOG
            .iter()
            .map(|(id, country)| Self::with_country(*id, *country))
            .collect()
    }

    /// Resolve a list of ids, dropping blanks and duplicates but keeping order
    ///
    /// # Errors
    /// - `TenantError::Unknown` for the first id not in the catalog
    /// - `TenantError::Empty` if nothing remains after dropping blanks
    pub fn resolve_all<I, S>(ids: I) -> Result<Vec<Self>, TenantError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tenants: Vec<Self> = Vec::new();
        for id in ids {
            let id = id.as_ref().trim();
            if id.is_empty() {
                continue;
            }
            let tenant = Self::new(id)?;
            if !tenants.contains(&tenant) {
                tenants.push(tenant);
            }
        }

        if tenants.is_empty() {
            return Err(TenantError::Empty);
        }
        Ok(tenants)
    }

    /// Global entity id, e.g. `FP_SG`
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Country code used in vendor service hostnames, e.g. `sg`
    #[inline]
    #[must_use]
    pub fn country_code(&self) -> &str {
        &self.country_code
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl FromStr for Tenant {
    type Err = TenantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
