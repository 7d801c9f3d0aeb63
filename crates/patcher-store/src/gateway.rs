//! Store gateway contract and cursor-following scan
//!
//! Backends only implement single-page reads ([`PageSource`]); the
//! [`scan_pages`] driver follows the continuation cursor until the store
//! signals the end and decodes the accumulated items in one pass. Callers
//! never observe a partial scan.

use crate::error::StoreError;
use crate::keys;
use async_trait::async_trait;
use patcher_types::{Record, RecordAttribute, Tenant};
use std::collections::BTreeMap;

/// One raw row: attribute name to string value
pub type Item = BTreeMap<String, String>;

/// Record store gateway
///
/// Implementations must be safe to share across concurrently running patch
/// tasks. Every update addresses exactly one record by (tenant, code).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every vendor record of a tenant, pagination fully resolved
    ///
    /// # Errors
    /// - `StoreError::Query` if any page request fails
    /// - `StoreError::Decode` if an item cannot be mapped onto [`Record`]
    async fn scan_all(&self, tenant: &Tenant) -> Result<Vec<Record>, StoreError>;

    /// Set one attribute of one record, returning the updated attributes
    ///
    /// # Errors
    /// - `StoreError::Write` on transport or permission failure
    /// - `StoreError::ConditionFailed` if the record is gone or already repaired
    /// - `StoreError::EmptyResult` if the store returned no attributes
    async fn conditional_update(
        &self,
        tenant: &Tenant,
        code: &str,
        attribute: RecordAttribute,
        value: &str,
    ) -> Result<UpdatedAttributes, StoreError>;
}

/// Range query: partition equality plus sort-key prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    /// Exact partition key
    pub partition_key: String,
    /// Required sort-key prefix
    pub sort_key_prefix: String,
}

impl RangeQuery {
    /// All vendor rows of a tenant
    #[must_use]
    pub fn vendors(tenant: &Tenant) -> Self {
        Self {
            partition_key: keys::vendor_pk(tenant.id()),
            sort_key_prefix: keys::vendor_sk_prefix(tenant.id()),
        }
    }
}

/// One page of a range query
#[derive(Debug, Clone)]
pub struct Page<C> {
    /// Raw items in this page
    pub items: Vec<Item>,
    /// Continuation cursor; `None` on the last page
    pub next: Option<C>,
}

/// Backend able to serve a range query one page at a time
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Opaque continuation cursor
    type Cursor: Send;

    /// Fetch the page starting at `cursor` (`None` for the first page)
    async fn fetch_page(
        &self,
        query: &RangeQuery,
        cursor: Option<Self::Cursor>,
    ) -> Result<Page<Self::Cursor>, StoreError>;
}

/// Follow the cursor until exhausted, then decode every item
///
/// # Errors
/// The first page error, or the first item that fails [`decode_record`]
pub async fn scan_pages<S>(source: &S, query: &RangeQuery) -> Result<Vec<Record>, StoreError>
where
    S: PageSource + ?Sized,
{
    let mut items = Vec::new();
    let mut cursor = None;
    let mut pages = 0usize;

    loop {
        let page = source.fetch_page(query, cursor.take()).await?;
        pages += 1;
        items.extend(page.items);

        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    tracing::debug!(
        partition_key = %query.partition_key,
        pages,
        items = items.len(),
        "range query exhausted"
    );

    items.iter().map(decode_record).collect()
}

/// Map a raw item onto a [`Record`]
///
/// `name` and `local_legal_name` default to empty; a missing or empty
/// `vendor_code` is a decode error since no update could address the row.
///
/// # Errors
/// `StoreError::Decode` if `vendor_code` is absent or empty
pub fn decode_record(item: &Item) -> Result<Record, StoreError> {
    let code = item
        .get(keys::VENDOR_CODE)
        .filter(|code| !code.is_empty())
        .ok_or_else(|| StoreError::Decode(format!("item without {}: {item:?}", keys::VENDOR_CODE)))?;

    Ok(Record {
        code: code.clone(),
        name: item.get(keys::NAME).cloned().unwrap_or_default(),
        local_legal_name: item.get(keys::LOCAL_LEGAL_NAME).cloned().unwrap_or_default(),
    })
}

/// Post-update view of the attributes an update touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdatedAttributes(Item);

impl UpdatedAttributes {
    /// Value of one updated attribute
    #[inline]
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.0.get(attribute).map(String::as_str)
    }

    /// Number of attributes returned
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the store returned nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over attribute/value pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<Item> for UpdatedAttributes {
    fn from(item: Item) -> Self {
        Self(item)
    }
}
