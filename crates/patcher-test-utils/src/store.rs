//! Paged in-memory record store

use async_trait::async_trait;
use dashmap::DashMap;
use patcher_store::{
    keys, scan_pages, Item, Page, PageSource, RangeQuery, RecordStore, StoreError,
    UpdatedAttributes,
};
use patcher_types::{Record, RecordAttribute, Tenant};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Rows keyed by (PK, SK), paged in sort-key order
///
/// Applies the same update condition as the DynamoDB backend: the row must
/// exist and the attribute must still be empty.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    rows: DashMap<(String, String), Record>,
    page_size: usize,
    scan_failures: DashMap<String, usize>,
    write_failures: DashMap<String, StoreError>,
    page_requests: AtomicUsize,
    writes: DashMap<String, usize>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            page_size: 25,
            scan_failures: DashMap::new(),
            write_failures: DashMap::new(),
            page_requests: AtomicUsize::new(0),
            writes: DashMap::new(),
        }
    }

    /// Items per page; clamped to at least one
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    #[must_use]
    pub fn with_records(self, tenant: &Tenant, records: impl IntoIterator<Item = Record>) -> Self {
        for record in records {
            self.insert(tenant, record);
        }
        self
    }

    pub fn insert(&self, tenant: &Tenant, record: Record) {
        let key = (keys::vendor_pk(tenant.id()), keys::vendor_sk(tenant.id(), &record.code));
        self.rows.insert(key, record);
    }

    /// Fail the `page`-th (zero-based) page request of every scan of `tenant`
    pub fn fail_scan_at_page(&self, tenant: &Tenant, page: usize) {
        self.scan_failures.insert(keys::vendor_pk(tenant.id()), page);
    }

    /// Reject every update of `code` with `error`
    pub fn fail_write(&self, code: &str, error: StoreError) {
        self.write_failures.insert(code.to_string(), error);
    }

    /// Current row snapshot
    pub fn record(&self, tenant: &Tenant, code: &str) -> Option<Record> {
        let key = (keys::vendor_pk(tenant.id()), keys::vendor_sk(tenant.id(), code));
        self.rows.get(&key).map(|row| row.value().clone())
    }

    /// Successful writes across all records
    pub fn total_writes(&self) -> usize {
        self.writes.iter().map(|entry| *entry.value()).sum()
    }

    /// Successful writes of one record
    pub fn writes_for(&self, code: &str) -> usize {
        self.writes.get(code).map_or(0, |count| *count)
    }

    /// Page requests served so far
    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    fn sorted_items(&self, query: &RangeQuery) -> Vec<(String, Item)> {
        let mut items: Vec<(String, Item)> = self
            .rows
            .iter()
            .filter(|row| {
                let (pk, sk) = row.key();
                *pk == query.partition_key && sk.starts_with(&query.sort_key_prefix)
            })
            .map(|row| (row.key().1.clone(), to_item(row.value())))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items
    }
}

fn to_item(record: &Record) -> Item {
    let mut item = Item::new();
    item.insert(keys::VENDOR_CODE.to_string(), record.code.clone());
    item.insert(keys::NAME.to_string(), record.name.clone());
    if !record.local_legal_name.is_empty() {
        item.insert(keys::LOCAL_LEGAL_NAME.to_string(), record.local_legal_name.clone());
    }
    item
}

#[async_trait]
impl PageSource for InMemoryRecordStore {
    type Cursor = usize;

    async fn fetch_page(
        &self,
        query: &RangeQuery,
        cursor: Option<usize>,
    ) -> Result<Page<usize>, StoreError> {
        let start = cursor.unwrap_or(0);
        let page_index = start / self.page_size;
        self.page_requests.fetch_add(1, Ordering::SeqCst);

        if let Some(failing) = self.scan_failures.get(&query.partition_key) {
            if *failing == page_index {
                return Err(StoreError::Query {
                    partition_key: query.partition_key.clone(),
                    message: "injected page failure".to_string(),
                    retryable: true,
                });
            }
        }

        let all = self.sorted_items(query);
        let end = (start + self.page_size).min(all.len());
        let items = all
            .get(start..end)
            .unwrap_or_default()
            .iter()
            .map(|(_, item)| item.clone())
            .collect();
        let next = (end < all.len()).then_some(end);

        Ok(Page { items, next })
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn scan_all(&self, tenant: &Tenant) -> Result<Vec<Record>, StoreError> {
        scan_pages(self, &RangeQuery::vendors(tenant)).await
    }

    async fn conditional_update(
        &self,
        tenant: &Tenant,
        code: &str,
        attribute: RecordAttribute,
        value: &str,
    ) -> Result<UpdatedAttributes, StoreError> {
        if let Some(error) = self.write_failures.get(code) {
            return Err(error.value().clone());
        }

        let sk = keys::vendor_sk(tenant.id(), code);
        let key = (keys::vendor_pk(tenant.id()), sk.clone());
        let Some(mut row) = self.rows.get_mut(&key) else {
            return Err(StoreError::ConditionFailed { key: sk });
        };
        if row.is_repaired(attribute) {
            return Err(StoreError::ConditionFailed { key: sk });
        }

        match attribute {
            RecordAttribute::LocalLegalName => row.local_legal_name = value.to_string(),
        }
        drop(row);
        *self.writes.entry(code.to_string()).or_insert(0) += 1;

        let mut updated = Item::new();
        updated.insert(attribute.as_str().to_string(), value.to_string());
        Ok(UpdatedAttributes::from(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{repaired_vendor, tenant, vendor};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn scan_returns_only_the_tenant_rows_in_key_order() {
        let sg = tenant("FP_SG");
        let tw = tenant("FP_TW");
        let store = InMemoryRecordStore::new()
            .with_page_size(2)
            .with_records(&sg, [vendor("c", "C"), vendor("a", "A"), vendor("b", "B")])
            .with_records(&tw, [vendor("z", "Z")]);

        let codes: Vec<String> = store
            .scan_all(&sg)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.code)
            .collect();

        assert_eq!(codes, vec!["a", "b", "c"]);
        assert_eq!(store.page_requests(), 2);
    }

    #[tokio::test]
    async fn update_is_conditional_on_empty_attribute() {
        let sg = tenant("FP_SG");
        let store = InMemoryRecordStore::new()
            .with_records(&sg, [vendor("a", "A"), repaired_vendor("b", "B", "Old")]);

        let updated = store
            .conditional_update(&sg, "a", RecordAttribute::LocalLegalName, "New")
            .await
            .unwrap();
        assert_eq!(updated.get("local_legal_name"), Some("New"));

        let err = store
            .conditional_update(&sg, "b", RecordAttribute::LocalLegalName, "New")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed { .. }));
        assert_eq!(store.record(&sg, "b").unwrap().local_legal_name, "Old");

        let err = store
            .conditional_update(&sg, "missing", RecordAttribute::LocalLegalName, "New")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed { .. }));
        assert_eq!(store.total_writes(), 1);
    }

    #[tokio::test]
    async fn injected_page_failure_fails_the_scan() {
        let sg = tenant("FP_SG");
        let store = InMemoryRecordStore::new()
            .with_page_size(1)
            .with_records(&sg, [vendor("a", "A"), vendor("b", "B")]);
        store.fail_scan_at_page(&sg, 1);

        let err = store.scan_all(&sg).await.unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }));
    }
}
