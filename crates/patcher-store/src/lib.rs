//! Record Store Gateway
//!
//! Abstracts the partitioned ordering table:
//! - [`RecordStore`]: full vendor scan per tenant and single-key conditional update
//! - [`PageSource`] + [`scan_pages`]: cursor-following pagination shared by backends
//! - [`DynamoRecordStore`]: the DynamoDB backend
//! - [`ConnectionCache`]: one client per (region, profile) for the whole process
//!
//! # Example
//!
//! ```rust,ignore
//! use patcher_store::{DynamoClientCache, DynamoRecordStore, RecordStore};
//!
//! let cache = DynamoClientCache::new();
//! let store = DynamoRecordStore::from_cache(&cache, &config.store).await;
//! let vendors = store.scan_all(&tenant).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod dynamo;
pub mod error;
pub mod gateway;
pub mod keys;

pub use cache::{ClientKey, ConnectionCache};
pub use dynamo::{DynamoClientCache, DynamoRecordStore};
pub use error::StoreError;
pub use gateway::{decode_record, scan_pages, Item, Page, PageSource, RangeQuery, RecordStore, UpdatedAttributes};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
