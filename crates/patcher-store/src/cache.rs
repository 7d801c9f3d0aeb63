//! Process-wide store connection cache using moka
//!
//! One connection per (region, profile) is built for the life of the
//! process and shared by every tenant. Concurrent requests for the same key
//! are coalesced, so a connection is never constructed twice.

use moka::future::Cache;
use patcher_types::StoreConfig;
use std::fmt;
use std::future::Future;

/// Composite cache key: region and credentials profile
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    /// AWS region
    pub region: String,
    /// Shared-config profile
    pub profile: String,
}

impl ClientKey {
    /// Create key
    #[inline]
    #[must_use]
    pub fn new(region: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            profile: profile.into(),
        }
    }
}

impl From<&StoreConfig> for ClientKey {
    fn from(config: &StoreConfig) -> Self {
        Self::new(config.region.as_str(), config.profile.as_str())
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.region, self.profile)
    }
}

/// Connection cache keyed by [`ClientKey`]
///
/// Unbounded and without expiry: entries live as long as the cache.
#[derive(Clone)]
pub struct ConnectionCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<ClientKey, V>,
}

impl<V> ConnectionCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create empty cache
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Cache::builder().build(),
        }
    }

    /// Shared connection for `key`, running `connect` only on first use
    pub async fn get_or_connect<F, Fut>(&self, key: ClientKey, connect: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let label = key.to_string();
        self.inner
            .get_with(key, async move {
                tracing::debug!(client = %label, "constructing store connection");
                connect().await
            })
            .await
    }

    /// Check if a connection for `key` exists
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &ClientKey) -> bool {
        self.inner.contains_key(key)
    }
}

impl<V> Default for ConnectionCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for ConnectionCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionCache")
            .field("entries", &self.inner.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn counting_connect(
        counter: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::future::Ready<Arc<usize>> {
        let counter = counter.clone();
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Arc::new(n))
        }
    }

    #[test]
    fn key_display_joins_region_and_profile() {
        assert_eq!(
            ClientKey::new("eu-central-1", "pd-staging").to_string(),
            "eu-central-1#pd-staging"
        );
    }

    #[tokio::test]
    async fn same_key_returns_shared_connection() {
        let cache = ConnectionCache::new();
        let built = Arc::new(AtomicUsize::new(0));
        let key = ClientKey::new("ap-southeast-1", "pd-production");

        let first = cache.get_or_connect(key.clone(), counting_connect(&built)).await;
        let second = cache.get_or_connect(key.clone(), counting_connect(&built)).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert!(cache.contains(&key));
    }

    #[tokio::test]
    async fn different_profiles_get_different_connections() {
        let cache = ConnectionCache::new();
        let built = Arc::new(AtomicUsize::new(0));

        let a = cache
            .get_or_connect(ClientKey::new("eu-central-1", "a"), counting_connect(&built))
            .await;
        let b = cache
            .get_or_connect(ClientKey::new("eu-central-1", "b"), counting_connect(&built))
            .await;

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_constructs_once() {
        let cache: ConnectionCache<Arc<usize>> = ConnectionCache::new();
        let built = Arc::new(AtomicUsize::new(0));
        let key = ClientKey::new("eu-central-1", "pd-staging");

        let lookups = (0..16).map(|_| {
            let cache = cache.clone();
            let built = built.clone();
            let key = key.clone();
            tokio::spawn(async move {
                cache
                    .get_or_connect(key, || async move {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Arc::new(built.fetch_add(1, Ordering::SeqCst))
                    })
                    .await
            })
        });
        let connections = futures::future::join_all(lookups).await;

        assert_eq!(built.load(Ordering::SeqCst), 1);
        let first = connections[0].as_ref().unwrap();
        for connection in &connections {
            assert!(Arc::ptr_eq(first, connection.as_ref().unwrap()));
        }
    }
}
