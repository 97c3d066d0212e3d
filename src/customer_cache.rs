use crate::cache_validator::ValidatedCacheEntry;
use crate::models::Customer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Point-in-time copy of the QBO customer list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub customers: Vec<Customer>,
    pub timestamp: DateTime<Utc>,
}

/// Storage for the customer snapshot.
///
/// Writers always replace the whole snapshot; there is no partial update.
#[async_trait]
pub trait CustomerCacheProvider: Send + Sync {
    /// Current snapshot, or `None` when absent, expired or corrupt.
    async fn get(&self) -> Option<CacheSnapshot>;

    /// Replaces the snapshot and stamps it with the current time.
    async fn set(&self, customers: Vec<Customer>) -> CacheSnapshot;

    /// When the current snapshot was taken.
    async fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.get().await.map(|s| s.timestamp)
    }

    /// Drops the snapshot so the next read repopulates it.
    async fn invalidate(&self);
}

const SNAPSHOT_KEY: &str = "qbo_customers";

/// In-process snapshot store with a time-to-live.
#[derive(Clone)]
pub struct MokaCustomerCache {
    cache: Cache<&'static str, Arc<ValidatedCacheEntry>>,
}

impl MokaCustomerCache {
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().time_to_live(ttl).max_capacity(1).build();
        Self { cache }
    }
}

#[async_trait]
impl CustomerCacheProvider for MokaCustomerCache {
    async fn get(&self) -> Option<CacheSnapshot> {
        let entry = self.cache.get(SNAPSHOT_KEY).await?;
        let snapshot = entry.open::<CacheSnapshot>();
        if snapshot.is_none() {
            self.cache.invalidate(SNAPSHOT_KEY).await;
        }
        snapshot
    }

    async fn set(&self, customers: Vec<Customer>) -> CacheSnapshot {
        let snapshot = CacheSnapshot {
            customers,
            timestamp: Utc::now(),
        };

        if let Some(entry) = ValidatedCacheEntry::seal(&snapshot) {
            self.cache.insert(SNAPSHOT_KEY, Arc::new(entry)).await;
            tracing::debug!(
                "Customer snapshot cached ({} customers)",
                snapshot.customers.len()
            );
        }

        snapshot
    }

    async fn invalidate(&self) {
        self.cache.invalidate(SNAPSHOT_KEY).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: &str) -> Customer {
        Customer {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_cache() {
        let cache = MokaCustomerCache::new(Duration::from_secs(60));
        assert!(cache.get().await.is_none());
        assert!(cache.timestamp().await.is_none());
    }

    #[tokio::test]
    async fn test_set_replaces_snapshot() {
        let cache = MokaCustomerCache::new(Duration::from_secs(60));

        let first = cache.set(vec![customer("1"), customer("2")]).await;
        assert_eq!(cache.get().await, Some(first.clone()));

        let second = cache.set(vec![customer("3")]).await;
        let current = cache.get().await.unwrap();
        assert_eq!(current.customers.len(), 1);
        assert_eq!(current.customers[0].id, "3");
        assert!(second.timestamp >= first.timestamp);
        assert_eq!(cache.timestamp().await, Some(second.timestamp));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = MokaCustomerCache::new(Duration::from_secs(60));
        cache.set(vec![customer("1")]).await;
        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_expired_snapshot_is_absent() {
        let cache = MokaCustomerCache::new(Duration::from_millis(50));
        cache.set(vec![customer("1")]).await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get().await.is_none());
    }
}
