//! The customer directory: cached QBO customers, reconciled for display.

use crate::customer_cache::{CacheSnapshot, CustomerCacheProvider};
use crate::customer_index::CustomerIndex;
use crate::errors::AppError;
use crate::models::Customer;
use crate::name_parser::CompanyNameGrammar;
use crate::reconcile::{reconcile_all, ReconciledCustomer};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Where fresh customer lists come from.
#[async_trait]
pub trait CustomerSource: Send + Sync {
    async fn fetch_customers(&self) -> Result<Vec<Customer>, AppError>;
}

/// What a request gets to work with.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheStatus {
    Ready(CacheSnapshot),
    /// Nothing cached and the source could not be reached. Callers show an
    /// empty list.
    Unavailable,
}

impl CacheStatus {
    pub fn customers(&self) -> &[Customer] {
        match self {
            CacheStatus::Ready(snapshot) => &snapshot.customers,
            CacheStatus::Unavailable => &[],
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            CacheStatus::Ready(snapshot) => Some(snapshot.timestamp),
            CacheStatus::Unavailable => None,
        }
    }
}

/// How long a failed repopulation keeps reads from retrying the source.
pub const UNAVAILABLE_BACKOFF: Duration = Duration::from_secs(30);

const UNAVAILABLE_KEY: &str = "source_unavailable";

/// Serves the customer snapshot, repopulating it from the source on expiry.
#[derive(Clone)]
pub struct CustomerDirectory {
    cache: Arc<dyn CustomerCacheProvider>,
    source: Arc<dyn CustomerSource>,
    grammar: CompanyNameGrammar,
    /// Present while the source is known to be down.
    unavailable: Cache<&'static str, ()>,
}

impl CustomerDirectory {
    pub fn new(
        cache: Arc<dyn CustomerCacheProvider>,
        source: Arc<dyn CustomerSource>,
        grammar: CompanyNameGrammar,
    ) -> Self {
        Self {
            cache,
            source,
            grammar,
            unavailable: backoff_marker(UNAVAILABLE_BACKOFF),
        }
    }

    /// Replaces the window during which reads skip a source that just failed.
    pub fn with_failure_backoff(mut self, backoff: Duration) -> Self {
        self.unavailable = backoff_marker(backoff);
        self
    }

    pub fn grammar(&self) -> &CompanyNameGrammar {
        &self.grammar
    }

    /// Current snapshot. On a miss the cache is repopulated; if that fails the
    /// result is `Unavailable`, and stays so without contacting the source
    /// until the backoff window passes.
    pub async fn snapshot(&self) -> CacheStatus {
        if let Some(snapshot) = self.cache.get().await {
            tracing::debug!(
                "Customer cache HIT ({} customers, taken {})",
                snapshot.customers.len(),
                snapshot.timestamp
            );
            return CacheStatus::Ready(snapshot);
        }

        if self.unavailable.contains_key(UNAVAILABLE_KEY) {
            tracing::debug!("Customer cache MISS - source recently failed, not retrying");
            return CacheStatus::Unavailable;
        }

        tracing::info!("Customer cache MISS - repopulating from source");
        match self.refresh().await {
            Ok(snapshot) => CacheStatus::Ready(snapshot),
            Err(e) => {
                tracing::warn!("Customer list unavailable: {}", e);
                self.unavailable.insert(UNAVAILABLE_KEY, ()).await;
                CacheStatus::Unavailable
            }
        }
    }

    /// Fetches a fresh list and replaces the cached snapshot. Ignores the
    /// failure backoff.
    ///
    /// Two refreshes racing each other both write; the later one wins.
    pub async fn refresh(&self) -> Result<CacheSnapshot, AppError> {
        let customers = self.source.fetch_customers().await?;
        self.unavailable.invalidate(UNAVAILABLE_KEY).await;
        let snapshot = self.cache.set(customers).await;
        tracing::info!(
            "Customer cache refreshed: {} customers at {}",
            snapshot.customers.len(),
            snapshot.timestamp
        );
        Ok(snapshot)
    }

    /// Reconciled customers for the current snapshot.
    pub async fn reconciled(&self) -> (Vec<ReconciledCustomer>, Option<DateTime<Utc>>) {
        let status = self.snapshot().await;
        (reconcile_all(&self.grammar, status.customers()), status.timestamp())
    }

    /// Id index over the reconciled snapshot.
    pub async fn index(&self) -> CustomerIndex<ReconciledCustomer> {
        let (customers, _) = self.reconciled().await;
        CustomerIndex::build(customers)
    }
}

fn backoff_marker(backoff: Duration) -> Cache<&'static str, ()> {
    Cache::builder().time_to_live(backoff).max_capacity(1).build()
}
