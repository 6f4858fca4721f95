//! TTL cache in front of a single provider adapter.
//!
//! Holds the last successfully fetched snapshot for one adapter. A request
//! inside the TTL window is answered from memory; otherwise the adapter is
//! called and, on success, the snapshot is replaced wholesale. A failed
//! refresh leaves the previous snapshot and timestamp untouched and the
//! error goes back to the caller; there is no fallback to stale data.
//!
//! The state sits behind one `RwLock`: fresh reads share it, while a refresh
//! holds it exclusively from the staleness check until the replace, so
//! readers only ever see a complete old or a complete new snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::RwLock;

use crate::errors::MarketDataError;
use crate::models::{Currency, MarketSnapshot};
use crate::provider::{FetchRequest, ProviderAdapter, ProviderCapabilities};

/// Cached state for one adapter.
#[derive(Debug, Default)]
struct CacheEntry {
    snapshot: Arc<MarketSnapshot>,
    /// The request the snapshot answers.
    fetched_for: Option<FetchRequest>,
    /// Monotonic time of the last successful fetch.
    last_fetched: Option<Instant>,
    /// Wall-clock time of the last successful fetch, for reporting.
    last_fetched_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        match self.last_fetched {
            Some(last) => now.saturating_duration_since(last) > ttl,
            None => true,
        }
    }

    fn serves(&self, request: &FetchRequest, now: Instant, ttl: Duration) -> bool {
        !self.is_expired(now, ttl)
            && !self.snapshot.is_empty()
            && self.fetched_for.as_ref() == Some(request)
    }
}

/// Point-in-time view of a fetcher's cache, for status reporting.
#[derive(Clone, Debug)]
pub struct CacheStatus {
    pub provider: &'static str,
    pub capabilities: ProviderCapabilities,
    pub ttl: Duration,
    pub currency: Option<Currency>,
    pub entries: usize,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// An adapter wrapped with a time-to-live cache.
pub struct CachedFetcher {
    adapter: Arc<dyn ProviderAdapter>,
    ttl: Duration,
    state: RwLock<CacheEntry>,
}

impl CachedFetcher {
    /// Create a fetcher with an empty cache.
    pub fn new(adapter: Arc<dyn ProviderAdapter>, ttl: Duration) -> Self {
        Self {
            adapter,
            ttl,
            state: RwLock::new(CacheEntry::default()),
        }
    }

    pub fn provider_id(&self) -> &'static str {
        self.adapter.id()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// True if no fetch has succeeded yet or the last one is older than the TTL.
    pub async fn should_fetch(&self) -> bool {
        self.should_fetch_at(Instant::now()).await
    }

    /// [`should_fetch`](Self::should_fetch) evaluated at a given instant.
    pub async fn should_fetch_at(&self, now: Instant) -> bool {
        self.state.read().await.is_expired(now, self.ttl)
    }

    /// Monotonic time of the last successful fetch.
    pub async fn last_fetched(&self) -> Option<Instant> {
        self.state.read().await.last_fetched
    }

    /// Return the cached snapshot if it is fresh and answers `request`,
    /// otherwise fetch from the adapter and replace the cache.
    ///
    /// A cache hit returns the same `Arc` as the previous call.
    pub async fn get_all(
        &self,
        request: &FetchRequest,
    ) -> Result<Arc<MarketSnapshot>, MarketDataError> {
        {
            let state = self.state.read().await;
            if state.serves(request, Instant::now(), self.ttl) {
                debug!("Cache hit for '{}'", self.adapter.id());
                return Ok(Arc::clone(&state.snapshot));
            }
        }

        let mut state = self.state.write().await;

        // Another caller may have refreshed while we waited for the lock
        if state.serves(request, Instant::now(), self.ttl) {
            debug!("Cache refreshed concurrently for '{}'", self.adapter.id());
            return Ok(Arc::clone(&state.snapshot));
        }

        debug!(
            "Cache miss for '{}' ({:?}), fetching",
            self.adapter.id(),
            request.currency
        );

        match self.adapter.fetch_market_data(request).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                state.snapshot = Arc::clone(&snapshot);
                state.fetched_for = Some(request.clone());
                state.last_fetched = Some(Instant::now());
                state.last_fetched_at = Some(Utc::now());
                info!(
                    "Refreshed '{}' with {} records",
                    self.adapter.id(),
                    snapshot.len()
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(
                    "Refresh of '{}' failed, keeping previous snapshot: {}",
                    self.adapter.id(),
                    e
                );
                Err(e)
            }
        }
    }

    pub async fn status(&self) -> CacheStatus {
        let state = self.state.read().await;
        CacheStatus {
            provider: self.adapter.id(),
            capabilities: self.adapter.capabilities(),
            ttl: self.ttl,
            currency: state
                .fetched_for
                .as_ref()
                .map(|request| request.currency.clone())
                .filter(|currency| !currency.is_empty()),
            entries: state.snapshot.len(),
            last_fetched_at: state.last_fetched_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::MarketRecord;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Adapter that replays scripted results and counts calls.
    pub(crate) struct StubAdapter {
        pub calls: AtomicUsize,
        results: Mutex<VecDeque<Result<MarketSnapshot, MarketDataError>>>,
    }

    impl StubAdapter {
        pub(crate) fn new(results: Vec<Result<MarketSnapshot, MarketDataError>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                results: Mutex::new(results.into()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ProviderAdapter for StubAdapter {
        fn id(&self) -> &'static str {
            "STUB"
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities::price_only()
        }

        async fn fetch_market_data(
            &self,
            _request: &FetchRequest,
        ) -> Result<MarketSnapshot, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(MarketDataError::NoDataReturned {
                    provider: "STUB".to_string(),
                }))
        }
    }

    pub(crate) fn snapshot(entries: &[(&str, f64)]) -> MarketSnapshot {
        entries
            .iter()
            .map(|(symbol, price)| {
                (
                    symbol.to_string(),
                    MarketRecord::priced(symbol.to_lowercase(), symbol, *symbol, *price),
                )
            })
            .collect()
    }

    fn upstream_down() -> MarketDataError {
        MarketDataError::UpstreamHttp {
            provider: "STUB".to_string(),
            status: 503,
        }
    }

    #[tokio::test]
    async fn test_should_fetch_before_first_fetch() {
        let stub = Arc::new(StubAdapter::new(vec![]));
        let fetcher = CachedFetcher::new(stub, Duration::from_secs(60));
        assert!(fetcher.should_fetch().await);
        assert!(fetcher.last_fetched().await.is_none());
    }

    #[tokio::test]
    async fn test_fresh_cache_returns_same_snapshot() {
        let stub = Arc::new(StubAdapter::new(vec![Ok(snapshot(&[("BTC", 1.0)]))]));
        let fetcher = CachedFetcher::new(stub.clone(), Duration::from_secs(60));
        let request = FetchRequest::for_currency("usd");

        let first = fetcher.get_all(&request).await.unwrap();
        let second = fetcher.get_all(&request).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(stub.calls(), 1);
        assert!(!fetcher.should_fetch().await);
    }

    #[tokio::test]
    async fn test_ttl_boundary() {
        let ttl = Duration::from_secs(60);
        let stub = Arc::new(StubAdapter::new(vec![Ok(snapshot(&[("BTC", 1.0)]))]));
        let fetcher = CachedFetcher::new(stub, ttl);
        fetcher
            .get_all(&FetchRequest::for_currency("usd"))
            .await
            .unwrap();

        let last = fetcher.last_fetched().await.unwrap();
        let margin = Duration::from_millis(1);
        assert!(!fetcher.should_fetch_at(last).await);
        assert!(!fetcher.should_fetch_at(last + ttl - margin).await);
        assert!(fetcher.should_fetch_at(last + ttl + margin).await);
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let stub = Arc::new(StubAdapter::new(vec![
            Ok(snapshot(&[("BTC", 1.0)])),
            Ok(snapshot(&[("BTC", 2.0)])),
        ]));
        let fetcher = CachedFetcher::new(stub.clone(), Duration::ZERO);
        let request = FetchRequest::for_currency("usd");

        fetcher.get_all(&request).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let refreshed = fetcher.get_all(&request).await.unwrap();

        assert_eq!(stub.calls(), 2);
        assert_eq!(refreshed["BTC"].price, 2.0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cache_and_timestamp() {
        let stub = Arc::new(StubAdapter::new(vec![
            Ok(snapshot(&[("BTC", 1.0)])),
            Err(upstream_down()),
        ]));
        let fetcher = CachedFetcher::new(stub.clone(), Duration::ZERO);
        let request = FetchRequest::for_currency("usd");

        fetcher.get_all(&request).await.unwrap();
        let before = fetcher.last_fetched().await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        let err = fetcher.get_all(&request).await.unwrap_err();
        assert!(matches!(err, MarketDataError::UpstreamHttp { status: 503, .. }));

        assert_eq!(fetcher.last_fetched().await, before);
        let status = fetcher.status().await;
        assert_eq!(status.entries, 1);
        assert_eq!(status.currency.as_deref(), Some("usd"));
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_before_first_fetch_leaves_cache_empty() {
        let stub = Arc::new(StubAdapter::new(vec![Err(upstream_down())]));
        let fetcher = CachedFetcher::new(stub, Duration::from_secs(60));

        assert!(fetcher
            .get_all(&FetchRequest::for_currency("usd"))
            .await
            .is_err());
        assert!(fetcher.should_fetch().await);
        assert_eq!(fetcher.status().await.entries, 0);
    }

    #[tokio::test]
    async fn test_currency_change_is_cache_miss() {
        let stub = Arc::new(StubAdapter::new(vec![
            Ok(snapshot(&[("BTC", 1.0)])),
            Ok(snapshot(&[("BTC", 0.9)])),
        ]));
        let fetcher = CachedFetcher::new(stub.clone(), Duration::from_secs(60));

        fetcher
            .get_all(&FetchRequest::for_currency("usd"))
            .await
            .unwrap();
        let eur = fetcher
            .get_all(&FetchRequest::for_currency("EUR"))
            .await
            .unwrap();

        assert_eq!(stub.calls(), 2);
        assert_eq!(eur["BTC"].price, 0.9);
        assert_eq!(fetcher.status().await.currency.as_deref(), Some("eur"));
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_not_served_from_cache() {
        let stub = Arc::new(StubAdapter::new(vec![
            Ok(MarketSnapshot::new()),
            Ok(snapshot(&[("BTC", 1.0)])),
        ]));
        let fetcher = CachedFetcher::new(stub.clone(), Duration::from_secs(60));
        let request = FetchRequest::for_currency("usd");

        assert!(fetcher.get_all(&request).await.unwrap().is_empty());
        assert_eq!(fetcher.get_all(&request).await.unwrap().len(), 1);
        assert_eq!(stub.calls(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let stub = Arc::new(StubAdapter::new(vec![Ok(snapshot(&[("BTC", 1.0)]))]));
        let fetcher = Arc::new(CachedFetcher::new(stub.clone(), Duration::from_secs(60)));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let fetcher = Arc::clone(&fetcher);
                tokio::spawn(async move {
                    fetcher
                        .get_all(&FetchRequest::for_currency("usd"))
                        .await
                        .map(|s| s.len())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 1);
        }
        assert_eq!(stub.calls(), 1);
    }
}
