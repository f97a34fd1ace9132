//! Catalog reads with retry and caching.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::BackendError;
use crate::catalog::cache::TtlCache;
use crate::catalog::source::CatalogSource;
use crate::catalog::types::{sort_by_order, CustomizationOption, Product};
use crate::resilience::{retry, RetryError, RetryPolicy};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(#[from] RetryError<BackendError>),

    #[error("product not found: {0}")]
    NotFound(String),
}

impl CatalogError {
    /// Whether a later request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogError::Unavailable(e) => e.last.is_transient(),
            CatalogError::NotFound(_) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Products,
    Product(String),
    Options(Option<String>),
}

#[derive(Debug, Clone)]
enum CacheEntry {
    Products(Arc<Vec<Product>>),
    Product(Arc<Product>),
    Options(Arc<Vec<CustomizationOption>>),
}

#[derive(Clone)]
pub struct CatalogService {
    source: Arc<dyn CatalogSource>,
    policy: RetryPolicy,
    cache: Option<TtlCache<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl CatalogService {
    /// Uncached service reading from `source` under `policy`.
    pub fn new(source: Arc<dyn CatalogSource>, policy: RetryPolicy) -> Self {
        Self {
            source,
            policy,
            cache: None,
            ttl: Duration::ZERO,
        }
    }

    /// Cache successful reads for `ttl`.
    pub fn with_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(TtlCache::new());
        self.ttl = ttl;
        self
    }

    /// Drop every cached read.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Drop expired cached reads. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.cache.as_ref().map_or(0, TtlCache::purge_expired)
    }

    /// Number of cached reads, expired ones included until purged.
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, TtlCache::len)
    }

    /// Purge expired reads every `every` until `stopped` resolves.
    /// Returns `None` when caching is disabled.
    pub fn spawn_purge_task<F>(&self, every: Duration, stopped: F) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cache.as_ref()?;
        let service = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tokio::pin!(stopped);
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        let removed = service.purge_expired();
                        if removed > 0 {
                            tracing::debug!(removed, remaining = service.cached_len(), "Purged expired catalog reads");
                        }
                    }
                }
            }
        }))
    }

    fn cached(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.cache.as_ref()?.get(key)
    }

    fn store(&self, key: CacheKey, entry: CacheEntry) {
        if let Some(cache) = &self.cache {
            cache.set(key, entry, self.ttl);
        }
    }

    /// Every product.
    pub async fn load_products(&self) -> Result<Vec<Product>, CatalogError> {
        if let Some(CacheEntry::Products(products)) = self.cached(&CacheKey::Products) {
            return Ok(products.as_ref().clone());
        }
        let products = retry(&self.policy, "catalog.load_products", || self.source.fetch_products())
            .await?
            .unwrap_or_default();
        tracing::debug!(count = products.len(), "Loaded products");
        self.store(CacheKey::Products, CacheEntry::Products(Arc::new(products.clone())));
        Ok(products)
    }

    /// One product by id.
    pub async fn load_product(&self, id: &str) -> Result<Product, CatalogError> {
        let key = CacheKey::Product(id.to_string());
        if let Some(CacheEntry::Product(product)) = self.cached(&key) {
            return Ok(product.as_ref().clone());
        }
        let product = retry(&self.policy, "catalog.load_product", || self.source.fetch_product(id))
            .await?
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        self.store(key, CacheEntry::Product(Arc::new(product.clone())));
        Ok(product)
    }

    /// Options for `product_id` (or every option), in display order.
    pub async fn load_customization_options(
        &self,
        product_id: Option<&str>,
    ) -> Result<Vec<CustomizationOption>, CatalogError> {
        let key = CacheKey::Options(product_id.map(str::to_string));
        if let Some(options) = self.cached_options(&key) {
            return Ok(options);
        }
        let options = self.fetch_options(product_id).await?;
        // Per-product entries are only kept for products known to exist.
        let known = match product_id {
            None => true,
            Some(id) => matches!(
                self.cached(&CacheKey::Product(id.to_string())),
                Some(CacheEntry::Product(_))
            ),
        };
        if known {
            self.store(key, CacheEntry::Options(Arc::new(options.clone())));
        }
        Ok(options)
    }

    fn cached_options(&self, key: &CacheKey) -> Option<Vec<CustomizationOption>> {
        match self.cached(key)? {
            CacheEntry::Options(options) => Some(options.as_ref().clone()),
            _ => None,
        }
    }

    async fn fetch_options(&self, product_id: Option<&str>) -> Result<Vec<CustomizationOption>, CatalogError> {
        let mut options = retry(&self.policy, "catalog.load_options", || {
            self.source.fetch_options(product_id)
        })
        .await?
        .unwrap_or_default();
        sort_by_order(&mut options);
        Ok(options)
    }

    /// Product and its options, fetched concurrently.
    pub async fn load_configurable(
        &self,
        product_id: &str,
    ) -> Result<(Product, Vec<CustomizationOption>), CatalogError> {
        let key = CacheKey::Options(Some(product_id.to_string()));
        let cached = self.cached_options(&key);
        let fresh = cached.is_none();
        let (product, options) = tokio::join!(self.load_product(product_id), async {
            match cached {
                Some(options) => Ok(options),
                None => self.fetch_options(Some(product_id)).await,
            }
        });
        let product = product?;
        let options = options?;
        if fresh {
            self.store(key, CacheEntry::Options(Arc::new(options.clone())));
        }
        Ok((product, options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::OptionKind;
    use crate::resilience::Fetched;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            base_price: 100.0,
            image_url: None,
        }
    }

    fn option(id: &str, order: i32) -> CustomizationOption {
        CustomizationOption {
            id: id.to_string(),
            name: id.to_string(),
            kind: OptionKind::Numeric,
            choices: vec![],
            range: None,
            required: false,
            default_value: None,
            price_adjustment: None,
            group: None,
            order,
            product_id: None,
            quantization_profile: None,
        }
    }

    /// Fails the first `failures` calls of every kind.
    struct FlakySource {
        failures: u32,
        calls: AtomicU32,
    }

    impl FlakySource {
        fn new(failures: u32) -> Self {
            Self { failures, calls: AtomicU32::new(0) }
        }

        fn fail(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) < self.failures
        }
    }

    #[async_trait]
    impl CatalogSource for FlakySource {
        async fn fetch_products(&self) -> Fetched<Vec<Product>, BackendError> {
            if self.fail() {
                return Fetched::err(BackendError::Status { status: 503, body: String::new() });
            }
            Fetched::ok(vec![product("p1")])
        }

        async fn fetch_product(&self, id: &str) -> Fetched<Product, BackendError> {
            if self.fail() {
                return Fetched::err(BackendError::Transport("reset".into()));
            }
            if id == "p1" {
                Fetched::ok(product(id))
            } else {
                Fetched::empty()
            }
        }

        async fn fetch_options(&self, _product_id: Option<&str>) -> Fetched<Vec<CustomizationOption>, BackendError> {
            if self.fail() {
                return Fetched::err(BackendError::Transport("reset".into()));
            }
            Fetched::ok(vec![option("b", 2), option("a", 1)])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_from_transient_failures() {
        let source = Arc::new(FlakySource::new(2));
        let service = CatalogService::new(source.clone(), RetryPolicy::default());

        let products = service.load_products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_surfaces_last_error() {
        let service = CatalogService::new(Arc::new(FlakySource::new(10)), RetryPolicy::default());
        let err = service.load_products().await.unwrap_err();
        match &err {
            CatalogError::Unavailable(e) => assert_eq!(e.attempts, 3),
            other => panic!("unexpected {:?}", other),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let service = CatalogService::new(Arc::new(FlakySource::new(0)), RetryPolicy::default());
        assert!(matches!(
            service.load_product("p9").await,
            Err(CatalogError::NotFound(id)) if id == "p9"
        ));
    }

    #[tokio::test]
    async fn test_options_sorted_and_cached() {
        let source = Arc::new(FlakySource::new(0));
        let service = CatalogService::new(source.clone(), RetryPolicy::default())
            .with_cache(Duration::from_secs(60));

        service.load_product("p1").await.unwrap();
        let first = service.load_customization_options(Some("p1")).await.unwrap();
        let ids: Vec<_> = first.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);

        service.load_customization_options(Some("p1")).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        service.invalidate();
        service.load_customization_options(None).await.unwrap();
        service.load_customization_options(None).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_load_configurable() {
        let service = CatalogService::new(Arc::new(FlakySource::new(0)), RetryPolicy::default());
        let (product, options) = service.load_configurable("p1").await.unwrap();
        assert_eq!(product.id, "p1");
        assert_eq!(options.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_products_leave_cache_empty() {
        let service = CatalogService::new(Arc::new(FlakySource::new(0)), RetryPolicy::default())
            .with_cache(Duration::from_secs(60));

        for i in 0..50 {
            let id = format!("nope-{}", i);
            assert!(matches!(
                service.load_configurable(&id).await,
                Err(CatalogError::NotFound(_))
            ));
            service.load_customization_options(Some(&id)).await.unwrap();
        }
        assert_eq!(service.cached_len(), 0);

        service.load_configurable("p1").await.unwrap();
        assert_eq!(service.cached_len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_task_drops_expired_reads() {
        let service = CatalogService::new(Arc::new(FlakySource::new(0)), RetryPolicy::default())
            .with_cache(Duration::from_secs(1));
        service.load_configurable("p1").await.unwrap();
        service.load_products().await.unwrap();
        assert_eq!(service.cached_len(), 3);

        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
        let handle = service
            .spawn_purge_task(Duration::from_secs(1), async move {
                let _ = stopped.await;
            })
            .unwrap();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(service.cached_len(), 0);

        stop.send(()).unwrap();
        handle.await.unwrap();
    }

    #[test]
    fn test_purge_task_needs_cache() {
        let service = CatalogService::new(Arc::new(FlakySource::new(0)), RetryPolicy::default());
        assert!(service.spawn_purge_task(Duration::from_secs(1), async {}).is_none());
        assert_eq!(service.purge_expired(), 0);
    }
}
