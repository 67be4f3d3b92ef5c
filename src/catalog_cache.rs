//! Read cache of active catalog products for the advisory features.
//!
//! Readers always get the current snapshot without waiting. Once the
//! snapshot is older than the TTL, the next read starts a single background
//! reload; until it lands, callers keep seeing the stale snapshot.

use std::sync::{
    Arc, RwLock,
    atomic::{AtomicBool, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tokio::time::Instant;

use crate::{
    entity::products::{Column as ProdCol, Entity as Products},
    error::AppResult,
    models::Product,
};

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self, limit: u64) -> AppResult<Vec<Product>>;
}

/// Newest active products straight from the `products` table.
pub struct DbCatalogSource {
    conn: DatabaseConnection,
}

impl DbCatalogSource {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CatalogSource for DbCatalogSource {
    async fn load(&self, limit: u64) -> AppResult<Vec<Product>> {
        let products = Products::find()
            .filter(ProdCol::IsActive.eq(true))
            .order_by_desc(ProdCol::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Product::from)
            .collect();
        Ok(products)
    }
}

#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub products: Arc<Vec<Product>>,
    pub loaded_at: Option<DateTime<Utc>>,
    loaded: Option<Instant>,
}

impl CatalogSnapshot {
    fn empty() -> Self {
        Self {
            products: Arc::new(Vec::new()),
            loaded_at: None,
            loaded: None,
        }
    }
}

#[derive(Clone)]
pub struct ProductCache {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn CatalogSource>,
    ttl: Duration,
    limit: u64,
    snapshot: RwLock<CatalogSnapshot>,
    refreshing: AtomicBool,
}

impl ProductCache {
    pub fn new(source: Arc<dyn CatalogSource>, ttl: Duration, limit: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                ttl,
                limit,
                snapshot: RwLock::new(CatalogSnapshot::empty()),
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    /// Initial load at startup. A failure leaves the cache empty; the first
    /// read will try again in the background.
    pub async fn warm(&self) {
        if let Err(err) = self.reload().await {
            tracing::error!(error = %err, "catalog cache warm-up failed");
        }
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        let current = self.current();
        if self.is_stale(&current) {
            self.spawn_refresh();
        }
        current
    }

    /// Reload now and wait for the result.
    pub async fn refresh_now(&self) -> AppResult<CatalogSnapshot> {
        self.reload().await
    }

    pub fn is_stale(&self, snapshot: &CatalogSnapshot) -> bool {
        match snapshot.loaded {
            Some(loaded) => loaded.elapsed() >= self.inner.ttl,
            None => true,
        }
    }

    fn current(&self) -> CatalogSnapshot {
        self.inner
            .snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn spawn_refresh(&self) {
        if self.inner.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }
        tracing::info!("catalog cache expired, refreshing in background");
        let cache = self.clone();
        tokio::spawn(async move {
            if let Err(err) = cache.reload().await {
                tracing::error!(error = %err, "catalog cache background refresh failed");
            }
            cache.inner.refreshing.store(false, Ordering::Release);
        });
    }

    async fn reload(&self) -> AppResult<CatalogSnapshot> {
        let products = self.inner.source.load(self.inner.limit).await?;
        let snapshot = CatalogSnapshot {
            products: Arc::new(products),
            loaded_at: Some(Utc::now()),
            loaded: Some(Instant::now()),
        };
        *self
            .inner
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = snapshot.clone();
        tracing::info!(count = snapshot.products.len(), "catalog cache loaded");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use uuid::Uuid;

    use super::*;
    use crate::error::AppError;

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn load(&self, limit: u64) -> AppResult<Vec<Product>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(AppError::Internal(anyhow::anyhow!("db down")));
            }
            Ok((0..limit.min(call as u64))
                .map(|i| product(&format!("p{call}-{i}")))
                .collect())
        }
    }

    fn product(name: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            price: 100,
            stock: 1,
            is_active: true,
            brand: None,
            color: None,
            width: None,
            height: None,
            depth: None,
            material: None,
            space: None,
            menh: None,
            huong: None,
            created_at: Utc::now(),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_snapshot_is_served_without_reloading() {
        let source = CountingSource::new(false);
        let cache = ProductCache::new(source.clone(), Duration::from_secs(60), 10);
        cache.warm().await;

        let snap = cache.snapshot();
        settle().await;

        assert_eq!(snap.products.len(), 1);
        assert!(snap.loaded_at.is_some());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_snapshot_is_served_while_one_refresh_runs() {
        let source = CountingSource::new(false);
        let cache = ProductCache::new(source.clone(), Duration::from_secs(60), 10);
        cache.warm().await;

        tokio::time::advance(Duration::from_secs(61)).await;

        let first = cache.snapshot();
        let second = cache.snapshot();
        assert_eq!(first.products.len(), 1);
        assert_eq!(second.products.len(), 1);

        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        let refreshed = cache.snapshot();
        assert_eq!(refreshed.products.len(), 2);
        assert!(!cache.is_stale(&refreshed));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_refresh_keeps_previous_state() {
        let source = CountingSource::new(true);
        let cache = ProductCache::new(source.clone(), Duration::from_secs(60), 10);
        cache.warm().await;

        let snap = cache.snapshot();
        assert!(snap.products.is_empty());
        assert!(snap.loaded_at.is_none());

        settle().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(cache.refresh_now().await.is_err());
    }
}
