// Discount catalog cache
// Sits in front of GET /discounts so every billing dialog does not re-fetch the same short list.

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::api::{ApiError, Discount, FrontDeskApi};

#[derive(Debug, Default)]
pub struct CatalogStats {
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
    pub refresh_count: AtomicUsize,
    pub expired_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CatalogStatsReport {
    pub items_count: usize,
    pub hit_count: usize,
    pub miss_count: usize,
    pub refresh_count: usize,
    pub expired_count: usize,
}

pub struct DiscountCatalog {
    entries: DashMap<i64, Discount>,
    // None until the first successful refresh
    loaded_at: Mutex<Option<Instant>>,
    ttl: Duration,
    stats: CatalogStats,
}

impl DiscountCatalog {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            loaded_at: Mutex::new(None),
            ttl,
            stats: CatalogStats::default(),
        }
    }

    fn is_fresh(&self) -> bool {
        let loaded_at = *self.loaded_at.lock();
        loaded_at.map_or(false, |loaded| loaded.elapsed() <= self.ttl)
    }

    // Replace the whole catalog; discounts removed on the backend disappear here too
    pub fn store(&self, discounts: Vec<Discount>) {
        self.entries.clear();
        for discount in discounts {
            self.entries.insert(discount.id, discount);
        }
        *self.loaded_at.lock() = Some(Instant::now());
    }

    // Cached entries in id order, or None when the catalog is empty or stale
    pub fn cached(&self) -> Option<Vec<Discount>> {
        if !self.is_fresh() {
            if self.loaded_at.lock().is_some() {
                self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
            }
            self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
            return None;
        }

        self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
        let mut discounts: Vec<Discount> = self.entries.iter().map(|e| e.value().clone()).collect();
        discounts.sort_by_key(|d| d.id);
        Some(discounts)
    }

    pub async fn get_or_fetch<A>(&self, api: &A) -> Result<Vec<Discount>, ApiError>
    where
        A: FrontDeskApi + ?Sized,
    {
        if let Some(discounts) = self.cached() {
            return Ok(discounts);
        }

        debug!("Discount catalog stale, fetching from backend");
        let discounts = api.discounts().await?;
        self.stats.refresh_count.fetch_add(1, Ordering::SeqCst);
        self.store(discounts.clone());
        Ok(discounts)
    }

    pub fn find(&self, discount_id: i64) -> Option<Discount> {
        if !self.is_fresh() {
            return None;
        }
        self.entries.get(&discount_id).map(|e| e.value().clone())
    }

    // Drop everything; returns how many entries were removed
    pub fn invalidate(&self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        *self.loaded_at.lock() = None;
        count
    }

    pub fn stats(&self) -> CatalogStatsReport {
        CatalogStatsReport {
            items_count: self.entries.len(),
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            refresh_count: self.stats.refresh_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
        }
    }
}
