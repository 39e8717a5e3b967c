//! In-memory image cache keyed by URL and bounded by total byte cost.

use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::api::RecipeApi;
use crate::error::ClientResult;

struct Entry {
    data: Bytes,
    cost: usize,
    last_used: u64,
}

/// Least-recently-used map with a byte budget.
struct CostLru {
    capacity: usize,
    total: usize,
    clock: u64,
    entries: HashMap<String, Entry>,
    recency: BTreeMap<u64, String>,
}

impl CostLru {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            total: 0,
            clock: 0,
            entries: HashMap::new(),
            recency: BTreeMap::new(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn get(&mut self, url: &str) -> Option<Bytes> {
        let now = self.tick();
        let entry = self.entries.get_mut(url)?;
        self.recency.remove(&entry.last_used);
        entry.last_used = now;
        self.recency.insert(now, url.to_string());
        Some(entry.data.clone())
    }

    /// Returns how many entries were evicted to make room.
    fn put(&mut self, url: &str, data: Bytes, cost: usize) -> usize {
        self.remove(url);
        if cost > self.capacity {
            return 0;
        }

        let mut evicted = 0;
        while self.total + cost > self.capacity {
            let Some((_, oldest)) = self.recency.pop_first() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&oldest) {
                self.total -= entry.cost;
                evicted += 1;
            }
        }

        let now = self.tick();
        self.recency.insert(now, url.to_string());
        self.entries.insert(
            url.to_string(),
            Entry {
                data,
                cost,
                last_used: now,
            },
        );
        self.total += cost;
        evicted
    }

    fn remove(&mut self, url: &str) {
        if let Some(entry) = self.entries.remove(url) {
            self.recency.remove(&entry.last_used);
            self.total -= entry.cost;
        }
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.total = 0;
    }
}

pub struct ImageCache<A: RecipeApi> {
    api: Arc<A>,
    lru: Mutex<CostLru>,
}

impl<A: RecipeApi> ImageCache<A> {
    pub fn new(api: Arc<A>, capacity_bytes: usize) -> Self {
        Self {
            api,
            lru: Mutex::new(CostLru::new(capacity_bytes)),
        }
    }

    /// Cached bytes for `url`, downloading on a miss. `None` on any failure;
    /// callers fall back to a placeholder.
    pub async fn load(&self, url: &str) -> Option<Bytes> {
        match self.try_load(url).await {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::debug!(url, error = %e, "image load failed");
                None
            }
        }
    }

    /// Like [`load`](Self::load) but keeps the failure.
    pub async fn try_load(&self, url: &str) -> ClientResult<Bytes> {
        let cached = self.lock().get(url);
        if let Some(data) = cached {
            tracing::trace!(url, "image cache hit");
            return Ok(data);
        }

        let image = self.api.download_image(url).await?;
        let cost = image.cost();
        let evicted = self.lock().put(&image.url, image.data.clone(), cost);
        if evicted > 0 {
            tracing::debug!(url, evicted, "evicted images to stay within budget");
        }

        Ok(image.data)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CostLru> {
        // A panic mid-update leaves only stale cache state behind
        self.lru.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().entries.contains_key(url)
    }

    pub fn total_cost(&self) -> usize {
        self.lock().total
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApi, MockFailure, Op};
    use reqwest::StatusCode;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn png_of_len(len: usize) -> Vec<u8> {
        let mut data = PNG.to_vec();
        data.resize(len.max(PNG.len()), 0);
        data
    }

    #[tokio::test]
    async fn second_load_is_served_from_cache() {
        let api = Arc::new(MockApi::new());
        api.set_image("https://img/a.png", png_of_len(32));
        let cache = ImageCache::new(api.clone(), 1024);

        let first = cache.load("https://img/a.png").await.unwrap();
        let second = cache.load("https://img/a.png").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.calls(Op::DownloadImage), 1);
        assert_eq!(cache.total_cost(), 32);
    }

    #[tokio::test]
    async fn failed_download_returns_none_and_caches_nothing() {
        let api = Arc::new(MockApi::new());
        api.fail(
            Op::DownloadImage,
            MockFailure::Response(StatusCode::INTERNAL_SERVER_ERROR),
        );
        let cache = ImageCache::new(api.clone(), 1024);

        assert!(cache.load("https://img/a.png").await.is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn non_image_body_is_decoding_error() {
        let api = Arc::new(MockApi::new());
        api.set_image("https://img/page", b"<html></html>".to_vec());
        let cache = ImageCache::new(api, 1024);

        let err = cache.try_load("https://img/page").await.unwrap_err();
        assert!(matches!(err, crate::error::ClientError::Decoding));
    }

    #[tokio::test]
    async fn least_recently_used_is_evicted_first() {
        let api = Arc::new(MockApi::new());
        for name in ["a", "b", "c"] {
            api.set_image(&format!("https://img/{name}"), png_of_len(40));
        }
        let cache = ImageCache::new(api.clone(), 100);

        cache.load("https://img/a").await.unwrap();
        cache.load("https://img/b").await.unwrap();
        // Touch a so b becomes the oldest
        cache.load("https://img/a").await.unwrap();
        cache.load("https://img/c").await.unwrap();

        assert!(cache.contains("https://img/a"));
        assert!(!cache.contains("https://img/b"));
        assert!(cache.contains("https://img/c"));
        assert_eq!(cache.total_cost(), 80);
    }

    #[tokio::test]
    async fn oversized_image_is_returned_but_not_kept() {
        let api = Arc::new(MockApi::new());
        api.set_image("https://img/huge", png_of_len(500));
        let cache = ImageCache::new(api.clone(), 100);

        assert_eq!(cache.load("https://img/huge").await.unwrap().len(), 500);
        assert!(cache.is_empty());
        assert_eq!(cache.total_cost(), 0);
    }

    #[test]
    fn replacing_an_entry_recounts_cost() {
        let mut lru = CostLru::new(100);
        lru.put("k", Bytes::from_static(b"aaaa"), 4);
        lru.put("k", Bytes::from_static(b"aaaaaaaa"), 8);
        assert_eq!(lru.total, 8);
        assert_eq!(lru.entries.len(), 1);
        assert_eq!(lru.recency.len(), 1);
    }

    #[test]
    fn clear_resets_cost() {
        let mut lru = CostLru::new(100);
        lru.put("k", Bytes::from_static(b"aaaa"), 4);
        lru.clear();
        assert_eq!(lru.total, 0);
        assert!(lru.get("k").is_none());
    }
}
