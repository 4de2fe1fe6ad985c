use moka::sync::Cache;
use std::time::Duration;

/// 带 TTL 和容量上限的本地缓存；写操作方负责显式失效
#[derive(Debug)]
pub struct CacheService<T: Clone + Send + Sync + 'static> {
    cache: Cache<String, T>,
}

impl<T: Clone + Send + Sync + 'static> CacheService<T> {
    pub fn new(ttl_secs: u64, max_capacity: u64) -> Self {
        let cache = Cache::builder().time_to_live(Duration::from_secs(ttl_secs)).max_capacity(max_capacity).build();
        CacheService { cache }
    }

    pub fn insert(&self, key: impl Into<String>, value: T) {
        self.cache.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.cache.get(key)
    }

    pub fn remove(&self, key: &str) {
        self.cache.invalidate(key);
    }

    /// 清除所有缓存
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }
}
