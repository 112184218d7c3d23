//! Bounded TTL caches for catalog, meta, and stream responses
//!
//! Three independently-expiring namespaces share one pair of process-wide
//! hit/miss counters. Stream entries expire fastest because resolved URLs
//! often carry short-lived signed tokens. The service is injected into the
//! provider facade and handlers rather than accessed as ambient state.

use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    Catalog,
    Meta,
    Stream,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub keys: u64,
}

#[derive(Clone)]
pub struct CacheService {
    catalog: Cache<String, Value>,
    meta: Cache<String, Value>,
    stream: Cache<String, Value>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl CacheService {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            catalog: Self::build_namespace(config.catalog_ttl_seconds, config),
            meta: Self::build_namespace(config.meta_ttl_seconds, config),
            stream: Self::build_namespace(config.stream_ttl_seconds, config),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    fn build_namespace(ttl_seconds: u64, config: &CacheConfig) -> Cache<String, Value> {
        Cache::builder()
            .max_capacity(config.max_entries_per_namespace)
            .time_to_live(Duration::from_secs(ttl_seconds.max(1)))
            .build()
    }

    fn namespace(&self, namespace: CacheNamespace) -> &Cache<String, Value> {
        match namespace {
            CacheNamespace::Catalog => &self.catalog,
            CacheNamespace::Meta => &self.meta,
            CacheNamespace::Stream => &self.stream,
        }
    }

    /// Look up a key, counting the outcome in the process-wide counters
    pub fn get(&self, namespace: CacheNamespace, key: &str) -> Option<Value> {
        match self.namespace(namespace).get(key) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn set(&self, namespace: CacheNamespace, key: &str, value: Value) {
        self.namespace(namespace).insert(key.to_string(), value);
    }

    /// Typed lookup for values stored via [`set_typed`](Self::set_typed)
    pub fn get_typed<T: serde::de::DeserializeOwned>(
        &self,
        namespace: CacheNamespace,
        key: &str,
    ) -> Option<T> {
        self.get(namespace, key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn set_typed<T: Serialize>(&self, namespace: CacheNamespace, key: &str, value: &T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.set(namespace, key, value);
        }
    }

    pub fn stats(&self) -> CacheStats {
        for cache in [&self.catalog, &self.meta, &self.stream] {
            cache.run_pending_tasks();
        }
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            keys: self.catalog.entry_count()
                + self.meta.entry_count()
                + self.stream.entry_count(),
        }
    }

    /// Empty every namespace and reset the hit/miss counters
    pub fn flush_all(&self) {
        for cache in [&self.catalog, &self.meta, &self.stream] {
            cache.invalidate_all();
            cache.run_pending_tasks();
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}
