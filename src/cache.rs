//! # Cache
//! Boundary to the shared baseline cache (Redis or similar in production).
//!
//! The engine talks to `dyn SharedCache` and treats every failure as a
//! miss or a no-op, so a flaky cache backend can never take scoring down.
//! `MemoryCache` is the in-process implementation used by tests and
//! single-node deployments; `NullCache` disables the shared tier entirely.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::clock::{Clock, SystemClock};

/// Canonical cache key for a category baseline.
pub fn cache_key(namespace: &str, category: &str) -> String {
    format!("{namespace}:{category}")
}

/// Shared cache with TTL semantics. Values are opaque strings (the engine
/// stores JSON-serialized baselines).
#[async_trait]
pub trait SharedCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()>;
}

/// No shared tier: every get misses, every set is accepted and dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

#[async_trait]
impl SharedCache for NullCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl_secs: u64) -> Result<()> {
        Ok(())
    }
}

/// In-process TTL cache. Time comes from the injected clock so tests can
/// expire entries without sleeping.
pub struct MemoryCache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Entry>>,
}

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let entries = self.entries.lock().expect("memory cache mutex poisoned");
        entries.values().filter(|e| e.expires_at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SharedCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("memory cache mutex poisoned");
        match entries.get(key) {
            Some(e) if e.expires_at > now => Ok(Some(e.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()> {
        let now = self.clock.now();
        let expires_at = now + Duration::seconds(ttl_secs as i64);
        let mut entries = self.entries.lock().expect("memory cache mutex poisoned");
        // Light housekeeping while we hold the lock anyway.
        entries.retain(|_, e| e.expires_at > now);
        entries.insert(key.to_owned(), Entry { value, expires_at });
        Ok(())
    }
}
