//! Explicit TTL caches with a dirty flag and flush-on-close.
//!
//! Caches are plain values owned by whoever builds the runtime handle, never
//! process globals. Readers take a shared lock; a write marks the cache dirty
//! and the next [`TtlCache::flush`] hands a snapshot to a [`CacheSink`].

use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tailgrid_core::ContainerInfo;
use tracing::{debug, warn};

use crate::error::{ActionError, RuntimeError};
use crate::runtime::ContainerRuntime;
use crate::types::{ContainerAction, LogByteStream, LogRequest};

/// Receives cache snapshots on flush.
pub trait CacheSink<K, V>: Send + Sync {
    fn persist(&self, entries: &[(K, V)]);
}

/// Discards snapshots.
pub struct NullSink;

impl<K, V> CacheSink<K, V> for NullSink {
    fn persist(&self, _entries: &[(K, V)]) {}
}

/// Writes snapshots as pretty JSON to a file.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl<K, V> CacheSink<K, V> for JsonFileSink
where
    K: Serialize + Send + Sync,
    V: Serialize + Send + Sync,
{
    fn persist(&self, entries: &[(K, V)]) {
        let body = match serde_json::to_vec_pretty(entries) {
            Ok(body) => body,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "cache snapshot encode failed");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, body) {
            warn!(path = %self.path.display(), error = %err, "cache snapshot write failed");
        }
    }
}

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, Entry<V>>>,
    dirty: AtomicBool,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            dirty: AtomicBool::new(false),
        }
    }

    /// Fresh value for `key`; expired entries read as missing.
    pub fn get(&self, key: &K) -> Option<V> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
        self.dirty.store(true, Ordering::Release);
    }

    pub fn invalidate(&self, key: &K) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if entries.remove(key).is_some() {
            self.dirty.store(true, Ordering::Release);
        }
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Hand every entry (expired included) to `sink` if anything changed.
    ///
    /// Returns whether a snapshot was written.
    pub fn flush(&self, sink: &dyn CacheSink<K, V>) -> bool {
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return false;
        }
        let snapshot: Vec<(K, V)> = {
            let entries = match self.entries.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            entries
                .iter()
                .map(|(key, entry)| (key.clone(), entry.value.clone()))
                .collect()
        };
        sink.persist(&snapshot);
        true
    }

    /// Final flush when the owning session ends.
    pub fn close(self, sink: &dyn CacheSink<K, V>) -> bool {
        self.flush(sink)
    }
}

const LISTING_KEY: &str = "containers";

/// Runtime wrapper that shares one container listing across callers for a
/// short TTL, so panes reconnecting together issue one list call.
pub struct CachedRuntime {
    inner: Arc<dyn ContainerRuntime>,
    listing: TtlCache<&'static str, Vec<ContainerInfo>>,
}

impl CachedRuntime {
    pub fn new(inner: Arc<dyn ContainerRuntime>, ttl: Duration) -> Self {
        Self {
            inner,
            listing: TtlCache::new(ttl),
        }
    }

    /// Flush the listing cache to `sink`; called when the viewer session closes.
    pub fn flush(&self, sink: &dyn CacheSink<&'static str, Vec<ContainerInfo>>) -> bool {
        self.listing.flush(sink)
    }
}

#[async_trait]
impl ContainerRuntime for CachedRuntime {
    async fn open_log_stream(
        &self,
        container: &ContainerInfo,
        request: LogRequest,
    ) -> Result<LogByteStream, RuntimeError> {
        self.inner.open_log_stream(container, request).await
    }

    async fn list_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeError> {
        if let Some(cached) = self.listing.get(&LISTING_KEY) {
            debug!(count = cached.len(), "container listing served from cache");
            return Ok(cached);
        }
        self.refresh_containers().await
    }

    async fn refresh_containers(&self) -> Result<Vec<ContainerInfo>, RuntimeError> {
        let listed = self.inner.refresh_containers().await?;
        self.listing.insert(LISTING_KEY, listed.clone());
        Ok(listed)
    }

    async fn perform(
        &self,
        action: ContainerAction,
        container: &ContainerInfo,
    ) -> Result<Vec<String>, ActionError> {
        let result = self.inner.perform(action, container).await;
        // Actions change what is running.
        self.listing.invalidate(&LISTING_KEY);
        result
    }
}
