// src/source/cache.rs

use async_trait::async_trait;
use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

use super::{TableKind, TableSource};
use crate::error::Result;
use crate::table::MetricTable;

struct Entry {
    table: Arc<MetricTable>,
    loaded_at: Instant,
}

/// Memoized tables keyed by table name.
///
/// `ttl = None` keeps entries for the life of the process; otherwise an entry
/// older than `ttl` is reloaded on next access. Failed loads are not stored.
pub struct TableCache {
    ttl: Option<Duration>,
    entries: Mutex<HashMap<String, Entry>>,
}

impl TableCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn is_fresh(&self, entry: &Entry, now: Instant) -> bool {
        match self.ttl {
            None => true,
            Some(ttl) => now.saturating_duration_since(entry.loaded_at) < ttl,
        }
    }

    /// Cached table for `name`, if present and not expired.
    pub async fn get(&self, name: &str) -> Option<Arc<MetricTable>> {
        let mut guard = self.entries.lock().await;
        let now = Instant::now();
        match guard.get(name) {
            Some(entry) if self.is_fresh(entry, now) => Some(Arc::clone(&entry.table)),
            Some(_) => {
                guard.remove(name);
                None
            }
            None => None,
        }
    }

    /// Return the cached table or run `load` and remember its result.
    ///
    /// The map stays locked while `load` runs, so concurrent callers for any
    /// table wait for one load instead of issuing their own.
    pub async fn get_or_try_load<F, Fut>(&self, name: &str, load: F) -> Result<Arc<MetricTable>>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Arc<MetricTable>>> + Send,
    {
        let mut guard = self.entries.lock().await;
        if let Some(entry) = guard.get(name) {
            if self.is_fresh(entry, Instant::now()) {
                debug!(table = name, "cache hit");
                return Ok(Arc::clone(&entry.table));
            }
            debug!(table = name, "cache entry expired");
        }

        let table = load().await?;
        guard.insert(
            name.to_string(),
            Entry {
                table: Arc::clone(&table),
                loaded_at: Instant::now(),
            },
        );
        Ok(table)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// A `TableSource` that answers from a shared `TableCache` before asking `inner`.
pub struct CachedSource<S> {
    inner: S,
    cache: Arc<TableCache>,
}

impl<S: TableSource> CachedSource<S> {
    pub fn new(inner: S, cache: Arc<TableCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<TableCache> {
        &self.cache
    }
}

#[async_trait]
impl<S: TableSource> TableSource for CachedSource<S> {
    async fn load(&self, name: &str) -> Result<Arc<MetricTable>> {
        self.cache
            .get_or_try_load(name, || self.inner.load(name))
            .await
    }

    fn table_name(&self, kind: TableKind) -> &str {
        self.inner.table_name(kind)
    }

    fn describe(&self) -> String {
        match self.cache.ttl() {
            Some(ttl) => format!("{} (cached {}s)", self.inner.describe(), ttl.as_secs()),
            None => format!("{} (cached)", self.inner.describe()),
        }
    }
}
