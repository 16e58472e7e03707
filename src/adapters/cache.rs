//! Time-bounded caching around the data and universe ports.
//!
//! Entries are reused while younger than the TTL. Only successful lookups are
//! stored, so a failed retrieval is retried on the next request.

use crate::domain::error::SwingscanError;
use crate::domain::ohlcv::{BarSeries, SeriesRequest};
use crate::ports::data_port::DataPort;
use crate::ports::universe_port::UniversePort;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some((stored, value)) if stored.elapsed() < self.ttl => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores `value` and drops every entry that has outlived the TTL.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        entries.insert(key, (Instant::now(), value));
    }

    /// Cached value for `key`, or the result of `load` (stored only on success).
    pub fn get_or_try_insert<E>(
        &self,
        key: K,
        load: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = load()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bars keyed by (symbol, period, interval).
pub struct CachedDataPort<P> {
    inner: P,
    cache: TtlCache<(String, SeriesRequest), BarSeries>,
}

impl<P: DataPort> CachedDataPort<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }
}

impl<P: DataPort> DataPort for CachedDataPort<P> {
    fn fetch_bars(
        &self,
        symbol: &str,
        request: SeriesRequest,
    ) -> Result<BarSeries, SwingscanError> {
        let key = (symbol.to_string(), request);
        if let Some(series) = self.cache.get(&key) {
            debug!(symbol, request = %request, "bar cache hit");
            return Ok(series);
        }
        let series = self.inner.fetch_bars(symbol, request)?;
        self.cache.insert(key, series.clone());
        Ok(series)
    }
}

/// Universes keyed by market name.
pub struct CachedUniversePort<P> {
    inner: P,
    cache: TtlCache<String, Vec<String>>,
}

impl<P: UniversePort> CachedUniversePort<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: TtlCache::new(ttl),
        }
    }
}

impl<P: UniversePort> UniversePort for CachedUniversePort<P> {
    fn resolve_universe(&self, market: &str) -> Result<Vec<String>, SwingscanError> {
        self.cache.get_or_try_insert(market.to_string(), || {
            self.inner.resolve_universe(market)
        })
    }

    fn list_markets(&self) -> Result<Vec<String>, SwingscanError> {
        self.inner.list_markets()
    }
}
