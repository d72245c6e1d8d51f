use std::future::Future;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

/// One cache line for a single external source.
///
/// A fresh entry is served without calling the fetcher. A stale or missing
/// entry triggers the fetcher; on success the entry is overwritten, on
/// failure the last good value keeps being served. Only a failure with
/// nothing ever cached yields `None`.
pub struct SourceCache<T> {
    name: &'static str,
    ttl: Duration,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> SourceCache<T> {
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Some(entry) = self.entry.read().await.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                tracing::debug!("{}: serving fresh cache entry", self.name);
                return Some(entry.value.clone());
            }
        }

        // Lock is not held across the fetch; concurrent misses may race and
        // both hit the upstream, last writer wins.
        match fetch().await {
            Ok(value) => {
                let mut slot = self.entry.write().await;
                *slot = Some(Entry {
                    value: value.clone(),
                    fetched_at: Instant::now(),
                });
                Some(value)
            }
            Err(e) => {
                let slot = self.entry.read().await;
                match slot.as_ref() {
                    Some(entry) => {
                        tracing::warn!("{}: refresh failed, serving stale value: {:#}", self.name, e);
                        Some(entry.value.clone())
                    }
                    None => {
                        tracing::warn!("{}: fetch failed with nothing cached: {:#}", self.name, e);
                        None
                    }
                }
            }
        }
    }
}
