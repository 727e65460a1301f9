//! Short-lived cache for rendered page fragments.
//!
//! The cache is handed to the website state as a trait object, together with
//! the [`Clock`] it reads time from, so expiry can be driven by hand in tests.

use std::{
    fmt,
    future::Future,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use moka::sync::Cache;

use crate::errors::AppError;

/// Upper bound on stored fragments; moka evicts the least used past it.
const MAX_CACHED_PAGES: u64 = 1_000;

pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + *offset
    }
}

#[derive(Debug)]
pub enum CacheError {
    Unavailable(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "page cache unavailable: {}", reason),
        }
    }
}

impl std::error::Error for CacheError {}

pub trait PageCache: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Drops every entry; the next read of any key recomputes.
    fn clear(&self) -> Result<(), CacheError>;
}

pub type SharedPageCache = Arc<dyn PageCache>;

#[derive(Debug, Clone)]
struct CachedPage {
    content: String,
    expires_at: Instant,
}

/// In-process cache backed by moka. Moka bounds the size and drops stale
/// entries on its own schedule; freshness of a read is decided by the
/// injected [`Clock`].
pub struct MemoryPageCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Cache<String, CachedPage>,
}

impl MemoryPageCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let entries = Cache::builder()
            .max_capacity(MAX_CACHED_PAGES)
            .time_to_live(ttl)
            .build();
        Self {
            ttl,
            clock,
            entries,
        }
    }
}

impl fmt::Debug for MemoryPageCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPageCache")
            .field("ttl", &self.ttl)
            .field("clock", &self.clock)
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl PageCache for MemoryPageCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.now();
        match self.entries.get(key) {
            Some(page) if page.expires_at > now => Ok(Some(page.content)),
            Some(_) => {
                self.entries.invalidate(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), CacheError> {
        let expires_at = self.clock.now() + self.ttl;
        self.entries.insert(
            key.to_owned(),
            CachedPage {
                content: value,
                expires_at,
            },
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.invalidate_all();
        Ok(())
    }
}

/// Returns the cached fragment for `key`, or renders, stores and returns it.
/// A failing cache never fails the request: the fragment is rendered directly.
pub async fn cached_fragment<F, Fut>(
    cache: &dyn PageCache,
    key: &str,
    render: F,
) -> Result<String, AppError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, AppError>>,
{
    match cache.get(key) {
        Ok(Some(content)) => {
            metrics::counter!("page_cache_hits_total").increment(1);
            tracing::debug!(key, "page cache hit");
            return Ok(content);
        }
        Ok(None) => {
            metrics::counter!("page_cache_misses_total").increment(1);
        }
        Err(error) => {
            metrics::counter!("page_cache_failures_total").increment(1);
            tracing::warn!(key, %error, "page cache lookup failed, rendering directly");
        }
    }

    let content = render().await?;
    if let Err(error) = cache.set(key, content.clone()) {
        metrics::counter!("page_cache_failures_total").increment(1);
        tracing::warn!(key, %error, "could not store page in cache");
    }
    Ok(content)
}
