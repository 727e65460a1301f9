use std::{fmt, sync::Arc};

use axum::extract::FromRef;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::{
    cache::{Clock, MemoryPageCache, PageCache, SharedPageCache, SystemClock},
    config::{SharedConfig, WebsiteConfig},
    database::Database,
    errors::AppError,
    sessions::Sessions,
};

#[derive(Clone)]
pub struct SharedState {
    database: Database,
    metrics: Option<PrometheusHandle>,
}

impl fmt::Debug for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedState")
            .field("database", &self.database)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl SharedState {
    pub fn new(config: &SharedConfig) -> Result<Self, AppError> {
        Ok(Self {
            database: Database::new(&config.database_url)?,
            metrics: None,
        })
    }

    pub fn stub() -> Self {
        Self {
            database: Database::in_memory(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn metrics(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }
}

#[derive(Clone, FromRef, Debug)]
pub struct WebsiteState {
    config: WebsiteConfig,
    shared: SharedState,
    sessions: Sessions,
    page_cache: SharedPageCache,
}

impl WebsiteState {
    pub fn new(config: WebsiteConfig, shared: SharedState) -> Self {
        Self::with_clock(config, shared, Arc::new(SystemClock))
    }

    /// Same as [`WebsiteState::new`] but the page cache reads time from `clock`.
    pub fn with_clock(config: WebsiteConfig, shared: SharedState, clock: Arc<dyn Clock>) -> Self {
        let page_cache = Arc::new(MemoryPageCache::new(config.index_cache_ttl(), clock));
        Self {
            sessions: Sessions::new(shared.database().clone()),
            shared,
            config,
            page_cache,
        }
    }

    pub fn config(&self) -> &WebsiteConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub fn database(&self) -> &Database {
        &self.shared.database
    }

    pub fn page_cache(&self) -> &dyn PageCache {
        self.page_cache.as_ref()
    }

    pub fn metrics(&self) -> Option<&PrometheusHandle> {
        self.shared.metrics()
    }
}

impl FromRef<WebsiteState> for Database {
    fn from_ref(app_state: &WebsiteState) -> Database {
        app_state.shared.database.clone()
    }
}
