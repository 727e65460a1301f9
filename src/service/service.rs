use std::sync::Arc;

use axum::Router;
use futures::future::BoxFuture;
use tokio::{net::TcpListener, signal};

use crate::{
    cache::{Clock, SystemClock},
    config::WebsiteConfig,
    state::{SharedState, WebsiteState},
};

use super::{get_router, into_service};

type BackgroundJob = Box<dyn Fn(SharedState) -> BoxFuture<'static, Result<(), std::io::Error>> + Send + Sync>;

pub struct WebsiteService {
    env_prefix: String,
    config: Option<WebsiteConfig>,
    router_factory: fn(WebsiteState) -> Router<WebsiteState>,
    clock: Arc<dyn Clock>,
    state: Option<WebsiteState>,
}

impl WebsiteService {
    fn new(env_prefix: &str, router_factory: fn(WebsiteState) -> Router<WebsiteState>) -> Self {
        Self {
            env_prefix: env_prefix.to_owned(),
            config: None,
            router_factory,
            clock: Arc::new(SystemClock),
            state: None,
        }
    }

    pub fn router(&self) -> Option<Router> {
        self.state
            .clone()
            .map(|state| get_router(state.clone(), (self.router_factory)(state)))
    }
}

impl ServiceExt for WebsiteService {
    fn stub(self) -> Self {
        Self {
            env_prefix: self.env_prefix,
            config: Some(WebsiteConfig::stub()),
            router_factory: self.router_factory,
            clock: self.clock,
            state: None,
        }
    }

    /// Reads the `<prefix>*` environment variables unless the service was stubbed.
    async fn set_up(&mut self, shared: SharedState) {
        let config = self
            .config
            .get_or_insert_with(|| WebsiteConfig::from_env_with_prefix(&self.env_prefix))
            .clone();
        self.state = Some(WebsiteState::with_clock(config, shared, self.clock.clone()));
    }

    async fn run(self) -> Result<(), std::io::Error> {
        let router = self.router().ok_or_else(|| {
            std::io::Error::other("the website service was not set up before running")
        })?;
        let config = self.state.as_ref().map(WebsiteState::config).ok_or_else(|| {
            std::io::Error::other("the website service was not set up before running")
        })?;
        let listener = TcpListener::bind(config.socket_addr()).await?;
        config.print();
        axum::serve(
            listener,
            axum::ServiceExt::<axum::extract::Request>::into_make_service(into_service(router)),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

/// A job that runs next to the website for the whole life of the process.
pub struct BackgroundService {
    task: BackgroundJob,
    state: Option<SharedState>,
}

impl BackgroundService {
    fn new(task: fn(SharedState) -> BoxFuture<'static, Result<(), std::io::Error>>) -> Self {
        Self {
            task: Box::new(task),
            state: None,
        }
    }
}

impl ServiceExt for BackgroundService {
    fn stub(self) -> Self {
        Self {
            task: self.task,
            state: Some(SharedState::stub()),
        }
    }

    async fn set_up(&mut self, shared: SharedState) {
        self.state = Some(shared);
    }

    async fn run(self) -> Result<(), std::io::Error> {
        let state = self.state.ok_or_else(|| {
            std::io::Error::other("the background service was not set up before running")
        })?;
        (self.task)(state).await
    }
}

pub enum Service {
    Background(BackgroundService),
    Website(WebsiteService),
}

impl Service {
    pub fn website(
        env_prefix: &str,
        router_factory: fn(WebsiteState) -> Router<WebsiteState>,
    ) -> Self {
        Self::Website(WebsiteService::new(env_prefix, router_factory))
    }

    pub fn background(
        task: fn(SharedState) -> BoxFuture<'static, Result<(), std::io::Error>>,
    ) -> Self {
        Self::Background(BackgroundService::new(task))
    }

    /// Replaces the clock the website's page cache reads.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        match self {
            Self::Website(mut s) => {
                s.clock = clock;
                Self::Website(s)
            }
            other => other,
        }
    }

    pub fn router(&self) -> Option<Router> {
        match self {
            Self::Background(_) => None,
            Self::Website(s) => s.router(),
        }
    }

    pub fn website_state(&self) -> Option<&WebsiteState> {
        match self {
            Self::Background(_) => None,
            Self::Website(s) => s.state.as_ref(),
        }
    }
}

impl ServiceExt for Service {
    fn stub(self) -> Self {
        match self {
            Self::Background(s) => Self::Background(s.stub()),
            Self::Website(s) => Self::Website(s.stub()),
        }
    }

    async fn set_up(&mut self, shared: SharedState) {
        match self {
            Self::Background(s) => s.set_up(shared).await,
            Self::Website(s) => s.set_up(shared).await,
        }
    }

    async fn run(self) -> Result<(), std::io::Error> {
        match self {
            Self::Background(s) => s.run().await,
            Self::Website(s) => s.run().await,
        }
    }
}

pub trait ServiceExt {
    fn stub(self) -> Self;
    fn set_up(&mut self, _shared: SharedState) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }
    fn run(self) -> impl std::future::Future<Output = Result<(), std::io::Error>> + Send;
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
        tracing::info!("shutdown gracefully from ctrl-c");
        },
        _ = terminate => {
        tracing::info!("shutdown gracefully from signal");
        },
    }
}
