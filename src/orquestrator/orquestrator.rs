use menva::read_default_file;
use metrics_exporter_prometheus::PrometheusBuilder;
use sentry::ClientInitGuard;
use tokio::task::JoinSet;

use crate::{
    config::SharedConfig,
    service::{Service, ServiceExt},
    state::SharedState,
};

use super::tracing::init_tracing;

#[derive(Default)]
pub struct ServicesOrquestrator {
    config: SharedConfig,
    services: Vec<Service>,
    run_migrations: bool,
    install_metrics: bool,
    sentry: Option<ClientInitGuard>,
}

impl ServicesOrquestrator {
    pub fn load_environment_variables(self) -> Self {
        read_default_file();
        self
    }

    pub fn set_config_from_env(mut self) -> Self {
        self.config = SharedConfig::from_env();
        self
    }

    pub fn enable_migrations(mut self) -> Self {
        self.run_migrations = true;
        self
    }

    /// Records counters in a Prometheus registry served at `/metrics`.
    pub fn enable_metrics(mut self) -> Self {
        self.install_metrics = true;
        self
    }

    pub fn init_tracing(mut self) -> Self {
        self.sentry = init_tracing(&self.config.env, self.config.sentry_token());
        self
    }

    pub fn add_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }

    async fn start_services(self) -> Result<(), std::io::Error> {
        let _sentry = self.sentry;
        let mut state = SharedState::new(&self.config).map_err(std::io::Error::other)?;

        if self.install_metrics {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(std::io::Error::other)?;
            state = state.with_metrics(handle);
        }

        if self.run_migrations {
            state
                .database()
                .run_migrations()
                .await
                .map_err(std::io::Error::other)?;
            tracing::info!("migrations applied");
        }

        let mut set = JoinSet::new();
        for mut service in self.services {
            service.set_up(state.clone()).await;

            set.spawn(service.run());
        }

        for result in set.join_all().await {
            if let Err(error) = result {
                tracing::error!(%error, "service stopped with an error");
                return Err(error);
            }
        }
        Ok(())
    }

    pub fn run(self) -> Result<(), std::io::Error> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .worker_threads(self.config.worker_threads)
            .max_blocking_threads(self.config.max_blocking_threads)
            .build()?
            .block_on(self.start_services())
    }
}
