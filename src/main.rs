use yatube::{orquestrator::ServicesOrquestrator, service::Service, sessions::purge_expired_sessions};

fn main() -> Result<(), std::io::Error> {
    ServicesOrquestrator::default()
        .load_environment_variables()
        .set_config_from_env()
        .init_tracing()
        .enable_metrics()
        .enable_migrations()
        .add_service(Service::website("WEB_", yatube::routes))
        .add_service(Service::background(purge_expired_sessions))
        .run()
}
