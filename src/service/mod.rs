mod router;
mod service;
mod tests;

pub use router::{get_router, into_service, WebsiteApp};
pub use service::{shutdown_signal, Service, ServiceExt};
pub use tests::StubService;
