pub mod about;
pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod models;
pub mod orquestrator;
pub mod pagination;
pub mod posts;
pub mod service;
pub mod sessions;
pub mod state;
pub mod utils;
pub mod website;

use axum::Router;

use state::WebsiteState;

/// Every page of the site: posts, about pages and authentication.
pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .merge(posts::routes(state.clone()))
        .merge(about::routes(state.clone()))
        .merge(auth::routes(state))
}
