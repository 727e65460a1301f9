use axum::{
    body::Body,
    extract::{DefaultBodyLimit, OriginalUri, State},
    http::{header::CONTENT_TYPE, HeaderValue, Request, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tower::{
    util::{MapRequest, MapRequestLayer},
    Layer, ServiceBuilder,
};
use tower_http::{
    normalize_path::{NormalizePath, NormalizePathLayer},
    request_id::{MakeRequestId, RequestId},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::{
        DefaultOnBodyChunk, DefaultOnEos, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse,
        TraceLayer,
    },
    LatencyUnit, ServiceBuilderExt,
};
use tracing::Level;

use crate::{auth::sessions_middleware, state::WebsiteState, website::not_found};

/// Wraps the page routes with sessions, media, metrics and the shared
/// middleware stack.
pub fn get_router(state: WebsiteState, routes: Router<WebsiteState>) -> Router {
    let config = state.config();
    let sensitive_headers: Arc<[_]> = vec![axum::http::header::COOKIE].into();
    // Build our middleware stack
    let middleware = ServiceBuilder::new()
        .layer(SetSensitiveRequestHeadersLayer::from_shared(
            sensitive_headers.clone(),
        ))
        .set_x_request_id(MakeCounterRequestId::default())
        // Add high level tracing/logging to all requests
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new())
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                )
                .on_body_chunk(DefaultOnBodyChunk::new())
                .on_eos(DefaultOnEos::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::INFO)),
        )
        .sensitive_response_headers(sensitive_headers)
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .compression()
        .propagate_x_request_id()
        // Set a `Content-Type` if there isn't one already.
        .insert_response_header_if_not_present(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        );

    Router::new()
        .merge(routes)
        .route("/metrics", get(render_metrics))
        .nest_service("/media", ServeDir::new(config.media_root()))
        .fallback(not_found)
        .layer(from_fn_with_state(state.clone(), sessions_middleware))
        .layer(DefaultBodyLimit::max(config.max_upload_size))
        .layer(middleware)
        .with_state(state)
}

pub type WebsiteApp = MapRequest<NormalizePath<Router>, fn(Request<Body>) -> Request<Body>>;

/// Trailing slashes are trimmed before routing, so `/create/` and `/create`
/// reach the same handler. This has to wrap the router from the outside: a
/// layer added with `Router::layer` only runs once a route has matched.
///
/// The URI as the client sent it is kept as [`OriginalUri`]; the router only
/// records its own copy when none is present.
pub fn into_service(router: Router) -> WebsiteApp {
    MapRequestLayer::new(keep_original_uri as fn(Request<Body>) -> Request<Body>)
        .layer(NormalizePathLayer::trim_trailing_slash().layer(router))
}

fn keep_original_uri(mut request: Request<Body>) -> Request<Body> {
    let uri = request.uri().clone();
    request.extensions_mut().insert(OriginalUri(uri));
    request
}

async fn render_metrics(State(state): State<WebsiteState>) -> Response {
    match state.metrics() {
        Some(handle) => (
            [(CONTENT_TYPE, HeaderValue::from_static("text/plain; version=0.0.4"))],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Clone, Default)]
struct MakeCounterRequestId {
    counter: Arc<AtomicU64>,
}

impl MakeRequestId for MakeCounterRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        self.counter
            .fetch_add(1, Ordering::SeqCst)
            .to_string()
            .parse()
            .ok()
            .map(RequestId::new)
    }
}
