use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension,
};
use axum_extra::{headers::Cookie, TypedHeader};

use super::services::set_security_headers;
use crate::{errors::AppError, http::login_redirect, sessions::Session, state::WebsiteState};

/// Guards a route: anonymous visitors are sent to the login page with the
/// requested path as `next`.
pub async fn login_required_middleware(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Response {
    if session.is_authenticated() {
        return next.run(request).await;
    }
    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| request.uri());
    let target = uri
        .path_and_query()
        .map(|p| p.as_str())
        .unwrap_or_else(|| uri.path());
    tracing::debug!(target, "anonymous request to a protected page");
    login_redirect(&state.config().login_url, target).into_response()
}

/// Resolves the session cookie, if any, and makes the [`Session`] available
/// to every handler. Visitors without a valid cookie get an anonymous one.
pub async fn sessions_middleware(
    State(state): State<WebsiteState>,
    cookie: Option<TypedHeader<Cookie>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let config = state.config();

    let current_session = match cookie
        .as_ref()
        .and_then(|TypedHeader(cookie)| cookie.get(&config.session_cookie_name))
    {
        Some(value) => {
            state
                .sessions()
                .find_session(value, &config.session_key)
                .await?
        }
        None => None,
    };
    let session = current_session.unwrap_or_else(Session::anonymous);

    request.extensions_mut().insert(session);

    let mut resp = next.run(request).await;
    set_security_headers(resp.headers_mut());

    Ok(resp)
}
