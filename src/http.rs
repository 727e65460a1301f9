use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

/// A `302 Found` redirect. axum's `Redirect::to` answers `303`, which is not
/// what browsers or the login flow expect from these pages.
#[derive(Debug, Clone)]
pub struct Found(String);

impl Found {
    pub fn to(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn location(&self) -> &str {
        &self.0
    }
}

impl IntoResponse for Found {
    fn into_response(self) -> Response {
        match HeaderValue::try_from(self.0) {
            Ok(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
            Err(error) => {
                tracing::error!(%error, "redirect to an invalid location");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Builds `<login_url>?next=<path>`. The path is percent-encoded except for
/// `/`, so the query reads `?next=/create/`.
pub fn login_redirect(login_url: &str, next: &str) -> Found {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => Found::to(format!("{}?{}", login_url, query.replace("%2F", "/"))),
        Err(_) => Found::to(login_url),
    }
}

/// Only same-site absolute paths are followed after login.
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\")
}
