use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use super::Meta;
use crate::errors::AppError;

/// Declares a page that only renders its template, with fixed metadata.
#[macro_export]
macro_rules! create_view {
    ($name:ident, $fn_name:ident, $template_path:expr, {
        meta_title: $title:expr,
        meta_description: $description:expr,
        meta_url: $url:expr,
    }) => {
        #[derive(::askama::Template)]
        #[template(path = $template_path)]
        pub struct $name<'a> {
            meta: $crate::website::Meta<'a>,
            viewer: Option<String>,
        }

        pub async fn $fn_name(
            ::axum::Extension(session): ::axum::Extension<$crate::sessions::Session>,
        ) -> $crate::website::HtmlResult {
            let meta = $crate::website::Meta::new($title, $url).with_description($description);
            let template = $name {
                meta,
                viewer: session.username().map(str::to_owned),
            };
            $crate::website::template_to_response(&template)
        }
    };
}

#[derive(Template)]
#[template(path = "core/404.html")]
struct Error404<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
    path: &'a str,
}

#[derive(Template)]
#[template(path = "core/500.html")]
struct Error500<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
}

#[derive(Debug)]
pub struct HtmlError(StatusCode, String);

pub type HtmlResult = Result<Html<String>, HtmlError>;

pub fn template_to_response<T: Template>(tmpl: &T) -> HtmlResult {
    tmpl.render()
        .map(Html)
        .map_err(AppError::TemplateError)
        .map_err(HtmlError::from)
}

impl HtmlError {
    pub fn status(&self) -> StatusCode {
        self.0
    }

    pub fn message(&self) -> &str {
        &self.1
    }

    fn render(&self) -> Result<String, askama::Error> {
        match self.0 {
            StatusCode::NOT_FOUND => Error404 {
                meta: Meta::new("Page not found", "/"),
                viewer: None,
                path: "",
            }
            .render(),
            StatusCode::BAD_REQUEST => Error500 {
                meta: Meta::new("Bad request", "/").with_description(self.1.clone()),
                viewer: None,
            }
            .render(),
            _ => Error500 {
                meta: Meta::new("Server error", "/"),
                viewer: None,
            }
            .render(),
        }
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        match self.render() {
            Ok(page) => (self.0, Html(page)).into_response(),
            Err(error) => {
                tracing::error!(%error, "could not render the error page");
                (self.0, self.1).into_response()
            }
        }
    }
}

impl From<AppError> for HtmlError {
    fn from(error: AppError) -> Self {
        let (status, message) = error.get_status_code_and_message();
        if status.is_server_error() {
            tracing::error!(%error, "request failed");
        }
        HtmlError(status, message)
    }
}

/// Fallback for every path no route matches.
pub async fn not_found(uri: axum::http::Uri) -> Response {
    let page = Error404 {
        meta: Meta::new("Page not found", "/"),
        viewer: None,
        path: uri.path(),
    };
    match page.render() {
        Ok(page) => (StatusCode::NOT_FOUND, Html(page)).into_response(),
        Err(error) => HtmlError::from(AppError::TemplateError(error)).into_response(),
    }
}
