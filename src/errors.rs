use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::website::HtmlError;

#[derive(Debug)]
pub enum AppError {
    DoesNotExist,
    WrongPassword(argon2::password_hash::Error),
    ErrorHashingPassword(argon2::password_hash::Error),
    TemplateError(askama::Error),
    Multipart(axum::extract::multipart::MultipartError),
    CustomBadRequest(String),
    CustomInternal(String),
}

impl AppError {
    pub fn custom_internal(message: &str) -> Self {
        Self::CustomInternal(message.to_owned())
    }

    pub fn custom_bad_request(message: &str) -> Self {
        Self::CustomBadRequest(message.to_owned())
    }

    pub fn get_status_code_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::DoesNotExist => (StatusCode::NOT_FOUND, "Not found".to_owned()),
            Self::WrongPassword(_) => (
                StatusCode::UNAUTHORIZED,
                "Wrong username or password".to_owned(),
            ),
            Self::Multipart(err) => (err.status(), err.body_text()),
            Self::CustomBadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::ErrorHashingPassword(_) | Self::TemplateError(_) | Self::CustomInternal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Sorry no sorry, something wrong happened".to_owned(),
            ),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DoesNotExist => write!(f, "the requested entity does not exist"),
            Self::WrongPassword(e) => write!(f, "wrong password: {}", e),
            Self::ErrorHashingPassword(e) => write!(f, "error hashing password: {}", e),
            Self::TemplateError(e) => write!(f, "template error: {}", e),
            Self::Multipart(e) => write!(f, "multipart error: {}", e),
            Self::CustomBadRequest(message) => write!(f, "bad request: {}", message),
            Self::CustomInternal(message) => write!(f, "internal error: {}", message),
        }
    }
}

impl std::error::Error for AppError {}

impl From<askama::Error> for AppError {
    fn from(error: askama::Error) -> Self {
        Self::TemplateError(error)
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(error: axum::extract::multipart::MultipartError) -> Self {
        Self::Multipart(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        HtmlError::from(self).into_response()
    }
}

/// Logs the error with its call site and turns it into an internal [`AppError`].
#[macro_export]
macro_rules! log_and_wrap_custom_internal {
    ($e:expr) => {{
        let error = $e;
        ::tracing::error!(file = file!(), line = line!(), error = %error, "internal error");
        $crate::errors::AppError::custom_internal(&error.to_string())
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::DoesNotExist.get_status_code_and_message().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::custom_bad_request("nope")
                .get_status_code_and_message()
                .0,
            StatusCode::BAD_REQUEST
        );
        let (status, message) = AppError::custom_internal("db is gone").get_status_code_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!message.contains("db is gone"));
    }

    #[test]
    fn test_macro_wraps_as_internal() {
        let error = log_and_wrap_custom_internal!(std::io::Error::other("disk full"));
        assert!(matches!(error, AppError::CustomInternal(m) if m == "disk full"));
    }
}
