use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use cookie::{time::Duration, Cookie, SameSite};

use crate::{
    config::WebsiteConfig,
    errors::AppError,
    http::is_safe_next,
    log_and_wrap_custom_internal,
    models::User,
    sessions::Session,
    state::WebsiteState,
    website::html::FormErrors,
};

use super::forms::{LoginForm, SignupForm};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(AppError::ErrorHashingPassword)?
        .to_string())
}

pub fn verify_password(raw_password: &str, db_password: &str) -> Result<(), AppError> {
    let parsed_hash = PasswordHash::new(db_password).map_err(AppError::ErrorHashingPassword)?;
    Argon2::default()
        .verify_password(raw_password.as_bytes(), &parsed_hash)
        .map_err(AppError::WrongPassword)
}

/// Where to go once logged in: a safe `next`, or the configured default.
pub fn login_redirect_target<'a>(config: &'a WebsiteConfig, next: Option<&'a str>) -> &'a str {
    match next {
        Some(next) if is_safe_next(next) => next,
        _ => &config.login_redirect_to,
    }
}

/// The outcome of a submitted auth form: either a logged in user with the
/// signed cookie value, or the form back with its errors.
pub enum Ingress<F> {
    LoggedIn { user: User, cookie_value: String },
    Invalid(F),
}

pub async fn handle_login(state: &WebsiteState, mut form: LoginForm) -> Result<Ingress<LoginForm>, AppError> {
    form.normalize();
    if let Err(errors) = form.check() {
        form.errors = errors;
        return Ok(Ingress::Invalid(form));
    }

    let user = User::find_by_username_with_password(state.database(), &form.username).await?;
    let user = match user {
        Some(user) => match verify_password(&form.password, &user.password) {
            Ok(()) => user.user,
            Err(AppError::WrongPassword(_)) => return Ok(Ingress::Invalid(form.rejected())),
            Err(error) => return Err(error),
        },
        None => return Ok(Ingress::Invalid(form.rejected())),
    };

    let config = state.config();
    let (_, cookie_value) = state
        .sessions()
        .create_session(&user, config.session_expiration, &config.session_key)
        .await?;
    tracing::info!(user = user.id, "user logged in");
    Ok(Ingress::LoggedIn { user, cookie_value })
}

pub async fn handle_signup(state: &WebsiteState, mut form: SignupForm) -> Result<Ingress<SignupForm>, AppError> {
    form.normalize();
    if let Err(errors) = form.check() {
        form.errors = errors;
        return Ok(Ingress::Invalid(form));
    }

    let password = hash_password(&form.password)?;
    let user = match User::create(state.database(), &form.username, &password).await {
        Ok(user) => user,
        Err(AppError::CustomBadRequest(message)) => {
            let mut errors = FormErrors::default();
            errors.add("username", message);
            form.errors = errors;
            return Ok(Ingress::Invalid(form));
        }
        Err(error) => return Err(error),
    };

    let config = state.config();
    let (_, cookie_value) = state
        .sessions()
        .create_session(&user, config.session_expiration, &config.session_key)
        .await?;
    tracing::info!(user = user.id, "user signed up");
    Ok(Ingress::LoggedIn { user, cookie_value })
}

pub async fn handle_logout(state: &WebsiteState, session: &Session) -> Result<(), AppError> {
    state.sessions().delete_session(session).await
}

pub fn session_cookie<'a>(config: &'a WebsiteConfig, value: String) -> Cookie<'a> {
    Cookie::build((config.session_cookie_name.as_str(), value))
        .domain(config.domain())
        .path("/")
        .max_age(Duration::days(config.session_expiration))
        .secure(config.secure_cookies)
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn expired_session_cookie(config: &WebsiteConfig) -> Cookie<'_> {
    Cookie::build((config.session_cookie_name.as_str(), ""))
        .domain(config.domain())
        .path("/")
        .max_age(Duration::ZERO)
        .secure(config.secure_cookies)
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn append_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) -> Result<(), AppError> {
    headers.append(
        SET_COOKIE,
        HeaderValue::from_bytes(cookie.encoded().to_string().as_bytes())
            .map_err(|e| log_and_wrap_custom_internal!(e))?,
    );
    Ok(())
}

pub fn set_security_headers(headers: &mut HeaderMap) {
    // Prevent MIME type sniffing.
    headers.insert(
        "X-Content-Type-Options",
        HeaderValue::from_static("nosniff"),
    );

    headers.insert(
        "Content-Security-Policy",
        HeaderValue::from_static("frame-ancestors 'none'"),
    );

    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AppError::WrongPassword(_))
        ));
    }

    #[test]
    fn test_login_redirect_target() {
        let config = WebsiteConfig::stub();
        assert_eq!(login_redirect_target(&config, Some("/create")), "/create");
        assert_eq!(login_redirect_target(&config, Some("https://evil.example")), "/");
        assert_eq!(login_redirect_target(&config, None), "/");
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = WebsiteConfig::stub();
        let cookie = session_cookie(&config, "abc.def".into()).to_string();
        assert!(cookie.starts_with("session_id=abc.def"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
    }
}
