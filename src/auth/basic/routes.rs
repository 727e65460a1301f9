use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Form, Router,
};
use serde::Deserialize;

use super::{
    forms::{LoginForm, SignupForm},
    services::{
        append_cookie, expired_session_cookie, handle_login, handle_logout, handle_signup,
        login_redirect_target, session_cookie, Ingress,
    },
};
use crate::{
    errors::AppError,
    http::Found,
    sessions::Session,
    state::WebsiteState,
    website::{html::ToForm, template_to_response, HtmlResult, Meta},
};

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .route("/auth/signup", get(signup).post(post_signup))
        .route("/auth/login", get(login).post(post_login))
        .route("/auth/logout", get(logout))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct NextParams {
    next: Option<String>,
}

#[derive(Template)]
#[template(path = "users/login.html")]
struct LoginTemplate<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
    form: String,
}

#[derive(Template)]
#[template(path = "users/signup.html")]
struct SignupTemplate<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
    form: String,
}

#[derive(Template)]
#[template(path = "users/logged_out.html")]
struct LoggedOutTemplate<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
}

fn render_login(session: &Session, form: &LoginForm) -> HtmlResult {
    template_to_response(&LoginTemplate {
        meta: Meta::new("Log in", "/auth/login/"),
        viewer: session.username().map(str::to_owned),
        form: form.to_form().to_string(),
    })
}

fn render_signup(session: &Session, form: &SignupForm) -> HtmlResult {
    template_to_response(&SignupTemplate {
        meta: Meta::new("Sign up", "/auth/signup/"),
        viewer: session.username().map(str::to_owned),
        form: form.to_form().to_string(),
    })
}

/// Sends the freshly logged in user on, carrying the new session cookie.
fn logged_in(state: &WebsiteState, cookie_value: String, target: &str) -> Result<Response, AppError> {
    let mut response = Found::to(target).into_response();
    append_cookie(
        response.headers_mut(),
        &session_cookie(state.config(), cookie_value),
    )?;
    Ok(response)
}

pub async fn login(
    Extension(session): Extension<Session>,
    Query(params): Query<NextParams>,
) -> HtmlResult {
    render_login(&session, &LoginForm::with_next(params.next.as_deref()))
}

pub async fn post_login(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Query(params): Query<NextParams>,
    Form(mut form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if form.next().is_none() {
        form.next = params.next.unwrap_or_default();
    }
    let next = form.next().map(str::to_owned);

    match handle_login(&state, form).await? {
        Ingress::LoggedIn { cookie_value, .. } => {
            let target = login_redirect_target(state.config(), next.as_deref()).to_owned();
            logged_in(&state, cookie_value, &target)
        }
        Ingress::Invalid(form) => Ok(render_login(&session, &form).into_response()),
    }
}

pub async fn signup(Extension(session): Extension<Session>) -> HtmlResult {
    render_signup(&session, &SignupForm::default())
}

pub async fn post_signup(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    match handle_signup(&state, form).await? {
        Ingress::LoggedIn { cookie_value, .. } => {
            let target = state.config().login_redirect_to.clone();
            logged_in(&state, cookie_value, &target)
        }
        Ingress::Invalid(form) => Ok(render_signup(&session, &form).into_response()),
    }
}

pub async fn logout(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
) -> Result<Response, AppError> {
    handle_logout(&state, &session).await?;
    let mut response = template_to_response(&LoggedOutTemplate {
        meta: Meta::new("Logged out", "/auth/logout/"),
        viewer: None,
    })
    .into_response();
    append_cookie(response.headers_mut(), &expired_session_cookie(state.config()))?;
    Ok(response)
}
