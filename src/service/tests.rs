use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response},
};
use http_body_util::BodyExt;
use tower::ServiceExt as _;

use super::{into_service, Service, ServiceExt};
use crate::{
    cache::ManualClock,
    database::Database,
    models::User,
    state::{SharedState, WebsiteState},
};

/// An in-process website on an in-memory database, for tests. The page cache
/// reads a [`ManualClock`] the test moves by hand.
pub struct StubService {
    service: Service,
    clock: Arc<ManualClock>,
}

impl StubService {
    pub async fn new(service: Service) -> Self {
        let clock = Arc::new(ManualClock::default());
        let mut service = service.stub().with_clock(clock.clone());
        let state = SharedState::stub();
        state
            .database()
            .run_migrations()
            .await
            .expect("migrations should run on a fresh database");
        service.set_up(state).await;
        Self { service, clock }
    }

    pub fn state(&self) -> &WebsiteState {
        self.service
            .website_state()
            .expect("a stub website is always set up")
    }

    pub fn database(&self) -> &Database {
        self.state().database()
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub async fn request(&self, req: Request<Body>) -> Response<Body> {
        let router = self.service.router().expect("a stub website has a router");
        match into_service(router).oneshot(req).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::from(body.to_owned())).unwrap())
            .await
    }

    /// Posts `multipart/form-data`. Each part is `(name, file name, content)`;
    /// parts without a file name are plain fields.
    pub async fn post_multipart(
        &self,
        uri: &str,
        parts: &[(&str, Option<&str>, &[u8])],
        cookie: Option<&str>,
    ) -> Response<Body> {
        const BOUNDARY: &str = "yatube-test-boundary";
        let mut body = Vec::new();
        for (name, file_name, content) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match file_name {
                Some(file_name) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                        name, file_name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder().method("POST").uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.request(builder.body(Body::from(body)).unwrap()).await
    }

    /// Opens a session for `user` and returns the `Cookie` header value that
    /// carries it.
    pub async fn login(&self, user: &User) -> String {
        let state = self.state();
        let config = state.config();
        let (_, value) = state
            .sessions()
            .create_session(user, config.session_expiration, &config.session_key)
            .await
            .expect("sessions can be created");
        format!("{}={}", config.session_cookie_name, value)
    }

    pub async fn body_string(response: Response<Body>) -> String {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&body).into_owned()
    }
}
