#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Response},
};
use yatube::{
    auth::hash_password,
    models::{Group, Post, User},
    service::{Service, StubService},
};

pub const PASSWORD: &str = "correct-horse-battery";

/// Smallest GIF the upload check accepts.
pub const SMALL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
    0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
];

pub async fn setup() -> StubService {
    StubService::new(Service::website("WEB_", yatube::routes)).await
}

pub async fn create_user(app: &StubService, username: &str) -> User {
    User::create(app.database(), username, &hash_password(PASSWORD).unwrap())
        .await
        .unwrap()
}

pub async fn create_group(app: &StubService, slug: &str) -> Group {
    Group::create(
        app.database(),
        &format!("Group {}", slug),
        Some(slug),
        &format!("Everything about {}", slug),
    )
    .await
    .unwrap()
}

pub async fn create_post(app: &StubService, author: &User, text: &str, group: Option<&Group>) -> i64 {
    Post::create(app.database(), author.id, text, group.map(|g| g.id), None)
        .await
        .unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

pub async fn body(response: Response<Body>) -> String {
    StubService::body_string(response).await
}

/// How many posts a rendered list shows.
pub fn listed_posts(html: &str) -> usize {
    html.matches("<article class=\"post\"").count()
}
