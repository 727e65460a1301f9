mod common;

use axum::http::StatusCode;
use common::{body, create_post, create_user, listed_posts, location, setup};
use yatube::models::Follow;

#[tokio::test]
async fn test_follow_creates_one_subscription() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let mia = create_user(&app, "mia").await;
    let cookie = app.login(&mia).await;

    let response = app.get("/profile/leo/follow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/profile/leo/");
    assert_eq!(Follow::count(app.database()).await.unwrap(), 1);
    assert!(Follow::exists(app.database(), mia.id, leo.id).await.unwrap());

    app.get("/profile/leo/follow/", Some(&cookie)).await;
    assert_eq!(Follow::count(app.database()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unfollow_removes_subscription() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let mia = create_user(&app, "mia").await;
    Follow::create(app.database(), mia.id, leo.id).await.unwrap();
    let cookie = app.login(&mia).await;

    let response = app.get("/profile/leo/unfollow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/profile/leo/");
    assert_eq!(Follow::count(app.database()).await.unwrap(), 0);

    let again = app.get("/profile/leo/unfollow/", Some(&cookie)).await;
    assert_eq!(again.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_cannot_follow_yourself() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let cookie = app.login(&leo).await;

    let response = app.get("/profile/leo/follow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(Follow::count(app.database()).await.unwrap(), 0);

    let html = body(app.get("/profile/leo/", Some(&cookie)).await).await;
    assert!(!html.contains("id=\"follow\""));
    assert!(!html.contains("id=\"unfollow\""));
}

#[tokio::test]
async fn test_following_unknown_author_is_404() {
    let app = setup().await;
    let mia = create_user(&app, "mia").await;
    let cookie = app.login(&mia).await;

    let response = app.get("/profile/nobody/follow/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feed_shows_followed_authors_only() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let mia = create_user(&app, "mia").await;
    let max = create_user(&app, "max").await;
    create_post(&app, &leo, "Leo writes", None).await;
    create_post(&app, &max, "Max writes", None).await;
    Follow::create(app.database(), mia.id, leo.id).await.unwrap();

    let feed = body(app.get("/follow/", Some(&app.login(&mia).await)).await).await;
    assert!(feed.contains("Leo writes"));
    assert!(!feed.contains("Max writes"));
    assert_eq!(listed_posts(&feed), 1);

    let others = body(app.get("/follow/", Some(&app.login(&max).await)).await).await;
    assert!(!others.contains("Leo writes"));
    assert_eq!(listed_posts(&others), 0);
}

#[tokio::test]
async fn test_profile_shows_follow_state() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let mia = create_user(&app, "mia").await;
    let cookie = app.login(&mia).await;

    let before = body(app.get("/profile/leo/", Some(&cookie)).await).await;
    assert!(before.contains("id=\"follow\""));
    assert!(before.contains("<span id=\"followers-count\">0</span>"));

    Follow::create(app.database(), mia.id, leo.id).await.unwrap();
    let after = body(app.get("/profile/leo/", Some(&cookie)).await).await;
    assert!(after.contains("id=\"unfollow\""));
    assert!(after.contains("<span id=\"followers-count\">1</span>"));
}
