mod common;

use axum::http::StatusCode;
use common::{body, create_group, create_post, create_user, location, setup, SMALL_GIF};
use yatube::models::{Comment, Post, PostFilter};

#[tokio::test]
async fn test_create_post_with_group_and_image() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let cats = create_group(&app, "cats").await;
    let cookie = app.login(&leo).await;
    let group_id = cats.id.to_string();

    let response = app
        .post_multipart(
            "/create/",
            &[
                ("text", None, "Created through the form".as_bytes()),
                ("group", None, group_id.as_bytes()),
                ("image", Some("small.gif"), SMALL_GIF),
            ],
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/profile/leo/");

    assert_eq!(Post::count(app.database(), PostFilter::All).await.unwrap(), 1);
    let post = Post::get_by_pk(app.database(), 1).await.unwrap();
    assert_eq!(post.text, "Created through the form");
    assert_eq!(post.group_id, Some(cats.id));
    let image = post.image.unwrap();
    assert!(image.starts_with("posts/"));
    assert!(image.ends_with(".gif"));

    let stored = app.state().config().media_root().join(&image);
    assert_eq!(tokio::fs::read(stored).await.unwrap(), SMALL_GIF);

    let html = body(app.get("/", None).await).await;
    assert!(html.contains(&format!("src=\"/media/{}\"", image)));
}

#[tokio::test]
async fn test_invalid_post_is_not_saved() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let cookie = app.login(&leo).await;

    let response = app
        .post_multipart(
            "/create/",
            &[
                ("text", None, "   ".as_bytes()),
                ("group", None, "42".as_bytes()),
                ("image", Some("notes.txt"), "not an image".as_bytes()),
            ],
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;
    assert!(html.contains("This field is required."));
    assert!(html.contains("Select a valid choice."));
    assert!(html.contains("Upload a valid image."));
    assert_eq!(Post::count(app.database(), PostFilter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_guest_cannot_create_posts() {
    let app = setup().await;

    let response = app
        .post_multipart("/create/", &[("text", None, "Sneaky".as_bytes())], None)
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), "/auth/login/?next=/create/");
    assert_eq!(Post::count(app.database(), PostFilter::All).await.unwrap(), 0);
}

#[tokio::test]
async fn test_author_edits_post() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let cats = create_group(&app, "cats").await;
    let dogs = create_group(&app, "dogs").await;
    let post_id = create_post(&app, &leo, "Before the edit", Some(&cats)).await;
    let cookie = app.login(&leo).await;
    let group_id = dogs.id.to_string();

    let response = app
        .post_multipart(
            &format!("/posts/{}/edit/", post_id),
            &[
                ("text", None, "After the edit".as_bytes()),
                ("group", None, group_id.as_bytes()),
            ],
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("/posts/{}/", post_id));

    let post = Post::get_by_pk(app.database(), post_id).await.unwrap();
    assert_eq!(post.text, "After the edit");
    assert_eq!(post.group_id, Some(dogs.id));
    assert_eq!(Post::count(app.database(), PostFilter::All).await.unwrap(), 1);

    let old_group = body(app.get("/group/cats/", None).await).await;
    assert!(!old_group.contains("After the edit"));
}

#[tokio::test]
async fn test_edit_keeps_image_when_none_uploaded() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let post_id = Post::create(app.database(), leo.id, "With a picture", None, Some("posts/kept.gif"))
        .await
        .unwrap();
    let cookie = app.login(&leo).await;

    let response = app
        .post_multipart(
            &format!("/posts/{}/edit/", post_id),
            &[("text", None, "Still with a picture".as_bytes())],
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);

    let post = Post::get_by_pk(app.database(), post_id).await.unwrap();
    assert_eq!(post.image.as_deref(), Some("posts/kept.gif"));
    assert_eq!(post.group_id, None);
}

#[tokio::test]
async fn test_only_the_author_can_edit() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let mia = create_user(&app, "mia").await;
    let post_id = create_post(&app, &leo, "Belongs to leo", None).await;
    let cookie = app.login(&mia).await;
    let edit_url = format!("/posts/{}/edit/", post_id);

    let response = app.get(&edit_url, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("/posts/{}/", post_id));

    let response = app
        .post_multipart(&edit_url, &[("text", None, "Hijacked".as_bytes())], Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("/posts/{}/", post_id));

    let post = Post::get_by_pk(app.database(), post_id).await.unwrap();
    assert_eq!(post.text, "Belongs to leo");
}

#[tokio::test]
async fn test_comment_is_added_to_post() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let mia = create_user(&app, "mia").await;
    let post_id = create_post(&app, &leo, "Comment on me", None).await;
    let cookie = app.login(&mia).await;

    let response = app
        .post_form(
            &format!("/posts/{}/comment/", post_id),
            "text=Nice+post",
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(&response), format!("/posts/{}/", post_id));

    let comments = Comment::for_post(app.database(), post_id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].text, "Nice post");
    assert_eq!(comments[0].author_username, "mia");

    let html = body(app.get(&format!("/posts/{}/", post_id), None).await).await;
    assert!(html.contains("Nice post"));
}

#[tokio::test]
async fn test_empty_comment_is_rejected() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let post_id = create_post(&app, &leo, "Comment on me", None).await;
    let cookie = app.login(&leo).await;

    let response = app
        .post_form(&format!("/posts/{}/comment/", post_id), "text=", Some(&cookie))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body(response).await;
    assert!(html.contains("id=\"post-detail\""));
    assert!(html.contains("This field is required."));
    assert_eq!(Comment::count(app.database()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_guest_cannot_comment() {
    let app = setup().await;
    let leo = create_user(&app, "leo").await;
    let post_id = create_post(&app, &leo, "Comment on me", None).await;

    let response = app
        .post_form(&format!("/posts/{}/comment/", post_id), "text=Anonymous", None)
        .await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(location(&response).starts_with("/auth/login/?next="));
    assert_eq!(Comment::count(app.database()).await.unwrap(), 0);
}
