use std::path::Path;

use axum::extract::Multipart;
use uuid::Uuid;

use crate::{
    config::WebsiteConfig,
    errors::AppError,
    log_and_wrap_custom_internal,
    models::{Follow, Group, Post, User},
    sessions::SessionUser,
    state::WebsiteState,
};

use super::forms::{CleanPost, PostForm, PostSubmission, UploadedImage};

/// Uploaded images live under this directory of the media root.
pub const POST_IMAGES_DIR: &str = "posts";

/// Reads the create/edit form out of a multipart body. Unknown fields are
/// skipped; an empty file input means no new image.
pub async fn read_post_submission(mut multipart: Multipart) -> Result<PostSubmission, AppError> {
    let mut submission = PostSubmission::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("text") => submission.text = field.text().await?,
            Some("group") => submission.group = field.text().await?,
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content = field.bytes().await?;
                if !content.is_empty() {
                    submission.image = Some(UploadedImage { file_name, content });
                }
            }
            _ => {}
        }
    }
    Ok(submission)
}

/// Writes the image under the media root and returns the path stored on the
/// post, relative to that root.
pub async fn store_image(
    media_root: &Path,
    image: &UploadedImage,
    extension: &str,
) -> Result<String, AppError> {
    let directory = media_root.join(POST_IMAGES_DIR);
    tokio::fs::create_dir_all(&directory)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))?;

    let name = format!("{}.{}", Uuid::now_v7(), extension);
    tokio::fs::write(directory.join(&name), &image.content)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))?;

    tracing::debug!(original = %image.file_name, stored = %name, "image stored");
    Ok(format!("{}/{}", POST_IMAGES_DIR, name))
}

async fn stored_image(config: &WebsiteConfig, clean: &CleanPost) -> Result<Option<String>, AppError> {
    match &clean.image {
        Some((image, extension)) => store_image(&config.media_root(), image, extension)
            .await
            .map(Some),
        None => Ok(None),
    }
}

/// Outcome of submitting the post form.
pub enum Submitted {
    Saved(i64),
    Invalid(PostForm),
}

pub async fn handle_create_post(
    state: &WebsiteState,
    author: &SessionUser,
    submission: PostSubmission,
) -> Result<Submitted, AppError> {
    let form = PostForm::new(Group::all(state.database()).await?);
    let clean = match form.clean(submission) {
        Ok(clean) => clean,
        Err(form) => return Ok(Submitted::Invalid(form)),
    };

    let image = stored_image(state.config(), &clean).await?;
    let post_id = Post::create(
        state.database(),
        author.pk,
        &clean.text,
        clean.group_id,
        image.as_deref(),
    )
    .await?;
    metrics::counter!("posts_created_total").increment(1);
    tracing::info!(post = post_id, author = author.pk, "post created");
    Ok(Submitted::Saved(post_id))
}

pub async fn handle_edit_post(
    state: &WebsiteState,
    post: &Post,
    submission: PostSubmission,
) -> Result<Submitted, AppError> {
    let form = PostForm::new(Group::all(state.database()).await?).with_values(
        &post.text,
        post.group_id,
        post.image.as_deref(),
    );
    let clean = match form.clean(submission) {
        Ok(clean) => clean,
        Err(form) => return Ok(Submitted::Invalid(form)),
    };

    // a missing upload keeps the current image
    let image = match stored_image(state.config(), &clean).await? {
        Some(image) => Some(image),
        None => post.image.clone(),
    };
    post.update(state.database(), &clean.text, clean.group_id, image.as_deref())
        .await?;
    tracing::info!(post = post.id, "post edited");
    Ok(Submitted::Saved(post.id))
}

/// Post ids come from the path; anything that is not one is simply not found.
pub fn parse_post_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| AppError::DoesNotExist)
}

/// Subscribes `user` to `username`. Following yourself or someone already
/// followed changes nothing.
pub async fn follow_author(
    state: &WebsiteState,
    user: &SessionUser,
    username: &str,
) -> Result<User, AppError> {
    let author = User::get_by_username(state.database(), username).await?;
    if !Follow::create(state.database(), user.pk, author.id).await? {
        tracing::debug!(user = user.pk, author = author.id, "follow request changed nothing");
    }
    Ok(author)
}

pub async fn unfollow_author(
    state: &WebsiteState,
    user: &SessionUser,
    username: &str,
) -> Result<User, AppError> {
    let author = User::get_by_username(state.database(), username).await?;
    Follow::delete(state.database(), user.pk, author.id).await?;
    Ok(author)
}
