use askama::Template;
use axum::{
    extract::{Multipart, Path, Query, State},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Form, Router,
};

use super::{
    forms::{CommentForm, PostForm},
    services::{
        follow_author, handle_create_post, handle_edit_post, parse_post_id, read_post_submission,
        unfollow_author, Submitted,
    },
};
use crate::{
    auth::login_required_middleware,
    cache::cached_fragment,
    errors::AppError,
    http::Found,
    models::{Comment, Follow, Group, Post, PostFilter, User},
    pagination::{Page, PageQuery, Paginator},
    sessions::{Session, SessionUser},
    state::WebsiteState,
    website::{html::ToForm, template_to_response, HtmlResult, Meta},
};

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    let protected = Router::new()
        .route("/create", get(post_create).post(post_create_submit))
        .route("/posts/{post_id}/edit", get(post_edit).post(post_edit_submit))
        .route("/posts/{post_id}/comment", post(add_comment))
        .route("/follow", get(follow_index))
        .route("/profile/{username}/follow", get(profile_follow))
        .route("/profile/{username}/unfollow", get(profile_unfollow))
        .route_layer(from_fn_with_state(state.clone(), login_required_middleware));

    Router::new()
        .route("/", get(index))
        .route("/group/{slug}", get(group_list))
        .route("/profile/{username}", get(profile))
        .route("/posts/{post_id}", get(post_detail))
        .merge(protected)
        .with_state(state)
}

fn profile_url(username: &str) -> String {
    format!("/profile/{}/", username)
}

fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

fn viewer(session: &Session) -> Option<String> {
    session.username().map(str::to_owned)
}

/// Protected routes run behind the login gate, so a missing user here is a
/// wiring mistake rather than a visitor error.
fn signed_in(session: &Session) -> Result<&SessionUser, AppError> {
    session
        .user()
        .ok_or_else(|| AppError::custom_internal("protected route reached without a user"))
}

#[derive(Template)]
#[template(path = "posts/includes/post_list.html")]
struct PostListTemplate<'a> {
    page: &'a Page<Post>,
    show_author: bool,
    show_group: bool,
}

fn render_post_list(page: &Page<Post>, show_author: bool, show_group: bool) -> Result<String, AppError> {
    PostListTemplate {
        page,
        show_author,
        show_group,
    }
    .render()
    .map_err(AppError::from)
}

#[derive(Template)]
#[template(path = "posts/index.html")]
struct IndexTemplate<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
    posts: String,
}

/// The main listing. The rendered list is cached per resolved page number
/// for the configured window; new posts show up once it expires.
pub async fn index(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Query(query): Query<PageQuery>,
) -> HtmlResult {
    let database = state.database();
    // Keyed by the resolved number: every out of range `?page=` shares the
    // entry of the last page.
    let paginator = Paginator::new(
        Post::count(database, PostFilter::All).await?,
        state.config().page_size,
    );
    let number = paginator.resolve(&query);
    let key = format!("index_page:{}", number);
    let posts = cached_fragment(state.page_cache(), &key, move || async move {
        let (offset, limit) = paginator.bounds(number);
        let items = Post::list(database, PostFilter::All, offset, limit).await?;
        render_post_list(&paginator.page(number, items), true, true)
    })
    .await?;

    template_to_response(&IndexTemplate {
        meta: Meta::new("Latest updates", "/"),
        viewer: viewer(&session),
        posts,
    })
}

#[derive(Template)]
#[template(path = "posts/group_list.html")]
struct GroupTemplate<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
    group: Group,
    posts: String,
}

pub async fn group_list(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> HtmlResult {
    let group = Group::get_by_slug(state.database(), &slug).await?;
    let page = Post::paginate(
        state.database(),
        PostFilter::Group(group.id),
        &query,
        state.config().page_size,
    )
    .await?;

    template_to_response(&GroupTemplate {
        meta: Meta::new(format!("Posts of the group {}", group.title), format!("/group/{}/", group.slug))
            .with_description(group.description.clone()),
        viewer: viewer(&session),
        posts: render_post_list(&page, true, false)?,
        group,
    })
}

#[derive(Template)]
#[template(path = "posts/profile.html")]
struct ProfileTemplate<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
    author: User,
    posts_count: usize,
    followers_count: i64,
    following: bool,
    can_follow: bool,
    posts: String,
}

pub async fn profile(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> HtmlResult {
    let database = state.database();
    let author = User::get_by_username(database, &username).await?;
    let page = Post::paginate(
        database,
        PostFilter::Author(author.id),
        &query,
        state.config().page_size,
    )
    .await?;

    let (following, can_follow) = match session.user_pk() {
        Some(pk) if pk != author.id => (Follow::exists(database, pk, author.id).await?, true),
        _ => (false, false),
    };

    template_to_response(&ProfileTemplate {
        meta: Meta::new(format!("Profile of {}", author.username), profile_url(&author.username)),
        viewer: viewer(&session),
        posts_count: page.total,
        followers_count: Follow::count_followers(database, author.id).await?,
        following,
        can_follow,
        posts: render_post_list(&page, false, true)?,
        author,
    })
}

#[derive(Template)]
#[template(path = "posts/post_detail.html")]
struct PostDetailTemplate<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
    post: Post,
    author_posts_count: usize,
    comments: Vec<Comment>,
    comment_form: Option<String>,
    can_edit: bool,
}

async fn render_post_detail(
    state: &WebsiteState,
    session: &Session,
    post: Post,
    comment_form: CommentForm,
) -> HtmlResult {
    let database = state.database();
    let author_posts_count = Post::count(database, PostFilter::Author(post.author_id)).await?;
    let comments = Comment::for_post(database, post.id).await?;

    template_to_response(&PostDetailTemplate {
        meta: Meta::new(format!("Post {}", post), post_url(post.id)),
        viewer: viewer(session),
        author_posts_count,
        comments,
        comment_form: session
            .is_authenticated()
            .then(|| comment_form.to_form().to_string()),
        can_edit: session.user_pk() == Some(post.author_id),
        post,
    })
}

pub async fn post_detail(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
) -> HtmlResult {
    let post = Post::get_by_pk(state.database(), parse_post_id(&post_id)?).await?;
    let form = CommentForm::for_post(post.id);
    render_post_detail(&state, &session, post, form).await
}

#[derive(Template)]
#[template(path = "posts/create_post.html")]
struct PostFormTemplate<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
    is_edit: bool,
    form: String,
}

fn render_post_form(session: &Session, form: &PostForm, editing: Option<i64>) -> HtmlResult {
    let meta = match editing {
        Some(post_id) => Meta::new("Edit post", format!("/posts/{}/edit/", post_id)),
        None => Meta::new("New post", "/create/"),
    };
    template_to_response(&PostFormTemplate {
        meta,
        viewer: viewer(session),
        is_edit: editing.is_some(),
        form: form.to_form().to_string(),
    })
}

pub async fn post_create(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
) -> HtmlResult {
    let form = PostForm::new(Group::all(state.database()).await?);
    render_post_form(&session, &form, None)
}

pub async fn post_create_submit(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let user = signed_in(&session)?;
    let submission = read_post_submission(multipart).await?;
    match handle_create_post(&state, user, submission).await? {
        Submitted::Saved(_) => Ok(Found::to(profile_url(&user.username)).into_response()),
        Submitted::Invalid(form) => Ok(render_post_form(&session, &form, None).into_response()),
    }
}

pub async fn post_edit(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
) -> Result<Response, AppError> {
    let user = signed_in(&session)?;
    let post = Post::get_by_pk(state.database(), parse_post_id(&post_id)?).await?;
    if post.author_id != user.pk {
        return Ok(Found::to(post_url(post.id)).into_response());
    }

    let form = PostForm::new(Group::all(state.database()).await?).with_values(
        &post.text,
        post.group_id,
        post.image.as_deref(),
    );
    Ok(render_post_form(&session, &form, Some(post.id)).into_response())
}

pub async fn post_edit_submit(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let user = signed_in(&session)?;
    let post = Post::get_by_pk(state.database(), parse_post_id(&post_id)?).await?;
    if post.author_id != user.pk {
        tracing::warn!(post = post.id, user = user.pk, "edit attempt by someone else");
        return Ok(Found::to(post_url(post.id)).into_response());
    }

    let submission = read_post_submission(multipart).await?;
    match handle_edit_post(&state, &post, submission).await? {
        Submitted::Saved(post_id) => Ok(Found::to(post_url(post_id)).into_response()),
        Submitted::Invalid(form) => {
            Ok(render_post_form(&session, &form, Some(post.id)).into_response())
        }
    }
}

pub async fn add_comment(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Response, AppError> {
    let user = signed_in(&session)?;
    let post = Post::get_by_pk(state.database(), parse_post_id(&post_id)?).await?;

    let form = CommentForm {
        action: format!("/posts/{}/comment/", post.id),
        ..form
    };
    match form.clean() {
        Ok(text) => {
            Comment::create(state.database(), post.id, user.pk, &text).await?;
            metrics::counter!("comments_created_total").increment(1);
            Ok(Found::to(post_url(post.id)).into_response())
        }
        Err(form) => Ok(render_post_detail(&state, &session, post, form)
            .await
            .into_response()),
    }
}

#[derive(Template)]
#[template(path = "posts/follow.html")]
struct FollowTemplate<'a> {
    meta: Meta<'a>,
    viewer: Option<String>,
    posts: String,
}

pub async fn follow_index(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Query(query): Query<PageQuery>,
) -> HtmlResult {
    let user = signed_in(&session)?;
    let page = Post::paginate(
        state.database(),
        PostFilter::FollowedBy(user.pk),
        &query,
        state.config().page_size,
    )
    .await?;

    template_to_response(&FollowTemplate {
        meta: Meta::new("Your subscriptions", "/follow/"),
        viewer: viewer(&session),
        posts: render_post_list(&page, true, true)?,
    })
}

pub async fn profile_follow(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Path(username): Path<String>,
) -> Result<Found, AppError> {
    let user = signed_in(&session)?;
    let author = follow_author(&state, user, &username).await?;
    Ok(Found::to(profile_url(&author.username)))
}

pub async fn profile_unfollow(
    State(state): State<WebsiteState>,
    Extension(session): Extension<Session>,
    Path(username): Path<String>,
) -> Result<Found, AppError> {
    let user = signed_in(&session)?;
    let author = unfollow_author(&state, user, &username).await?;
    Ok(Found::to(profile_url(&author.username)))
}
