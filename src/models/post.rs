use std::fmt;

use chrono::NaiveDateTime;
use sqlx::{FromRow, QueryBuilder, Sqlite};

use crate::{
    database::Database,
    errors::AppError,
    log_and_wrap_custom_internal,
    pagination::{Page, PageQuery, Paginator},
    utils::truncate_chars,
};

/// Characters of the body kept by the `Display` form of a post.
pub const POST_PREVIEW_CHARS: usize = 15;

const SELECT_POSTS: &str = r#"
    SELECT posts.id, posts.text, posts.created_at, posts.image,
        posts.author_id, users.username AS author_username,
        posts.group_id, groups.slug AS group_slug, groups.title AS group_title
    FROM posts
    INNER JOIN users ON users.id = posts.author_id
    LEFT JOIN groups ON groups.id = posts.group_id
"#;

/// Newest first. Posts stamped with the same instant keep insertion order,
/// so pages never overlap.
const ORDER_POSTS: &str = " ORDER BY posts.created_at DESC, posts.id ASC";

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.preview(POST_PREVIEW_CHARS))
    }
}

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostFilter {
    All,
    Author(i64),
    Group(i64),
    /// Posts by every author the given user follows.
    FollowedBy(i64),
}

impl PostFilter {
    fn push_where<'a>(&self, builder: &mut QueryBuilder<'a, Sqlite>) {
        match *self {
            Self::All => {}
            Self::Author(author_id) => {
                builder.push(" WHERE posts.author_id = ").push_bind(author_id);
            }
            Self::Group(group_id) => {
                builder.push(" WHERE posts.group_id = ").push_bind(group_id);
            }
            Self::FollowedBy(user_id) => {
                builder
                    .push(" WHERE posts.author_id IN (SELECT follows.author_id FROM follows WHERE follows.user_id = ")
                    .push_bind(user_id)
                    .push(")");
            }
        }
    }
}

impl Post {
    pub fn preview(&self, limit: usize) -> &str {
        truncate_chars(&self.text, limit)
    }

    pub fn published(&self) -> String {
        self.created_at.format("%d %b %Y %H:%M").to_string()
    }

    pub async fn create(
        database: &Database,
        author_id: i64,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> Result<i64, AppError> {
        sqlx::query(
            "INSERT INTO posts (text, created_at, image, author_id, group_id) VALUES ($1, $2, $3, $4, $5);",
        )
        .bind(text)
        .bind(super::now())
        .bind(image)
        .bind(author_id)
        .bind(group_id)
        .execute(&**database)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))
        .map(|r| r.last_insert_rowid())
    }

    pub async fn find_by_pk(database: &Database, pk: i64) -> Result<Option<Self>, AppError> {
        let mut query_builder = QueryBuilder::new(SELECT_POSTS);
        query_builder.push(" WHERE posts.id = ").push_bind(pk);
        query_builder
            .build_query_as::<Self>()
            .fetch_optional(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
    }

    pub async fn get_by_pk(database: &Database, pk: i64) -> Result<Self, AppError> {
        Self::find_by_pk(database, pk)
            .await?
            .ok_or(AppError::DoesNotExist)
    }

    pub async fn update(
        &self,
        database: &Database,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE posts SET text = $1, group_id = $2, image = $3 WHERE id = $4;")
            .bind(text)
            .bind(group_id)
            .bind(image)
            .bind(self.id)
            .execute(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))?;
        Ok(())
    }

    pub async fn delete(self, database: &Database) -> Result<(), AppError> {
        sqlx::query("DELETE FROM posts WHERE id = $1;")
            .bind(self.id)
            .execute(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))?;
        Ok(())
    }

    pub async fn count(database: &Database, filter: PostFilter) -> Result<usize, AppError> {
        let mut query_builder = QueryBuilder::new("SELECT COUNT(*) FROM posts");
        filter.push_where(&mut query_builder);
        query_builder
            .build_query_scalar::<i64>()
            .fetch_one(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
            .map(|count| count.max(0) as usize)
    }

    pub async fn list(
        database: &Database,
        filter: PostFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Self>, AppError> {
        let mut query_builder = QueryBuilder::new(SELECT_POSTS);
        filter.push_where(&mut query_builder);
        query_builder
            .push(ORDER_POSTS)
            .push(" LIMIT ")
            .push_bind(limit as i64)
            .push(" OFFSET ")
            .push_bind(offset as i64);
        query_builder
            .build_query_as::<Self>()
            .fetch_all(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
    }

    /// One page of the posts matching `filter`.
    pub async fn paginate(
        database: &Database,
        filter: PostFilter,
        query: &PageQuery,
        per_page: usize,
    ) -> Result<Page<Self>, AppError> {
        let paginator = Paginator::new(Self::count(database, filter).await?, per_page);
        let number = paginator.resolve(query);
        let (offset, limit) = paginator.bounds(number);
        let items = Self::list(database, filter, offset, limit).await?;
        Ok(paginator.page(number, items))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(text: &str) -> Post {
        Post {
            id: 1,
            text: text.into(),
            created_at: chrono::NaiveDate::from_ymd_opt(2023, 3, 13)
                .and_then(|d| d.and_hms_opt(19, 30, 0))
                .unwrap(),
            image: None,
            author_id: 1,
            author_username: "TestUser".into(),
            group_id: None,
            group_slug: None,
            group_title: None,
        }
    }

    #[test]
    fn test_display_truncates_body() {
        let post = post("Тестовый пост более 15 символов и тест вроде не падает)");
        assert_eq!(post.to_string(), "Тестовый пост б");
        assert_eq!(post.to_string().chars().count(), POST_PREVIEW_CHARS);
    }

    #[test]
    fn test_display_keeps_short_body() {
        assert_eq!(post("Тест").to_string(), "Тест");
    }

    #[test]
    fn test_published() {
        assert_eq!(post("x").published(), "13 Mar 2023 19:30");
    }

    #[tokio::test]
    async fn test_filters_select_the_right_posts() {
        use crate::models::{Follow, Group, User};

        let database = Database::in_memory();
        database.run_migrations().await.unwrap();
        let leo = User::create(&database, "leo", "hash").await.unwrap();
        let mia = User::create(&database, "mia", "hash").await.unwrap();
        let cats = Group::create(&database, "Cats", Some("cats"), "").await.unwrap();
        Post::create(&database, leo.id, "leo in cats", Some(cats.id), None)
            .await
            .unwrap();
        Post::create(&database, leo.id, "leo alone", None, None).await.unwrap();
        Post::create(&database, mia.id, "mia alone", None, None).await.unwrap();
        Follow::create(&database, mia.id, leo.id).await.unwrap();

        let texts = |posts: Vec<Post>| posts.into_iter().map(|p| p.text).collect::<Vec<_>>();

        assert_eq!(Post::count(&database, PostFilter::All).await.unwrap(), 3);
        assert_eq!(
            texts(Post::list(&database, PostFilter::Group(cats.id), 0, 10).await.unwrap()),
            ["leo in cats"]
        );
        assert_eq!(
            texts(Post::list(&database, PostFilter::Author(mia.id), 0, 10).await.unwrap()),
            ["mia alone"]
        );
        assert_eq!(
            texts(Post::list(&database, PostFilter::FollowedBy(mia.id), 0, 10).await.unwrap()),
            ["leo alone", "leo in cats"]
        );
        assert!(Post::list(&database, PostFilter::FollowedBy(leo.id), 0, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_rewrites_post() {
        use crate::models::User;

        let database = Database::in_memory();
        database.run_migrations().await.unwrap();
        let leo = User::create(&database, "leo", "hash").await.unwrap();
        let post_id = Post::create(&database, leo.id, "before", None, None).await.unwrap();

        let post = Post::get_by_pk(&database, post_id).await.unwrap();
        post.update(&database, "after", None, Some("posts/a.png"))
            .await
            .unwrap();

        let post = Post::get_by_pk(&database, post_id).await.unwrap();
        assert_eq!(post.text, "after");
        assert_eq!(post.image.as_deref(), Some("posts/a.png"));
        assert!(matches!(
            Post::get_by_pk(&database, post_id + 1).await,
            Err(AppError::DoesNotExist)
        ));
    }

    #[tokio::test]
    async fn test_same_instant_keeps_insertion_order() {
        use crate::models::User;

        let database = Database::in_memory();
        database.run_migrations().await.unwrap();
        let leo = User::create(&database, "leo", "hash").await.unwrap();
        let first = Post::create(&database, leo.id, "first inserted", None, None)
            .await
            .unwrap();
        let second = Post::create(&database, leo.id, "second inserted", None, None)
            .await
            .unwrap();
        sqlx::query("UPDATE posts SET created_at = $1;")
            .bind("2023-03-13 19:30:00")
            .execute(&*database)
            .await
            .unwrap();

        let ids = |posts: Vec<Post>| posts.into_iter().map(|p| p.id).collect::<Vec<_>>();
        assert_eq!(
            ids(Post::list(&database, PostFilter::All, 0, 10).await.unwrap()),
            [first, second]
        );
        assert_eq!(
            ids(Post::list(&database, PostFilter::All, 0, 1).await.unwrap()),
            [first]
        );
        assert_eq!(
            ids(Post::list(&database, PostFilter::All, 1, 1).await.unwrap()),
            [second]
        );
    }
}
