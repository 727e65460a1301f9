use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::{database::Database, errors::AppError, log_and_wrap_custom_internal};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created_at: NaiveDateTime,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
}

impl Comment {
    pub fn published(&self) -> String {
        self.created_at.format("%d %b %Y %H:%M").to_string()
    }

    pub async fn create(
        database: &Database,
        post_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<i64, AppError> {
        sqlx::query(
            "INSERT INTO comments (text, created_at, post_id, author_id) VALUES ($1, $2, $3, $4);",
        )
        .bind(text)
        .bind(super::now())
        .bind(post_id)
        .bind(author_id)
        .execute(&**database)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))
        .map(|r| r.last_insert_rowid())
    }

    /// Oldest first, the way a conversation reads.
    pub async fn for_post(database: &Database, post_id: i64) -> Result<Vec<Self>, AppError> {
        sqlx::query_as(
            r#"
            SELECT comments.id, comments.text, comments.created_at, comments.post_id,
                comments.author_id, users.username AS author_username
            FROM comments
            INNER JOIN users ON users.id = comments.author_id
            WHERE comments.post_id = $1
            ORDER BY comments.created_at ASC, comments.id ASC;
            "#,
        )
        .bind(post_id)
        .fetch_all(&**database)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))
    }

    pub async fn count(database: &Database) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM comments;")
            .fetch_one(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
    }
}
