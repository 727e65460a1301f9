use sqlx::FromRow;

use crate::{database::Database, errors::AppError, log_and_wrap_custom_internal};

/// A directed subscription: `user_id` reads what `author_id` writes.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
}

impl Follow {
    /// Subscribes `user_id` to `author_id`. Returns whether a row was created.
    ///
    /// Duplicates are absorbed by the unique index on `(user_id, author_id)`,
    /// so concurrent calls for the same pair leave exactly one row. Following
    /// yourself is refused before reaching the store, which also rejects it.
    pub async fn create(
        database: &Database,
        user_id: i64,
        author_id: i64,
    ) -> Result<bool, AppError> {
        if user_id == author_id {
            return Ok(false);
        }
        let created = sqlx::query(
            "INSERT INTO follows (user_id, author_id) VALUES ($1, $2) ON CONFLICT (user_id, author_id) DO NOTHING;",
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&**database)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))?
        .rows_affected()
            > 0;

        if created {
            metrics::counter!("follows_created_total").increment(1);
        }
        Ok(created)
    }

    /// Removes the subscription if there is one. Returns whether a row was deleted.
    pub async fn delete(
        database: &Database,
        user_id: i64,
        author_id: i64,
    ) -> Result<bool, AppError> {
        sqlx::query("DELETE FROM follows WHERE user_id = $1 AND author_id = $2;")
            .bind(user_id)
            .bind(author_id)
            .execute(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
            .map(|r| r.rows_affected() > 0)
    }

    pub async fn exists(
        database: &Database,
        user_id: i64,
        author_id: i64,
    ) -> Result<bool, AppError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2);")
            .bind(user_id)
            .bind(author_id)
            .fetch_one(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
    }

    pub async fn find(
        database: &Database,
        user_id: i64,
        author_id: i64,
    ) -> Result<Option<Self>, AppError> {
        sqlx::query_as("SELECT id, user_id, author_id FROM follows WHERE user_id = $1 AND author_id = $2;")
            .bind(user_id)
            .bind(author_id)
            .fetch_optional(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
    }

    pub async fn count(database: &Database) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM follows;")
            .fetch_one(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
    }

    pub async fn count_followers(database: &Database, author_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE author_id = $1;")
            .bind(author_id)
            .fetch_one(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
    }
}
