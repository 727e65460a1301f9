use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::{database::Database, errors::AppError, log_and_wrap_custom_internal};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, FromRow)]
pub struct UserWithPassword {
    #[sqlx(flatten)]
    pub user: User,
    pub password: String,
}

impl User {
    /// Inserts a user with an already hashed password. A taken username is a
    /// bad request, not an internal error.
    pub async fn create(
        database: &Database,
        username: &str,
        password_hash: &str,
    ) -> Result<Self, AppError> {
        let created_at = super::now();
        let result = sqlx::query("INSERT INTO users (username, password, created_at) VALUES ($1, $2, $3);")
            .bind(username)
            .bind(password_hash)
            .bind(created_at)
            .execute(&**database)
            .await;

        match result {
            Ok(done) => Ok(Self {
                id: done.last_insert_rowid(),
                username: username.to_owned(),
                created_at,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                AppError::custom_bad_request("A user with that username already exists."),
            ),
            Err(e) => Err(log_and_wrap_custom_internal!(e)),
        }
    }

    pub async fn find_by_username(
        database: &Database,
        username: &str,
    ) -> Result<Option<Self>, AppError> {
        sqlx::query_as("SELECT id, username, created_at FROM users WHERE username = $1;")
            .bind(username)
            .fetch_optional(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
    }

    pub async fn get_by_username(database: &Database, username: &str) -> Result<Self, AppError> {
        Self::find_by_username(database, username)
            .await?
            .ok_or(AppError::DoesNotExist)
    }

    pub async fn find_by_username_with_password(
        database: &Database,
        username: &str,
    ) -> Result<Option<UserWithPassword>, AppError> {
        sqlx::query_as(
            "SELECT id, username, created_at, password FROM users WHERE username = $1;",
        )
        .bind(username)
        .fetch_optional(&**database)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))
    }

    pub async fn delete(self, database: &Database) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1;")
            .bind(self.id)
            .execute(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))?;
        Ok(())
    }
}
