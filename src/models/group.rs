use std::fmt;

use sqlx::FromRow;

use crate::{database::Database, errors::AppError, log_and_wrap_custom_internal, utils::slugify};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

impl Group {
    /// Groups are created by administrators only. Without an explicit slug one
    /// is derived from the title.
    pub async fn create(
        database: &Database,
        title: &str,
        slug: Option<&str>,
        description: &str,
    ) -> Result<Self, AppError> {
        let slug = match slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_owned(),
            _ => slugify(title, true),
        };
        if slug.is_empty() {
            return Err(AppError::custom_bad_request(
                "A group needs a slug made of letters, digits, dashes or underscores.",
            ));
        }

        let result = sqlx::query("INSERT INTO groups (title, slug, description) VALUES ($1, $2, $3);")
            .bind(title)
            .bind(&slug)
            .bind(description)
            .execute(&**database)
            .await;

        match result {
            Ok(done) => Ok(Self {
                id: done.last_insert_rowid(),
                title: title.to_owned(),
                slug,
                description: description.to_owned(),
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                AppError::custom_bad_request("A group with that slug already exists."),
            ),
            Err(e) => Err(log_and_wrap_custom_internal!(e)),
        }
    }

    pub async fn get_by_slug(database: &Database, slug: &str) -> Result<Self, AppError> {
        sqlx::query_as("SELECT id, title, slug, description FROM groups WHERE slug = $1;")
            .bind(slug)
            .fetch_optional(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))?
            .ok_or(AppError::DoesNotExist)
    }

    pub async fn all(database: &Database) -> Result<Vec<Self>, AppError> {
        sqlx::query_as("SELECT id, title, slug, description FROM groups ORDER BY title;")
            .fetch_all(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
    }

    pub async fn delete(self, database: &Database) -> Result<(), AppError> {
        sqlx::query("DELETE FROM groups WHERE id = $1;")
            .bind(self.id)
            .execute(&**database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))?;
        Ok(())
    }
}
