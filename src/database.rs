use std::{ops::Deref, str::FromStr};

use sqlx::{
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{errors::AppError, log_and_wrap_custom_internal};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[derive(Clone, Debug)]
pub struct Database(SqlitePool);

impl Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Database {
    pub fn new(url: &str) -> Result<Self, AppError> {
        let database_config = SqliteConnectOptions::from_str(url)
            .map_err(|e| log_and_wrap_custom_internal!(e))?
            .create_if_missing(true)
            .foreign_keys(true);

        Ok(Self(SqlitePool::connect_lazy_with(database_config)))
    }

    /// A private in-memory database. It lives as long as its single connection,
    /// so the pool never lets that connection go idle or expire.
    pub fn in_memory() -> Self {
        let database_config = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_lazy_with(database_config);
        Self(pool)
    }

    pub async fn run_migrations(&self) -> Result<(), AppError> {
        MIGRATOR
            .run(&self.0)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
    }
}
