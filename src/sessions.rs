use std::time::Duration;

use chrono::{Days, NaiveDateTime};
use futures::future::BoxFuture;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    database::Database, errors::AppError, log_and_wrap_custom_internal, models::User,
    service::shutdown_signal, state::SharedState,
};

const PURGE_EVERY: Duration = Duration::from_secs(60 * 60);

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SessionUser {
    pub pk: i64,
    pub username: String,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            pk: user.id,
            username: user.username.clone(),
        }
    }
}

/// What the request knows about who is asking. Anonymous visitors carry no
/// id and no user.
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: Option<String>,
    user: Option<SessionUser>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    pub fn user_pk(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.pk)
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[derive(Debug, FromRow)]
struct StoredSession {
    session_id: String,
    #[sqlx(flatten)]
    user: SessionUser,
}

#[derive(Clone, Debug)]
pub struct Sessions {
    database: Database,
}

impl Sessions {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Resolves a signed cookie value into a live session. A bad signature,
    /// an unknown id and an expired row all read as "no session".
    pub async fn find_session(
        &self,
        cookie_value: &str,
        secret: &str,
    ) -> Result<Option<Session>, AppError> {
        let Some(session_id) = verify(cookie_value, secret) else {
            tracing::debug!("session cookie with an invalid signature");
            return Ok(None);
        };

        let now = chrono::Utc::now().naive_utc();
        let stored: Option<StoredSession> = sqlx::query_as(
            r#"
            SELECT web_sessions.session_id, users.id AS pk, users.username
            FROM web_sessions
            INNER JOIN users ON users.id = web_sessions.user_pk
            WHERE web_sessions.session_id = $1 AND web_sessions.expiration > $2;
            "#,
        )
        .bind(session_id)
        .bind(now)
        .fetch_optional(&*self.database)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))?;

        let Some(stored) = stored else {
            return Ok(None);
        };

        sqlx::query("UPDATE web_sessions SET last_accessed = $1 WHERE session_id = $2;")
            .bind(now)
            .bind(&stored.session_id)
            .execute(&*self.database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))?;

        Ok(Some(Session {
            id: Some(stored.session_id),
            user: Some(stored.user),
        }))
    }

    /// Opens a session for `user` and returns it along with the signed value
    /// to put in the cookie.
    pub async fn create_session(
        &self,
        user: &User,
        expiration_days: i64,
        secret: &str,
    ) -> Result<(Session, String), AppError> {
        let session_id = Uuid::now_v7().to_string();
        let now = chrono::Utc::now().naive_utc();
        let expiration: NaiveDateTime = now + Days::new(expiration_days.max(0) as u64);

        sqlx::query(
            "INSERT INTO web_sessions (session_id, user_pk, last_accessed, expiration) VALUES ($1, $2, $3, $4);",
        )
        .bind(&session_id)
        .bind(user.id)
        .bind(now)
        .bind(expiration)
        .execute(&*self.database)
        .await
        .map_err(|e| log_and_wrap_custom_internal!(e))?;

        let cookie_value = sign(&session_id, secret);
        Ok((
            Session {
                id: Some(session_id),
                user: Some(user.into()),
            },
            cookie_value,
        ))
    }

    pub async fn delete_session(&self, session: &Session) -> Result<(), AppError> {
        let Some(session_id) = session.id() else {
            return Ok(());
        };
        sqlx::query("DELETE FROM web_sessions WHERE session_id = $1;")
            .bind(session_id)
            .execute(&*self.database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))?;
        Ok(())
    }

    /// Drops every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        sqlx::query("DELETE FROM web_sessions WHERE expiration <= $1;")
            .bind(chrono::Utc::now().naive_utc())
            .execute(&*self.database)
            .await
            .map_err(|e| log_and_wrap_custom_internal!(e))
            .map(|r| r.rows_affected())
    }
}

/// Background job: drops expired sessions every hour until shutdown.
pub fn purge_expired_sessions(state: SharedState) -> BoxFuture<'static, Result<(), std::io::Error>> {
    Box::pin(async move {
        let sessions = Sessions::new(state.database().clone());
        let mut interval = tokio::time::interval(PURGE_EVERY);
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => return Ok(()),
                _ = interval.tick() => match sessions.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "expired sessions purged"),
                    Err(error) => tracing::warn!(%error, "could not purge expired sessions"),
                },
            }
        }
    })
}

fn generate_token(secret: &str, data: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());

    hex::encode(mac.finalize().into_bytes())
}

/// `<session id>.<hex hmac>`
pub fn sign(session_id: &str, secret: &str) -> String {
    format!("{}.{}", session_id, generate_token(secret, session_id))
}

/// Returns the session id when the signature matches.
pub fn verify<'a>(cookie_value: &'a str, secret: &str) -> Option<&'a str> {
    let (session_id, signature) = cookie_value.rsplit_once('.')?;
    let signature = hex::decode(signature).ok()?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(session_id.as_bytes());
    mac.verify_slice(&signature).ok().map(|_| session_id)
}
