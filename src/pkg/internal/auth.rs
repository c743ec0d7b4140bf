use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::prelude::{FromRow, Type};
use standard_error::{Interpolate, StandardError, Status};
use uuid::Uuid;

use crate::{conf::settings, pkg::server::state::AppState, prelude::Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type)]
#[sqlx(type_name = "session_status", rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Expired,
}

#[derive(FromRow, Debug)]
pub struct Session {
    pub token: Uuid,
    pub user_id: String,
    pub expiry: DateTime<Utc>,
    pub status: SessionStatus,
}

#[derive(FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
}

#[derive(FromRow)]
struct UserCredentials {
    user_id: String,
    email: String,
    name: String,
    password_hash: String,
}

impl User {
    pub async fn create(state: &AppState, email: &str, name: &str, password: &str) -> Result<Self> {
        let hash = hash_password(password).await?;
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING user_id, email, name
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(email)
        .bind(name)
        .bind(&hash)
        .fetch_optional(&*state.db_pool)
        .await?;
        user.ok_or_else(|| StandardError::new("ERR-AUTH-005").code(StatusCode::CONFLICT))
    }

    pub async fn login(state: &AppState, email: &str, password: &str) -> Result<(User, Session)> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            "SELECT user_id, email, name, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&*state.db_pool)
        .await?
        .ok_or_else(|| StandardError::new("ERR-AUTH-003").code(StatusCode::UNAUTHORIZED))?;
        if !verify_password(password, &creds.password_hash).await? {
            return Err(StandardError::new("ERR-AUTH-003").code(StatusCode::UNAUTHORIZED));
        }
        let user = User {
            user_id: creds.user_id,
            email: creds.email,
            name: creds.name,
        };
        let session = user.issue_session(state).await?;
        Ok((user, session))
    }

    pub async fn issue_session(&self, state: &AppState) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, expiry, status)
            VALUES ($1, NOW() + make_interval(days => $2), $3)
            RETURNING token, user_id, expiry, status
            "#,
        )
        .bind(&self.user_id)
        .bind(settings.session_ttl_days)
        .bind(SessionStatus::Active)
        .fetch_one(&*state.db_pool)
        .await?;
        tracing::debug!("issued session for {}", &self.email);
        Ok(session)
    }
}

impl Session {
    pub async fn check_token_validity(state: &AppState, token_str: &str) -> Result<User> {
        let token = token_str
            .parse::<Uuid>()
            .map_err(|_| StandardError::new("ERR-AUTH-002").code(StatusCode::UNAUTHORIZED))?;

        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT token, user_id, expiry, status
            FROM sessions
            WHERE token = $1
            AND status = $2
            AND expiry > NOW()
            "#,
        )
        .bind(token)
        .bind(SessionStatus::Active)
        .fetch_optional(&*state.db_pool)
        .await?;
        if let Some(session) = session {
            let user = sqlx::query_as::<_, User>(
                "SELECT user_id, email, name FROM users WHERE user_id = $1",
            )
            .bind(&session.user_id)
            .fetch_one(&*state.db_pool)
            .await?;
            Ok(user)
        } else {
            Err(StandardError::new("ERR-AUTH-001").code(StatusCode::UNAUTHORIZED))
        }
    }

    pub async fn expire_for_user(state: &AppState, user_id: &str) -> Result<()> {
        sqlx::query("UPDATE sessions SET status = $1 WHERE user_id = $2 AND status = $3")
            .bind(SessionStatus::Expired)
            .bind(user_id)
            .bind(SessionStatus::Active)
            .execute(&*state.db_pool)
            .await?;
        Ok(())
    }
}

pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    // bcrypt is CPU-bound, keep it off the async workers
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| StandardError::new("ERR-AUTH-004").interpolate_err(e.to_string()))?
        .map_err(|e| StandardError::new("ERR-AUTH-004").interpolate_err(e.to_string()))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| StandardError::new("ERR-AUTH-003").interpolate_err(e.to_string()))?
        .map_err(|e| StandardError::new("ERR-AUTH-003").interpolate_err(e.to_string()))
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::{hash_password, verify_password};
    use crate::prelude::Result;

    #[traced_test]
    #[tokio::test]
    async fn test_password_round_trip() -> Result<()> {
        let hash = bcrypt::hash("hunter2hunter2", 4).expect("hash failed");
        assert!(verify_password("hunter2hunter2", &hash).await?);
        assert!(!verify_password("wrong-password", &hash).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_hash_password_salts() -> Result<()> {
        let first = hash_password("correct horse battery").await?;
        let second = hash_password("correct horse battery").await?;
        assert_ne!(first, second);
        assert!(verify_password("correct horse battery", &first).await?);
        Ok(())
    }
}
