//! Accounts and sessions.
//!
//! Passwords are hashed with PBKDF2-HMAC-SHA256; access tokens are random
//! and only their SHA-256 digest reaches the database.

pub mod password;
pub mod routes;

use std::num::NonZeroU32;
use std::sync::{Arc, LazyLock};

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AuthError, DatabaseError};
use crate::store::{Database, User};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));

/// Whether `email` looks like an address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// A signed-in user and the token that identifies the session.
#[derive(Debug, Clone, Serialize)]
pub struct UserSession {
    pub user: User,
    pub access_token: String,
}

/// The `Bearer` token from an `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// PBKDF2 on the blocking pool, off the async workers.
async fn hash_blocking(plain: &str, rounds: NonZeroU32) -> Result<String, AuthError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || password::hash_password(&plain, rounds))
        .await
        .map_err(|e| AuthError::Hashing(format!("hash task failed: {e}")))
}

async fn verify_blocking(plain: &str, stored: String) -> Result<bool, AuthError> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || password::verify_password(&plain, &stored))
        .await
        .map_err(|e| AuthError::Hashing(format!("verify task failed: {e}")))?
}

pub struct AuthManager {
    db: Arc<dyn Database>,
    rounds: NonZeroU32,
}

impl AuthManager {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self::with_rounds(db, password::DEFAULT_ROUNDS)
    }

    /// Use a different PBKDF2 round count for new passwords.
    pub fn with_rounds(db: Arc<dyn Database>, rounds: NonZeroU32) -> Self {
        Self { db, rounds }
    }

    /// Check credentials shape before any database work.
    pub fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail);
        }
        Ok(())
    }

    /// Register a new account.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        Self::validate_credentials(email, password)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LEN,
            });
        }
        if self.db.get_user_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            created_at: now,
            updated_at: now,
        };
        let hash = hash_blocking(password, self.rounds).await?;

        match self.db.insert_user(&user, &hash).await {
            Ok(()) => {}
            Err(DatabaseError::Constraint(_)) => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    /// Verify credentials and open a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserSession, AuthError> {
        Self::validate_credentials(email, password)?;

        let Some(stored) = self.db.get_user_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        match verify_blocking(password, stored.password_hash.clone()).await {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::InvalidCredentials),
            Err(e) => {
                warn!(user_id = %stored.user.id, error = %e, "Rejecting sign-in");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let access_token = password::generate_token();
        self.db
            .insert_session(&password::token_digest(&access_token), stored.user.id)
            .await?;

        info!(user_id = %stored.user.id, "Signed in");
        Ok(UserSession {
            user: stored.user,
            access_token,
        })
    }

    /// End a session. Returns whether the token was live.
    pub async fn sign_out(&self, token: &str) -> Result<bool, AuthError> {
        let removed = self
            .db
            .delete_session(&password::token_digest(token))
            .await?;
        if removed {
            info!("Signed out");
        }
        Ok(removed)
    }

    /// The user behind an access token.
    pub async fn current_user(&self, token: &str) -> Result<Option<User>, AuthError> {
        Ok(self
            .db
            .get_session_user(&password::token_digest(token))
            .await?)
    }

    /// The user behind the request's bearer token.
    pub async fn user_from_headers(&self, headers: &HeaderMap) -> Result<User, AuthError> {
        let token = bearer_token(headers).ok_or(AuthError::Unauthorized)?;
        self.current_user(token)
            .await?
            .ok_or(AuthError::Unauthorized)
    }

    /// Like [`user_from_headers`](Self::user_from_headers), but the user must
    /// also be `user_id`.
    pub async fn authorize(&self, headers: &HeaderMap, user_id: &str) -> Result<User, AuthError> {
        let user = self.user_from_headers(headers).await?;
        if user.id.to_string() != user_id.trim() {
            return Err(AuthError::Unauthorized);
        }
        Ok(user)
    }
}
