//! Unified `Database` trait: single async interface for all persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::contacts::model::TrustedContact;
use crate::error::DatabaseError;

/// A registered account, as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user row together with its stored password hash.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

/// Backend-agnostic database trait covering accounts, sessions and contacts.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    // ── Users ───────────────────────────────────────────────────────

    /// Insert a user. Fails with `Constraint` if the email is taken
    /// (compared case-insensitively).
    async fn insert_user(&self, user: &User, password_hash: &str) -> Result<(), DatabaseError>;

    /// Look up a user by email, ignoring case.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, DatabaseError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    // ── Sessions ────────────────────────────────────────────────────

    /// Record a session keyed by the digest of its access token.
    async fn insert_session(&self, token_hash: &str, user_id: Uuid) -> Result<(), DatabaseError>;

    /// The user owning a session, if the session exists.
    async fn get_session_user(&self, token_hash: &str) -> Result<Option<User>, DatabaseError>;

    /// Remove a session. Returns whether one existed.
    async fn delete_session(&self, token_hash: &str) -> Result<bool, DatabaseError>;

    // ── Trusted contacts ────────────────────────────────────────────

    async fn insert_contact(&self, contact: &TrustedContact) -> Result<(), DatabaseError>;

    async fn get_contact(&self, id: Uuid) -> Result<Option<TrustedContact>, DatabaseError>;

    /// All contacts of a user, oldest first.
    async fn list_contacts(&self, user_id: Uuid) -> Result<Vec<TrustedContact>, DatabaseError>;

    /// Overwrite the mutable fields of an existing contact.
    async fn update_contact(&self, contact: &TrustedContact) -> Result<(), DatabaseError>;

    /// Returns whether a row was deleted.
    async fn delete_contact(&self, id: Uuid) -> Result<bool, DatabaseError>;
}
