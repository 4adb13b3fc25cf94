//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::contacts::model::{Relationship, TrustedContact};
use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{Database, StoredUser, User};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run a single-row query and map the row, if any.
    async fn query_one<T>(
        &self,
        op: &str,
        sql: &str,
        args: impl libsql::params::IntoParams + Send,
        map: fn(&libsql::Row) -> Result<T, libsql::Error>,
    ) -> Result<Option<T>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(sql, args)
            .await
            .map_err(|e| DatabaseError::Query(format!("{op}: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => map(&row)
                .map(Some)
                .map_err(|e| DatabaseError::Query(format!("{op} row parse: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("{op}: {e}"))),
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Canonical timestamp format. Fixed width so text ordering matches time.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_default()
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

/// Distinguish uniqueness violations from other write failures.
fn write_error(op: &str, e: libsql::Error) -> DatabaseError {
    let message = e.to_string();
    if message.contains("UNIQUE constraint failed") {
        DatabaseError::Constraint(format!("{op}: {message}"))
    } else {
        DatabaseError::Query(format!("{op}: {message}"))
    }
}

const USER_COLUMNS: &str = "id, email, created_at, updated_at, password_hash";

const CONTACT_COLUMNS: &str = "id, user_id, name, phone, email, relationship, created_at";

/// Column order matches USER_COLUMNS.
fn row_to_user(row: &libsql::Row) -> Result<User, libsql::Error> {
    let id: String = row.get(0)?;
    let created: String = row.get(2)?;
    let updated: String = row.get(3)?;
    Ok(User {
        id: parse_uuid(&id),
        email: row.get(1)?,
        created_at: parse_datetime(&created),
        updated_at: parse_datetime(&updated),
    })
}

fn row_to_stored_user(row: &libsql::Row) -> Result<StoredUser, libsql::Error> {
    Ok(StoredUser {
        user: row_to_user(row)?,
        password_hash: row.get(4)?,
    })
}

/// Column order matches CONTACT_COLUMNS.
fn row_to_contact(row: &libsql::Row) -> Result<TrustedContact, libsql::Error> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let relationship: String = row.get(5)?;
    let created: String = row.get(6)?;
    Ok(TrustedContact {
        id: parse_uuid(&id),
        user_id: parse_uuid(&user_id),
        name: row.get(2)?,
        phone: row.get(3).ok(),
        email: row.get(4).ok(),
        relationship: relationship.parse().unwrap_or(Relationship::Other),
        created_at: parse_datetime(&created),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl Database for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Users ───────────────────────────────────────────────────────

    async fn insert_user(&self, user: &User, password_hash: &str) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO users (id, email, password_hash, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.id.to_string(),
                    user.email.as_str(),
                    password_hash,
                    format_datetime(&user.created_at),
                    format_datetime(&user.updated_at),
                ],
            )
            .await
            .map_err(|e| write_error("insert_user", e))?;

        debug!(user_id = %user.id, "User inserted into DB");
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, DatabaseError> {
        self.query_one(
            "get_user_by_email",
            &format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower(?1)"),
            params![email],
            row_to_stored_user,
        )
        .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        self.query_one(
            "get_user",
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.to_string()],
            row_to_user,
        )
        .await
    }

    // ── Sessions ────────────────────────────────────────────────────

    async fn insert_session(&self, token_hash: &str, user_id: Uuid) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                "INSERT INTO sessions (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![token_hash, user_id.to_string(), format_datetime(&Utc::now())],
            )
            .await
            .map_err(|e| write_error("insert_session", e))?;

        debug!(user_id = %user_id, "Session created");
        Ok(())
    }

    async fn get_session_user(&self, token_hash: &str) -> Result<Option<User>, DatabaseError> {
        self.query_one(
            "get_session_user",
            "SELECT u.id, u.email, u.created_at, u.updated_at, u.password_hash
             FROM sessions s JOIN users u ON u.id = s.user_id
             WHERE s.token_hash = ?1",
            params![token_hash],
            row_to_user,
        )
        .await
    }

    async fn delete_session(&self, token_hash: &str) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute(
                "DELETE FROM sessions WHERE token_hash = ?1",
                params![token_hash],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_session: {e}")))?;
        Ok(count > 0)
    }

    // ── Trusted contacts ────────────────────────────────────────────

    async fn insert_contact(&self, contact: &TrustedContact) -> Result<(), DatabaseError> {
        self.conn()
            .execute(
                &format!("INSERT INTO trusted_contacts ({CONTACT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                params![
                    contact.id.to_string(),
                    contact.user_id.to_string(),
                    contact.name.as_str(),
                    opt_text(contact.phone.as_deref()),
                    opt_text(contact.email.as_deref()),
                    contact.relationship.as_str(),
                    format_datetime(&contact.created_at),
                ],
            )
            .await
            .map_err(|e| write_error("insert_contact", e))?;

        debug!(id = %contact.id, user_id = %contact.user_id, "Trusted contact inserted");
        Ok(())
    }

    async fn get_contact(&self, id: Uuid) -> Result<Option<TrustedContact>, DatabaseError> {
        self.query_one(
            "get_contact",
            &format!("SELECT {CONTACT_COLUMNS} FROM trusted_contacts WHERE id = ?1"),
            params![id.to_string()],
            row_to_contact,
        )
        .await
    }

    async fn list_contacts(&self, user_id: Uuid) -> Result<Vec<TrustedContact>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {CONTACT_COLUMNS} FROM trusted_contacts WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC"
                ),
                params![user_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_contacts: {e}")))?;

        let mut contacts = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_contacts: {e}")))?
        {
            let contact = row_to_contact(&row)
                .map_err(|e| DatabaseError::Query(format!("list_contacts row parse: {e}")))?;
            contacts.push(contact);
        }
        Ok(contacts)
    }

    async fn update_contact(&self, contact: &TrustedContact) -> Result<(), DatabaseError> {
        let count = self
            .conn()
            .execute(
                "UPDATE trusted_contacts SET name = ?1, phone = ?2, email = ?3, relationship = ?4 WHERE id = ?5",
                params![
                    contact.name.as_str(),
                    opt_text(contact.phone.as_deref()),
                    opt_text(contact.email.as_deref()),
                    contact.relationship.as_str(),
                    contact.id.to_string(),
                ],
            )
            .await
            .map_err(|e| write_error("update_contact", e))?;

        if count == 0 {
            return Err(DatabaseError::NotFound {
                entity: "trusted_contact".to_string(),
                id: contact.id.to_string(),
            });
        }
        debug!(id = %contact.id, "Trusted contact updated");
        Ok(())
    }

    async fn delete_contact(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let count = self
            .conn()
            .execute(
                "DELETE FROM trusted_contacts WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_contact: {e}")))?;
        Ok(count > 0)
    }
}
