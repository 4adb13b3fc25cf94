//! Persistence layer: SQLite-backed storage for accounts and trusted contacts.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{Database, StoredUser, User};
