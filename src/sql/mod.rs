//! SQLite database operations for distance-counter.
//!
//! This module provides functions for interacting with the SQLite database,
//! organized by data type. Every operation takes an open transaction so callers
//! decide what commits together.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::StoreError;

/// Office, person, unit and distance rows.
pub mod record;

/// Session rows backing the login cookie.
pub mod session;

/// Registered user accounts.
pub mod user;

/// Result type for database operations.
pub type SqlResult<T> = Result<T, StoreError>;

/// Opens a connection pool with foreign keys enforced on every connection.
///
/// An in-memory database lives only as long as its connection, so `sqlite::memory:` URLs
/// get a single connection that is never recycled. File databases run in WAL mode so
/// readers never wait on a writer.
pub async fn connect(database_url: &str, max_connections: u32) -> SqlResult<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let in_memory = database_url.contains(":memory:");
    let (options, pool_options) = if in_memory {
        (
            options,
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        )
    } else {
        (
            options.journal_mode(SqliteJournalMode::Wal),
            SqlitePoolOptions::new().max_connections(max_connections),
        )
    };
    Ok(pool_options.connect_with(options).await?)
}

/// Begins a transaction that holds the write lock from its first statement.
///
/// Every handler that writes opens its transaction here. Concurrent writers queue on the
/// lock (up to the busy timeout) instead of failing when a read lock cannot be upgraded.
pub async fn begin_write(pool: &SqlitePool) -> SqlResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Applies the migrations embedded from `migrations/`.
pub async fn migrate(pool: &SqlitePool) -> SqlResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Internal(e.to_string()))
}
