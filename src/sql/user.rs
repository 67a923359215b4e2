//! User account operations for SQLite database.
//!
//! Accounts hold a username and an Argon2 password hash. Hashing happens in the caller;
//! this module only stores and retrieves the PHC string.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, Transaction};

use super::SqlResult;

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct UserRecord {
    /// Store-assigned key.
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Optional contact address; empty when not given.
    pub email: String,
    /// Argon2 hash in PHC string format.
    pub password_hash: String,
    /// When the account was registered.
    pub date_joined: DateTime<Utc>,
}

/// Creates a new account.
///
/// # Arguments
/// * `tx` - SQLite transaction
/// * `username` - Unique login name, already validated
/// * `email` - Contact address, possibly empty
/// * `password_hash` - Argon2 PHC string
///
/// # Returns
/// * `Ok(i64)` - Key of the new account
/// * `Err(StoreError::AlreadyExists)` - Username is taken
/// * `Err(StoreError::Internal)` - Database error
pub async fn create(
    tx: &mut Transaction<'_, Sqlite>,
    username: &str,
    email: &str,
    password_hash: &str,
) -> SqlResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, date_joined)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Looks up an account by username.
pub async fn get_by_username(
    tx: &mut Transaction<'_, Sqlite>,
    username: &str,
) -> SqlResult<Option<UserRecord>> {
    Ok(sqlx::query_as::<_, UserRecord>(
        r#"
        SELECT id, username, email, password_hash, date_joined
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(&mut **tx)
    .await?)
}
