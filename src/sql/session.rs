//! Login sessions for SQLite database.
//!
//! A session is an opaque token handed to the browser in a cookie. Age checks are left to
//! the guard, which knows the configured lifetime.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, Transaction};

use super::SqlResult;

/// A live session joined with its account.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct SessionRecord {
    /// Opaque cookie value.
    pub token: String,
    /// Key of the signed-in account.
    pub user_id: i64,
    /// Login name of the signed-in account.
    pub username: String,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
}

/// Opens a session for `user_id`.
pub async fn create(
    tx: &mut Transaction<'_, Sqlite>,
    token: &str,
    user_id: i64,
    created_at: DateTime<Utc>,
) -> SqlResult<()> {
    sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
        .bind(token)
        .bind(user_id)
        .bind(created_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// Retrieves a session by token.
///
/// # Returns
/// * `Ok(Some(SessionRecord))` - Session exists
/// * `Ok(None)` - Unknown token
/// * `Err(StoreError)` - Database error
pub async fn get(tx: &mut Transaction<'_, Sqlite>, token: &str) -> SqlResult<Option<SessionRecord>> {
    Ok(sqlx::query_as::<_, SessionRecord>(
        r#"
        SELECT s.token, s.user_id, u.username, s.created_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token = ?
        "#,
    )
    .bind(token)
    .fetch_optional(&mut **tx)
    .await?)
}

/// Closes a session. Returns false if the token was unknown.
pub async fn delete(tx: &mut Transaction<'_, Sqlite>, token: &str) -> SqlResult<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::tests::setup_test_db;
    use crate::sql::user;

    #[tokio::test]
    async fn open_read_close() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();
        let user_id = user::create(&mut tx, "homer", "", "hash").await.unwrap();
        create(&mut tx, "token-1", user_id, Utc::now()).await.unwrap();

        let session = get(&mut tx, "token-1").await.unwrap().unwrap();
        assert_eq!(session.user_id, user_id);
        assert_eq!(session.username, "homer");

        assert!(delete(&mut tx, "token-1").await.unwrap());
        assert!(!delete(&mut tx, "token-1").await.unwrap());
        assert!(get(&mut tx, "token-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn created_at_round_trips() {
        let pool = setup_test_db().await;
        let mut tx = pool.begin().await.unwrap();
        let user_id = user::create(&mut tx, "marge", "", "hash").await.unwrap();
        let opened = DateTime::parse_from_rfc3339("2023-09-15T08:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        create(&mut tx, "token-2", user_id, opened).await.unwrap();
        let session = get(&mut tx, "token-2").await.unwrap().unwrap();
        assert_eq!(session.created_at, opened);
    }
}
