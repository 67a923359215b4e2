//! Repository functions for the four entity kinds.
//!
//! Writes are built from a validated [`Draft`], so the column list always comes from the
//! schema. Reads join in the display fields of referenced rows and decode into the typed
//! records in [`crate::model`].

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite, Transaction};

use super::SqlResult;
use crate::validate::{Draft, FieldValue};
use crate::{Distance, EntityKind, Office, Person, Record, Unit};

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn select(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Office => {
            r#"
            SELECT o.id, o.city, o.country
            FROM offices o
            "#
        }
        EntityKind::Person => {
            r#"
            SELECT p.id, p.first_name, p.last_name, p.email, p.office_id, o.city AS office_city
            FROM people p
            JOIN offices o ON o.id = p.office_id
            "#
        }
        EntityKind::Unit => {
            r#"
            SELECT u.id, u.symbol
            FROM units u
            "#
        }
        EntityKind::Distance => {
            r#"
            SELECT d.id, d.date, d.person_id,
                   p.first_name AS person_first_name, p.last_name AS person_last_name,
                   d.magnitude, d.unit_id, u.symbol AS unit_symbol
            FROM distances d
            JOIN people p ON p.id = d.person_id
            JOIN units u ON u.id = d.unit_id
            "#
        }
    }
}

fn key_column(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Office => "o.id",
        EntityKind::Person => "p.id",
        EntityKind::Unit => "u.id",
        EntityKind::Distance => "d.id",
    }
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &FieldValue) -> SqliteQuery<'q> {
    match value {
        FieldValue::Text(text) => query.bind(text.clone()),
        FieldValue::Date(date) => query.bind(*date),
        FieldValue::Decimal(magnitude) => query.bind(magnitude.hundredths()),
        FieldValue::Reference(_, id) => query.bind(*id),
    }
}

async fn fetch_as<T>(
    tx: &mut Transaction<'_, Sqlite>,
    sql: &str,
    id: Option<i64>,
) -> SqlResult<Vec<T>>
where
    T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
{
    let mut query = sqlx::query_as::<_, T>(sql);
    if let Some(id) = id {
        query = query.bind(id);
    }
    Ok(query.fetch_all(&mut **tx).await?)
}

async fn fetch(
    tx: &mut Transaction<'_, Sqlite>,
    kind: EntityKind,
    id: Option<i64>,
) -> SqlResult<Vec<Record>> {
    let sql = match id {
        Some(_) => format!("{} WHERE {} = ?", select(kind), key_column(kind)),
        None => format!("{} ORDER BY {}", select(kind), key_column(kind)),
    };
    let records = match kind {
        EntityKind::Office => fetch_as::<Office>(tx, &sql, id)
            .await?
            .into_iter()
            .map(Record::Office)
            .collect(),
        EntityKind::Person => fetch_as::<Person>(tx, &sql, id)
            .await?
            .into_iter()
            .map(Record::Person)
            .collect(),
        EntityKind::Unit => fetch_as::<Unit>(tx, &sql, id)
            .await?
            .into_iter()
            .map(Record::Unit)
            .collect(),
        EntityKind::Distance => fetch_as::<Distance>(tx, &sql, id)
            .await?
            .into_iter()
            .map(Record::Distance)
            .collect(),
    };
    Ok(records)
}

/// Retrieves one row of `kind` by key.
///
/// # Returns
/// * `Ok(Some(Record))` - Row found
/// * `Ok(None)` - No row of this kind has the key
/// * `Err(StoreError)` - Database error
pub async fn get(
    tx: &mut Transaction<'_, Sqlite>,
    kind: EntityKind,
    id: i64,
) -> SqlResult<Option<Record>> {
    Ok(fetch(tx, kind, Some(id)).await?.into_iter().next())
}

/// Lists every row of `kind` in key order.
pub async fn list(tx: &mut Transaction<'_, Sqlite>, kind: EntityKind) -> SqlResult<Vec<Record>> {
    fetch(tx, kind, None).await
}

/// Returns true if a row of `kind` has the key.
pub async fn exists(tx: &mut Transaction<'_, Sqlite>, kind: EntityKind, id: i64) -> SqlResult<bool> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", kind.table());
    let count: i64 = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_one(&mut **tx)
        .await?;
    Ok(count > 0)
}

/// Counts the rows of `kind`.
pub async fn count(tx: &mut Transaction<'_, Sqlite>, kind: EntityKind) -> SqlResult<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
    Ok(sqlx::query_scalar(&sql).fetch_one(&mut **tx).await?)
}

/// Inserts a new row from a validated draft.
///
/// # Returns
/// * `Ok(i64)` - The store-assigned key of the new row
/// * `Err(StoreError)` - Database error
pub async fn insert(tx: &mut Transaction<'_, Sqlite>, draft: &Draft) -> SqlResult<i64> {
    let columns: Vec<&str> = draft.columns().map(|(column, _)| column).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        draft.kind().table(),
        columns.join(", "),
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for (_, value) in draft.columns() {
        query = bind_value(query, value);
    }
    let result = query.execute(&mut **tx).await?;
    Ok(result.last_insert_rowid())
}

/// Overwrites the row `id` with a validated draft.
///
/// # Returns
/// * `Ok(true)` - Row existed and was updated
/// * `Ok(false)` - No row of the draft's kind has the key
/// * `Err(StoreError)` - Database error
pub async fn update(tx: &mut Transaction<'_, Sqlite>, id: i64, draft: &Draft) -> SqlResult<bool> {
    let assignments: Vec<String> = draft
        .columns()
        .map(|(column, _)| format!("{} = ?", column))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?",
        draft.kind().table(),
        assignments.join(", ")
    );

    let mut query = sqlx::query(&sql);
    for (_, value) in draft.columns() {
        query = bind_value(query, value);
    }
    let result = query.bind(id).execute(&mut **tx).await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes the row `id` of `kind`.
///
/// The schema cascades the delete to every row that references it: offices take their
/// people with them, and people and units take their distances.
///
/// # Returns
/// * `Ok(true)` - Row existed and was deleted
/// * `Ok(false)` - Row did not exist
/// * `Err(StoreError)` - Database error
pub async fn delete(tx: &mut Transaction<'_, Sqlite>, kind: EntityKind, id: i64) -> SqlResult<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?", kind.table());
    let result = sqlx::query(&sql).bind(id).execute(&mut **tx).await?;
    Ok(result.rows_affected() > 0)
}
