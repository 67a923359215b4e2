//! The CRUD controller.
//!
//! One set of operations serves every [`EntityKind`]. Each operation runs in a single
//! transaction: the row lookup, validation (including reference checks) and the write
//! either all commit or none do.

use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::CookieJar;
use sqlx::{Sqlite, Transaction};

use crate::guard::CurrentUser;
use crate::render::{self, Choices, View};
use crate::routes::{AppState, Target, parse_id};
use crate::schema::{self, FieldType};
use crate::sql::{self, record};
use crate::validate::{FieldErrors, Validation, validate};
use crate::{AppError, EntityKind, FormData, Record, auth};

/// What a handler decided to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Show a page.
    Render {
        /// Logical template name.
        template: String,
        /// What the page shows.
        view: View,
    },
    /// Send the browser elsewhere with `302 Found`.
    Redirect(Target),
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Render { template, view } => {
                Html(render::render(&template, &view)).into_response()
            }
            Outcome::Redirect(target) => {
                (StatusCode::FOUND, [(header::LOCATION, target.path())]).into_response()
            }
        }
    }
}

async fn require(
    tx: &mut Transaction<'_, Sqlite>,
    kind: EntityKind,
    raw_id: &str,
) -> Result<Record, AppError> {
    let id = parse_id(kind, raw_id)?;
    record::get(tx, kind, id)
        .await?
        .ok_or_else(|| AppError::not_found(kind, id))
}

async fn choices(
    tx: &mut Transaction<'_, Sqlite>,
    kind: EntityKind,
) -> Result<Vec<(&'static str, Choices)>, AppError> {
    let mut all = Vec::new();
    for field in schema::fields(kind) {
        if let FieldType::Reference(target) = field.field_type {
            let options: Choices = record::list(tx, target)
                .await?
                .iter()
                .map(|row| (row.id(), row.label()))
                .collect();
            all.push((field.name, options));
        }
    }
    Ok(all)
}

async fn form_page(
    tx: &mut Transaction<'_, Sqlite>,
    kind: EntityKind,
    id: Option<i64>,
    values: FormData,
    errors: FieldErrors,
    notice: Option<String>,
) -> Result<Outcome, AppError> {
    let choices = choices(tx, kind).await?;
    Ok(Outcome::Render {
        template: kind.template("form"),
        view: View::Form {
            kind,
            id,
            values,
            errors,
            choices,
            notice,
        },
    })
}

/// Lists every row of `kind`.
pub async fn list(state: AppState, kind: EntityKind) -> Result<Outcome, AppError> {
    let mut tx = state.pool.begin().await?;
    let records = record::list(&mut tx, kind).await?;
    tx.commit().await?;
    Ok(Outcome::Render {
        template: kind.template("list"),
        view: View::List { kind, records },
    })
}

/// Shows one row of `kind`.
pub async fn detail(state: AppState, kind: EntityKind, id: String) -> Result<Outcome, AppError> {
    let mut tx = state.pool.begin().await?;
    let record = require(&mut tx, kind, &id).await?;
    tx.commit().await?;
    Ok(Outcome::Render {
        template: kind.template("detail"),
        view: View::Detail { record },
    })
}

/// Shows an empty create form, with the sign-in greeting if one is pending.
pub async fn create_form(
    state: AppState,
    jar: CookieJar,
    kind: EntityKind,
) -> Result<(CookieJar, Outcome), AppError> {
    let (jar, notice) = auth::take_welcome(jar);
    let mut tx = state.pool.begin().await?;
    let outcome = form_page(
        &mut tx,
        kind,
        None,
        FormData::new(),
        FieldErrors::new(),
        notice,
    )
    .await?;
    tx.commit().await?;
    Ok((jar, outcome))
}

/// Validates and inserts a submitted row, then returns to the kind's list.
///
/// An invalid submission is shown again with its errors and nothing is written.
pub async fn create(
    state: AppState,
    user: CurrentUser,
    kind: EntityKind,
    form: FormData,
) -> Result<Outcome, AppError> {
    let mut tx = sql::begin_write(&state.pool).await?;
    match validate(&mut tx, kind, &form).await? {
        Validation::Valid(draft) => {
            let id = record::insert(&mut tx, &draft).await?;
            tx.commit().await?;
            tracing::info!(kind = %kind, id, user = %user.username, "created");
            Ok(Outcome::Redirect(Target::List(kind)))
        }
        Validation::Invalid(errors) => {
            tracing::debug!(kind = %kind, errors = errors.len(), "create rejected");
            let outcome = form_page(&mut tx, kind, None, form, errors, None).await?;
            tx.commit().await?;
            Ok(outcome)
        }
    }
}

/// Shows the edit form pre-populated from the stored row.
pub async fn edit_form(state: AppState, kind: EntityKind, id: String) -> Result<Outcome, AppError> {
    let mut tx = state.pool.begin().await?;
    let record = require(&mut tx, kind, &id).await?;
    let outcome = form_page(
        &mut tx,
        kind,
        Some(record.id()),
        record.form_values(),
        FieldErrors::new(),
        None,
    )
    .await?;
    tx.commit().await?;
    Ok(outcome)
}

/// Validates a submission against an existing row and overwrites it, then shows the row.
///
/// An invalid submission leaves the row untouched.
pub async fn edit(
    state: AppState,
    user: CurrentUser,
    kind: EntityKind,
    id: String,
    form: FormData,
) -> Result<Outcome, AppError> {
    let mut tx = sql::begin_write(&state.pool).await?;
    let id = require(&mut tx, kind, &id).await?.id();
    match validate(&mut tx, kind, &form).await? {
        Validation::Valid(draft) => {
            if !record::update(&mut tx, id, &draft).await? {
                return Err(AppError::not_found(kind, id));
            }
            tx.commit().await?;
            tracing::info!(kind = %kind, id, user = %user.username, "updated");
            Ok(Outcome::Redirect(Target::Detail(kind, id)))
        }
        Validation::Invalid(errors) => {
            tracing::debug!(kind = %kind, id, errors = errors.len(), "edit rejected");
            let outcome = form_page(&mut tx, kind, Some(id), form, errors, None).await?;
            tx.commit().await?;
            Ok(outcome)
        }
    }
}

/// Deletes a row and everything that references it, then returns to the kind's list.
///
/// Without a confirming user (a plain GET) nothing is deleted and the browser is sent
/// back to the row.
pub async fn delete(
    state: AppState,
    confirmed_by: Option<CurrentUser>,
    kind: EntityKind,
    id: String,
) -> Result<Outcome, AppError> {
    let mut tx = sql::begin_write(&state.pool).await?;
    let id = require(&mut tx, kind, &id).await?.id();
    let Some(user) = confirmed_by else {
        tx.commit().await?;
        return Ok(Outcome::Redirect(Target::Detail(kind, id)));
    };
    record::delete(&mut tx, kind, id).await?;
    tx.commit().await?;
    tracing::info!(kind = %kind, id, user = %user.username, "deleted");
    Ok(Outcome::Redirect(Target::List(kind)))
}
