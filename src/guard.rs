//! The authorization guard.
//!
//! Every CRUD route sits behind [`require_login`]. A request is allowed through when its
//! `sessionid` cookie names a live session; anything else is sent to the sign-in page.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::crud::Outcome;
use crate::routes::{AppState, Target};
use crate::sql::{self, SqlResult};
use crate::AppError;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "sessionid";

/// The signed-in account, available to guarded handlers as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// Key of the account.
    pub id: i64,
    /// Login name of the account.
    pub username: String,
}

/// The guard's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The request may proceed as this user.
    Allowed(CurrentUser),
    /// The request must go elsewhere first.
    Redirect(Target),
}

/// Decides whether the request carrying `jar` is signed in.
///
/// Sessions older than `max_age` are removed and treated as absent.
pub async fn check(
    pool: &SqlitePool,
    jar: &CookieJar,
    max_age: chrono::Duration,
) -> SqlResult<Access> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(Access::Redirect(Target::Login));
    };
    let token = cookie.value();

    let mut tx = pool.begin().await?;
    let session = sql::session::get(&mut tx, token).await?;
    tx.commit().await?;
    let Some(session) = session else {
        tracing::warn!("unknown session token");
        return Ok(Access::Redirect(Target::Login));
    };
    if Utc::now() - session.created_at > max_age {
        let mut tx = sql::begin_write(pool).await?;
        sql::session::delete(&mut tx, token).await?;
        tx.commit().await?;
        tracing::warn!(user = %session.username, "session expired");
        return Ok(Access::Redirect(Target::Login));
    }
    Ok(Access::Allowed(CurrentUser {
        id: session.user_id,
        username: session.username,
    }))
}

/// Middleware that lets signed-in requests through and redirects the rest to `/login/`.
pub async fn require_login(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match check(&state.pool, &jar, state.session_max_age).await {
        Ok(Access::Allowed(user)) => {
            tracing::debug!(user = %user.username, "access allowed");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(Access::Redirect(target)) => Outcome::Redirect(target).into_response(),
        Err(e) => AppError::from(e).into_response(),
    }
}
