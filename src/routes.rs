//! The route table.
//!
//! Every kind gets the same five operations at kind-specific paths. [`Target`] is the
//! inverse of the table: handlers name where to send the browser and the table says how
//! that is spelled.

use axum::Router;
use axum::extract::{Path, State};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::{Extension, Form};
use axum_extra::extract::CookieJar;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

use crate::guard::{self, CurrentUser};
use crate::{AppError, EntityKind, FormData, auth, crud};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection pool for the entity store.
    pub pool: SqlitePool,
    /// How long a session stays valid after sign-in.
    pub session_max_age: chrono::Duration,
}

impl AppState {
    /// Creates handler state over `pool`.
    pub fn new(pool: SqlitePool, session_max_age: chrono::Duration) -> Self {
        Self {
            pool,
            session_max_age,
        }
    }
}

/////////////////////////////////////////////// Target /////////////////////////////////////////////////

/// A place to send the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// All rows of a kind. The distance list is the site index.
    List(EntityKind),
    /// One row.
    Detail(EntityKind, i64),
    /// The create form.
    Create(EntityKind),
    /// The edit form for one row.
    Edit(EntityKind, i64),
    /// The delete endpoint for one row.
    Delete(EntityKind, i64),
    /// The sign-in form.
    Login,
    /// Sign out.
    Logout,
    /// The registration form.
    Register,
}

impl Target {
    /// The URL path for this target.
    pub fn path(&self) -> String {
        use EntityKind::*;
        match *self {
            Target::List(Distance) => "/".to_string(),
            Target::List(Office) => "/offices/".to_string(),
            Target::List(Person) => "/people/".to_string(),
            Target::List(Unit) => "/units/".to_string(),
            Target::Detail(Distance, id) => format!("/{}", id),
            Target::Detail(kind, id) => format!("/{}/{}", kind.name(), id),
            Target::Create(Distance) => "/log".to_string(),
            Target::Create(kind) => format!("/{}/create/", kind.name()),
            Target::Edit(Distance, id) => format!("/{}/edit", id),
            Target::Edit(kind, id) => {
                format!("{}{}/edit/", Target::List(kind).path(), id)
            }
            Target::Delete(Distance, id) => format!("/{}/delete/", id),
            Target::Delete(kind, id) => format!("/{}/{}/delete/", kind.name(), id),
            Target::Login => "/login/".to_string(),
            Target::Logout => "/logout/".to_string(),
            Target::Register => "/register/".to_string(),
        }
    }
}

/// Route patterns for one kind, in `Target` order.
struct Patterns {
    list: &'static str,
    detail: &'static str,
    create: &'static [&'static str],
    edit: &'static str,
    delete: &'static str,
}

fn patterns(kind: EntityKind) -> Patterns {
    match kind {
        EntityKind::Distance => Patterns {
            list: "/",
            detail: "/:id",
            create: &["/log", "/log/create/"],
            edit: "/:id/edit",
            delete: "/:id/delete/",
        },
        EntityKind::Office => Patterns {
            list: "/offices/",
            detail: "/office/:id",
            create: &["/office/create/"],
            edit: "/offices/:id/edit/",
            delete: "/office/:id/delete/",
        },
        EntityKind::Person => Patterns {
            list: "/people/",
            detail: "/person/:id",
            create: &["/person/create/"],
            edit: "/people/:id/edit/",
            delete: "/person/:id/delete/",
        },
        EntityKind::Unit => Patterns {
            list: "/units/",
            detail: "/unit/:id",
            create: &["/unit/create/"],
            edit: "/units/:id/edit/",
            delete: "/unit/:id/delete/",
        },
    }
}

/// Parses a key taken from the path. Anything that is not an integer names no row.
pub fn parse_id(kind: EntityKind, raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().map_err(|_| AppError::not_found(kind, raw))
}

fn kind_router(kind: EntityKind) -> Router<AppState> {
    let patterns = patterns(kind);
    let mut router = Router::new()
        .route(
            patterns.list,
            get(move |State(state): State<AppState>| crud::list(state, kind)),
        )
        .route(
            patterns.detail,
            get(move |State(state): State<AppState>, Path(id): Path<String>| {
                crud::detail(state, kind, id)
            }),
        )
        .route(
            patterns.edit,
            get(move |State(state): State<AppState>, Path(id): Path<String>| {
                crud::edit_form(state, kind, id)
            })
            .post(
                move |State(state): State<AppState>,
                      Extension(user): Extension<CurrentUser>,
                      Path(id): Path<String>,
                      Form(form): Form<FormData>| {
                    crud::edit(state, user, kind, id, form)
                },
            ),
        )
        .route(
            patterns.delete,
            get(move |State(state): State<AppState>, Path(id): Path<String>| {
                crud::delete(state, None, kind, id)
            })
            .post(
                move |State(state): State<AppState>,
                      Extension(user): Extension<CurrentUser>,
                      Path(id): Path<String>| {
                    crud::delete(state, Some(user), kind, id)
                },
            ),
        );
    for pattern in patterns.create {
        router = router.route(
            pattern,
            get(move |State(state): State<AppState>, jar: CookieJar| {
                crud::create_form(state, jar, kind)
            })
            .post(
                move |State(state): State<AppState>,
                      Extension(user): Extension<CurrentUser>,
                      Form(form): Form<FormData>| {
                    crud::create(state, user, kind, form)
                },
            ),
        );
    }
    router
}

/// Builds the application: guarded CRUD routes for every kind plus the public account
/// routes.
pub fn create_router(state: AppState) -> Router {
    let guarded = EntityKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| router.merge(kind_router(kind)))
        .route_layer(from_fn_with_state(state.clone(), guard::require_login));

    Router::new()
        .route("/login/", get(auth::login_form).post(auth::login))
        .route("/logout/", get(auth::logout).post(auth::logout))
        .route("/register/", get(auth::register_form).post(auth::register))
        .merge(guarded)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
