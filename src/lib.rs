//! # distance-counter: Distances Logged Across Offices
//!
//! A small web application for recording how far people travel. People belong to offices,
//! and every logged distance names the person, the day, a magnitude and a unit of
//! measurement. Signed-in users manage all four kinds of record through HTML forms.
//!
//! ## Core Concepts
//!
//! ### Entity Kinds
//! There are four: [`EntityKind::Office`], [`EntityKind::Person`], [`EntityKind::Unit`] and
//! [`EntityKind::Distance`]. People reference an office; distances reference a person and
//! a unit. Deleting a referenced row deletes everything that references it.
//!
//! ### Schemas and Validation
//! Each kind is described by a table of fields in [`schema`]. One validator interprets
//! those tables, turning a submitted form into either a [`validate::Draft`] ready to write
//! or per-field error messages.
//!
//! ### Operations
//! Every kind supports the same five operations: list, detail, create, edit and delete.
//! Each runs inside one SQLite transaction and ends by rendering a page or redirecting.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Routes + session guard (Axum)           │
//! ├─────────────────────────────────────────┤
//! │ CRUD controller / account handlers      │
//! ├─────────────────────────────────────────┤
//! │ Validation (schema-driven)  │ Rendering │
//! ├─────────────────────────────────────────┤
//! │ Repository functions (sqlx)             │
//! ├─────────────────────────────────────────┤
//! │ SQLite (migrations/)                    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage Examples
//!
//! ### Parsing Magnitudes
//!
//! ```rust
//! # use distance_counter::{Magnitude, MagnitudeError};
//! let magnitude: Magnitude = "10.5".parse().unwrap();
//! assert_eq!(magnitude.hundredths(), 1050);
//! assert_eq!(magnitude.to_string(), "10.50");
//!
//! assert_eq!("1.234".parse::<Magnitude>(), Err(MagnitudeError::TooManyDecimalPlaces));
//! ```
//!
//! ### Serving the Application
//!
//! ```no_run
//! # use distance_counter::{AppState, create_router, sql};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = sql::connect("sqlite://distance.db", 5).await?;
//! sql::migrate(&pool).await?;
//! let app = create_router(AppState::new(pool, chrono::Duration::days(14)));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
mod errors;
mod kind;
mod magnitude;
mod model;

/// Sign-in, sign-out and account registration handlers.
pub mod auth;

/// Server configuration loaded from defaults, YAML and the command line.
pub mod config;

/// The generic create/read/update/delete controller.
pub mod crud;

/// Session checking middleware for guarded routes.
pub mod guard;

/// HTML rendering for every page.
pub mod render;

/// The route table and shared handler state.
pub mod routes;

/// Declarative field schemas for every entity kind.
pub mod schema;

/// SQLite storage.
pub mod sql;

/// Form validation driven by the schemas.
pub mod validate;

pub use config::{Config, ConfigError};
pub use errors::{AppError, StoreError};
pub use kind::{EntityKind, EntityKindParseError};
pub use magnitude::{Magnitude, MagnitudeError};
pub use model::{Distance, FormData, Office, Person, Record, Unit};
pub use routes::{AppState, Target, create_router};
