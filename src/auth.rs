//! Sign-in, sign-out and account registration.
//!
//! Passwords are hashed with Argon2 and never stored or echoed in clear. A successful
//! sign-in or registration opens a session and hands its token to the browser in an
//! HTTP-only cookie.

use std::sync::LazyLock;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::Form;
use axum::extract::State;
use axum::response::IntoResponse;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::Utc;
use regex::Regex;
use uuid::Uuid;

use crate::crud::Outcome;
use crate::guard::SESSION_COOKIE;
use crate::render::View;
use crate::routes::{AppState, Target};
use crate::validate::{self, FieldErrors, REQUIRED, check_length};
use crate::{AppError, FormData, StoreError, sql};

/// Name of the cookie carrying the one-shot greeting shown after sign-in.
pub const WELCOME_COOKIE: &str = "welcome";

/// Shortest password accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const LOGIN_FAILED: &str = "Invalid username or password, please try again!";
const INVALID_USERNAME: &str = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
const DUPLICATE_USERNAME: &str = "A user with that username already exists.";
const PASSWORD_MISMATCH: &str = "The two password fields didn't match.";

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles"));

/// Errors from hashing or checking a password.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    /// The hasher rejected its input.
    #[error("could not hash password: {0}")]
    Hash(String),
    /// A stored hash is not a valid PHC string.
    #[error("stored password hash is malformed: {0}")]
    Malformed(String),
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        AppError::Store(StoreError::Internal(e.to_string()))
    }
}

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC string.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(|e| PasswordError::Malformed(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Malformed(e.to_string())),
    }
}

fn field<'a>(form: &'a FormData, name: &str) -> &'a str {
    form.get(name).map(String::as_str).unwrap_or("")
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn open_session(state: &AppState, user_id: i64) -> Result<Cookie<'static>, AppError> {
    let token = Uuid::new_v4().to_string();
    let mut tx = sql::begin_write(&state.pool).await?;
    sql::session::create(&mut tx, &token, user_id, Utc::now()).await?;
    tx.commit().await?;
    Ok(session_cookie(token))
}

fn title_case(text: &str) -> String {
    let mut titled = String::with_capacity(text.len());
    let mut after_letter = false;
    for c in text.chars() {
        if after_letter {
            titled.extend(c.to_lowercase());
        } else {
            titled.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    titled
}

/// The greeting shown on the distance log once `username` has signed in.
pub fn welcome_message(username: &str) -> String {
    format!("Hello {}, let's get logging!", title_case(username))
}

fn welcome_cookie(username: &str) -> Cookie<'static> {
    Cookie::build((WELCOME_COOKIE, username.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Takes the pending sign-in greeting out of `jar`, if there is one.
pub fn take_welcome(jar: CookieJar) -> (CookieJar, Option<String>) {
    let Some(username) = jar.get(WELCOME_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };
    let jar = jar.remove(Cookie::build(WELCOME_COOKIE).path("/"));
    (jar, Some(welcome_message(&username)))
}

fn login_page(username: &str, error: Option<&str>) -> Outcome {
    Outcome::Render {
        template: "login.html".to_string(),
        view: View::Login {
            username: username.to_string(),
            error: error.map(str::to_string),
        },
    }
}

/// Shows the sign-in form.
pub async fn login_form() -> Outcome {
    login_page("", None)
}

/// Signs in and continues to the distance log.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<FormData>,
) -> Result<impl IntoResponse, AppError> {
    let username = field(&form, "username").trim();
    let password = field(&form, "password");
    if username.is_empty()
        || password.is_empty()
        || check_length(username, 30).is_err()
        || check_length(password, 40).is_err()
    {
        return Ok((jar, login_page(username, Some(LOGIN_FAILED))));
    }

    let mut tx = state.pool.begin().await?;
    let user = sql::user::get_by_username(&mut tx, username).await?;
    tx.commit().await?;

    let user = match user {
        Some(user) if verify_password(password, &user.password_hash)? => user,
        _ => {
            tracing::warn!(username, "failed sign-in");
            return Ok((jar, login_page(username, Some(LOGIN_FAILED))));
        }
    };

    let cookie = open_session(&state, user.id).await?;
    tracing::info!(user = %user.username, "signed in");
    Ok((
        jar.add(cookie).add(welcome_cookie(&user.username)),
        Outcome::Redirect(Target::Create(crate::EntityKind::Distance)),
    ))
}

/// Closes the session and returns to the sign-in form.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let mut tx = sql::begin_write(&state.pool).await?;
        if sql::session::delete(&mut tx, cookie.value()).await? {
            tracing::info!("signed out");
        }
        tx.commit().await?;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Outcome::Redirect(Target::Login)))
}

fn register_page(values: FormData, errors: FieldErrors) -> Outcome {
    Outcome::Render {
        template: "register.html".to_string(),
        view: View::Register { values, errors },
    }
}

/// Shows the registration form.
pub async fn register_form() -> Outcome {
    register_page(FormData::new(), FieldErrors::new())
}

fn check_registration(form: &FormData) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let username = field(form, "username").trim();
    if username.is_empty() {
        errors.insert("username", REQUIRED);
    } else if let Err(message) = check_length(username, 150) {
        errors.insert("username", message);
    } else if !USERNAME.is_match(username) {
        errors.insert("username", INVALID_USERNAME);
    }

    let email = field(form, "email").trim();
    if !email.is_empty() {
        if !validate::is_valid_email(email) {
            errors.insert("email", validate::INVALID_EMAIL);
        } else if let Err(message) = check_length(email, 254) {
            errors.insert("email", message);
        }
    }

    let password1 = field(form, "password1");
    let password2 = field(form, "password2");
    if password1.is_empty() {
        errors.insert("password1", REQUIRED);
    }
    if password2.is_empty() {
        errors.insert("password2", REQUIRED);
    } else if !password1.is_empty() && password1 != password2 {
        errors.insert("password2", PASSWORD_MISMATCH);
    } else if password2.chars().count() < MIN_PASSWORD_LENGTH {
        errors.insert(
            "password2",
            format!(
                "This password is too short. It must contain at least {} characters.",
                MIN_PASSWORD_LENGTH
            ),
        );
    }
    errors
}

/// Creates an account, signs it in and continues to the index.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<FormData>,
) -> Result<impl IntoResponse, AppError> {
    let mut errors = check_registration(&form);
    if !errors.is_empty() {
        return Ok((jar, register_page(form, errors)));
    }

    let username = field(&form, "username").trim();
    let email = field(&form, "email").trim();
    let hash = hash_password(field(&form, "password1"))?;

    let mut tx = sql::begin_write(&state.pool).await?;
    let user_id = match sql::user::create(&mut tx, username, email, &hash).await {
        Ok(id) => id,
        Err(StoreError::AlreadyExists) => {
            errors.insert("username", DUPLICATE_USERNAME);
            return Ok((jar, register_page(form, errors)));
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit().await?;
    tracing::info!(user = %username, "registered");

    let cookie = open_session(&state, user_id).await?;
    Ok((
        jar.add(cookie),
        Outcome::Redirect(Target::List(crate::EntityKind::Distance)),
    ))
}
