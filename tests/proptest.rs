use std::collections::BTreeMap;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum_test::{TestRequest, TestResponse, TestServer};
use chrono::Utc;
use proptest::prelude::*;
use sqlx::SqlitePool;

use distance_counter::sql::{self, record};
use distance_counter::{AppState, EntityKind, create_router};

const REQUIRED: &str = "This field is required.";

/// Test infrastructure for driving the application over HTTP
pub struct ApiTestServer {
    pub server: TestServer,
    pub pool: SqlitePool,
    cookies: BTreeMap<String, String>,
}

impl ApiTestServer {
    /// Create a server over a fresh in-memory database with nobody signed in
    pub async fn new() -> Self {
        let pool = sql::connect("sqlite::memory:", 1).await.unwrap();
        sql::migrate(&pool).await.unwrap();
        let app = create_router(AppState::new(pool.clone(), chrono::Duration::days(14)));
        let server = TestServer::new(app).unwrap();
        Self {
            server,
            pool,
            cookies: BTreeMap::new(),
        }
    }

    /// Create a server with a session opened directly in the store
    pub async fn signed_in() -> Self {
        let mut api = Self::new().await;
        let mut tx = api.pool.begin().await.unwrap();
        let user_id = sql::user::create(&mut tx, "tester", "", "unused")
            .await
            .unwrap();
        sql::session::create(&mut tx, "test-session", user_id, Utc::now())
            .await
            .unwrap();
        tx.commit().await.unwrap();
        api.set_cookie("sessionid", "test-session");
        api
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    /// Apply every cookie a response set or removed, as a browser would
    pub fn keep_cookies(&mut self, response: &TestResponse) {
        for set_cookie in response.headers().get_all(SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.set_cookie(name, value);
            }
        }
    }

    fn with_cookie(&self, request: TestRequest) -> TestRequest {
        if self.cookies.is_empty() {
            return request;
        }
        let header = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        request.add_header(COOKIE, HeaderValue::from_str(&header).unwrap())
    }

    pub fn get(&self, path: &str) -> TestRequest {
        self.with_cookie(self.server.get(path))
    }

    pub fn post(&self, path: &str) -> TestRequest {
        self.with_cookie(self.server.post(path))
    }

    pub async fn count(&self, kind: EntityKind) -> i64 {
        let mut tx = self.pool.begin().await.unwrap();
        record::count(&mut tx, kind).await.unwrap()
    }

    pub async fn newest(&self, kind: EntityKind) -> i64 {
        let mut tx = self.pool.begin().await.unwrap();
        record::list(&mut tx, kind)
            .await
            .unwrap()
            .last()
            .expect("no rows")
            .id()
    }

    /// Create an office through the form and return its key
    pub async fn create_office(&self, city: &str, country: &str) -> i64 {
        let response = self
            .post("/office/create/")
            .form(&[("city", city), ("country", country)])
            .await;
        response.assert_status(StatusCode::FOUND);
        self.newest(EntityKind::Office).await
    }

    pub async fn create_person(&self, first: &str, last: &str, email: &str, office: i64) -> i64 {
        let office = office.to_string();
        let response = self
            .post("/person/create/")
            .form(&[
                ("first_name", first),
                ("last_name", last),
                ("email", email),
                ("office", office.as_str()),
            ])
            .await;
        response.assert_status(StatusCode::FOUND);
        self.newest(EntityKind::Person).await
    }

    pub async fn create_unit(&self, symbol: &str) -> i64 {
        let response = self
            .post("/unit/create/")
            .form(&[("symbol", symbol)])
            .await;
        response.assert_status(StatusCode::FOUND);
        self.newest(EntityKind::Unit).await
    }

    pub async fn create_distance(&self, date: &str, person: i64, magnitude: &str, unit: i64) -> i64 {
        let person = person.to_string();
        let unit = unit.to_string();
        let response = self
            .post("/log")
            .form(&[
                ("date", date),
                ("person", person.as_str()),
                ("magnitude", magnitude),
                ("unit", unit.as_str()),
            ])
            .await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location"), "/");
        self.newest(EntityKind::Distance).await
    }
}

/// Property test strategies for generating form input
pub mod strategies {
    use super::*;
    use proptest::string::string_regex;

    /// Strategy for text that needs neither trimming nor escaping
    pub fn word_strategy(max: usize) -> impl Strategy<Value = String> {
        string_regex(&format!("[A-Za-z][A-Za-z0-9]{{0,{}}}", max - 1)).unwrap()
    }

    /// Strategy for unit symbols one or more characters too long
    pub fn overlong_symbol_strategy() -> impl Strategy<Value = String> {
        string_regex("[a-z]{11,40}").unwrap()
    }

    /// Strategy for magnitudes within eight digits, as hundredths
    pub fn hundredths_strategy() -> impl Strategy<Value = i64> {
        0i64..100_000_000
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn office_create_then_detail_shows_values(
        city in strategies::word_strategy(100),
        country in strategies::word_strategy(100),
    ) {
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let api = ApiTestServer::signed_in().await;
            let id = api.create_office(&city, &country).await;

            let response = api.get(&format!("/office/{}", id)).await;
            response.assert_status_ok();
            let text = response.text();
            assert!(text.contains(&format!("Office ID: {}", id)));
            assert!(text.contains(&city));
            assert!(text.contains(&country));
        });
    }

    #[test]
    fn person_and_unit_create_then_detail_shows_values(
        first in strategies::word_strategy(20),
        last in strategies::word_strategy(30),
        symbol in strategies::word_strategy(10),
    ) {
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let api = ApiTestServer::signed_in().await;
            let office = api.create_office("Springfield", "USA").await;
            let email = format!("{}@example.com", first.to_lowercase());
            let person = api.create_person(&first, &last, &email, office).await;
            let unit = api.create_unit(&symbol).await;

            let response = api.get(&format!("/person/{}", person)).await;
            response.assert_status_ok();
            let text = response.text();
            assert!(text.contains(&format!("Person ID: {}", person)));
            for expected in [first.as_str(), last.as_str(), email.as_str(), "Springfield"] {
                assert!(text.contains(expected), "missing {}", expected);
            }

            let response = api.get(&format!("/unit/{}", unit)).await;
            response.assert_status_ok();
            let text = response.text();
            assert!(text.contains(&format!("Unit ID: {}", unit)));
            assert!(text.contains(&symbol));
        });
    }

    #[test]
    fn overlong_symbols_are_rejected(symbol in strategies::overlong_symbol_strategy()) {
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let api = ApiTestServer::signed_in().await;
            let response = api
                .post("/unit/create/")
                .form(&[("symbol", symbol.as_str())])
                .await;
            response.assert_status_ok();
            let expected = format!(
                "Ensure this value has at most 10 characters (it has {}).",
                symbol.len()
            );
            assert!(response.text().contains(&expected));
            assert_eq!(api.count(EntityKind::Unit).await, 0);
        });
    }

    #[test]
    fn magnitudes_display_with_two_places(hundredths in strategies::hundredths_strategy()) {
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let api = ApiTestServer::signed_in().await;
            let office = api.create_office("Leeds", "UK").await;
            let person = api.create_person("Lenny", "Leonard", "lenny@x.com", office).await;
            let unit = api.create_unit("km").await;
            let submitted = format!("{}.{:02}", hundredths / 100, hundredths % 100);
            let id = api.create_distance("2023-09-15", person, &submitted, unit).await;

            let shown = format!("{} km", submitted);
            let response = api.get(&format!("/{}", id)).await;
            assert!(response.text().contains(&shown), "{} -> {}", submitted, shown);
        });
    }
}

#[tokio::test]
async fn unauthenticated_requests_redirect_to_login() {
    let api = ApiTestServer::new().await;
    for path in ["/", "/people/", "/offices/", "/log", "/1", "/unit/create/"] {
        let response = api.get(path).await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(response.header("location"), "/login/", "{}", path);
    }

    let response = api
        .post("/office/create/")
        .form(&[("city", "Manchester"), ("country", "UK")])
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/login/");
    assert_eq!(api.count(EntityKind::Office).await, 0);
}

#[tokio::test]
async fn forged_session_redirects_to_login() {
    let mut api = ApiTestServer::new().await;
    api.set_cookie("sessionid", "not-a-session");
    let response = api.get("/").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/login/");
}

#[tokio::test]
async fn homer_logs_a_distance() {
    let api = ApiTestServer::signed_in().await;
    let office = api.create_office("Manchester", "UK").await;
    let person = api
        .create_person("Homer", "Simpson", "homer@x.com", office)
        .await;
    let unit = api.create_unit("steps").await;
    let id = api
        .create_distance("2023-09-15", person, "10.50", unit)
        .await;

    let response = api.get(&format!("/{}", id)).await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("data-template=\"distance/detail.html\""));
    for expected in ["2023-09-15", "Homer", "Simpson", "10.50", "steps"] {
        assert!(text.contains(expected), "missing {}", expected);
    }

    let index = api.get("/").await.text();
    assert!(index.contains("2023-09-15: Simpson, Homer"));
}

#[tokio::test]
async fn each_create_lands_on_its_list() {
    let api = ApiTestServer::signed_in().await;
    let response = api
        .post("/office/create/")
        .form(&[("city", "Manchester"), ("country", "UK")])
        .await;
    assert_eq!(response.header("location"), "/offices/");
    let response = api.post("/unit/create/").form(&[("symbol", "km")]).await;
    assert_eq!(response.header("location"), "/units/");
}

#[tokio::test]
async fn empty_distance_is_rejected_without_writing() {
    let api = ApiTestServer::signed_in().await;
    let office = api.create_office("Manchester", "UK").await;
    let person = api
        .create_person("Homer", "Simpson", "homer@x.com", office)
        .await;
    let unit = api.create_unit("steps").await;

    let person = person.to_string();
    let unit = unit.to_string();
    let response = api
        .post("/log/create/")
        .form(&[
            ("date", ""),
            ("person", person.as_str()),
            ("magnitude", ""),
            ("unit", unit.as_str()),
        ])
        .await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("data-template=\"distance/form.html\""));
    assert_eq!(text.matches(REQUIRED).count(), 2);
    assert_eq!(api.count(EntityKind::Distance).await, 0);
}

#[tokio::test]
async fn dangling_reference_is_a_field_error() {
    let api = ApiTestServer::signed_in().await;
    let response = api
        .post("/person/create/")
        .form(&[
            ("first_name", "Homer"),
            ("last_name", "Simpson"),
            ("email", "homer@x.com"),
            ("office", "999"),
        ])
        .await;
    response.assert_status_ok();
    assert!(
        response
            .text()
            .contains("Select a valid choice. That choice is not one of the available choices.")
    );
    assert_eq!(api.count(EntityKind::Person).await, 0);
}

#[tokio::test]
async fn missing_rows_are_not_found() {
    let api = ApiTestServer::signed_in().await;
    let response = api.get("/999").await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert!(response.text().contains("No distance matches the given query (999)."));

    for path in ["/office/999", "/people/999/edit/", "/unit/999/delete/", "/abc"] {
        api.get(path).await.assert_status(StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn edit_updates_and_shows_the_row() {
    let api = ApiTestServer::signed_in().await;
    let office = api.create_office("Manchester", "UK").await;

    let form = api.get(&format!("/offices/{}/edit/", office)).await;
    form.assert_status_ok();
    assert!(form.text().contains("value=\"Manchester\""));

    let response = api
        .post(&format!("/offices/{}/edit/", office))
        .form(&[("city", "Salford"), ("country", "UK")])
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), format!("/office/{}", office).as_str());
    assert!(api.get(&format!("/office/{}", office)).await.text().contains("Salford"));
}

#[tokio::test]
async fn invalid_edit_leaves_row_unchanged() {
    let api = ApiTestServer::signed_in().await;
    let office = api.create_office("Manchester", "UK").await;

    let response = api
        .post(&format!("/offices/{}/edit/", office))
        .form(&[("city", ""), ("country", "Scotland")])
        .await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains(REQUIRED));
    assert!(text.contains("value=\"Scotland\""));

    let detail = api.get(&format!("/office/{}", office)).await.text();
    assert!(detail.contains("Manchester"));
    assert!(!detail.contains("Scotland"));
}

#[tokio::test]
async fn delete_needs_confirmation() {
    let api = ApiTestServer::signed_in().await;
    let unit = api.create_unit("km").await;

    let response = api.get(&format!("/unit/{}/delete/", unit)).await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), format!("/unit/{}", unit).as_str());
    assert_eq!(api.count(EntityKind::Unit).await, 1);

    let response = api.post(&format!("/unit/{}/delete/", unit)).await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/units/");
    api.get(&format!("/unit/{}", unit))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_rows_of_every_kind_are_not_found() {
    let api = ApiTestServer::signed_in().await;
    let office = api.create_office("Springfield", "USA").await;
    let person = api
        .create_person("Marge", "Simpson", "marge@x.com", office)
        .await;
    let unit = api.create_unit("km").await;
    let distance = api.create_distance("2023-09-15", person, "5", unit).await;

    // Children first so each delete removes only its own row.
    for (kind, id) in [
        (EntityKind::Distance, distance),
        (EntityKind::Person, person),
        (EntityKind::Unit, unit),
        (EntityKind::Office, office),
    ] {
        let detail = match kind {
            EntityKind::Distance => format!("/{}", id),
            _ => format!("/{}/{}", kind, id),
        };
        api.get(&detail).await.assert_status_ok();

        let response = api.post(&format!("{}/delete/", detail)).await;
        response.assert_status(StatusCode::FOUND);
        let list = match kind {
            EntityKind::Distance => "/",
            EntityKind::Person => "/people/",
            EntityKind::Unit => "/units/",
            EntityKind::Office => "/offices/",
        };
        assert_eq!(response.header("location"), list);
        api.get(&detail).await.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(api.count(kind).await, 0, "{}", kind);
    }
}

#[tokio::test]
async fn deleting_an_office_removes_its_people_and_distances() {
    let api = ApiTestServer::signed_in().await;
    let office = api.create_office("Springfield", "USA").await;
    let person = api
        .create_person("Homer", "Simpson", "homer@x.com", office)
        .await;
    let unit = api.create_unit("km").await;
    let distance = api.create_distance("2023-09-15", person, "3", unit).await;

    let response = api.post(&format!("/office/{}/delete/", office)).await;
    assert_eq!(response.header("location"), "/offices/");

    api.get(&format!("/person/{}", person))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    api.get(&format!("/{}", distance))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    assert_eq!(api.count(EntityKind::Unit).await, 1);
}

#[tokio::test]
async fn register_sign_out_and_sign_in() {
    let mut api = ApiTestServer::new().await;

    let response = api
        .post("/register/")
        .form(&[
            ("username", "homer"),
            ("email", "homer@x.com"),
            ("password1", "donuts-4-ever"),
            ("password2", "donuts-4-ever"),
        ])
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/");
    api.keep_cookies(&response);
    api.get("/").await.assert_status_ok();

    let response = api.get("/logout/").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/login/");
    let response = api.get("/").await;
    assert_eq!(response.header("location"), "/login/");

    let response = api
        .post("/login/")
        .form(&[("username", "homer"), ("password", "donuts-4-never")])
        .await;
    response.assert_status_ok();
    assert!(
        response
            .text()
            .contains("Invalid username or password, please try again!")
    );

    let response = api
        .post("/login/")
        .form(&[("username", "homer"), ("password", "donuts-4-ever")])
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(response.header("location"), "/log");
    api.keep_cookies(&response);

    let response = api.get("/log").await;
    response.assert_status_ok();
    assert!(response.text().contains("Hello Homer, let's get logging!"));
    api.keep_cookies(&response);
    let response = api.get("/log").await;
    response.assert_status_ok();
    assert!(!response.text().contains("let's get logging"));
}

#[tokio::test]
async fn incomplete_sign_in_is_a_failed_sign_in() {
    let api = ApiTestServer::new().await;
    let response = api.post("/login/").form(&[("username", "homer")]).await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("Invalid username or password, please try again!"));
    assert!(!text.contains(REQUIRED));
}

#[tokio::test]
async fn duplicate_registration_is_a_field_error() {
    let api = ApiTestServer::signed_in().await;
    let response = api
        .post("/register/")
        .form(&[
            ("username", "tester"),
            ("password1", "donuts-4-ever"),
            ("password2", "donuts-4-ever"),
        ])
        .await;
    response.assert_status_ok();
    assert!(
        response
            .text()
            .contains("A user with that username already exists.")
    );
}
