#![allow(missing_docs)]

pub(crate) mod form;

use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};
use rusqlite::Connection;
use scraper::Html;
use serde_json::json;

use crate::{
    AppState, Data, PaginationConfig, PasswordHash, UserID, ValidatedPassword,
    auth::{COOKIE_TOKEN, UserProfile, create_user},
    endpoints, initialize_db,
};

pub(crate) use form::{assert_form_input, assert_hx_endpoint, must_get_form, must_get_sheet_form};

/// A password strong enough to pass registration.
pub(crate) const TEST_PASSWORD: &str = "quilted-zebra-Marmalade-91";

/// bcrypt's minimum cost, so tests that register users stay fast.
const TEST_PASSWORD_HASH_COST: u32 = 4;

/// An app state with an empty in-memory database.
pub(crate) fn test_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    let mut state = AppState::new(connection, "42", "Etc/UTC", PaginationConfig::default())
        .expect("Could not create app state");
    state.password_hash_cost = TEST_PASSWORD_HASH_COST;

    state
}

/// An in-memory database with every table created.
pub(crate) fn test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize_db(&connection).expect("Could not initialize database");

    connection
}

/// Insert a user directly into the database.
pub(crate) fn insert_test_user(email: &str, connection: &Connection) -> UserID {
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked(TEST_PASSWORD),
        TEST_PASSWORD_HASH_COST,
    )
    .expect("Could not hash password");

    create_user(email, password_hash, connection)
        .expect("Could not create user")
        .id
}

/// A user registered through the API along with their auth cookie.
pub(crate) struct TestUser {
    pub id: UserID,
    pub cookie: Cookie<'static>,
}

/// Register `email` with [TEST_PASSWORD] through the API.
pub(crate) async fn register_user(server: &TestServer, email: &str) -> TestUser {
    let response = server
        .post(endpoints::USERS_API)
        .json(&json!({ "email": email, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();

    TestUser {
        id: response.json::<Data<UserProfile>>().data.id,
        cookie: response.cookie(COOKIE_TOKEN),
    }
}

/// Parse the HTML page in `response`.
pub(crate) fn parse_page(response: &TestResponse) -> Html {
    Html::parse_document(&response.text())
}
