//! The registration page and the endpoint that creates new users.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::{HxRedirect, HxRequest};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Data, Error,
    api::ApiJson,
    auth::{
        PasswordHash, UserProfile, ValidatedPassword, create_user, set_auth_cookie,
        user::validate_email,
    },
    db::lock_connection,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, LINK_STYLE, base, email_input, loading_spinner, log_in_register,
        password_input,
    },
};

/// The details needed to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// The email the user will log in with.
    pub email: String,
    /// The user's password in plain text.
    pub password: String,
}

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The bcrypt cost used when hashing the password.
    pub password_hash_cost: u32,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a new user and log them in.
///
/// htmx requests are redirected to the dashboard, other callers get the new
/// user's profile.
///
/// # Errors
///
/// Returns:
/// - [Error::InvalidEmail] if the email is not an email address.
/// - [Error::TooWeak] if the password is easy to guess.
/// - [Error::DuplicateEmail] if the email is already registered.
pub async fn register_user(
    State(state): State<RegistrationState>,
    HxRequest(is_htmx): HxRequest,
    jar: PrivateCookieJar,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<Response, Error> {
    validate_email(&request.email)?;
    let password = ValidatedPassword::new(&request.password, &[request.email.as_str()])?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let user = {
        let connection = lock_connection(&state.db_connection)?;
        create_user(&request.email, password_hash, &connection)?
    };
    tracing::info!("Registered user {}.", user.id);

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;
    let body = Json(Data::new(UserProfile::from(user)));

    if is_htmx {
        Ok((
            jar,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            body,
        )
            .into_response())
    } else {
        Ok((jar, body).into_response())
    }
}

fn register_form() -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS_API)
            hx-indicator="#submit-button"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(""))
            (password_input("new-password"))

            button type="submit" id="submit-button" class={ "w-full " (BUTTON_PRIMARY_STYLE) }
            {
                (loading_spinner())
                "Create account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Log in here" }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let content = log_in_register("Create an account", &register_form());

    base("Register", &content).into_response()
}
