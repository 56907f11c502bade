//! The log-in page and the endpoint that exchanges credentials for an auth
//! cookie.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
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
    api::{ApiJson, checkbox, empty_string_as_none},
    auth::{UserProfile, normalize_redirect_url, set_auth_cookie, user::get_user_by_email},
    db::lock_connection,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, LINK_STYLE, base, email_input, loading_spinner, log_in_register,
        password_input,
    },
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
pub const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The credentials sent to the log-in endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInRequest {
    /// The email the user registered with.
    pub email: String,

    /// The user's password in plain text.
    pub password: String,

    /// Keep the user logged in for a week instead of a few minutes.
    ///
    /// Accepts a boolean, or the "on" value an HTML checkbox sends.
    #[serde(default, deserialize_with = "checkbox")]
    pub remember_me: bool,

    /// The page to return to after logging in through the log-in page.
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub redirect_url: Option<String>,
}

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// Handler for log-in requests.
///
/// On success the auth cookie is set. htmx requests are redirected to the
/// requested page or the dashboard, other callers get their user profile.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is unknown or the
/// password is wrong. The two cases are not distinguished.
pub async fn post_log_in(
    State(state): State<LogInState>,
    HxRequest(is_htmx): HxRequest,
    jar: PrivateCookieJar,
    ApiJson(request): ApiJson<LogInRequest>,
) -> Result<Response, Error> {
    let user = {
        let connection = lock_connection(&state.db_connection)?;
        match get_user_by_email(&request.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                tracing::warn!("Log-in attempt for unknown email.");
                return Err(Error::InvalidCredentials);
            }
            Err(error) => return Err(error),
        }
    };

    let is_password_valid = user
        .password_hash
        .verify(&request.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        tracing::warn!("Log-in attempt with the wrong password for user {}.", user.id);
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if request.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;
    let body = Json(Data::new(UserProfile::from(user)));

    if is_htmx {
        let redirect_url = parse_redirect_url(request.redirect_url.as_deref())
            .unwrap_or_else(|| endpoints::DASHBOARD_VIEW.to_owned());

        Ok((jar, HxRedirect(redirect_url), body).into_response())
    } else {
        Ok((jar, body).into_response())
    }
}

fn parse_redirect_url(raw_url: Option<&str>) -> Option<String> {
    let raw_url = raw_url?;
    let redirect_url = normalize_redirect_url(raw_url);

    if redirect_url.is_none() {
        tracing::warn!("Ignoring invalid redirect URL: {raw_url}");
    }

    redirect_url
}

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

fn log_in_form(redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#submit-button"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirectUrl" value=(redirect_url);
            }

            (email_input(""))
            (password_input("current-password"))

            div class="flex items-center gap-x-3"
            {
                input type="checkbox" name="rememberMe" id="rememberMe" class="rounded-xs";

                label for="rememberMe" class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" class={ "w-full " (BUTTON_PRIMARY_STYLE) }
            {
                (loading_spinner())
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                a href=(endpoints::REGISTER_VIEW) class=(LINK_STYLE) { "Register here" }
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form(redirect_url.as_deref()));

    base("Log In", &content).into_response()
}
