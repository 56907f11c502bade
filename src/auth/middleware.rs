//! Authentication middleware that validates cookies, extends sessions, and
//! rejects or redirects anonymous callers.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{
    AppState, Error,
    auth::{
        DEFAULT_COOKIE_DURATION,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::build_log_in_redirect_url,
    },
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Check for a valid auth cookie, run the request with the caller's
/// [UserID](crate::UserID) in its extensions, then push the cookie expiry out.
///
/// `reject` builds the response for callers without a valid cookie.
#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    reject: impl FnOnce(&Request) -> Response,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::<Key>::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => match error {},
    };

    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(_) => {
            let request = Request::from_parts(parts, body);
            tracing::warn!(
                "Rejected request to {} without a valid auth cookie.",
                request.uri().path()
            );
            return reject(&request);
        }
    };

    parts.extensions.insert(user_id);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = match extend_auth_cookie_duration_if_needed(jar.clone(), DEFAULT_COOKIE_DURATION) {
        Ok(updated_jar) => updated_jar,
        Err(error) => {
            tracing::error!("Error extending cookie duration: {error}. Rolling back cookie jar.");
            jar
        }
    };

    for (key, value) in jar.into_response().headers().iter() {
        if key == SET_COOKIE {
            parts.headers.append(key, value.to_owned());
        }
    }

    Response::from_parts(parts, body)
}

/// Guard for the JSON API.
///
/// Callers without a valid auth cookie get a 401 JSON error and the handler,
/// and therefore the database, is never reached.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard_api(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, |_| {
        Error::Unauthenticated.into_response()
    })
    .await
}

/// Guard for the dashboard pages.
///
/// Callers without a valid auth cookie are redirected to the log-in page,
/// which sends them back to the page they asked for once logged in.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, |request| {
        Redirect::to(&build_log_in_redirect_url(request)).into_response()
    })
    .await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Json, Router, middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, SameSite},
    };
    use axum_test::TestServer;
    use time::{Duration, OffsetDateTime};

    use crate::{
        Error, ErrorBody,
        app_state::create_cookie_key,
        auth::{
            COOKIE_TOKEN, UserID, auth_guard, auth_guard_api, middleware::AuthState,
            set_auth_cookie,
        },
        endpoints,
    };

    async fn whoami(Extension(user_id): Extension<UserID>) -> Json<i64> {
        Json(user_id.as_i64())
    }

    async fn stub_log_in_route(jar: PrivateCookieJar) -> Result<PrivateCookieJar, Error> {
        set_auth_cookie(jar, UserID::new(42), Duration::seconds(5))
    }

    const TEST_LOG_IN_ROUTE: &str = "/test_log_in";
    const TEST_PAGE_ROUTE: &str = "/protected";
    const TEST_API_ROUTE: &str = "/api/protected";

    fn get_test_server() -> TestServer {
        let state = AuthState {
            cookie_key: create_cookie_key("nafstenoas"),
        };

        let app = Router::new()
            .route(TEST_PAGE_ROUTE, get(whoami))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .merge(
                Router::new()
                    .route(TEST_API_ROUTE, get(whoami))
                    .route_layer(middleware::from_fn_with_state(
                        state.clone(),
                        auth_guard_api,
                    )),
            )
            .route(TEST_LOG_IN_ROUTE, post(stub_log_in_route))
            .with_state(state);

        TestServer::new(app)
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(2),
            "got date time {left:?}, want {right:?}"
        );
    }

    async fn log_in(server: &TestServer) -> Cookie<'static> {
        let response = server.post(TEST_LOG_IN_ROUTE).await;
        response.assert_status_ok();
        response.cookie(COOKIE_TOKEN)
    }

    #[tokio::test]
    async fn valid_cookie_passes_user_id_to_handler() {
        let server = get_test_server();
        let cookie = log_in(&server).await;

        let response = server.get(TEST_API_ROUTE).add_cookie(cookie).await;

        response.assert_status_ok();
        assert_eq!(response.json::<i64>(), 42);
    }

    #[tokio::test]
    async fn guard_extends_cookie_duration() {
        let server = get_test_server();
        let cookie = log_in(&server).await;
        assert_date_time_close(
            cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + Duration::seconds(5),
        );

        let response = server.get(TEST_PAGE_ROUTE).add_cookie(cookie).await;

        let auth_cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close(
            auth_cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + Duration::minutes(5),
        );
        assert_eq!(auth_cookie.secure(), Some(true));
        assert_eq!(auth_cookie.http_only(), Some(true));
        assert_eq!(auth_cookie.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn api_without_cookie_is_unauthorized() {
        let server = get_test_server();

        let response = server.get(TEST_API_ROUTE).await;

        response.assert_status_unauthorized();
        assert_eq!(response.json::<ErrorBody>().error, "Unauthorized");
    }

    #[tokio::test]
    async fn api_with_garbage_cookie_is_unauthorized() {
        let server = get_test_server();

        let response = server
            .get(TEST_API_ROUTE)
            .add_cookie(Cookie::new(COOKIE_TOKEN, "FOOBAR"))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn page_without_cookie_redirects_to_log_in() {
        let server = get_test_server();

        let response = server.get(TEST_PAGE_ROUTE).await;

        response.assert_status_see_other();
        let expected_query =
            serde_urlencoded::to_string([("redirect_url", TEST_PAGE_ROUTE)]).unwrap();
        assert_eq!(
            response.header("location"),
            format!("{}?{}", endpoints::LOG_IN_VIEW, expected_query)
        );
    }
}
