//! Logs the user out by expiring the auth cookie.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::{HxRedirect, HxRequest};

use crate::{Data, auth::invalidate_auth_cookie, endpoints};

/// Invalidate the auth cookie.
///
/// htmx requests are redirected to the log-in page.
pub async fn post_log_out(HxRequest(is_htmx): HxRequest, jar: PrivateCookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar);
    let body = Json(Data::new(()));

    if is_htmx {
        (jar, HxRedirect(endpoints::LOG_IN_VIEW.to_owned()), body).into_response()
    } else {
        (jar, body).into_response()
    }
}
