//! Helpers for the URL a user returns to after logging in.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Pages that make no sense to return to after logging in.
const AUTH_PAGES: [&str; 2] = [endpoints::LOG_IN_VIEW, endpoints::REGISTER_VIEW];

fn is_safe_redirect_url(redirect_url: &str) -> bool {
    if !redirect_url.starts_with('/') || redirect_url.starts_with("//") {
        return false;
    }

    let path = redirect_url
        .split_once('?')
        .map(|(path, _)| path)
        .unwrap_or(redirect_url);

    !AUTH_PAGES.contains(&path) && !path.starts_with("/api")
}

/// Reduce `raw_url` to a path and query on this site.
///
/// Returns `None` for absolute URLs to other hosts, API routes, and the
/// authentication pages themselves.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if uri.scheme().is_some() || uri.authority().is_some() {
        return None;
    }
    let path_and_query = uri.path_and_query()?.as_str();

    is_safe_redirect_url(path_and_query).then(|| path_and_query.to_owned())
}

/// The log-in page URL that returns the user to the page `request` asked for.
pub fn build_log_in_redirect_url(request: &Request) -> String {
    let target = request
        .uri()
        .path_and_query()
        .and_then(|path_and_query| normalize_redirect_url(path_and_query.as_str()))
        .unwrap_or_else(|| endpoints::DASHBOARD_VIEW.to_owned());

    build_log_in_redirect_url_from_target(&target)
}

fn build_log_in_redirect_url_from_target(redirect_target: &str) -> String {
    match serde_urlencoded::to_string([("redirect_url", redirect_target)]) {
        Ok(param) => format!("{}?{}", endpoints::LOG_IN_VIEW, param),
        Err(error) => {
            tracing::error!("Could not encode redirect URL {redirect_target}: {error}");
            endpoints::LOG_IN_VIEW.to_owned()
        }
    }
}
