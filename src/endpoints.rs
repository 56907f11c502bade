//! The endpoint URIs for pages and the JSON API.
//!
//! For endpoints that take a parameter, e.g., '/api/accounts/{id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing the user's accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page listing the user's categories.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page listing the user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route for registering a new user.
pub const USERS_API: &str = "/api/users";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT_API: &str = "/api/log_out";

/// The route to list and create accounts.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to get, update and delete a single account.
pub const ACCOUNT_API: &str = "/api/accounts/{id}";
/// The route to delete many accounts at once.
pub const ACCOUNTS_BULK_DELETE_API: &str = "/api/accounts/bulk-delete";

/// The route to list and create categories.
pub const CATEGORIES_API: &str = "/api/categories";
/// The route to get, update and delete a single category.
pub const CATEGORY_API: &str = "/api/categories/{id}";
/// The route to delete many categories at once.
pub const CATEGORIES_BULK_DELETE_API: &str = "/api/categories/bulk-delete";

/// The route to list and create transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to get, update and delete a single transaction.
pub const TRANSACTION_API: &str = "/api/transactions/{id}";
/// The route to delete many transactions at once.
pub const TRANSACTIONS_BULK_DELETE_API: &str = "/api/transactions/bulk-delete";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace and ends with a
/// right brace. For example, in the endpoint path '/api/accounts/{id}', '{id}'
/// is the parameter.
///
/// This function assumes that an endpoint path contains at most one parameter.
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
