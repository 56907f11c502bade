//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        bulk_delete_accounts_endpoint, create_account_endpoint, delete_account_endpoint,
        get_account_endpoint, get_accounts_page, list_accounts_endpoint, update_account_endpoint,
    },
    auth::{
        auth_guard, auth_guard_api, get_log_in_page, get_register_page, post_log_in,
        post_log_out, register_user,
    },
    category::{
        bulk_delete_categories_endpoint, create_category_endpoint, delete_category_endpoint,
        get_categories_page, get_category_endpoint, list_categories_endpoint,
        update_category_endpoint,
    },
    dashboard::get_dashboard_page,
    endpoints,
    not_found::get_404_not_found,
    transaction::{
        bulk_delete_transactions_endpoint, create_transaction_endpoint,
        delete_transaction_endpoint, get_transaction_endpoint, get_transactions_page,
        list_transactions_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT_API, post(post_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS_API, post(register_user));

    let protected_pages = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // API routes answer with a 401 instead of redirecting to the log-in page.
    let protected_api = Router::new()
        .route(
            endpoints::ACCOUNTS_API,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(
            endpoints::ACCOUNT_API,
            get(get_account_endpoint)
                .patch(update_account_endpoint)
                .delete(delete_account_endpoint),
        )
        .route(
            endpoints::ACCOUNTS_BULK_DELETE_API,
            post(bulk_delete_accounts_endpoint),
        )
        .route(
            endpoints::CATEGORIES_API,
            get(list_categories_endpoint).post(create_category_endpoint),
        )
        .route(
            endpoints::CATEGORY_API,
            get(get_category_endpoint)
                .patch(update_category_endpoint)
                .delete(delete_category_endpoint),
        )
        .route(
            endpoints::CATEGORIES_BULK_DELETE_API,
            post(bulk_delete_categories_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_API,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION_API,
            get(get_transaction_endpoint)
                .patch(update_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTIONS_BULK_DELETE_API,
            post(bulk_delete_transactions_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard_api));

    protected_pages
        .merge(protected_api)
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}
