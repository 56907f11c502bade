//! The JSON API route handlers for categories.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, BulkDeleteRequest, Data, Error, UserID,
    category::{
        Category, CategoryForm, create_category, delete_category, delete_categories, get_category,
        list_categories, update_category,
    },
    api::{ApiJson, ApiPath, HtmxContext, require_id},
    db::lock_connection,
};

/// The state needed by the category route handlers.
#[derive(Debug, Clone)]
pub struct CategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn list_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Data<Vec<Category>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_categories(user_id, &connection).map(|categories| Json(Data::new(categories)))
}

/// Get one of the caller's categories.
pub async fn get_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Data<Category>>, Error> {
    let id = require_id(&id)?;
    let connection = lock_connection(&state.db_connection)?;

    get_category(id, user_id, &connection).map(|category| Json(Data::new(category)))
}

/// Create a category owned by the caller.
pub async fn create_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiJson(form): ApiJson<CategoryForm>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let category = create_category(&form, user_id, &connection)?;

    Ok(htmx.respond(category))
}

pub async fn update_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiPath(id): ApiPath<String>,
    ApiJson(form): ApiJson<CategoryForm>,
) -> Result<Response, Error> {
    let id = require_id(&id)?;
    let connection = lock_connection(&state.db_connection)?;
    let category = update_category(id, &form, user_id, &connection)?;

    Ok(htmx.respond(category))
}

/// Delete one of the caller's categories, uncategorizing its transactions.
pub async fn delete_category_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiPath(id): ApiPath<String>,
) -> Result<Response, Error> {
    let id = require_id(&id)?;
    let connection = lock_connection(&state.db_connection)?;
    let deleted = delete_category(id, user_id, &connection)?;

    Ok(htmx.respond(deleted))
}

/// Delete the caller's categories among the requested ids.
pub async fn bulk_delete_categories_endpoint(
    State(state): State<CategoryState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiJson(request): ApiJson<BulkDeleteRequest>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let deleted = delete_categories(&request.ids, user_id, &connection)?;

    tracing::info!("User {user_id} deleted {} category(s).", deleted.len());

    Ok(htmx.respond(deleted))
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use serde_json::json;

    use crate::{
        Category, Data, DeletedId, ErrorBody, build_router,
        endpoints::{self, format_endpoint},
        test_utils::{register_user, test_state},
    };

    #[tokio::test]
    async fn create_then_list_includes_category_once() {
        let server = TestServer::new(build_router(test_state()));
        let user = register_user(&server, "alice@example.com").await;

        let created: Data<Category> = server
            .post(endpoints::CATEGORIES_API)
            .add_cookie(user.cookie.clone())
            .json(&json!({ "name": "Groceries" }))
            .await
            .json();

        let listed: Data<Vec<Category>> = server
            .get(endpoints::CATEGORIES_API)
            .add_cookie(user.cookie)
            .await
            .json();

        assert_eq!(listed.data, vec![created.data]);
    }

    #[tokio::test]
    async fn get_update_and_delete_category() {
        let server = TestServer::new(build_router(test_state()));
        let user = register_user(&server, "alice@example.com").await;
        let category: Data<Category> = server
            .post(endpoints::CATEGORIES_API)
            .add_cookie(user.cookie.clone())
            .json(&json!({ "name": "Groceries" }))
            .await
            .json();
        let url = format_endpoint(endpoints::CATEGORY_API, &category.data.id);

        let fetched: Data<Category> = server
            .get(&url)
            .add_cookie(user.cookie.clone())
            .await
            .json();
        assert_eq!(fetched, category);

        let updated: Data<Category> = server
            .patch(&url)
            .add_cookie(user.cookie.clone())
            .json(&json!({ "name": "Food" }))
            .await
            .json();
        assert_eq!(updated.data.name, "Food");

        let deleted: Data<DeletedId> = server
            .delete(&url)
            .add_cookie(user.cookie.clone())
            .await
            .json();
        assert_eq!(deleted.data.id, category.data.id);

        server
            .get(&url)
            .add_cookie(user.cookie)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn other_users_category_is_not_found() {
        let server = TestServer::new(build_router(test_state()));
        let alice = register_user(&server, "alice@example.com").await;
        let bob = register_user(&server, "bob@example.com").await;
        let category: Data<Category> = server
            .post(endpoints::CATEGORIES_API)
            .add_cookie(alice.cookie)
            .json(&json!({ "name": "Groceries" }))
            .await
            .json();
        let url = format_endpoint(endpoints::CATEGORY_API, &category.data.id);

        server
            .get(&url)
            .add_cookie(bob.cookie.clone())
            .await
            .assert_status_not_found();
        server
            .patch(&url)
            .add_cookie(bob.cookie.clone())
            .json(&json!({ "name": "Mine" }))
            .await
            .assert_status_not_found();
        let response = server.delete(&url).add_cookie(bob.cookie).await;
        response.assert_status_not_found();
        assert_eq!(response.json::<ErrorBody>().error, "Not found");
    }

    #[tokio::test]
    async fn bulk_delete_accepts_single_id_string() {
        let server = TestServer::new(build_router(test_state()));
        let user = register_user(&server, "alice@example.com").await;
        let category: Data<Category> = server
            .post(endpoints::CATEGORIES_API)
            .add_cookie(user.cookie.clone())
            .json(&json!({ "name": "Groceries" }))
            .await
            .json();

        let deleted: Data<Vec<DeletedId>> = server
            .post(endpoints::CATEGORIES_BULK_DELETE_API)
            .add_cookie(user.cookie)
            .json(&json!({ "ids": category.data.id }))
            .await
            .json();

        assert_eq!(deleted.data, vec![DeletedId { id: category.data.id }]);
    }

    #[tokio::test]
    async fn htmx_create_redirects_to_page_without_sheet() {
        let server = TestServer::new(build_router(test_state()));
        let user = register_user(&server, "alice@example.com").await;

        let response = server
            .post(endpoints::CATEGORIES_API)
            .add_cookie(user.cookie)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", "http://localhost/categories?sheet=edit&id=abc&page=2")
            .json(&json!({ "name": "Groceries" }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("hx-redirect"), "/categories?page=2");
    }
}
