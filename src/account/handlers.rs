//! The JSON API route handlers for accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::Response,
};
use rusqlite::Connection;

use crate::{
    AppState, BulkDeleteRequest, Data, Error, UserID,
    account::{
        Account, AccountForm, create_account, delete_account, delete_accounts, get_account,
        list_accounts, update_account,
    },
    api::{ApiJson, ApiPath, HtmxContext, require_id},
    db::lock_connection,
};

/// The state needed by the account route handlers.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// List the caller's accounts.
pub async fn list_accounts_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Data<Vec<Account>>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_accounts(user_id, &connection).map(|accounts| Json(Data::new(accounts)))
}

/// Get one of the caller's accounts.
pub async fn get_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Data<Account>>, Error> {
    let id = require_id(&id)?;
    let connection = lock_connection(&state.db_connection)?;

    get_account(id, user_id, &connection).map(|account| Json(Data::new(account)))
}

/// Create an account owned by the caller.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiJson(form): ApiJson<AccountForm>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let account = create_account(&form, user_id, &connection)?;

    Ok(htmx.respond(account))
}

/// Rename one of the caller's accounts.
pub async fn update_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiPath(id): ApiPath<String>,
    ApiJson(form): ApiJson<AccountForm>,
) -> Result<Response, Error> {
    let id = require_id(&id)?;
    let connection = lock_connection(&state.db_connection)?;
    let account = update_account(id, &form, user_id, &connection)?;

    Ok(htmx.respond(account))
}

/// Delete one of the caller's accounts along with its transactions.
pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiPath(id): ApiPath<String>,
) -> Result<Response, Error> {
    let id = require_id(&id)?;
    let connection = lock_connection(&state.db_connection)?;
    let deleted = delete_account(id, user_id, &connection)?;

    Ok(htmx.respond(deleted))
}

/// Delete the caller's accounts among the requested ids.
pub async fn bulk_delete_accounts_endpoint(
    State(state): State<AccountState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiJson(request): ApiJson<BulkDeleteRequest>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let deleted = delete_accounts(&request.ids, user_id, &connection)?;

    tracing::info!("User {user_id} deleted {} account(s).", deleted.len());

    Ok(htmx.respond(deleted))
}
