//! The JSON API route handlers for transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::Response,
};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, BulkDeleteRequest, Data, Error, UserID,
    api::{ApiJson, ApiPath, ApiQuery, HtmxContext, require_id},
    db::lock_connection,
    timezone::local_today,
    transaction::{
        DateRange, Transaction, TransactionFilter, TransactionForm, TransactionListQuery,
        TransactionRow, create_transaction, delete_transaction, delete_transactions,
        get_transaction, list_transactions, update_transaction,
    },
};

/// The state needed by the transaction route handlers.
#[derive(Debug, Clone)]
pub struct TransactionState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The timezone used to work out today's date for the default range.
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Today's date in `local_timezone`.
pub(crate) fn today_in(local_timezone: &str) -> Result<Date, Error> {
    local_today(local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(local_timezone.to_owned()))
}

/// Turn the list query into a filter, filling in the default date range.
pub(crate) fn resolve_filter(
    query: &TransactionListQuery,
    today: Date,
) -> Result<TransactionFilter, Error> {
    let range = DateRange::resolve(query.from.as_deref(), query.to.as_deref(), today)?;

    Ok(TransactionFilter {
        from: range.from,
        to: range.to,
        account_id: query.account_id.as_deref().map(str::trim).map(str::to_owned),
    })
}

/// List the caller's transactions in a date range.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiQuery(query): ApiQuery<TransactionListQuery>,
) -> Result<Json<Data<Vec<TransactionRow>>>, Error> {
    let filter = resolve_filter(&query, today_in(&state.local_timezone)?)?;
    let connection = lock_connection(&state.db_connection)?;

    list_transactions(&filter, user_id, &connection).map(|rows| Json(Data::new(rows)))
}

pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<Data<Transaction>>, Error> {
    let id = require_id(&id)?;
    let connection = lock_connection(&state.db_connection)?;

    get_transaction(id, user_id, &connection).map(|transaction| Json(Data::new(transaction)))
}

pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiJson(form): ApiJson<TransactionForm>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let transaction = create_transaction(&form, user_id, &connection)?;

    Ok(htmx.respond(transaction))
}

pub async fn update_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiPath(id): ApiPath<String>,
    ApiJson(form): ApiJson<TransactionForm>,
) -> Result<Response, Error> {
    let id = require_id(&id)?;
    let connection = lock_connection(&state.db_connection)?;
    let transaction = update_transaction(id, &form, user_id, &connection)?;

    Ok(htmx.respond(transaction))
}

pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiPath(id): ApiPath<String>,
) -> Result<Response, Error> {
    let id = require_id(&id)?;
    let connection = lock_connection(&state.db_connection)?;
    let deleted = delete_transaction(id, user_id, &connection)?;

    Ok(htmx.respond(deleted))
}

pub async fn bulk_delete_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    htmx: HtmxContext,
    ApiJson(request): ApiJson<BulkDeleteRequest>,
) -> Result<Response, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let deleted = delete_transactions(&request.ids, user_id, &connection)?;

    tracing::info!("User {user_id} deleted {} transaction(s).", deleted.len());

    Ok(htmx.respond(deleted))
}
