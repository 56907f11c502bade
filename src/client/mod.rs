//! A typed HTTP client for the Finboard JSON API.
//!
//! The client sends and receives the same types the server uses, so a change
//! to a request or response shape breaks the client at compile time.
//!
//! The auth cookie is taken from the `Set-Cookie` header of the register and
//! log-in responses and sent with every later request. The server extends the
//! cookie on each authenticated request, so the stored cookie is replaced
//! whenever a response sets a new one.
//!
//! List results are kept in a [QueryCache] until they go stale or a mutation
//! of the same resource succeeds.

mod cache;

use std::sync::{Mutex, PoisonError};

use axum_extra::extract::cookie::Cookie;
use reqwest::{
    RequestBuilder, Response, StatusCode, Url,
    header::{COOKIE, SET_COOKIE},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Account, AccountForm, BulkDeleteRequest, Category, CategoryForm, Data, DatabaseId, DeletedId,
    ErrorBody, LogInRequest, RegisterRequest, Transaction, TransactionForm, TransactionListQuery,
    TransactionRow, UserProfile, auth::COOKIE_TOKEN, endpoints,
};

pub use cache::{DEFAULT_STALE_TIME, QueryCache, QueryKey, Resource};

/// The errors returned by [Client].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The client is not logged in, or its session expired.
    #[error("unauthorized")]
    Unauthorized,

    /// The row does not exist or belongs to another user.
    #[error("not found")]
    NotFound,

    /// The server rejected the request body or parameters.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The email is already registered.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The server failed to process the request.
    #[error("server error: {0}")]
    Server(String),

    /// The request could not be sent or the response could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    fn from_status(status: StatusCode, body: Option<ErrorBody>) -> Self {
        let message = match body {
            Some(ErrorBody {
                error,
                details: Some(details),
            }) => format!("{error}: {details}"),
            Some(ErrorBody { error, .. }) => error,
            None => status.to_string(),
        };

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::NOT_FOUND => ClientError::NotFound,
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            StatusCode::CONFLICT => ClientError::Conflict(message),
            _ => ClientError::Server(message),
        }
    }
}

/// A client for one user's session with a Finboard server.
#[derive(Debug)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    /// The `token=...` pair sent in the `Cookie` header.
    auth_cookie: Mutex<Option<String>>,
    cache: QueryCache,
}

impl Client {
    /// Create a client for the server at `base_url`, e.g. "http://127.0.0.1:3000".
    ///
    /// # Errors
    /// Returns [ClientError::Server] if `base_url` is not a valid URL.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|error| ClientError::Server(format!("invalid base url: {error}")))?;

        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            auth_cookie: Mutex::new(None),
            cache: QueryCache::default(),
        })
    }

    /// The cache of list results.
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Drop cached lists for `resource` once `result` shows the mutation
    /// succeeded.
    fn invalidate_on_success<T>(
        &self,
        resource: Resource,
        result: Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        if result.is_ok() {
            self.cache.invalidate(resource);
        }

        result
    }

    /// Whether the client holds an auth cookie.
    pub fn is_logged_in(&self) -> bool {
        self.auth_cookie
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|error| ClientError::Server(format!("invalid url {path}: {error}")))
    }

    fn item_url(&self, endpoint: &str, id: &str) -> Result<Url, ClientError> {
        self.url(&endpoints::format_endpoint(endpoint, id))
    }

    /// Keep the auth cookie from `response`, or forget it if the server
    /// expired it.
    fn store_auth_cookie(&self, response: &Response) {
        for value in response.headers().get_all(SET_COOKIE) {
            let Some(cookie) = value
                .to_str()
                .ok()
                .and_then(|value| Cookie::parse(value.to_owned()).ok())
            else {
                continue;
            };

            if cookie.name() != COOKIE_TOKEN {
                continue;
            }

            let is_expired = cookie
                .max_age()
                .is_some_and(|max_age| max_age.is_zero() || max_age.is_negative());
            let mut auth_cookie = self
                .auth_cookie
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            *auth_cookie = if is_expired {
                None
            } else {
                Some(cookie.stripped().to_string())
            };
        }
    }

    /// Send `request` with the auth cookie and unwrap the `data` field of the
    /// response.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let auth_cookie = self
            .auth_cookie
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let request = match auth_cookie {
            Some(cookie) => request.header(COOKIE, cookie),
            None => request,
        };

        let response = request.send().await?;
        self.store_auth_cookie(&response);

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Data<T>>().await?.data);
        }

        let body = response.json::<ErrorBody>().await.ok();
        tracing::debug!("Request failed with {status}: {body:?}");

        Err(ClientError::from_status(status, body))
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.http.post(url).json(body)).await
    }

    async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ClientError> {
        self.send(self.http.patch(url).json(body)).await
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        self.send(self.http.get(url)).await
    }

    async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        self.send(self.http.delete(url)).await
    }

    // ========================================================================
    // AUTH
    // ========================================================================

    /// Create a user and log in as them.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ClientError> {
        let profile = self.post(self.url(endpoints::USERS_API)?, request).await?;
        self.cache.clear();

        Ok(profile)
    }

    /// Log in and keep the session cookie.
    pub async fn log_in(&self, request: &LogInRequest) -> Result<UserProfile, ClientError> {
        let profile = self.post(self.url(endpoints::LOG_IN_API)?, request).await?;
        self.cache.clear();

        Ok(profile)
    }

    /// End the session. The client forgets its auth cookie even if the
    /// request fails.
    pub async fn log_out(&self) -> Result<(), ClientError> {
        let result = self
            .send::<()>(self.http.post(self.url(endpoints::LOG_OUT_API)?))
            .await;

        *self
            .auth_cookie
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        self.cache.clear();

        result
    }

    // ========================================================================
    // ACCOUNTS
    // ========================================================================

    /// The caller's accounts, sorted by name.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, ClientError> {
        let url = self.url(endpoints::ACCOUNTS_API)?;

        self.cache
            .fetch(&QueryKey::Accounts, || self.get(url))
            .await
    }

    /// The account with `id`.
    pub async fn get_account(&self, id: &str) -> Result<Account, ClientError> {
        self.get(self.item_url(endpoints::ACCOUNT_API, id)?).await
    }

    /// Create an account.
    pub async fn create_account(&self, form: &AccountForm) -> Result<Account, ClientError> {
        let result = self.post(self.url(endpoints::ACCOUNTS_API)?, form).await;

        self.invalidate_on_success(Resource::Accounts, result)
    }

    /// Rename the account with `id`.
    pub async fn update_account(
        &self,
        id: &str,
        form: &AccountForm,
    ) -> Result<Account, ClientError> {
        let result = self.patch(self.item_url(endpoints::ACCOUNT_API, id)?, form).await;

        self.invalidate_on_success(Resource::Accounts, result)
    }

    /// Delete the account with `id` and its transactions.
    pub async fn delete_account(&self, id: &str) -> Result<DeletedId, ClientError> {
        let result = self.delete(self.item_url(endpoints::ACCOUNT_API, id)?).await;

        self.invalidate_on_success(Resource::Accounts, result)
    }

    /// Delete the accounts in `ids`, skipping ids the caller does not own.
    pub async fn bulk_delete_accounts(
        &self,
        ids: &[DatabaseId],
    ) -> Result<Vec<DeletedId>, ClientError> {
        let request = BulkDeleteRequest { ids: ids.to_vec() };

        let result = self.post(self.url(endpoints::ACCOUNTS_BULK_DELETE_API)?, &request).await;

        self.invalidate_on_success(Resource::Accounts, result)
    }

    // ========================================================================
    // CATEGORIES
    // ========================================================================

    /// The caller's categories, sorted by name.
    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        let url = self.url(endpoints::CATEGORIES_API)?;

        self.cache
            .fetch(&QueryKey::Categories, || self.get(url))
            .await
    }

    /// The category with `id`.
    pub async fn get_category(&self, id: &str) -> Result<Category, ClientError> {
        self.get(self.item_url(endpoints::CATEGORY_API, id)?).await
    }

    /// Create a category.
    pub async fn create_category(&self, form: &CategoryForm) -> Result<Category, ClientError> {
        let result = self.post(self.url(endpoints::CATEGORIES_API)?, form).await;

        self.invalidate_on_success(Resource::Categories, result)
    }

    /// Rename the category with `id`.
    pub async fn update_category(
        &self,
        id: &str,
        form: &CategoryForm,
    ) -> Result<Category, ClientError> {
        let result = self.patch(self.item_url(endpoints::CATEGORY_API, id)?, form).await;

        self.invalidate_on_success(Resource::Categories, result)
    }

    /// Delete the category with `id`. Its transactions become uncategorized.
    pub async fn delete_category(&self, id: &str) -> Result<DeletedId, ClientError> {
        let result = self.delete(self.item_url(endpoints::CATEGORY_API, id)?).await;

        self.invalidate_on_success(Resource::Categories, result)
    }

    /// Delete the categories in `ids`, skipping ids the caller does not own.
    pub async fn bulk_delete_categories(
        &self,
        ids: &[DatabaseId],
    ) -> Result<Vec<DeletedId>, ClientError> {
        let request = BulkDeleteRequest { ids: ids.to_vec() };

        let result = self.post(self.url(endpoints::CATEGORIES_BULK_DELETE_API)?, &request).await;

        self.invalidate_on_success(Resource::Categories, result)
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    /// List transactions. Missing dates default to the trailing 30 days on
    /// the server.
    pub async fn list_transactions(
        &self,
        query: &TransactionListQuery,
    ) -> Result<Vec<TransactionRow>, ClientError> {
        let request = self
            .http
            .get(self.url(endpoints::TRANSACTIONS_API)?)
            .query(query);

        self.cache
            .fetch(&QueryKey::transactions(query), || self.send(request))
            .await
    }

    /// The transaction with `id`.
    pub async fn get_transaction(&self, id: &str) -> Result<Transaction, ClientError> {
        self.get(self.item_url(endpoints::TRANSACTION_API, id)?).await
    }

    /// Create a transaction.
    pub async fn create_transaction(
        &self,
        form: &TransactionForm,
    ) -> Result<Transaction, ClientError> {
        let result = self.post(self.url(endpoints::TRANSACTIONS_API)?, form).await;

        self.invalidate_on_success(Resource::Transactions, result)
    }

    /// Replace the fields of the transaction with `id`.
    pub async fn update_transaction(
        &self,
        id: &str,
        form: &TransactionForm,
    ) -> Result<Transaction, ClientError> {
        let result = self.patch(self.item_url(endpoints::TRANSACTION_API, id)?, form).await;

        self.invalidate_on_success(Resource::Transactions, result)
    }

    /// Delete the transaction with `id`.
    pub async fn delete_transaction(&self, id: &str) -> Result<DeletedId, ClientError> {
        let result = self.delete(self.item_url(endpoints::TRANSACTION_API, id)?).await;

        self.invalidate_on_success(Resource::Transactions, result)
    }

    /// Delete the transactions in `ids`, skipping ids the caller does not own.
    pub async fn bulk_delete_transactions(
        &self,
        ids: &[DatabaseId],
    ) -> Result<Vec<DeletedId>, ClientError> {
        let request = BulkDeleteRequest { ids: ids.to_vec() };

        let result = self.post(self.url(endpoints::TRANSACTIONS_BULK_DELETE_API)?, &request).await;

        self.invalidate_on_success(Resource::Transactions, result)
    }
}
