//! A cache of list results keyed by query.
//!
//! Entries go stale after a fixed time and are dropped when a mutation
//! invalidates their resource.

use std::{
    any::Any,
    collections::HashMap,
    fmt,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::{DatabaseId, TransactionListQuery};

/// How long a cached list is served before it is fetched again.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// The kinds of rows that can be cached and invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// The caller's accounts.
    Accounts,
    /// The caller's categories.
    Categories,
    /// The caller's transactions.
    Transactions,
}

impl Resource {
    /// Whether changing `self` can change the cached rows of `other`.
    ///
    /// Transaction rows carry their account and category names, and deleting
    /// an account deletes its transactions, so accounts and categories
    /// reach transactions.
    fn affects(self, other: Resource) -> bool {
        self == other
            || (other == Resource::Transactions
                && matches!(self, Resource::Accounts | Resource::Categories))
    }
}

/// The key for one cached list.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKey {
    /// All of the caller's accounts.
    Accounts,
    /// All of the caller's categories.
    Categories,
    /// The transactions matching a date range and optional account.
    #[allow(missing_docs)]
    Transactions {
        from: Option<String>,
        to: Option<String>,
        account_id: Option<DatabaseId>,
    },
}

impl QueryKey {
    /// The key for a transactions list query.
    pub fn transactions(query: &TransactionListQuery) -> Self {
        QueryKey::Transactions {
            from: query.from.clone(),
            to: query.to.clone(),
            account_id: query.account_id.clone(),
        }
    }

    /// The resource whose mutations invalidate this key.
    pub fn resource(&self) -> Resource {
        match self {
            QueryKey::Accounts => Resource::Accounts,
            QueryKey::Categories => Resource::Categories,
            QueryKey::Transactions { .. } => Resource::Transactions,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Accounts => write!(f, "accounts"),
            QueryKey::Categories => write!(f, "categories"),
            QueryKey::Transactions {
                from,
                to,
                account_id,
            } => write!(
                f,
                "transactions:{}:{}:{}",
                from.as_deref().unwrap_or_default(),
                to.as_deref().unwrap_or_default(),
                account_id.as_deref().unwrap_or_default()
            ),
        }
    }
}

struct Entry {
    resource: Resource,
    value: Box<dyn Any + Send + Sync>,
    fetched_at: Instant,
}

/// Cached list results shared by everything using one [super::Client].
pub struct QueryCache {
    stale_time: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();

        f.debug_struct("QueryCache")
            .field("stale_time", &self.stale_time)
            .field("keys", &keys)
            .finish()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    /// Create an empty cache whose entries go stale after `stale_time`.
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The fresh value cached under `key`, if any.
    ///
    /// Returns `None` if the entry is stale or holds a different type.
    pub fn get<T: Clone + 'static>(&self, key: &QueryKey) -> Option<T> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&key.to_string())?;

        if entry.fetched_at.elapsed() >= self.stale_time {
            return None;
        }

        entry.value.downcast_ref::<T>().cloned()
    }

    /// Cache `value` under `key`, replacing any previous entry.
    pub fn insert<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                key.to_string(),
                Entry {
                    resource: key.resource(),
                    value: Box::new(value),
                    fetched_at: Instant::now(),
                },
            );
    }

    /// Return the cached value for `key`, or run `fetch` and cache its
    /// result.
    ///
    /// Errors from `fetch` are returned and not cached.
    pub async fn fetch<T, E, F, Fut>(&self, key: &QueryKey, fetch: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get::<T>(key) {
            tracing::debug!("Cache hit for {key}");
            return Ok(value);
        }

        let value = fetch().await?;
        self.insert(key, value.clone());

        Ok(value)
    }

    /// Drop every entry that a change to `resource` could make outdated.
    pub fn invalidate(&self, resource: Resource) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, entry| !resource.affects(entry.resource));
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// The number of entries, fresh or stale.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
