//! Defines the core data models and database queries for transactions.
//!
//! Transactions do not store their owner. A transaction belongs to whoever
//! owns its account, so every query joins through `account` on the caller's
//! [UserID].

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    DatabaseId, DeletedId, Error, UserID,
    account::get_account,
    api::{empty_string_as_none, number_or_string},
    category::get_category,
    database_id::{dedup_ids, new_database_id},
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The account the money moved in or out of.
    pub account_id: DatabaseId,
    /// The category the transaction is filed under, if any.
    pub category_id: Option<DatabaseId>,
    /// When the transaction happened.
    pub date: Date,
    /// Who was paid, or who paid.
    pub payee: String,
    /// The amount of money spent or earned in this transaction.
    ///
    /// Positive values are income, negative values are expenses.
    pub amount: f64,
    /// Free text notes.
    pub notes: Option<String>,
}

/// A transaction along with the names of its account and category, as shown
/// in transaction lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    /// The transaction's own fields, flattened into the row.
    #[serde(flatten)]
    pub transaction: Transaction,
    /// The name of the account the transaction belongs to.
    pub account_name: String,
    /// `None` for uncategorized transactions.
    pub category_name: Option<String>,
}

/// The fields a user sets when creating or updating a transaction.
///
/// Updates replace every field, so leaving out `categoryId` or `notes`
/// clears them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// The day the money moved, `YYYY-MM-DD`.
    pub date: Date,
    /// Who was paid, or who paid.
    pub payee: String,
    /// Negative for expenses. Accepts a number or a numeric string.
    #[serde(deserialize_with = "number_or_string")]
    pub amount: f64,
    /// An account owned by the caller.
    pub account_id: DatabaseId,
    /// A category owned by the caller, or `None` to leave it uncategorized.
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<DatabaseId>,
    /// Free text about the transaction.
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

/// The filters applied when listing transactions.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionFilter {
    /// The first day to include.
    pub from: Date,
    /// The last day to include.
    pub to: Date,
    /// Only include transactions in this account.
    pub account_id: Option<DatabaseId>,
}

/// A [TransactionForm] that passed validation.
struct ValidatedForm {
    date: Date,
    payee: String,
    amount: f64,
    account_id: DatabaseId,
    category_id: Option<DatabaseId>,
    notes: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL REFERENCES account(id) ON DELETE CASCADE,
            category_id TEXT REFERENCES category(id) ON DELETE SET NULL,
            date TEXT NOT NULL,
            payee TEXT NOT NULL,
            amount REAL NOT NULL,
            notes TEXT
        )",
        (),
    )?;

    // Improve performance of the date range query on the transactions page.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_account_date
        ON \"transaction\"(account_id, date)",
        (),
    )?;

    Ok(())
}

fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        category_id: row.get(2)?,
        date: row.get(3)?,
        payee: row.get(4)?,
        amount: row.get(5)?,
        notes: row.get(6)?,
    })
}

fn map_transaction_list_row(row: &Row) -> Result<TransactionRow, rusqlite::Error> {
    Ok(TransactionRow {
        transaction: map_transaction_row(row)?,
        account_name: row.get(7)?,
        category_name: row.get(8)?,
    })
}

/// Check the payee and that the account and category belong to `user_id`.
fn validate_form(
    form: &TransactionForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<ValidatedForm, Error> {
    let payee = form.payee.trim();

    if payee.is_empty() {
        return Err(Error::EmptyPayee);
    }

    let account_id = form.account_id.trim();
    match get_account(account_id, user_id, connection) {
        Ok(_) => {}
        Err(Error::NotFound) => return Err(Error::InvalidAccount(account_id.to_owned())),
        Err(error) => return Err(error),
    }

    let category_id = form
        .category_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    if let Some(category_id) = category_id {
        match get_category(category_id, user_id, connection) {
            Ok(_) => {}
            Err(Error::NotFound) => return Err(Error::InvalidCategory(category_id.to_owned())),
            Err(error) => return Err(error),
        }
    }

    let notes = form
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(str::to_owned);

    Ok(ValidatedForm {
        date: form.date,
        payee: payee.to_owned(),
        amount: form.amount,
        account_id: account_id.to_owned(),
        category_id: category_id.map(str::to_owned),
        notes,
    })
}

/// Create a transaction in one of `user_id`'s accounts.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyPayee] if the payee is blank,
/// - [Error::InvalidAccount] or [Error::InvalidCategory] if the form refers to
///   an account or category `user_id` does not own,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    form: &TransactionForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let form = validate_form(form, user_id, connection)?;

    connection
        .prepare(
            "INSERT INTO \"transaction\" (id, account_id, category_id, date, payee, amount, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, account_id, category_id, date, payee, amount, notes",
        )?
        .query_row(
            params![
                new_database_id(),
                form.account_id,
                form.category_id,
                form.date,
                form.payee,
                form.amount,
                form.notes,
            ],
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Get the transactions in `user_id`'s accounts matching `filter`, newest
/// first.
pub fn list_transactions(
    filter: &TransactionFilter,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.account_id, t.category_id, t.date, t.payee, t.amount, t.notes,
                a.name, c.name
            FROM \"transaction\" t
            INNER JOIN account a ON a.id = t.account_id
            LEFT JOIN category c ON c.id = t.category_id
            WHERE a.user_id = ?1
                AND t.date BETWEEN ?2 AND ?3
                AND (?4 IS NULL OR t.account_id = ?4)
            ORDER BY t.date DESC, t.id",
        )?
        .query_map(
            params![user_id.as_i64(), filter.from, filter.to, filter.account_id],
            map_transaction_list_row,
        )?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Get the transaction `id` if it is in one of `user_id`'s accounts.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user.
pub fn get_transaction(
    id: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT t.id, t.account_id, t.category_id, t.date, t.payee, t.amount, t.notes
            FROM \"transaction\" t
            INNER JOIN account a ON a.id = t.account_id
            WHERE t.id = ?1 AND a.user_id = ?2",
        )?
        .query_row(params![id, user_id.as_i64()], map_transaction_row)
        .map_err(Error::from)
}

/// Replace every field of the transaction `id`.
///
/// # Errors
/// Returns [Error::NotFound] if `user_id` does not own the transaction, and
/// otherwise the same validation errors as [create_transaction].
pub fn update_transaction(
    id: &str,
    form: &TransactionForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let existing = get_transaction(id, user_id, connection)?;
    let form = validate_form(form, user_id, connection)?;

    connection
        .prepare(
            "UPDATE \"transaction\"
            SET account_id = ?1, category_id = ?2, date = ?3, payee = ?4, amount = ?5, notes = ?6
            WHERE id = ?7
            RETURNING id, account_id, category_id, date, payee, amount, notes",
        )?
        .query_row(
            params![
                form.account_id,
                form.category_id,
                form.date,
                form.payee,
                form.amount,
                form.notes,
                existing.id,
            ],
            map_transaction_row,
        )
        .map_err(Error::from)
}

const DELETE_OWNED_TRANSACTION: &str = "DELETE FROM \"transaction\"
    WHERE id = ?1 AND account_id IN (SELECT id FROM account WHERE user_id = ?2)
    RETURNING id";

/// Delete the transaction `id` if it is in one of `user_id`'s accounts.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user.
pub fn delete_transaction(
    id: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<DeletedId, Error> {
    connection
        .query_row(
            DELETE_OWNED_TRANSACTION,
            params![id, user_id.as_i64()],
            |row| Ok(DeletedId { id: row.get(0)? }),
        )
        .map_err(Error::from)
}

/// Delete the transactions in `ids` that belong to `user_id` in a single
/// transaction. Other ids are skipped.
pub fn delete_transactions(
    ids: &[DatabaseId],
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<DeletedId>, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let mut deleted = Vec::new();

    {
        let mut statement = sql_transaction.prepare(DELETE_OWNED_TRANSACTION)?;

        for id in dedup_ids(ids) {
            let deleted_id = statement
                .query_row(params![id, user_id.as_i64()], |row| {
                    Ok(DeletedId { id: row.get(0)? })
                })
                .optional()?;

            deleted.extend(deleted_id);
        }
    }

    sql_transaction.commit()?;

    Ok(deleted)
}

/// Count the transactions in `user_id`'s accounts.
pub fn count_transactions(user_id: UserID, connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row(
            "SELECT COUNT(t.id) FROM \"transaction\" t
            INNER JOIN account a ON a.id = t.account_id
            WHERE a.user_id = ?1",
            params![user_id.as_i64()],
            |row| row.get::<_, i64>(0),
        )
        .map_err(Error::from)
        .and_then(|count| {
            u64::try_from(count).map_err(|_| {
                Error::SqlError(rusqlite::Error::IntegralValueOutOfRange(0, count))
            })
        })
}
