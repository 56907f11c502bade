//! The account model and the queries that read and write accounts.
//!
//! Every query takes the caller's [UserID] and only touches rows the caller
//! owns.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::{
    DatabaseId, DeletedId, Error, UserID,
    database_id::{dedup_ids, new_database_id},
};

/// A bank account, credit card, or wallet that transactions are recorded
/// against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The id for the account.
    pub id: DatabaseId,
    /// The user that owns the account.
    pub user_id: UserID,
    /// The display name of the account.
    pub name: String,
}

/// The fields a user can set when creating or updating an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountForm {
    /// The display name of the account.
    pub name: String,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_user_id ON account(user_id)",
        (),
    )?;

    Ok(())
}

fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
    })
}

/// Trim `name`, rejecting names that are empty after trimming.
pub(crate) fn validate_name(name: &str) -> Result<String, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyName);
    }

    Ok(name.to_owned())
}

/// Create an account owned by `user_id`.
///
/// # Errors
/// Returns [Error::EmptyName] if the name is blank, or [Error::SqlError] if
/// the insert failed.
pub fn create_account(
    form: &AccountForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = validate_name(&form.name)?;

    connection
        .query_row(
            "INSERT INTO account (id, user_id, name) VALUES (?1, ?2, ?3)
            RETURNING id, user_id, name",
            params![new_database_id(), user_id.as_i64(), name],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get every account owned by `user_id`, ordered by name.
pub fn list_accounts(user_id: UserID, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name FROM account
            WHERE user_id = ?1
            ORDER BY name COLLATE NOCASE, id",
        )?
        .query_map(params![user_id.as_i64()], map_row_to_account)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Get the account `id` if `user_id` owns it.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to
/// another user.
pub fn get_account(id: &str, user_id: UserID, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_row(
            "SELECT id, user_id, name FROM account WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Rename the account `id` if `user_id` owns it.
///
/// # Errors
/// Returns [Error::EmptyName] if the name is blank, or [Error::NotFound] if
/// the account does not exist or belongs to another user.
pub fn update_account(
    id: &str,
    form: &AccountForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<Account, Error> {
    let name = validate_name(&form.name)?;

    connection
        .query_row(
            "UPDATE account SET name = ?1 WHERE id = ?2 AND user_id = ?3
            RETURNING id, user_id, name",
            params![name, id, user_id.as_i64()],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Delete the account `id` and its transactions if `user_id` owns it.
///
/// # Errors
/// Returns [Error::NotFound] if the account does not exist or belongs to
/// another user.
pub fn delete_account(
    id: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<DeletedId, Error> {
    connection
        .query_row(
            "DELETE FROM account WHERE id = ?1 AND user_id = ?2 RETURNING id",
            params![id, user_id.as_i64()],
            |row| Ok(DeletedId { id: row.get(0)? }),
        )
        .map_err(Error::from)
}

/// Delete the accounts in `ids` that `user_id` owns, skipping the rest.
///
/// All deletes happen in one transaction. Returns the ids that were deleted.
pub fn delete_accounts(
    ids: &[DatabaseId],
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<DeletedId>, Error> {
    let transaction = connection.unchecked_transaction()?;
    let mut deleted = Vec::new();

    {
        let mut statement = transaction
            .prepare("DELETE FROM account WHERE id = ?1 AND user_id = ?2 RETURNING id")?;

        for id in dedup_ids(ids) {
            let deleted_id = statement
                .query_row(params![id, user_id.as_i64()], |row| {
                    Ok(DeletedId { id: row.get(0)? })
                })
                .optional()?;

            deleted.extend(deleted_id);
        }
    }

    transaction.commit()?;

    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        DeletedId, Error,
        account::{AccountForm, create_account_table},
        test_utils::{insert_test_user, test_connection},
    };

    use super::{
        create_account, delete_account, delete_accounts, get_account, list_accounts,
        update_account,
    };

    fn form(name: &str) -> AccountForm {
        AccountForm {
            name: name.to_owned(),
        }
    }

    #[test]
    fn sql_is_valid() {
        let connection = Connection::open_in_memory().unwrap();

        assert_eq!(Ok(()), create_account_table(&connection));
    }

    #[test]
    fn create_trims_name_and_stamps_owner() {
        let connection = test_connection();
        let user_id = insert_test_user("a@example.com", &connection);

        let account = create_account(&form("  Cheque  "), user_id, &connection).unwrap();

        assert_eq!(account.name, "Cheque");
        assert_eq!(account.user_id, user_id);
        assert_eq!(account.id.len(), 32);
    }

    #[test]
    fn create_rejects_blank_name() {
        let connection = test_connection();
        let user_id = insert_test_user("a@example.com", &connection);

        assert_eq!(
            create_account(&form("   "), user_id, &connection),
            Err(Error::EmptyName)
        );
    }

    #[test]
    fn list_only_returns_own_accounts_by_name() {
        let connection = test_connection();
        let alice = insert_test_user("alice@example.com", &connection);
        let bob = insert_test_user("bob@example.com", &connection);
        create_account(&form("savings"), alice, &connection).unwrap();
        create_account(&form("Cheque"), alice, &connection).unwrap();
        create_account(&form("Bob's"), bob, &connection).unwrap();

        let names: Vec<String> = list_accounts(alice, &connection)
            .unwrap()
            .into_iter()
            .map(|account| account.name)
            .collect();

        assert_eq!(names, vec!["Cheque", "savings"]);
    }

    #[test]
    fn other_users_account_is_not_found() {
        let connection = test_connection();
        let alice = insert_test_user("alice@example.com", &connection);
        let bob = insert_test_user("bob@example.com", &connection);
        let account = create_account(&form("Cheque"), alice, &connection).unwrap();

        assert_eq!(get_account(&account.id, bob, &connection), Err(Error::NotFound));
        assert_eq!(
            update_account(&account.id, &form("Mine now"), bob, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(delete_account(&account.id, bob, &connection), Err(Error::NotFound));
        assert_eq!(get_account(&account.id, alice, &connection), Ok(account));
    }

    #[test]
    fn update_renames_account() {
        let connection = test_connection();
        let user_id = insert_test_user("a@example.com", &connection);
        let account = create_account(&form("Cheque"), user_id, &connection).unwrap();

        let updated = update_account(&account.id, &form("Everyday"), user_id, &connection).unwrap();

        assert_eq!(updated.id, account.id);
        assert_eq!(updated.name, "Everyday");
    }

    #[test]
    fn delete_missing_account_is_not_found() {
        let connection = test_connection();
        let user_id = insert_test_user("a@example.com", &connection);

        assert_eq!(delete_account("nope", user_id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn bulk_delete_skips_foreign_and_unknown_ids() {
        let connection = test_connection();
        let alice = insert_test_user("alice@example.com", &connection);
        let bob = insert_test_user("bob@example.com", &connection);
        let mine = create_account(&form("Cheque"), alice, &connection).unwrap();
        let theirs = create_account(&form("Bob's"), bob, &connection).unwrap();

        let deleted = delete_accounts(
            &[
                mine.id.clone(),
                theirs.id.clone(),
                "unknown".to_owned(),
                mine.id.clone(),
            ],
            alice,
            &connection,
        )
        .unwrap();

        assert_eq!(deleted, vec![DeletedId { id: mine.id }]);
        assert_eq!(get_account(&theirs.id, bob, &connection), Ok(theirs));
    }

    #[test]
    fn bulk_delete_with_no_ids_deletes_nothing() {
        let connection = test_connection();
        let user_id = insert_test_user("a@example.com", &connection);
        create_account(&form("Cheque"), user_id, &connection).unwrap();

        assert_eq!(delete_accounts(&[], user_id, &connection), Ok(Vec::new()));
        assert_eq!(list_accounts(user_id, &connection).unwrap().len(), 1);
    }
}
