//! The category model and its queries.

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::{
    DatabaseId, DeletedId, Error, UserID,
    account::validate_name,
    database_id::{dedup_ids, new_database_id},
};

/// A label for grouping transactions, e.g. "Groceries" or "Rent".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The server-generated id.
    pub id: DatabaseId,
    /// The user that owns the category.
    pub user_id: UserID,
    /// The display name.
    pub name: String,
}

/// The fields a user can set when creating or updating a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryForm {
    /// The display name, trimmed before it is saved.
    pub name: String,
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id TEXT PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
            name TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_category_user_id ON category(user_id)",
        (),
    )?;

    Ok(())
}

fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    Ok(Category {
        id: row.get(0)?,
        user_id: UserID::new(row.get(1)?),
        name: row.get(2)?,
    })
}

/// Create a category owned by `user_id`.
///
/// # Errors
/// Returns [Error::EmptyName] if the name is blank.
pub fn create_category(
    form: &CategoryForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = validate_name(&form.name)?;

    connection
        .query_row(
            "INSERT INTO category (id, user_id, name) VALUES (?1, ?2, ?3)
            RETURNING id, user_id, name",
            params![new_database_id(), user_id.as_i64(), name],
            map_row_to_category,
        )
        .map_err(Error::from)
}

/// Get every category owned by `user_id`, ordered by name.
pub fn list_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name FROM category
            WHERE user_id = ?1
            ORDER BY name COLLATE NOCASE, id",
        )?
        .query_map(params![user_id.as_i64()], map_row_to_category)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// # Errors
/// Returns [Error::NotFound] if the category does not exist or belongs to
/// another user.
pub fn get_category(id: &str, user_id: UserID, connection: &Connection) -> Result<Category, Error> {
    connection
        .query_row(
            "SELECT id, user_id, name FROM category WHERE id = ?1 AND user_id = ?2",
            params![id, user_id.as_i64()],
            map_row_to_category,
        )
        .map_err(Error::from)
}

/// Rename the category `id`. Returns [Error::NotFound] if `user_id` does
/// not own it.
pub fn update_category(
    id: &str,
    form: &CategoryForm,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let name = validate_name(&form.name)?;

    connection
        .query_row(
            "UPDATE category SET name = ?1 WHERE id = ?2 AND user_id = ?3
            RETURNING id, user_id, name",
            params![name, id, user_id.as_i64()],
            map_row_to_category,
        )
        .map_err(Error::from)
}

/// Delete the category `id` if `user_id` owns it.
///
/// Transactions in the category are kept and become uncategorized.
pub fn delete_category(
    id: &str,
    user_id: UserID,
    connection: &Connection,
) -> Result<DeletedId, Error> {
    connection
        .query_row(
            "DELETE FROM category WHERE id = ?1 AND user_id = ?2 RETURNING id",
            params![id, user_id.as_i64()],
            |row| Ok(DeletedId { id: row.get(0)? }),
        )
        .map_err(Error::from)
}

/// Delete the categories in `ids` that `user_id` owns in one transaction,
/// ignoring the rest.
pub fn delete_categories(
    ids: &[DatabaseId],
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<DeletedId>, Error> {
    let transaction = connection.unchecked_transaction()?;
    let mut deleted = Vec::new();

    {
        let mut statement = transaction
            .prepare("DELETE FROM category WHERE id = ?1 AND user_id = ?2 RETURNING id")?;

        for id in dedup_ids(ids) {
            if let Some(deleted_id) = statement
                .query_row(params![id, user_id.as_i64()], |row| {
                    Ok(DeletedId { id: row.get(0)? })
                })
                .optional()?
            {
                deleted.push(deleted_id);
            }
        }
    }

    transaction.commit()?;

    Ok(deleted)
}
