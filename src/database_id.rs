//! Database ID type definition.

use std::collections::HashSet;

use uuid::Uuid;

/// Alias for the opaque string type used for account, category and
/// transaction IDs.
pub type DatabaseId = String;

/// Generate a new, random ID for a row.
///
/// IDs are UUID v4s in their simple form, e.g. "67e5504410b1426f9247bb680e5fe0c8".
pub fn new_database_id() -> DatabaseId {
    Uuid::new_v4().simple().to_string()
}

/// The distinct, non-empty ids in `ids`, in the order they first appear.
pub(crate) fn dedup_ids(ids: &[DatabaseId]) -> Vec<&str> {
    let mut seen = HashSet::new();

    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty() && seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{dedup_ids, new_database_id};

    #[test]
    fn dedup_keeps_first_occurrence() {
        let ids = ["b", "a", "b", "", "c", "a"].map(str::to_owned);

        assert_eq!(dedup_ids(&ids), vec!["b", "a", "c"]);
    }

    #[test]
    fn ids_are_unique_hex_strings() {
        let first = new_database_id();
        let second = new_database_id();

        assert_ne!(first, second);
        assert_eq!(first.len(), 32);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
