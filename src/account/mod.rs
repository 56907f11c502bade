//! Accounts: the bank accounts, cards and wallets a user records
//! transactions against.

mod core;
mod handlers;
mod page;

pub use core::{
    Account, AccountForm, create_account, create_account_table, delete_account,
    delete_accounts, get_account, list_accounts, update_account,
};
pub(crate) use core::validate_name;
pub use handlers::{
    bulk_delete_accounts_endpoint, create_account_endpoint,
    delete_account_endpoint, get_account_endpoint, list_accounts_endpoint,
    update_account_endpoint,
};
pub use page::get_accounts_page;
