//! Transactions: money spent or earned in one of the user's accounts.

mod core;
mod handlers;
mod page;
mod range;

pub use core::{
    Transaction, TransactionFilter, TransactionForm, TransactionRow, count_transactions,
    create_transaction, create_transaction_table, delete_transaction, delete_transactions,
    get_transaction, list_transactions, update_transaction,
};
pub use handlers::{
    bulk_delete_transactions_endpoint, create_transaction_endpoint,
    delete_transaction_endpoint, get_transaction_endpoint, list_transactions_endpoint,
    update_transaction_endpoint,
};
pub(crate) use handlers::today_in;
pub use page::get_transactions_page;
pub use range::{DateRange, TransactionListQuery, format_date};
