//! Categories: user-defined labels that transactions can be grouped by.

mod core;
mod handlers;
mod page;

pub use core::{
    Category, CategoryForm, create_category, create_category_table, delete_category,
    delete_categories, get_category, list_categories, update_category,
};
pub use handlers::{
    bulk_delete_categories_endpoint, create_category_endpoint,
    delete_category_endpoint, get_category_endpoint, list_categories_endpoint,
    update_category_endpoint,
};
pub use page::get_categories_page;
