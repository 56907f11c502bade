//! The side panel that holds the create and edit forms on each dashboard page.
//!
//! Whether a sheet is open, and for which row, is kept in the page's query
//! string (`?sheet=new`, `?sheet=edit&id=...`).

use maud::{Markup, html};
use serde::Deserialize;

use crate::{DatabaseId, html::LINK_STYLE};

/// The sheet parameters from a page's query string.
#[derive(Debug, Default, Deserialize)]
pub struct SheetQuery {
    /// `new` or `edit`.
    pub sheet: Option<String>,
    /// The row shown in an edit sheet.
    pub id: Option<String>,
}

/// Which form, if any, the page shows in its sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sheet {
    /// No sheet is shown.
    Closed,
    /// The form for a new row.
    New,
    /// The form for the row with this id.
    Edit(DatabaseId),
}

impl Sheet {
    /// Read the sheet state from the query string.
    ///
    /// An edit sheet without an id, or an unknown sheet name, is closed.
    pub fn from_query(query: &SheetQuery) -> Self {
        match (query.sheet.as_deref(), query.id.as_deref()) {
            (Some("new"), _) => Sheet::New,
            (Some("edit"), Some(id)) if !id.trim().is_empty() => {
                Sheet::Edit(id.trim().to_owned())
            }
            _ => Sheet::Closed,
        }
    }
}

/// Render an open sheet with `title` around `form`.
///
/// `close_href` is the page URL without the sheet parameters.
pub fn render_sheet(title: &str, description: &str, close_href: &str, form: &Markup) -> Markup {
    html! {
        div class="fixed inset-0 z-40 bg-black/50" aria-hidden="true" {}

        aside
            id="sheet"
            role="dialog"
            aria-modal="true"
            aria-labelledby="sheet-title"
            class="fixed inset-y-0 right-0 z-50 w-full max-w-md p-6 space-y-6 overflow-y-auto
                bg-white shadow-xl dark:bg-gray-800 text-gray-900 dark:text-white"
        {
            header class="flex items-start justify-between"
            {
                div
                {
                    h2 id="sheet-title" class="text-lg font-semibold" { (title) }
                    p class="text-sm text-gray-500 dark:text-gray-400" { (description) }
                }

                a href=(close_href) class=(LINK_STYLE) aria-label="Close" { "Close" }
            }

            (form)
        }
    }
}
