//! The categories page.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    category::{Category, get_category, list_categories},
    data_table::{
        Column, DataTable, PaginationConfig, TableQuery, TableRow, TableState, render_table,
    },
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, dashboard_page, form_input, loading_spinner},
    internal_server_error::page_error_response,
    sheet::{Sheet, SheetQuery, render_sheet},
};

const COLUMNS: [Column; 1] = [Column::text("name", "Name")];

impl TableRow for Category {
    fn id(&self) -> &str {
        &self.id
    }

    fn cell_text(&self, column: &str) -> String {
        match column {
            "name" => self.name.clone(),
            _ => String::new(),
        }
    }
}

/// The state needed for the categories page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Render the categories page.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user_id): Extension<UserID>,
    Query(table_query): Query<TableQuery>,
    Query(sheet_query): Query<SheetQuery>,
) -> Response {
    match render_categories_page(&state, user_id, table_query, &sheet_query) {
        Ok(page) => Html(page.into_string()).into_response(),
        Err(error) => page_error_response(error),
    }
}

fn render_categories_page(
    state: &CategoriesPageState,
    user_id: UserID,
    table_query: TableQuery,
    sheet_query: &SheetQuery,
) -> Result<Markup, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let categories = list_categories(user_id, &connection)?;

    let table = DataTable::new(
        COLUMNS.to_vec(),
        "name",
        categories,
        TableState::from_query(table_query),
        &state.pagination_config,
    );

    let path = endpoints::CATEGORIES_VIEW;
    let close_href = table.state.href(path);

    let sheet = match Sheet::from_query(sheet_query) {
        Sheet::Closed => None,
        Sheet::New => Some(render_sheet(
            "New category",
            "Group transactions under a category.",
            &close_href,
            &category_form(None),
        )),
        // An id the user does not own renders the page with the sheet closed.
        Sheet::Edit(id) => match get_category(&id, user_id, &connection) {
            Ok(category) => Some(render_sheet(
                "Edit category",
                "Rename or delete this category.",
                &close_href,
                &category_form(Some(&category)),
            )),
            Err(Error::NotFound) => None,
            Err(error) => return Err(error),
        },
    };

    let content = render_table(&table, path, endpoints::CATEGORIES_BULK_DELETE_API);
    let new_href = table.state.href_with(path, &[("sheet", "new")]);

    Ok(dashboard_page("Categories", path, &new_href, &content, sheet))
}

fn category_form(category: Option<&Category>) -> Markup {
    let name = category.map(|category| category.name.as_str()).unwrap_or_default();

    html! {
        @match category {
            Some(category) => {
                form
                    hx-patch=(format_endpoint(endpoints::CATEGORY_API, &category.id))
                    hx-disabled-elt="find button"
                    class="space-y-4"
                {
                    (form_input("Name", "name", "text", name, true))

                    button type="submit" class=(BUTTON_PRIMARY_STYLE)
                    {
                        (loading_spinner())
                        "Save"
                    }
                }

                button
                    type="button"
                    id="delete-row"
                    hx-delete=(format_endpoint(endpoints::CATEGORY_API, &category.id))
                    hx-confirm="Delete this category? Its transactions will become uncategorized."
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
            None => {
                form
                    hx-post=(endpoints::CATEGORIES_API)
                    hx-disabled-elt="find button"
                    class="space-y-4"
                {
                    (form_input("Name", "name", "text", name, true))

                    button type="submit" class=(BUTTON_PRIMARY_STYLE)
                    {
                        (loading_spinner())
                        "Create"
                    }
                }
            }
        }
    }
}
