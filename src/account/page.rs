//! The accounts page: a table of the user's accounts with a sheet for
//! creating and editing them.

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
    account::{Account, get_account, list_accounts},
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

impl TableRow for Account {
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

/// The state needed for the accounts page.
#[derive(Debug, Clone)]
pub struct AccountsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for AccountsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Render the accounts page.
pub async fn get_accounts_page(
    State(state): State<AccountsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(table_query): Query<TableQuery>,
    Query(sheet_query): Query<SheetQuery>,
) -> Response {
    match render_accounts_page(&state, user_id, table_query, &sheet_query) {
        Ok(page) => Html(page.into_string()).into_response(),
        Err(error) => page_error_response(error),
    }
}

fn render_accounts_page(
    state: &AccountsPageState,
    user_id: UserID,
    table_query: TableQuery,
    sheet_query: &SheetQuery,
) -> Result<Markup, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let accounts = list_accounts(user_id, &connection)?;

    let table = DataTable::new(
        COLUMNS.to_vec(),
        "name",
        accounts,
        TableState::from_query(table_query),
        &state.pagination_config,
    );

    let path = endpoints::ACCOUNTS_VIEW;
    let close_href = table.state.href(path);

    let sheet = match Sheet::from_query(sheet_query) {
        Sheet::Closed => None,
        Sheet::New => Some(render_sheet(
            "New account",
            "Add an account to record transactions against.",
            &close_href,
            &account_form(None),
        )),
        // An id the user does not own renders the page with the sheet closed.
        Sheet::Edit(id) => match get_account(&id, user_id, &connection) {
            Ok(account) => Some(render_sheet(
                "Edit account",
                "Rename or delete this account.",
                &close_href,
                &account_form(Some(&account)),
            )),
            Err(Error::NotFound) => None,
            Err(error) => return Err(error),
        },
    };

    let content = render_table(&table, path, endpoints::ACCOUNTS_BULK_DELETE_API);
    let new_href = table.state.href_with(path, &[("sheet", "new")]);

    Ok(dashboard_page("Accounts", path, &new_href, &content, sheet))
}

fn account_form(account: Option<&Account>) -> Markup {
    let name = account.map(|account| account.name.as_str()).unwrap_or_default();

    html! {
        @match account {
            Some(account) => {
                form
                    hx-patch=(format_endpoint(endpoints::ACCOUNT_API, &account.id))
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
                    hx-delete=(format_endpoint(endpoints::ACCOUNT_API, &account.id))
                    hx-confirm="Delete this account and all of its transactions?"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
            None => {
                form
                    hx-post=(endpoints::ACCOUNTS_API)
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
