//! The transactions page: a date-range and account filter, the table of
//! transactions, and the create/edit sheet.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Account, AppState, Category, Error, UserID,
    account::list_accounts,
    category::list_categories,
    data_table::{
        Column, DataTable, PaginationConfig, SortValue, TableQuery, TableRow, TableState,
        render_table,
    },
    db::lock_connection,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, dashboard_page, form_input, format_currency,
        loading_spinner,
    },
    internal_server_error::page_error_response,
    sheet::{Sheet, SheetQuery, render_sheet},
    transaction::{
        Transaction, TransactionListQuery, TransactionRow, format_date, get_transaction,
        handlers::{resolve_filter, today_in},
        list_transactions,
    },
};

const COLUMNS: [Column; 5] = [
    Column::text("date", "Date"),
    Column::text("payee", "Payee"),
    Column::text("account", "Account"),
    Column::text("category", "Category"),
    Column::numeric("amount", "Amount"),
];

impl TableRow for TransactionRow {
    fn id(&self) -> &str {
        &self.transaction.id
    }

    fn cell_text(&self, column: &str) -> String {
        match column {
            "date" => format_date(self.transaction.date),
            "payee" => self.transaction.payee.clone(),
            "account" => self.account_name.clone(),
            "category" => self.category_name.clone().unwrap_or_default(),
            "amount" => format_currency(self.transaction.amount),
            _ => String::new(),
        }
    }

    fn sort_value(&self, column: &str) -> SortValue {
        match column {
            "date" => SortValue::Date(self.transaction.date),
            "amount" => SortValue::Number(self.transaction.amount),
            "category" => match &self.category_name {
                Some(name) => SortValue::Text(name.clone()),
                None => SortValue::Empty,
            },
            _ => SortValue::Text(self.cell_text(column)),
        }
    }

    fn cell(&self, column: &str) -> Markup {
        match column {
            "amount" => {
                let color = if self.transaction.amount < 0.0 {
                    "text-red-600 dark:text-red-400"
                } else {
                    "text-green-600 dark:text-green-400"
                };

                html! { span class=(color) { (self.cell_text(column)) } }
            }
            "category" if self.category_name.is_none() => {
                html! { span class="italic text-gray-400" { "Uncategorized" } }
            }
            _ => html! { (self.cell_text(column)) },
        }
    }
}

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Render the transactions page.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Extension(user_id): Extension<UserID>,
    Query(list_query): Query<TransactionListQuery>,
    Query(table_query): Query<TableQuery>,
    Query(sheet_query): Query<SheetQuery>,
) -> Response {
    match render_transactions_page(&state, user_id, &list_query, table_query, &sheet_query) {
        Ok(page) => Html(page.into_string()).into_response(),
        Err(error) => page_error_response(error),
    }
}

fn render_transactions_page(
    state: &TransactionsPageState,
    user_id: UserID,
    list_query: &TransactionListQuery,
    table_query: TableQuery,
    sheet_query: &SheetQuery,
) -> Result<Markup, Error> {
    let today = today_in(&state.local_timezone)?;
    let filter = resolve_filter(list_query, today)?;

    let connection = lock_connection(&state.db_connection)?;
    let transactions = list_transactions(&filter, user_id, &connection)?;
    let accounts = list_accounts(user_id, &connection)?;
    let categories = list_categories(user_id, &connection)?;

    let state_with_range =
        TableState::from_query(table_query).with_extra_params(range_params(list_query));
    let table = DataTable::new(
        COLUMNS.to_vec(),
        "payee",
        transactions,
        state_with_range,
        &state.pagination_config,
    );

    let path = endpoints::TRANSACTIONS_VIEW;
    let close_href = table.state.href(path);

    let sheet = match Sheet::from_query(sheet_query) {
        Sheet::Closed => None,
        Sheet::New => Some(render_sheet(
            "New transaction",
            "Record money spent or earned.",
            &close_href,
            &transaction_form(None, &accounts, &categories, &format_date(today)),
        )),
        Sheet::Edit(id) => match get_transaction(&id, user_id, &connection) {
            Ok(transaction) => Some(render_sheet(
                "Edit transaction",
                "Change or delete this transaction.",
                &close_href,
                &transaction_form(Some(&transaction), &accounts, &categories, &format_date(today)),
            )),
            Err(Error::NotFound) => None,
            Err(error) => return Err(error),
        },
    };

    let content = html! {
        (range_form(list_query, &filter.from, &filter.to, &accounts, &table.state))
        (render_table(&table, path, endpoints::TRANSACTIONS_BULK_DELETE_API))
    };
    let new_href = table.state.href_with(path, &[("sheet", "new")]);

    Ok(dashboard_page("Transactions", path, &new_href, &content, sheet))
}

/// The date-range and account parameters the user asked for, kept in every
/// table link.
fn range_params(query: &TransactionListQuery) -> Vec<(String, String)> {
    [
        ("from", &query.from),
        ("to", &query.to),
        ("accountId", &query.account_id),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.as_ref().map(|value| (key.to_owned(), value.clone())))
    .collect()
}

fn range_form(
    query: &TransactionListQuery,
    from: &time::Date,
    to: &time::Date,
    accounts: &[Account],
    state: &TableState,
) -> Markup {
    let sort_params: Vec<(&str, String)> = state
        .to_query_pairs()
        .into_iter()
        .filter_map(|(key, value)| match key.as_str() {
            "sort" => Some(("sort", value)),
            "dir" => Some(("dir", value)),
            _ => None,
        })
        .collect();

    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            id="range-filter"
            class="flex flex-wrap items-end gap-4"
        {
            @for (key, value) in &sort_params {
                input type="hidden" name=(key) value=(value);
            }

            div
            {
                label for="from" class=(FORM_LABEL_STYLE) { "From" }
                input type="date" name="from" id="from" value=(format_date(*from)) class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="to" class=(FORM_LABEL_STYLE) { "To" }
                input type="date" name="to" id="to" value=(format_date(*to)) class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="range-account" class=(FORM_LABEL_STYLE) { "Account" }
                select name="accountId" id="range-account" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" selected[query.account_id.is_none()] { "All accounts" }

                    @for account in accounts {
                        option
                            value=(account.id)
                            selected[query.account_id.as_deref() == Some(account.id.as_str())]
                        {
                            (account.name)
                        }
                    }
                }
            }

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Apply" }
        }
    }
}

fn transaction_form(
    transaction: Option<&Transaction>,
    accounts: &[Account],
    categories: &[Category],
    today: &str,
) -> Markup {
    if accounts.is_empty() {
        return html! {
            p
            {
                "Create an account before adding transactions. "
                a href=(format!("{}?sheet=new", endpoints::ACCOUNTS_VIEW)) class=(LINK_STYLE)
                {
                    "New account"
                }
            }
        };
    }

    let date = transaction
        .map(|transaction| format_date(transaction.date))
        .unwrap_or_else(|| today.to_owned());
    let payee = transaction.map(|transaction| transaction.payee.as_str()).unwrap_or_default();
    let amount = transaction
        .map(|transaction| format!("{:.2}", transaction.amount))
        .unwrap_or_default();
    let account_id = transaction.map(|transaction| transaction.account_id.as_str());
    let category_id = transaction.and_then(|transaction| transaction.category_id.as_deref());
    let notes = transaction
        .and_then(|transaction| transaction.notes.as_deref())
        .unwrap_or_default();

    let fields = html! {
        (form_input("Date", "date", "date", &date, true))
        (form_input("Payee", "payee", "text", payee, true))
        (form_input("Amount", "amount", "number", &amount, true))

        div
        {
            label for="accountId" class=(FORM_LABEL_STYLE) { "Account" }
            select name="accountId" id="accountId" required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for account in accounts {
                    option value=(account.id) selected[account_id == Some(account.id.as_str())]
                    {
                        (account.name)
                    }
                }
            }
        }

        div
        {
            label for="categoryId" class=(FORM_LABEL_STYLE) { "Category" }
            select name="categoryId" id="categoryId" class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" selected[category_id.is_none()] { "Uncategorized" }

                @for category in categories {
                    option value=(category.id) selected[category_id == Some(category.id.as_str())]
                    {
                        (category.name)
                    }
                }
            }
        }

        div
        {
            label for="notes" class=(FORM_LABEL_STYLE) { "Notes" }
            textarea name="notes" id="notes" rows="3" class=(FORM_TEXT_INPUT_STYLE) { (notes) }
        }
    };

    html! {
        @match transaction {
            Some(transaction) => {
                form
                    hx-patch=(format_endpoint(endpoints::TRANSACTION_API, &transaction.id))
                    hx-disabled-elt="find button"
                    class="space-y-4"
                {
                    (fields)

                    button type="submit" class=(BUTTON_PRIMARY_STYLE)
                    {
                        (loading_spinner())
                        "Save"
                    }
                }

                button
                    type="button"
                    id="delete-row"
                    hx-delete=(format_endpoint(endpoints::TRANSACTION_API, &transaction.id))
                    hx-confirm="Delete this transaction?"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
            None => {
                form
                    hx-post=(endpoints::TRANSACTIONS_API)
                    hx-disabled-elt="find button"
                    class="space-y-4"
                {
                    (fields)

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

#[cfg(test)]
mod tests {
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use scraper::Selector;
    use serde_json::json;

    use crate::{
        Account, Data, Transaction, build_router,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input, assert_hx_endpoint, must_get_form, must_get_sheet_form, parse_page,
            register_user,
            test_state,
        },
    };

    async fn create_account(server: &TestServer, cookie: &Cookie<'static>, name: &str) -> Account {
        server
            .post(endpoints::ACCOUNTS_API)
            .add_cookie(cookie.clone())
            .json(&json!({ "name": name }))
            .await
            .json::<Data<Account>>()
            .data
    }

    async fn create_transaction(
        server: &TestServer,
        cookie: &Cookie<'static>,
        account_id: &str,
        date: &str,
        payee: &str,
    ) -> Transaction {
        server
            .post(endpoints::TRANSACTIONS_API)
            .add_cookie(cookie.clone())
            .json(&json!({
                "date": date,
                "payee": payee,
                "amount": -10,
                "accountId": account_id,
            }))
            .await
            .json::<Data<Transaction>>()
            .data
    }

    fn row_ids(html: &scraper::Html) -> Vec<String> {
        let rows = Selector::parse("tbody tr[data-row-id]").unwrap();
        html.select(&rows)
            .filter_map(|row| row.value().attr("data-row-id"))
            .map(str::to_owned)
            .collect()
    }

    #[tokio::test]
    async fn shows_transactions_in_requested_range_and_account() {
        let server = TestServer::new(build_router(test_state()));
        let user = register_user(&server, "alice@example.com").await;
        let cheque = create_account(&server, &user.cookie, "Cheque").await;
        let savings = create_account(&server, &user.cookie, "Savings").await;
        let wanted =
            create_transaction(&server, &user.cookie, &cheque.id, "2024-05-10", "Rent").await;
        create_transaction(&server, &user.cookie, &savings.id, "2024-05-10", "Interest").await;
        create_transaction(&server, &user.cookie, &cheque.id, "2024-07-10", "Rent").await;

        let response = server
            .get(endpoints::TRANSACTIONS_VIEW)
            .add_query_param("from", "2024-05-01")
            .add_query_param("to", "2024-05-31")
            .add_query_param("accountId", &cheque.id)
            .add_cookie(user.cookie)
            .await;

        response.assert_status_ok();
        let html = parse_page(&response);
        assert_eq!(row_ids(&html), vec![wanted.id]);

        // Table links keep the range.
        let next_sort = Selector::parse("thead a[href*='sort=payee']").unwrap();
        let href = html.select(&next_sort).next().unwrap().value().attr("href").unwrap();
        assert!(href.contains("from=2024-05-01"), "got {href}");
        assert!(href.contains("to=2024-05-31"), "got {href}");
    }

    #[tokio::test]
    async fn bad_range_renders_error_page() {
        let server = TestServer::new(build_router(test_state()));
        let user = register_user(&server, "alice@example.com").await;

        server
            .get(endpoints::TRANSACTIONS_VIEW)
            .add_query_param("from", "2024-06-01")
            .add_query_param("to", "2024-05-01")
            .add_cookie(user.cookie)
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn new_sheet_lists_only_own_accounts() {
        let server = TestServer::new(build_router(test_state()));
        let alice = register_user(&server, "alice@example.com").await;
        let bob = register_user(&server, "bob@example.com").await;
        let account = create_account(&server, &alice.cookie, "Cheque").await;
        create_account(&server, &bob.cookie, "Bob's").await;

        let response = server
            .get(endpoints::TRANSACTIONS_VIEW)
            .add_query_param("sheet", "new")
            .add_cookie(alice.cookie)
            .await;

        let html = parse_page(&response);
        let form = must_get_sheet_form(&html);
        assert_hx_endpoint(&form, endpoints::TRANSACTIONS_API, "hx-post");
        assert_form_input(&form, "payee", "text");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "date", "date");

        let options = Selector::parse("select[name=accountId] option").unwrap();
        let values: Vec<_> = form
            .select(&options)
            .filter_map(|option| option.value().attr("value"))
            .collect();
        assert_eq!(values, vec![account.id.as_str()]);
    }

    #[tokio::test]
    async fn new_sheet_without_accounts_links_to_accounts() {
        let server = TestServer::new(build_router(test_state()));
        let user = register_user(&server, "alice@example.com").await;

        let response = server
            .get(endpoints::TRANSACTIONS_VIEW)
            .add_query_param("sheet", "new")
            .add_cookie(user.cookie)
            .await;

        let html = parse_page(&response);
        let link = Selector::parse("#sheet a[href='/accounts?sheet=new']").unwrap();
        assert_eq!(html.select(&link).count(), 1);
    }

    #[tokio::test]
    async fn edit_sheet_patches_transaction() {
        let server = TestServer::new(build_router(test_state()));
        let user = register_user(&server, "alice@example.com").await;
        let account = create_account(&server, &user.cookie, "Cheque").await;
        let transaction =
            create_transaction(&server, &user.cookie, &account.id, "2024-05-10", "Rent").await;

        let response = server
            .get(endpoints::TRANSACTIONS_VIEW)
            .add_query_param("sheet", "edit")
            .add_query_param("id", &transaction.id)
            .add_cookie(user.cookie)
            .await;

        let html = parse_page(&response);
        let form = must_get_sheet_form(&html);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::TRANSACTION_API, &transaction.id),
            "hx-patch",
        );
        let amount = Selector::parse("input[name=amount]").unwrap();
        assert_eq!(
            form.select(&amount).next().unwrap().value().attr("value"),
            Some("-10.00")
        );
        // The range filter form comes first on the page.
        assert_eq!(
            must_get_form(&html).value().attr("id"),
            Some("range-filter")
        );
    }
}
