//! The dashboard route: an overview of the user's accounts and their last
//! 30 days of transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, TransactionRow, UserID,
    account::list_accounts,
    auth::get_user_by_id,
    category::list_categories,
    db::lock_connection,
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base, format_currency},
    internal_server_error::page_error_response,
    navigation::NavBar,
    transaction::{
        DateRange, TransactionFilter, count_transactions, format_date, list_transactions,
        today_in,
    },
};

/// How many of the latest transactions are listed on the dashboard.
const RECENT_TRANSACTION_COUNT: usize = 5;

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Totals for a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Summary {
    income: f64,
    expenses: f64,
}

impl Summary {
    fn from_rows(rows: &[TransactionRow]) -> Self {
        rows.iter()
            .map(|row| row.transaction.amount)
            .fold(Summary::default(), |mut summary, amount| {
                if amount >= 0.0 {
                    summary.income += amount;
                } else {
                    summary.expenses += amount;
                }
                summary
            })
    }

    fn net(&self) -> f64 {
        self.income + self.expenses
    }
}

/// Display a page with an overview of the user's data.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    match render_dashboard(&state, user_id) {
        Ok(page) => Html(page.into_string()).into_response(),
        Err(error) => page_error_response(error),
    }
}

fn render_dashboard(state: &DashboardState, user_id: UserID) -> Result<Markup, Error> {
    let range = DateRange::resolve(None, None, today_in(&state.local_timezone)?)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = get_user_by_id(user_id, &connection)?;
    let account_count = list_accounts(user_id, &connection)?.len();
    let category_count = list_categories(user_id, &connection)?.len();
    let transaction_count = count_transactions(user_id, &connection)?;
    let rows = list_transactions(
        &TransactionFilter {
            from: range.from,
            to: range.to,
            account_id: None,
        },
        user_id,
        &connection,
    )?;

    let summary = Summary::from_rows(&rows);

    let content = html! {
        (NavBar::new(endpoints::DASHBOARD_VIEW).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-8"
            {
                div
                {
                    h1 class="text-2xl font-bold" { "Dashboard" }
                    p id="user-email" class="text-sm text-gray-600 dark:text-gray-400"
                    {
                        "Signed in as " (user.email)
                    }
                }

                section id="summary" class="grid grid-cols-1 sm:grid-cols-3 gap-4"
                {
                    (summary_card("Income", "income", summary.income))
                    (summary_card("Expenses", "expenses", summary.expenses))
                    (summary_card("Net", "net", summary.net()))
                }

                p class="text-sm text-gray-600 dark:text-gray-400"
                {
                    "Last 30 days: " (format_date(range.from)) " to " (format_date(range.to))
                }

                section id="counts" class="grid grid-cols-1 sm:grid-cols-3 gap-4"
                {
                    (count_card("Accounts", account_count as u64, endpoints::ACCOUNTS_VIEW))
                    (count_card("Categories", category_count as u64, endpoints::CATEGORIES_VIEW))
                    (count_card("Transactions", transaction_count, endpoints::TRANSACTIONS_VIEW))
                }

                (recent_transactions(&rows))
            }
        }
    };

    Ok(base("Dashboard", &content))
}

fn summary_card(title: &str, id: &str, amount: f64) -> Markup {
    let color = if amount < 0.0 {
        "text-red-600 dark:text-red-400"
    } else {
        "text-green-600 dark:text-green-400"
    };

    html! {
        div class="p-4 bg-white rounded shadow dark:bg-gray-800"
        {
            h2 class="text-sm text-gray-600 dark:text-gray-400" { (title) }
            p id=(id) class=(format!("text-2xl font-semibold {color}")) { (format_currency(amount)) }
        }
    }
}

fn count_card(title: &str, count: u64, href: &str) -> Markup {
    html! {
        a href=(href) class="block p-4 bg-white rounded shadow hover:bg-gray-100 dark:bg-gray-800 dark:hover:bg-gray-700"
        {
            h2 class="text-sm text-gray-600 dark:text-gray-400" { (title) }
            p class="text-2xl font-semibold" { (count) }
        }
    }
}

fn recent_transactions(rows: &[TransactionRow]) -> Markup {
    html! {
        section id="recent-transactions" class="space-y-2"
        {
            div class="flex justify-between items-baseline"
            {
                h2 class="text-xl font-semibold" { "Recent transactions" }
                a href=(endpoints::TRANSACTIONS_VIEW) class=(LINK_STYLE) { "View all" }
            }

            @if rows.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No transactions in the last 30 days." }
            } @else {
                ul class="divide-y divide-gray-200 dark:divide-gray-700"
                {
                    @for row in rows.iter().take(RECENT_TRANSACTION_COUNT) {
                        li class="flex justify-between py-2"
                        {
                            span { (format_date(row.transaction.date)) " " (row.transaction.payee) }
                            span { (format_currency(row.transaction.amount)) }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum_test::TestServer;
    use scraper::Selector;
    use serde_json::json;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        Account, Data, Transaction, TransactionRow, build_router, endpoints,
        test_utils::{parse_page, register_user, test_state},
        transaction::format_date,
    };

    use super::Summary;

    fn row(amount: f64) -> TransactionRow {
        TransactionRow {
            transaction: Transaction {
                id: "id".to_owned(),
                account_id: "account".to_owned(),
                category_id: None,
                date: date!(2025 - 01 - 01),
                payee: "payee".to_owned(),
                amount,
                notes: None,
            },
            account_name: "Cheque".to_owned(),
            category_name: None,
        }
    }

    #[test]
    fn summary_splits_income_and_expenses() {
        let summary = Summary::from_rows(&[row(100.0), row(-30.0), row(-20.0)]);

        assert_eq!(summary.income, 100.0);
        assert_eq!(summary.expenses, -50.0);
        assert_eq!(summary.net(), 50.0);
    }

    #[tokio::test]
    async fn shows_totals_for_last_thirty_days() {
        let server = TestServer::new(build_router(test_state()));
        let user = register_user(&server, "alice@example.com").await;
        let account: Data<Account> = server
            .post(endpoints::ACCOUNTS_API)
            .add_cookie(user.cookie.clone())
            .json(&json!({ "name": "Cheque" }))
            .await
            .json();
        let today = OffsetDateTime::now_utc().date();
        for (days_ago, amount) in [(0, 500.0), (3, -125.0), (60, -999.0)] {
            server
                .post(endpoints::TRANSACTIONS_API)
                .add_cookie(user.cookie.clone())
                .json(&json!({
                    "date": format_date(today - Duration::days(days_ago)),
                    "payee": "Someone",
                    "amount": amount,
                    "accountId": account.data.id,
                }))
                .await
                .assert_status_ok();
        }

        let response = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(user.cookie)
            .await;

        response.assert_status_ok();
        let html = parse_page(&response);
        let text = |selector: &str| -> String {
            let selector = Selector::parse(selector).unwrap();
            html.select(&selector).next().unwrap().text().collect()
        };
        assert_eq!(text("#income"), "$500.00");
        assert_eq!(text("#expenses"), "-$125.00");
        assert_eq!(text("#net"), "$375.00");
        assert_eq!(text("#user-email").trim(), "Signed in as alice@example.com");
    }
}
