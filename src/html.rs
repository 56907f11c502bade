//! Shared page layout, style classes and formatting helpers for the HTML views.

use std::sync::OnceLock;

use maud::{DOCTYPE, Markup, PreEscaped, html};
use numfmt::{Formatter, Precision};

use crate::{endpoints, navigation::NavBar};

// Link styles
pub const LINK_STYLE: &str = "text-blue-600 hover:text-blue-500 \
    dark:text-blue-500 dark:hover:text-blue-400 underline";

// Button styles
pub const BUTTON_PRIMARY_STYLE: &str = "px-4 py-2 bg-blue-500 \
    dark:bg-blue-600 disabled:bg-blue-700 hover:enabled:bg-blue-600 \
    hover:enabled:dark:bg-blue-700 text-white rounded";

pub const BUTTON_SECONDARY_STYLE: &str = "py-2 px-4 text-sm font-medium \
    text-gray-900 bg-white rounded border border-gray-200 hover:bg-gray-100 \
    hover:text-blue-700 dark:bg-gray-800 dark:text-gray-400 \
    dark:border-gray-600 dark:hover:text-white dark:hover:bg-gray-700";

pub const BUTTON_DELETE_STYLE: &str = "py-2 px-4 text-sm font-medium text-white \
    bg-red-600 hover:enabled:bg-red-500 disabled:opacity-50 rounded";

// Form styles
pub const FORM_LABEL_STYLE: &str = "block mb-2 text-sm font-medium text-gray-900 dark:text-white";
pub const FORM_TEXT_INPUT_STYLE: &str = "block w-full p-2.5 rounded text-sm \
    text-gray-900 dark:text-white disabled:text-gray-500 bg-gray-50 \
    dark:bg-gray-700 border border-gray-300 dark:border-gray-600 \
    dark:placeholder-gray-400 focus:ring-blue-600 focus:border-blue-600 \
    focus:dark:border-blue-500 focus:dark:ring-blue-500";

// Table styles
pub const TABLE_HEADER_STYLE: &str = "text-xs text-gray-700 uppercase \
    bg-gray-50 dark:bg-gray-700 dark:text-gray-400";

pub const TABLE_ROW_STYLE: &str = "bg-white border-b dark:bg-gray-800 dark:border-gray-700";

pub const TABLE_CELL_STYLE: &str = "px-6 py-4";

// Page container
pub const PAGE_CONTAINER_STYLE: &str =
    "flex flex-col items-center px-6 py-8 mx-auto lg:py-5 text-gray-900 dark:text-white";

/// Shows the `error` field of JSON error responses to htmx requests in the
/// alert container.
const ALERT_SCRIPT: &str = r#"
document.addEventListener("htmx:responseError", function (event) {
    var container = document.getElementById("alert-container");
    var message = "Something went wrong, please try again.";
    try {
        var body = JSON.parse(event.detail.xhr.responseText);
        if (body.error) {
            message = body.error;
        }
    } catch (_) {}
    container.textContent = message;
    container.classList.remove("hidden");
    setTimeout(function () { container.classList.add("hidden"); }, 5000);
});
"#;

/// The page skeleton shared by every view.
pub fn base(title: &str, content: &Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " - Finboard" }
                link href=(format!("{}/main.css", endpoints::STATIC)) rel="stylesheet";

                script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4" {}
                script src="https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js" {}
                script src="https://unpkg.com/htmx-ext-json-enc@2.0.2/json-enc.js" {}
                script { (PreEscaped(ALERT_SCRIPT)) }
            }

            body
                hx-ext="json-enc"
                class="container max-w-full min-h-screen bg-gray-50 dark:bg-gray-900"
            {
                (content)

                div
                    id="alert-container"
                    role="alert"
                    class="hidden fixed bottom-4 left-1/2 -translate-x-1/2 z-50 w-full max-w-md \
                        px-4 py-3 rounded bg-red-100 text-red-800 dark:bg-red-900 dark:text-red-200"
                {}
            }
        }
    }
}

pub fn error_view(title: &str, header: &str, description: &str, fix: &str) -> Markup {
    let content = html!(
        section class="bg-white dark:bg-gray-900"
        {
            div class="py-8 px-4 mx-auto max-w-screen-xl lg:py-16 lg:px-6"
            {
                div class="mx-auto max-w-screen-sm text-center"
                {
                    h1
                        class="mb-4 text-7xl tracking-tight font-extrabold
                            lg:text-9xl text-blue-600 dark:text-blue-500"
                    {
                        (header)
                    }

                    p
                        class="mb-4 text-3xl md:text-4xl tracking-tight
                            font-bold text-gray-900 dark:text-white"
                    {
                        (description)
                    }

                    p class="mb-4 text-2xl tracking-tight text-gray-900 dark:text-white"
                    {
                        (fix)
                    }

                    a href=(endpoints::ROOT) class=(BUTTON_PRIMARY_STYLE)
                    {
                        "Back to Homepage"
                    }
                }
            }
        }
    );

    base(title, &content)
}

/// A dashboard page: the navigation bar, a heading with a "New" link, the
/// page `content` and the open `sheet`, if any.
pub fn dashboard_page(
    title: &str,
    active_endpoint: &str,
    new_href: &str,
    content: &Markup,
    sheet: Option<Markup>,
) -> Markup {
    let page = html! {
        (NavBar::new(active_endpoint).into_html())

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl space-y-6"
            {
                header class="flex items-center justify-between"
                {
                    h1 class="text-2xl font-bold" { (title) }

                    a href=(new_href) id="new-row" class=(BUTTON_PRIMARY_STYLE) { "New" }
                }

                (content)
            }
        }

        @if let Some(sheet) = sheet {
            (sheet)
        }
    };

    base(title, &page)
}

/// The centred card used by the log-in and registration pages.
pub fn log_in_register(form_title: &str, form: &Markup) -> Markup {
    html! {
        div class="flex flex-col items-center justify-center px-6 py-8 mx-auto"
        {
            span class="mb-6 text-2xl font-semibold text-gray-900 dark:text-white"
            {
                "Finboard"
            }

            div class="w-full bg-white rounded-lg shadow dark:border sm:max-w-md dark:bg-gray-800 dark:border-gray-700"
            {
                div class="p-6 space-y-4 md:space-y-6 sm:p-8"
                {
                    h1 class="text-xl font-bold leading-tight tracking-tight text-gray-900 md:text-2xl dark:text-white"
                    {
                        (form_title)
                    }

                    (form)
                }
            }
        }
    }
}

pub fn email_input(email: &str) -> Markup {
    html! {
        div
        {
            label for="email" class=(FORM_LABEL_STYLE) { "Email" }

            input
                type="email"
                name="email"
                id="email"
                placeholder="name@example.com"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                autofocus
                value=(email);
        }
    }
}

pub fn password_input(autocomplete: &str) -> Markup {
    html! {
        div
        {
            label for="password" class=(FORM_LABEL_STYLE) { "Password" }

            input
                type="password"
                name="password"
                id="password"
                placeholder="••••••••"
                autocomplete=(autocomplete)
                class=(FORM_TEXT_INPUT_STYLE)
                required;
        }
    }
}

/// A labelled input for the sheet forms.
pub fn form_input(
    label: &str,
    name: &str,
    input_type: &str,
    value: &str,
    required: bool,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type=(input_type)
                name=(name)
                id=(name)
                value=(value)
                step=[(input_type == "number").then_some("0.01")]
                required[required]
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

pub fn loading_spinner() -> Markup {
    html! {
        span class="htmx-indicator inline-block w-4 h-4 me-2 border-2 border-white border-t-transparent rounded-full animate-spin" {}
    }
}

/// Format `number` as dollars with two decimal places, e.g. "-$1,234.50".
pub fn format_currency(number: f64) -> String {
    static POSITIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();
    static NEGATIVE_FMT: OnceLock<Option<Formatter>> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| currency_formatter("$"));
    let negative_fmt = NEGATIVE_FMT.get_or_init(|| currency_formatter("-$"));

    let formatted_string = if number < 0.0 {
        match negative_fmt {
            Some(formatter) => formatter.fmt_string(number.abs()),
            None => return format!("-${:.2}", number.abs()),
        }
    } else if number > 0.0 {
        match positive_fmt {
            Some(formatter) => formatter.fmt_string(number),
            None => return format!("${number:.2}"),
        }
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        return "$0.00".to_owned();
    };

    pad_cents(formatted_string)
}

fn currency_formatter(prefix: &str) -> Option<Formatter> {
    Formatter::currency(prefix)
        .ok()
        .map(|formatter| formatter.precision(Precision::Decimals(2)))
}

/// numfmt drops trailing zeros, e.g. "12.30" is rendered as "$12.3" and
/// "12.00" as "$12".
fn pad_cents(formatted: String) -> String {
    match formatted.rfind('.') {
        None => format!("{formatted}.00"),
        Some(dot) => match formatted.len() - dot - 1 {
            0 => format!("{formatted}00"),
            1 => format!("{formatted}0"),
            _ => formatted,
        },
    }
}
