use maud::{Markup, html};
use serde_json::json;

use crate::{
    data_table::{DataTable, SortDirection, TableRow},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_SECONDARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
    },
};

/// Render `table` as it appears on the page at `path`.
///
/// The bulk delete button posts the selected ids to `bulk_delete_endpoint`.
pub fn render_table<T: TableRow>(
    table: &DataTable<T>,
    path: &str,
    bulk_delete_endpoint: &str,
) -> Markup {
    let visible_rows = table.visible_rows();
    let filtered_count = table.filtered_rows().len();
    let delete_ids = table.bulk_delete_ids();
    let column_count = table.columns().len() + 2;
    let confirm_message = format!(
        "Delete {} selected row(s)? This cannot be undone.",
        delete_ids.len()
    );

    html! {
        div class="w-full space-y-4"
        {
            div class="flex items-center justify-between gap-4"
            {
                (filter_form(table, path))

                @if !delete_ids.is_empty() {
                    button
                        type="button"
                        id="bulk-delete"
                        hx-post=(bulk_delete_endpoint)
                        hx-vals=(json!({ "ids": delete_ids }).to_string())
                        hx-confirm=(confirm_message)
                        class=(BUTTON_DELETE_STYLE)
                    {
                        "Delete (" (delete_ids.len()) ")"
                    }
                }
            }

            div class="overflow-x-auto rounded shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class="px-4 py-3 w-8"
                            {
                                a
                                    href=(table.toggle_all().href(path))
                                    aria-label="Select all"
                                {
                                    (checkbox(table.all_filtered_selected()))
                                }
                            }

                            @for column in table.columns() {
                                th scope="col" class=(aligned("px-6 py-3", column.numeric))
                                {
                                    (sort_link(table, path, column.key, column.header))
                                }
                            }

                            th scope="col" class="px-6 py-3" { span class="sr-only" { "Edit" } }
                        }
                    }

                    tbody
                    {
                        @for row in &visible_rows {
                            @let is_selected = table.is_selected(row.id());
                            tr class=(TABLE_ROW_STYLE) data-row-id=(row.id()) aria-selected=(is_selected)
                            {
                                td class="px-4 py-4"
                                {
                                    a href=(row_toggle_href(table, path, row.id())) aria-label="Select row"
                                    {
                                        (checkbox(is_selected))
                                    }
                                }

                                @for column in table.columns() {
                                    td class=(aligned(TABLE_CELL_STYLE, column.numeric))
                                    {
                                        (row.cell(column.key))
                                    }
                                }

                                td class=(TABLE_CELL_STYLE)
                                {
                                    a
                                        href=(table.state.href_with(path, &[("sheet", "edit"), ("id", row.id())]))
                                        class=(LINK_STYLE)
                                    {
                                        "Edit"
                                    }
                                }
                            }
                        }

                        @if visible_rows.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan=(column_count) class="h-24 text-center" { "No results." }
                            }
                        }
                    }
                }
            }

            div class="flex items-center justify-between gap-4 text-sm"
            {
                p id="selection-count" class="text-gray-500 dark:text-gray-400"
                {
                    (delete_ids.len()) " of " (filtered_count) " row(s) selected."
                }

                div class="flex items-center gap-2"
                {
                    span id="page-indicator"
                    {
                        "Page " (table.current_page()) " of " (table.page_count())
                    }

                    (page_button("Previous", table.previous_page().map(|state| state.href(path))))
                    (page_button("Next", table.next_page().map(|state| state.href(path))))
                }
            }
        }
    }
}

fn filter_form<T: TableRow>(table: &DataTable<T>, path: &str) -> Markup {
    let placeholder = table
        .filter_column()
        .map(|column| format!("Filter {}...", column.header.to_lowercase()))
        .unwrap_or_else(|| "Filter...".to_owned());

    let mut state = table.state.clone();
    state.set_filter("");
    state.clear_selection();

    html! {
        form method="get" action=(path) class="flex items-center gap-2 max-w-sm"
        {
            @for (key, value) in state.to_query_pairs() {
                input type="hidden" name=(key) value=(value);
            }

            input
                type="search"
                name="filter"
                value=(table.state.filter)
                placeholder=(placeholder)
                class=(FORM_TEXT_INPUT_STYLE);

            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Filter" }
        }
    }
}

fn sort_link<T: TableRow>(table: &DataTable<T>, path: &str, key: &str, header: &str) -> Markup {
    let mut state = table.state.clone();
    state.toggle_sort(key);

    let indicator = match &table.state.sort {
        Some(sort) if sort.column == key => match sort.direction {
            SortDirection::Ascending => " ▲",
            SortDirection::Descending => " ▼",
        },
        _ => "",
    };

    html! {
        a href=(state.href(path)) class="hover:underline" { (header) (indicator) }
    }
}

fn aligned(style: &str, numeric: bool) -> String {
    if numeric {
        format!("{style} text-right")
    } else {
        style.to_owned()
    }
}

fn row_toggle_href<T: TableRow>(table: &DataTable<T>, path: &str, id: &str) -> String {
    let mut state = table.state.clone();
    state.toggle_row(id);
    state.href(path)
}

fn checkbox(checked: bool) -> Markup {
    html! {
        input type="checkbox" checked[checked] tabindex="-1" class="pointer-events-none rounded-xs";
    }
}

fn page_button(label: &str, href: Option<String>) -> Markup {
    html! {
        @match href {
            Some(href) => {
                a href=(href) class=(BUTTON_SECONDARY_STYLE) { (label) }
            }
            None => {
                button type="button" disabled class=(BUTTON_SECONDARY_STYLE) { (label) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use crate::data_table::{Column, DataTable, PaginationConfig, TableRow, TableState};

    use super::render_table;

    struct Row(String, String);

    impl TableRow for Row {
        fn id(&self) -> &str {
            &self.0
        }

        fn cell_text(&self, _column: &str) -> String {
            self.1.clone()
        }
    }

    fn render(rows: Vec<Row>, state: TableState) -> Html {
        let table = DataTable::new(
            vec![Column::text("name", "Name")],
            "name",
            rows,
            state,
            &PaginationConfig { page_size: 2 },
        );

        let markup = render_table(&table, "/accounts", "/api/accounts/bulk-delete");

        Html::parse_fragment(&markup.into_string())
    }

    fn rows() -> Vec<Row> {
        vec![
            Row("a".to_owned(), "Cheque".to_owned()),
            Row("b".to_owned(), "Savings".to_owned()),
            Row("c".to_owned(), "Credit".to_owned()),
        ]
    }

    #[test]
    fn renders_one_page_of_rows() {
        let html = render(rows(), TableState::default());

        let row_selector = Selector::parse("tbody tr[data-row-id]").unwrap();
        assert_eq!(html.select(&row_selector).count(), 2);
        let indicator = Selector::parse("#page-indicator").unwrap();
        let text: String = html.select(&indicator).next().unwrap().text().collect();
        assert_eq!(text.trim(), "Page 1 of 2");
    }

    #[test]
    fn next_link_points_at_second_page() {
        let html = render(rows(), TableState::default());

        let next = Selector::parse("a[href='/accounts?page=2']").unwrap();
        assert_eq!(html.select(&next).count(), 1);
    }

    #[test]
    fn bulk_delete_button_carries_selected_ids() {
        let mut state = TableState::default();
        state.toggle_row("a");
        state.toggle_row("c");

        let html = render(rows(), state);

        let button = Selector::parse("#bulk-delete").unwrap();
        let button = html.select(&button).next().unwrap();
        assert_eq!(
            button.value().attr("hx-post"),
            Some("/api/accounts/bulk-delete")
        );
        assert_eq!(button.value().attr("hx-vals"), Some(r#"{"ids":["a","c"]}"#));
        assert_eq!(
            button.value().attr("hx-confirm"),
            Some("Delete 2 selected row(s)? This cannot be undone.")
        );
    }

    #[test]
    fn no_bulk_delete_button_without_selection() {
        let html = render(rows(), TableState::default());

        let button = Selector::parse("#bulk-delete").unwrap();
        assert_eq!(html.select(&button).count(), 0);
    }

    #[test]
    fn empty_table_says_no_results() {
        let html = render(Vec::new(), TableState::default());

        let cell = Selector::parse("td[colspan]").unwrap();
        let text: String = html.select(&cell).next().unwrap().text().collect();
        assert_eq!(text, "No results.");
    }
}
