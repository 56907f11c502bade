//! Sorting, filtering, paging and row selection for the tables on the
//! dashboard pages.
//!
//! The state of a table lives in the page's query string, so every render
//! starts from a [TableState] parsed from the request and every link in the
//! table points at the URL of the next state.

mod view;

use std::{cmp::Ordering, collections::BTreeSet};

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::DatabaseId;

pub use view::render_table;

/// The config for pagination
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    /// The number of rows shown on each page of a table.
    pub page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

/// The order rows are sorted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    fn reversed(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Which column the rows are sorted by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    /// The key of the sorted column.
    pub column: String,
    /// Whether the column is sorted ascending or descending.
    pub direction: SortDirection,
}

/// The raw table parameters from a page's query string.
///
/// Every field is optional and parsed leniently: a bad value falls back to
/// the default rather than failing the page.
#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    /// The key of the column to sort by.
    pub sort: Option<String>,
    /// `asc` or `desc`.
    pub dir: Option<String>,
    /// Free text to filter rows by.
    pub filter: Option<String>,
    /// The 1-based page number.
    pub page: Option<String>,
    /// Comma separated row ids.
    pub selected: Option<String>,
}

/// The sort, filter, page and selection of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
    /// The sorted column, or `None` to keep the rows in their given order.
    pub sort: Option<SortState>,
    /// Free text matched against the filter column.
    pub filter: String,
    /// The 1-based page number.
    pub page: u64,
    /// The ids of the selected rows.
    pub selected: BTreeSet<DatabaseId>,
    /// Other query parameters of the page, kept in every link.
    pub extra_params: Vec<(String, String)>,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            sort: None,
            filter: String::new(),
            page: 1,
            selected: BTreeSet::new(),
            extra_params: Vec::new(),
        }
    }
}

impl TableState {
    /// Build the table state from the query string of a page.
    pub fn from_query(query: TableQuery) -> Self {
        let direction = match query.dir.as_deref() {
            Some("desc") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };

        let sort = query
            .sort
            .filter(|column| !column.is_empty())
            .map(|column| SortState { column, direction });

        let page = query
            .page
            .and_then(|page| page.trim().parse::<u64>().ok())
            .filter(|page| *page > 0)
            .unwrap_or(1);

        let selected = query
            .selected
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .collect();

        Self {
            sort,
            filter: query.filter.unwrap_or_default().trim().to_owned(),
            page,
            selected,
            extra_params: Vec::new(),
        }
    }

    /// Keep `params` in every link the table renders.
    pub fn with_extra_params(mut self, params: Vec<(String, String)>) -> Self {
        self.extra_params = params;
        self
    }

    /// Sort by `column`.
    ///
    /// Choosing the current sort column flips the direction, a new column
    /// starts in ascending order.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort = Some(match self.sort.take() {
            Some(sort) if sort.column == column => SortState {
                column: sort.column,
                direction: sort.direction.reversed(),
            },
            _ => SortState {
                column: column.to_owned(),
                direction: SortDirection::Ascending,
            },
        });
    }

    /// Replace the filter text and go back to the first page.
    pub fn set_filter(&mut self, filter: &str) {
        self.filter = filter.trim().to_owned();
        self.page = 1;
    }

    /// Select `id` if it is not selected, otherwise deselect it.
    pub fn toggle_row(&mut self, id: &str) {
        if !self.selected.remove(id) {
            self.selected.insert(id.to_owned());
        }
    }

    /// Deselect every row.
    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// The query string pairs that describe this state.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.extra_params.clone();

        if let Some(sort) = &self.sort {
            pairs.push(("sort".to_owned(), sort.column.clone()));
            pairs.push(("dir".to_owned(), sort.direction.as_str().to_owned()));
        }

        if !self.filter.is_empty() {
            pairs.push(("filter".to_owned(), self.filter.clone()));
        }

        if self.page > 1 {
            pairs.push(("page".to_owned(), self.page.to_string()));
        }

        if !self.selected.is_empty() {
            let selected: Vec<&str> = self.selected.iter().map(String::as_str).collect();
            pairs.push(("selected".to_owned(), selected.join(",")));
        }

        pairs
    }

    /// The URL of `path` showing this state, with `params` appended.
    pub fn href_with(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut pairs = self.to_query_pairs();
        pairs.extend(
            params
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned())),
        );

        if pairs.is_empty() {
            return path.to_owned();
        }

        match serde_urlencoded::to_string(&pairs) {
            Ok(query) => format!("{path}?{query}"),
            Err(error) => {
                tracing::error!("Could not encode table state {pairs:?}: {error}");
                path.to_owned()
            }
        }
    }

    /// The URL of `path` showing this state.
    pub fn href(&self, path: &str) -> String {
        self.href_with(path, &[])
    }
}

/// A column of a [DataTable].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    /// The name used for the column in URLs and by [TableRow].
    pub key: &'static str,
    /// The column heading.
    pub header: &'static str,
    /// Right align the column, e.g. for amounts.
    pub numeric: bool,
}

impl Column {
    /// A left aligned column.
    pub const fn text(key: &'static str, header: &'static str) -> Self {
        Self {
            key,
            header,
            numeric: false,
        }
    }

    /// A right aligned column.
    pub const fn numeric(key: &'static str, header: &'static str) -> Self {
        Self {
            key,
            header,
            numeric: true,
        }
    }
}

/// A value rows are ordered by.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum SortValue {
    /// Compared case-insensitively.
    Text(String),
    /// Compared numerically, e.g. amounts.
    Number(f64),
    /// Compared by calendar day.
    Date(Date),
    /// Sorts before every other value, e.g. a missing category.
    Empty,
}

impl SortValue {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Empty, SortValue::Empty) => Ordering::Equal,
            (SortValue::Empty, _) => Ordering::Less,
            (_, SortValue::Empty) => Ordering::Greater,
            (SortValue::Text(left), SortValue::Text(right)) => {
                left.to_lowercase().cmp(&right.to_lowercase())
            }
            (left, right) => left.partial_cmp(right).unwrap_or(Ordering::Equal),
        }
    }
}

/// A row that can be shown in a [DataTable].
pub trait TableRow {
    /// The id of the row, used for selection and deletion.
    fn id(&self) -> &str;

    /// The plain text of the cell in `column`. The filter matches against this.
    fn cell_text(&self, column: &str) -> String;

    /// The value used to sort rows by `column`.
    fn sort_value(&self, column: &str) -> SortValue {
        SortValue::Text(self.cell_text(column))
    }

    /// The markup of the cell in `column`.
    fn cell(&self, column: &str) -> Markup {
        html! { (self.cell_text(column)) }
    }
}

/// Applies a [TableState] to a set of rows.
#[derive(Debug, Clone)]
pub struct DataTable<T> {
    columns: Vec<Column>,
    filter_column: &'static str,
    rows: Vec<T>,
    page_size: u64,
    /// The sort, filter, page and selection applied to the rows.
    pub state: TableState,
}

impl<T: TableRow> DataTable<T> {
    /// Create a table of `rows` whose free text filter applies to
    /// `filter_column`.
    pub fn new(
        columns: Vec<Column>,
        filter_column: &'static str,
        rows: Vec<T>,
        state: TableState,
        pagination_config: &PaginationConfig,
    ) -> Self {
        Self {
            columns,
            filter_column,
            rows,
            page_size: pagination_config.page_size.max(1),
            state,
        }
    }

    /// The columns in display order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The column the free text filter matches against.
    pub fn filter_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|column| column.key == self.filter_column)
    }

    /// The rows that pass the filter, in sorted order.
    pub fn filtered_rows(&self) -> Vec<&T> {
        let needle = self.state.filter.to_lowercase();

        let mut rows: Vec<&T> = self
            .rows
            .iter()
            .filter(|row| {
                needle.is_empty()
                    || row
                        .cell_text(self.filter_column)
                        .to_lowercase()
                        .contains(&needle)
            })
            .collect();

        if let Some(sort) = &self.state.sort {
            rows.sort_by(|a, b| {
                let ordering = a
                    .sort_value(&sort.column)
                    .compare(&b.sort_value(&sort.column));

                match sort.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        rows
    }

    /// The number of pages, at least one even for an empty table.
    pub fn page_count(&self) -> u64 {
        let row_count = self.filtered_rows().len() as u64;

        row_count.div_ceil(self.page_size).max(1)
    }

    /// The requested page, clamped to the pages that exist.
    pub fn current_page(&self) -> u64 {
        self.state.page.clamp(1, self.page_count())
    }

    /// The rows on the current page.
    pub fn visible_rows(&self) -> Vec<&T> {
        let start = ((self.current_page() - 1) * self.page_size) as usize;

        self.filtered_rows()
            .into_iter()
            .skip(start)
            .take(self.page_size as usize)
            .collect()
    }

    /// Whether there is a page before the current one.
    pub fn can_previous_page(&self) -> bool {
        self.current_page() > 1
    }

    /// Whether there is a page after the current one.
    pub fn can_next_page(&self) -> bool {
        self.current_page() < self.page_count()
    }

    /// The state showing the previous page, if there is one.
    pub fn previous_page(&self) -> Option<TableState> {
        self.can_previous_page().then(|| TableState {
            page: self.current_page() - 1,
            ..self.state.clone()
        })
    }

    /// The state showing the next page, if there is one.
    pub fn next_page(&self) -> Option<TableState> {
        self.can_next_page().then(|| TableState {
            page: self.current_page() + 1,
            ..self.state.clone()
        })
    }

    /// Whether the row with `id` is selected.
    pub fn is_selected(&self, id: &str) -> bool {
        self.state.selected.contains(id)
    }

    /// Whether every row that passes the filter is selected.
    pub fn all_filtered_selected(&self) -> bool {
        let rows = self.filtered_rows();

        !rows.is_empty() && rows.iter().all(|row| self.is_selected(row.id()))
    }

    /// The state after clicking the select-all checkbox.
    ///
    /// Selects every row that passes the filter, or deselects them if they
    /// are all selected already.
    pub fn toggle_all(&self) -> TableState {
        let mut state = self.state.clone();
        let all_selected = self.all_filtered_selected();

        for row in self.filtered_rows() {
            if all_selected {
                state.selected.remove(row.id());
            } else {
                state.selected.insert(row.id().to_owned());
            }
        }

        state
    }

    /// The ids that a bulk delete should remove: the selected rows that pass
    /// the current filter.
    ///
    /// The selection itself is cleared by the redirect that follows a
    /// successful delete, which drops `selected` from the page URL.
    pub fn bulk_delete_ids(&self) -> Vec<DatabaseId> {
        self.filtered_rows()
            .into_iter()
            .filter(|row| self.is_selected(row.id()))
            .map(|row| row.id().to_owned())
            .collect()
    }
}


#[cfg(test)]
mod data_table_tests {
    use crate::data_table::{
        Column, DataTable, PaginationConfig, SortValue, TableRow, TableState,
    };

    #[derive(Debug, Clone)]
    struct Row {
        id: String,
        name: String,
        amount: f64,
    }

    impl TableRow for Row {
        fn id(&self) -> &str {
            &self.id
        }

        fn cell_text(&self, column: &str) -> String {
            match column {
                "name" => self.name.clone(),
                "amount" => self.amount.to_string(),
                _ => String::new(),
            }
        }

        fn sort_value(&self, column: &str) -> SortValue {
            match column {
                "amount" => SortValue::Number(self.amount),
                _ => SortValue::Text(self.cell_text(column)),
            }
        }
    }

    fn rows(count: usize) -> Vec<Row> {
        (0..count)
            .map(|i| Row {
                id: format!("id{i:02}"),
                name: if i % 2 == 0 {
                    format!("Even {i}")
                } else {
                    format!("Odd {i}")
                },
                amount: (count - i) as f64,
            })
            .collect()
    }

    fn table(rows: Vec<Row>, state: TableState) -> DataTable<Row> {
        DataTable::new(
            vec![Column::text("name", "Name"), Column::numeric("amount", "Amount")],
            "name",
            rows,
            state,
            &PaginationConfig { page_size: 10 },
        )
    }

    fn ids(rows: &[&Row]) -> Vec<String> {
        rows.iter().map(|row| row.id.clone()).collect()
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let mut state = TableState::default();
        state.set_filter("EVEN");

        let table = table(rows(6), state);

        assert_eq!(
            ids(&table.filtered_rows()),
            vec!["id00", "id02", "id04"]
        );
    }

    #[test]
    fn sorts_numbers_by_value() {
        let mut state = TableState::default();
        state.toggle_sort("amount");

        let table = table(rows(3), state);

        assert_eq!(ids(&table.filtered_rows()), vec!["id02", "id01", "id00"]);
    }

    #[test]
    fn sorts_descending() {
        let mut state = TableState::default();
        state.toggle_sort("amount");
        state.toggle_sort("amount");

        let table = table(rows(3), state);

        assert_eq!(ids(&table.filtered_rows()), vec!["id00", "id01", "id02"]);
    }

    #[test]
    fn pages_through_rows() {
        let table = table(rows(25), TableState::default());

        assert_eq!(table.page_count(), 3);
        assert_eq!(table.visible_rows().len(), 10);
        assert!(!table.can_previous_page());
        assert!(table.can_next_page());

        let last = self::table(rows(25), TableState { page: 3, ..Default::default() });
        assert_eq!(last.visible_rows().len(), 5);
        assert!(last.can_previous_page());
        assert!(!last.can_next_page());
        assert_eq!(last.previous_page().map(|state| state.page), Some(2));
        assert_eq!(last.next_page(), None);
    }

    #[test]
    fn page_is_clamped_to_filtered_rows() {
        let mut state = TableState {
            page: 3,
            ..Default::default()
        };
        state.filter = "odd".to_owned();

        let table = table(rows(25), state);

        assert_eq!(table.page_count(), 2);
        assert_eq!(table.current_page(), 2);
        assert_eq!(table.visible_rows().len(), 2);
    }

    #[test]
    fn empty_table_has_one_page() {
        let table = table(Vec::new(), TableState::default());

        assert_eq!(table.page_count(), 1);
        assert!(table.visible_rows().is_empty());
        assert!(!table.can_next_page());
        assert!(!table.all_filtered_selected());
    }

    #[test]
    fn toggle_all_selects_only_filtered_rows() {
        let mut state = TableState::default();
        state.set_filter("odd");
        let table = table(rows(4), state);

        let state = table.toggle_all();

        assert_eq!(
            state.selected.iter().cloned().collect::<Vec<_>>(),
            vec!["id01", "id03"]
        );

        let table = self::table(rows(4), state);
        assert!(table.all_filtered_selected());
        assert!(table.toggle_all().selected.is_empty());
    }

    #[test]
    fn bulk_delete_uses_filtered_selection() {
        let mut state = TableState::default();
        state.toggle_row("id00");
        state.toggle_row("id01");
        state.set_filter("even");
        let table = table(rows(4), state);

        assert_eq!(table.bulk_delete_ids(), vec!["id00"]);
    }
}
