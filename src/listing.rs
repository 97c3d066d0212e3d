//! Generic list view: search filter, typed sort and pagination.
//!
//! Every admin table (customers, invoices, mentors, students, teams) runs the
//! same pipeline: `filter -> sort -> paginate`. A record type opts in by
//! implementing [`Listable`] and describing its columns in a [`ListSpec`].

use serde::Serialize;
use std::cmp::Ordering;

/// Default rows per page.
pub const DEFAULT_PER_PAGE: usize = 20;
/// Largest page a client may ask for.
pub const MAX_PER_PAGE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Compared case-insensitively as strings.
    Text,
    /// Compared as floats.
    Numeric,
}

/// One sortable column.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Column {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: ColumnKind,
}

impl Column {
    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: ColumnKind::Text,
        }
    }

    pub const fn numeric(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            kind: ColumnKind::Numeric,
        }
    }
}

/// Column layout for a record type.
#[derive(Debug, Clone, Copy)]
pub struct ListSpec {
    pub columns: &'static [Column],
    /// Used when the requested sort key is unknown.
    pub default_sort: &'static str,
}

impl ListSpec {
    pub fn column(&self, key: &str) -> Option<&'static Column> {
        let columns: &'static [Column] = self.columns;
        columns.iter().find(|c| c.key == key)
    }

    /// Resolves a requested key to a known column, falling back to the
    /// default sort column and then the first column. `None` only when the
    /// layout has no columns.
    pub fn resolve(&self, key: &str) -> Option<&'static Column> {
        let columns: &'static [Column] = self.columns;
        self.column(key.trim())
            .or_else(|| self.column(self.default_sort))
            .or_else(|| columns.first())
    }
}

/// Value a record exposes for sorting on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(f64),
}

impl SortValue {
    fn as_number(&self) -> f64 {
        match self {
            SortValue::Number(n) => *n,
            SortValue::Text(s) => parse_amount(s),
        }
    }

    fn as_text(&self) -> String {
        match self {
            SortValue::Text(s) => s.to_lowercase(),
            SortValue::Number(n) => n.to_string(),
        }
    }
}

/// A record that can be shown in a list view.
pub trait Listable {
    const SPEC: ListSpec;

    /// Fields the search term is matched against.
    fn search_fields(&self) -> Vec<&str>;

    /// Value for sort column `key`. `None` when the record has no value
    /// there; such records sort before those that do.
    fn sort_value(&self, key: &str) -> Option<SortValue>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parses `asc`/`desc` case-insensitively; anything else is ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// True if `term` is a case-insensitive substring of any searchable field.
/// Empty or whitespace-only terms match everything.
pub fn matches_search<T: Listable>(record: &T, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    record
        .search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Compares two records on `column`.
fn compare_on<T: Listable>(a: &T, b: &T, column: &Column) -> Ordering {
    let left = a.sort_value(column.key);
    let right = b.sort_value(column.key);

    match (left, right) {
        (Some(l), Some(r)) => match column.kind {
            ColumnKind::Numeric => l.as_number().total_cmp(&r.as_number()),
            ColumnKind::Text => l.as_text().cmp(&r.as_text()),
        },
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// Filters `records` by `search`, then stable-sorts them by `sort_key`.
///
/// Unknown sort keys fall back to the record type's default column. `Desc`
/// reverses the comparator result, so ties keep input order either way.
/// Records without any sortable column keep their input order.
pub fn filter_and_sort<T: Listable>(
    records: Vec<T>,
    search: &str,
    sort_key: &str,
    direction: SortDirection,
) -> Vec<T> {
    let column = T::SPEC.resolve(sort_key);

    let mut kept: Vec<T> = records
        .into_iter()
        .filter(|r| matches_search(r, search))
        .collect();

    if let Some(column) = column {
        kept.sort_by(|a, b| direction.apply(compare_on(a, b, column)));
    }
    kept
}

/// Requested page, with `page >= 1` and `1 <= per_page <= MAX_PER_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub per_page: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    /// Builds a request, clamping out-of-range values.
    pub fn new(page: Option<usize>, per_page: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// One page of a list plus enough to render pagination links.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

/// Slices `records[(page-1)*per_page, page*per_page)`. Pages past the end are
/// empty.
pub fn paginate<T>(records: Vec<T>, request: PageRequest) -> Page<T> {
    let total = records.len();
    let total_pages = total.div_ceil(request.per_page);
    let items = records
        .into_iter()
        .skip(request.offset())
        .take(request.per_page)
        .collect();

    Page {
        items,
        total,
        page: request.page,
        per_page: request.per_page,
        total_pages,
    }
}

/// Full pipeline over already-reconciled records.
pub fn list_view<T: Listable>(
    records: Vec<T>,
    search: &str,
    sort_key: &str,
    direction: SortDirection,
    request: PageRequest,
) -> Page<T> {
    paginate(filter_and_sort(records, search, sort_key, direction), request)
}

/// Parses a displayed amount such as `"$1,250.00"` or `"-9"` into a float.
/// Unparseable input is `0.0`.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Formats an amount for display, e.g. `9.0 -> "$9.00"`, `-3.5 -> "-$3.50"`.
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        name: String,
        amount: f64,
    }

    fn row(name: &str, amount: f64) -> Row {
        Row {
            name: name.to_string(),
            amount,
        }
    }

    impl Listable for Row {
        const SPEC: ListSpec = ListSpec {
            columns: &[Column::text("name", "Name"), Column::numeric("amount", "Amount")],
            default_sort: "name",
        };

        fn search_fields(&self) -> Vec<&str> {
            vec![self.name.as_str()]
        }

        fn sort_value(&self, key: &str) -> Option<SortValue> {
            match key {
                "name" => Some(SortValue::Text(self.name.clone())),
                "amount" => Some(SortValue::Number(self.amount)),
                _ => None,
            }
        }
    }

    fn names(rows: &[Row]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_text_sort_is_case_insensitive() {
        let rows = vec![row("bravo", 0.0), row("Alpha", 0.0), row("charlie", 0.0)];
        let sorted = filter_and_sort(rows, "", "name", SortDirection::Asc);
        assert_eq!(names(&sorted), vec!["Alpha", "bravo", "charlie"]);
    }

    #[test]
    fn test_numeric_sort_by_value() {
        let rows = vec![row("a", 10.0), row("b", 9.0), row("c", -2.5), row("d", 0.0)];
        let sorted = filter_and_sort(rows, "", "amount", SortDirection::Asc);
        assert_eq!(names(&sorted), vec!["c", "d", "b", "a"]);
    }

    #[test]
    fn test_desc_is_reverse_and_stable() {
        let rows = vec![row("x", 1.0), row("y", 1.0), row("z", 2.0)];
        let sorted = filter_and_sort(rows, "", "amount", SortDirection::Desc);
        assert_eq!(names(&sorted), vec!["z", "x", "y"]);
    }

    #[test]
    fn test_unknown_key_uses_default() {
        let rows = vec![row("b", 1.0), row("a", 2.0)];
        let sorted = filter_and_sort(rows, "", "nonsense", SortDirection::Asc);
        assert_eq!(names(&sorted), vec!["a", "b"]);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Note(&'static str);

    impl Listable for Note {
        const SPEC: ListSpec = ListSpec {
            columns: &[],
            default_sort: "",
        };

        fn search_fields(&self) -> Vec<&str> {
            vec![self.0]
        }

        fn sort_value(&self, _key: &str) -> Option<SortValue> {
            None
        }
    }

    #[test]
    fn test_layout_without_columns_keeps_order() {
        assert!(Note::SPEC.resolve("anything").is_none());

        let notes = vec![Note("second"), Note("first"), Note("skip")];
        let kept = filter_and_sort(notes, "s", "anything", SortDirection::Desc);
        assert_eq!(kept, vec![Note("second"), Note("first"), Note("skip")]);

        let page = list_view(
            vec![Note("b"), Note("a")],
            "",
            "",
            SortDirection::Asc,
            PageRequest::default(),
        );
        assert_eq!(page.items, vec![Note("b"), Note("a")]);
    }

    #[test]
    fn test_resolve_falls_back_to_default() {
        assert_eq!(Row::SPEC.resolve(" amount ").map(|c| c.key), Some("amount"));
        assert_eq!(Row::SPEC.resolve("nonsense").map(|c| c.key), Some("name"));
    }

    #[test]
    fn test_search_filters() {
        let rows = vec![row("Jane Doe", 0.0), row("Acme", 0.0)];
        let found = filter_and_sort(rows.clone(), "JANE", "name", SortDirection::Asc);
        assert_eq!(names(&found), vec!["Jane Doe"]);

        let all = filter_and_sort(rows, "   ", "name", SortDirection::Asc);
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_page_request_clamps() {
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, per_page: 1 });
        assert_eq!(PageRequest::new(None, Some(10_000)).per_page, MAX_PER_PAGE);
        assert_eq!(PageRequest::new(None, None), PageRequest::default());
    }

    #[test]
    fn test_paginate() {
        let records: Vec<u32> = (0..25).collect();
        let page = paginate(records.clone(), PageRequest::new(Some(3), Some(10)));
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);

        let past_end = paginate(records, PageRequest::new(Some(9), Some(10)));
        assert!(past_end.items.is_empty());
    }

    #[test]
    fn test_amount_helpers() {
        assert_eq!(parse_amount("$1,250.00"), 1250.0);
        assert_eq!(parse_amount("-9"), -9.0);
        assert_eq!(parse_amount("n/a"), 0.0);
        assert_eq!(format_currency(9.0), "$9.00");
        assert_eq!(format_currency(-3.5), "-$3.50");
    }
}
