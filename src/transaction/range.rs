//! Date-range helpers for listing transactions.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, format_description::BorrowedFormatItem, macros::format_description};

use crate::{DatabaseId, Error, api::empty_string_as_none};

/// How far back the date range reaches when no start date is given.
pub const DEFAULT_RANGE_DAYS: i64 = 30;

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// The query parameters for listing transactions.
///
/// Blank values are treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListQuery {
    /// The first day to include, `YYYY-MM-DD`.
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub from: Option<String>,
    /// The last day to include, `YYYY-MM-DD`.
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub to: Option<String>,
    /// Only list transactions in this account.
    #[serde(
        default,
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub account_id: Option<DatabaseId>,
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: Date,
    pub to: Date,
}

impl DateRange {
    /// Resolve the requested range.
    ///
    /// `to` defaults to `today` and `from` defaults to [DEFAULT_RANGE_DAYS]
    /// before `to`.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if a date is not `YYYY-MM-DD`, or
    /// [Error::InvalidDateRange] if `from` is after `to`.
    pub fn resolve(from: Option<&str>, to: Option<&str>, today: Date) -> Result<Self, Error> {
        let to = match to {
            Some(to) => parse_date(to)?,
            None => today,
        };

        let from = match from {
            Some(from) => parse_date(from)?,
            None => to.saturating_sub(Duration::days(DEFAULT_RANGE_DAYS)),
        };

        if from > to {
            return Err(Error::InvalidDateRange {
                from: format_date(from),
                to: format_date(to),
            });
        }

        Ok(Self { from, to })
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// Format `date` as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}
