//! Request and response types shared by the JSON API handlers and the typed
//! client, plus the extractors that turn malformed input into [Error]s.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{Uri, request::Parts},
    response::{IntoResponse, Response},
};
use axum_htmx::{HxRedirect, HxRefresh};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{DatabaseId, Error};

/// The envelope for every successful JSON response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data<T> {
    /// The response payload.
    pub data: T,
}

impl<T> Data<T> {
    /// Wrap `data` in the response envelope.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// The body of a bulk-delete request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    /// The ids to delete. Ids the caller does not own are skipped.
    #[serde(default, deserialize_with = "one_or_many")]
    pub ids: Vec<DatabaseId>,
}

/// The id of a row removed by a delete request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeletedId {
    /// The id of the deleted row.
    pub id: DatabaseId,
}

/// A JSON body extractor that reports malformed bodies as a 400 JSON error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// A query string extractor that reports malformed queries as a 400 JSON error.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);

/// A path parameter extractor that reports bad parameters as a 400 JSON error.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(Error))]
pub struct ApiPath<T>(pub T);

/// Trim the row id from a request path.
///
/// # Errors
/// Returns [Error::MissingId] if the id is blank.
pub(crate) fn require_id(id: &str) -> Result<&str, Error> {
    let id = id.trim();

    if id.is_empty() {
        return Err(Error::MissingId);
    }

    Ok(id)
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

const HX_REQUEST: &str = "hx-request";
const HX_CURRENT_URL: &str = "hx-current-url";

/// The page query parameters dropped after a mutation: the open sheet and
/// the row selection.
const TRANSIENT_PARAMS: [&str; 3] = ["sheet", "id", "selected"];

/// How a mutation was requested: directly through the JSON API, or by a form
/// on a dashboard page through htmx.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmxContext {
    is_htmx: bool,
    return_url: Option<String>,
}

impl<S> FromRequestParts<S> for HtmxContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
        };

        let is_htmx = header(HX_REQUEST).is_some_and(|value| value.eq_ignore_ascii_case("true"));
        let return_url = header(HX_CURRENT_URL).and_then(close_sheet_url);

        Ok(Self {
            is_htmx,
            return_url,
        })
    }
}

impl HtmxContext {
    /// Respond to a successful mutation with `data`.
    ///
    /// htmx requests are additionally sent back to the page they came from
    /// with the sheet closed and the selection cleared, which re-renders the
    /// page with fresh data.
    pub fn respond<T: Serialize>(self, data: T) -> Response {
        let body = Json(Data::new(data));

        match (self.is_htmx, self.return_url) {
            (true, Some(url)) => (HxRedirect(url), body).into_response(),
            (true, None) => (HxRefresh(true), body).into_response(),
            (false, _) => body.into_response(),
        }
    }
}

/// Strip the sheet and selection parameters from the page URL `raw_url`,
/// returning the path and remaining query.
///
/// Returns `None` if `raw_url` is not a URL.
pub(crate) fn close_sheet_url(raw_url: &str) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    let path = uri.path();

    let Some(query) = uri.query() else {
        return Some(path.to_owned());
    };

    let params: Vec<(String, String)> = serde_urlencoded::from_str(query).ok()?;
    let params: Vec<(String, String)> = params
        .into_iter()
        .filter(|(key, _)| !TRANSIENT_PARAMS.contains(&key.as_str()))
        .collect();

    if params.is_empty() {
        return Some(path.to_owned());
    }

    let query = serde_urlencoded::to_string(params).ok()?;

    Some(format!("{path}?{query}"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Accept either a single string or a list of strings.
///
/// Forms submitted through htmx send a lone checked checkbox as a string.
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Accept a number or a string holding a number.
pub(crate) fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(number) => Ok(number),
        NumberOrString::Text(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite())
            .ok_or_else(|| serde::de::Error::custom(format!("\"{text}\" is not a number"))),
    }
}

/// Treat an empty or blank string the same as a missing value.
pub(crate) fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;

    Ok(value.filter(|text| !text.trim().is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolOrString {
    Bool(bool),
    Text(String),
}

/// Accept a boolean, or the string an HTML checkbox sends when checked.
pub(crate) fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<BoolOrString>::deserialize(deserializer)? {
        Some(BoolOrString::Bool(value)) => value,
        Some(BoolOrString::Text(text)) => matches!(text.as_str(), "on" | "true"),
        None => false,
    })
}

#[cfg(test)]
mod close_sheet_url_tests {
    use super::close_sheet_url;

    #[test]
    fn removes_sheet_and_id() {
        assert_eq!(
            close_sheet_url("http://localhost:3000/accounts?sheet=edit&id=abc&page=2").as_deref(),
            Some("/accounts?page=2")
        );
    }

    #[test]
    fn removes_selection() {
        assert_eq!(
            close_sheet_url("/accounts?selected=a%2Cb&filter=bank").as_deref(),
            Some("/accounts?filter=bank")
        );
    }

    #[test]
    fn keeps_bare_path() {
        assert_eq!(
            close_sheet_url("http://localhost:3000/categories?sheet=new").as_deref(),
            Some("/categories")
        );
        assert_eq!(
            close_sheet_url("/transactions").as_deref(),
            Some("/transactions")
        );
    }

    #[test]
    fn keeps_table_state() {
        assert_eq!(
            close_sheet_url("/transactions?sort=payee&dir=desc&filter=cafe").as_deref(),
            Some("/transactions?sort=payee&dir=desc&filter=cafe")
        );
    }
}

#[cfg(test)]
mod lenient_serde_tests {
    use serde::Deserialize;

    use crate::BulkDeleteRequest;

    #[derive(Debug, Deserialize)]
    struct Amount {
        #[serde(deserialize_with = "super::number_or_string")]
        amount: f64,
    }

    #[derive(Debug, Deserialize)]
    struct Notes {
        #[serde(default, deserialize_with = "super::empty_string_as_none")]
        notes: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct RememberMe {
        #[serde(default, deserialize_with = "super::checkbox")]
        remember_me: bool,
    }

    #[test]
    fn bulk_delete_accepts_single_id() {
        let request: BulkDeleteRequest = serde_json::from_str(r#"{"ids":"abc"}"#).unwrap();

        assert_eq!(request.ids, vec!["abc".to_owned()]);
    }

    #[test]
    fn bulk_delete_accepts_list_and_missing_ids() {
        let request: BulkDeleteRequest = serde_json::from_str(r#"{"ids":["a","b"]}"#).unwrap();
        assert_eq!(request.ids, vec!["a".to_owned(), "b".to_owned()]);

        let request: BulkDeleteRequest = serde_json::from_str("{}").unwrap();
        assert!(request.ids.is_empty());
    }

    #[test]
    fn amount_accepts_number_and_string() {
        let amount: Amount = serde_json::from_str(r#"{"amount":-12.5}"#).unwrap();
        assert_eq!(amount.amount, -12.5);

        let amount: Amount = serde_json::from_str(r#"{"amount":"42"}"#).unwrap();
        assert_eq!(amount.amount, 42.0);

        let amount: Amount = serde_json::from_str(r#"{"amount":3}"#).unwrap();
        assert_eq!(amount.amount, 3.0);
    }

    #[test]
    fn amount_rejects_text() {
        assert!(serde_json::from_str::<Amount>(r#"{"amount":"lots"}"#).is_err());
        assert!(serde_json::from_str::<Amount>(r#"{"amount":"NaN"}"#).is_err());
    }

    #[test]
    fn blank_notes_are_none() {
        let notes: Notes = serde_json::from_str(r#"{"notes":"  "}"#).unwrap();
        assert_eq!(notes.notes, None);

        let notes: Notes = serde_json::from_str("{}").unwrap();
        assert_eq!(notes.notes, None);

        let notes: Notes = serde_json::from_str(r#"{"notes":"rent"}"#).unwrap();
        assert_eq!(notes.notes.as_deref(), Some("rent"));
    }

    #[test]
    fn checkbox_accepts_on_and_bool() {
        let value: RememberMe = serde_json::from_str(r#"{"remember_me":"on"}"#).unwrap();
        assert!(value.remember_me);

        let value: RememberMe = serde_json::from_str(r#"{"remember_me":true}"#).unwrap();
        assert!(value.remember_me);

        let value: RememberMe = serde_json::from_str("{}").unwrap();
        assert!(!value.remember_me);
    }
}
