//! HTTP handlers for discussion, scrap and user endpoints, plus the
//! shared query-parameter and identity plumbing.

/// Discussion feed, search and CRUD handlers.
pub mod discussion;
/// Scrap (bookmark) handlers.
pub mod scrap;
/// User handlers.
pub mod user;

use chrono::{DateTime, Utc};
use hyper::HeaderMap;
use rostrum_core::db::filter::{FilterSpec, SearchFilter};
use rostrum_core::feed::FeedRequest;
use rostrum_core::models::discussion::Category;
use rostrum_core::status::LifecycleState;
use rostrum_core::AppError;
use serde::Deserialize;

/// Header carrying the caller's user id. Authentication proper lives in
/// front of this service; handlers only parse the forwarded identity.
pub const USER_ID_HEADER: &str = "x-user-id";

const DEFAULT_PAGE_SIZE: i64 = 10;

/// Parse the caller's user id from the identity header.
///
/// # Errors
/// Returns [`AppError::Validation`] when the header is missing or not a
/// non-negative integer.
pub(crate) fn authenticated_user_id(headers: &HeaderMap) -> Result<u64, AppError> {
    let value = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| AppError::Validation(format!("missing {USER_ID_HEADER} header")))?;
    value
        .to_str()
        .ok()
        .and_then(|text| text.trim().parse::<u64>().ok())
        .ok_or_else(|| AppError::Validation(format!("invalid {USER_ID_HEADER} header")))
}

/// Query parameters shared by every listing endpoint. `category` and
/// `status` are comma-separated token lists.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeedParams {
    pub cursor: Option<String>,
    pub size: Option<i64>,
    pub category: Option<String>,
    pub status: Option<String>,
}

/// Search endpoint parameters: the feed parameters plus the query text
/// and search mode.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchParams {
    pub cursor: Option<String>,
    pub size: Option<i64>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub query: Option<String>,
    pub search_by: Option<String>,
}

impl SearchParams {
    fn feed_params(&self) -> FeedParams {
        FeedParams {
            cursor: self.cursor.clone(),
            size: self.size,
            category: self.category.clone(),
            status: self.status.clone(),
        }
    }
}

fn parse_csv<T>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Result<T, AppError>,
) -> Result<Vec<T>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(parse)
        .collect()
}

/// Build a core feed request from query parameters. Unknown category or
/// status tokens are rejected here, before any query runs.
pub(crate) fn feed_request(
    params: &FeedParams,
    search: SearchFilter,
    now: DateTime<Utc>,
) -> Result<FeedRequest, AppError> {
    Ok(FeedRequest {
        filter: FilterSpec {
            categories: parse_csv(params.category.as_deref(), Category::from_token)?,
            states: parse_csv(params.status.as_deref(), LifecycleState::from_token)?,
        },
        search,
        cursor: params.cursor.clone(),
        size: params.size.unwrap_or(DEFAULT_PAGE_SIZE),
        now,
    })
}

/// Resolve the search mode. The default mode scans title and content.
pub(crate) fn search_filter(
    search_by: Option<&str>,
    query: Option<&str>,
) -> Result<SearchFilter, AppError> {
    let query = query.unwrap_or("");
    match search_by {
        None | Some("textOrContent") => Ok(SearchFilter::title_or_content(query)),
        Some("authorNickname") => Ok(SearchFilter::author_nickname(query)),
        Some(other) => Err(AppError::Validation(format!(
            "invalid searchBy token: '{other}'"
        ))),
    }
}
