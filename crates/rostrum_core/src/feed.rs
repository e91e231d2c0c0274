//! Feed orchestration: the request boundary of every listing endpoint.
//!
//! Validation (page size, cursor shape) happens here, before any query
//! executes. The caller captures `now` exactly once per request and it is
//! threaded through both the filter predicate and the preview mapping, so
//! a row's filtered-in decision and its displayed state always agree
//! within one page.

use crate::cursor::Cursor;
use crate::db::discussion::FeedPlan;
use crate::db::filter::{FilterSpec, Predicate, SearchFilter};
use crate::db::Database;
use crate::error::AppError;
use crate::models::discussion::{Discussion, DiscussionPreview};
use crate::models::user::User;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Hard ceiling on the requested page size.
pub const MAX_PAGE_SIZE: i64 = 50;

/// One listing request, shared by every strategy.
#[derive(Debug, Clone)]
pub struct FeedRequest {
    pub filter: FilterSpec,
    pub search: SearchFilter,
    /// Opaque cursor token from the previous page, if any. An empty
    /// token counts as absent and yields the first page; only non-empty
    /// tokens go through [`Cursor::decode`] and can fail as malformed.
    pub cursor: Option<String>,
    /// Requested page size (echoed back in the response).
    pub size: i64,
    /// The single per-request instant used for all state derivation.
    pub now: DateTime<Utc>,
}

/// One page of a cursor walk.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    pub content: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_next: bool,
    /// The requested page size, not the number of rows returned.
    pub size: i64,
}

/// Global feed: browse, or search when `request.search` is set.
///
/// # Errors
/// Returns [`AppError::Validation`] / [`AppError::MalformedCursor`] for
/// bad inputs, storage errors otherwise.
pub fn fetch_feed(
    db: &Database,
    request: &FeedRequest,
) -> Result<CursorPage<DiscussionPreview>, AppError> {
    run(db, request, None, None)
}

/// Feed of discussions authored by `author_id`.
///
/// # Errors
/// Returns [`AppError::NotFound`] when the author does not exist, since
/// an empty page would be ambiguous with "author has no discussions".
pub fn fetch_author_feed(
    db: &Database,
    request: &FeedRequest,
    author_id: u64,
) -> Result<CursorPage<DiscussionPreview>, AppError> {
    if !db.users.exists(author_id)? {
        return Err(AppError::NotFound("user"));
    }
    run(db, request, Some(author_id), None)
}

/// Feed of discussions scrapped by `user_id`.
///
/// # Errors
/// Returns [`AppError::NotFound`] when the user does not exist.
pub fn fetch_scrap_feed(
    db: &Database,
    request: &FeedRequest,
    user_id: u64,
) -> Result<CursorPage<DiscussionPreview>, AppError> {
    if !db.users.exists(user_id)? {
        return Err(AppError::NotFound("user"));
    }
    run(db, request, None, Some(user_id))
}

fn run(
    db: &Database,
    request: &FeedRequest,
    author_id: Option<u64>,
    scrapped_by: Option<u64>,
) -> Result<CursorPage<DiscussionPreview>, AppError> {
    let size = validate_page_size(request.size)?;
    let cursor = match request.cursor.as_deref() {
        Some(token) if !token.is_empty() => Some(Cursor::decode(token)?),
        _ => None,
    };

    let mut filter = request.filter.predicate(request.now);
    if let Some(author_id) = author_id {
        filter = filter.and(Predicate::AuthorIs(author_id));
    }

    let plan = FeedPlan {
        filter,
        search: request.search.clone(),
        scrapped_by,
        cursor,
        limit: size + 1,
    };
    let rows = db.discussions.fetch_page(&plan)?;
    Ok(assemble(rows, size, request.size, request.now))
}

/// Validate the requested page size and convert it to a fetch count.
///
/// # Errors
/// Returns [`AppError::Validation`] outside `1..=MAX_PAGE_SIZE`.
pub fn validate_page_size(size: i64) -> Result<usize, AppError> {
    if !(1..=MAX_PAGE_SIZE).contains(&size) {
        return Err(AppError::Validation(format!(
            "page size must be between 1 and {MAX_PAGE_SIZE}, got {size}"
        )));
    }
    Ok(size as usize)
}

/// Turn an over-fetched row set into a page.
///
/// The fetch asked for `size + 1` rows; a full result means there is at
/// least one more page, and the extra boundary row (index `size`) yields
/// the next cursor without being returned itself.
fn assemble(
    mut rows: Vec<(Discussion, Option<User>)>,
    size: usize,
    requested_size: i64,
    now: DateTime<Utc>,
) -> CursorPage<DiscussionPreview> {
    let has_next = rows.len() > size;
    let next_cursor = has_next.then(|| Cursor::from_row(&rows[size].0).encode());
    rows.truncate(size);
    let content = rows
        .iter()
        .map(|(row, author)| DiscussionPreview::from_row(row, author.as_ref(), now))
        .collect();
    CursorPage {
        content,
        next_cursor,
        has_next,
        size: requested_size,
    }
}
