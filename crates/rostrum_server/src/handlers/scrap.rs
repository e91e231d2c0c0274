//! Scrap (bookmark) HTTP handlers.

use super::{authenticated_user_id, feed_request, FeedParams};
use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use hyper::HeaderMap;
use rostrum_core::db::filter::SearchFilter;
use rostrum_core::feed::{fetch_scrap_feed, CursorPage};
use rostrum_core::models::discussion::DiscussionPreview;
use rostrum_core::AppError;

/// Feed of discussions the caller has scrapped, newest first.
///
/// # Errors
/// Returns an error if the caller is unknown or parameters are invalid.
pub async fn scrap_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FeedParams>,
) -> Result<Json<CursorPage<DiscussionPreview>>, HttpError> {
    let user_id = authenticated_user_id(&headers)?;
    let now = Utc::now();
    let request = feed_request(&params, SearchFilter::None, now)?;
    Ok(Json(fetch_scrap_feed(&state.db, &request, user_id)?))
}

/// Scrap a discussion for the caller.
///
/// # Errors
/// Returns an error if the user or discussion is missing, or the scrap
/// already exists.
pub async fn add_scrap(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(discussion_id): Path<u64>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let user_id = authenticated_user_id(&headers)?;
    if !state.db.users.exists(user_id)? {
        return Err(AppError::NotFound("user").into());
    }
    if state.db.discussions.get(discussion_id)?.is_none() {
        return Err(AppError::NotFound("discussion").into());
    }
    state.db.scraps.add(user_id, discussion_id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Remove the caller's scrap of a discussion.
///
/// # Errors
/// Returns an error if the user is missing or no such scrap exists.
pub async fn remove_scrap(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(discussion_id): Path<u64>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let user_id = authenticated_user_id(&headers)?;
    if !state.db.users.exists(user_id)? {
        return Err(AppError::NotFound("user").into());
    }
    state.db.scraps.remove(user_id, discussion_id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}
