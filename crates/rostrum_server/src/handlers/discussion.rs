//! Discussion HTTP handlers.

use super::{authenticated_user_id, feed_request, search_filter, FeedParams, SearchParams};
use crate::{error::HttpError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use hyper::HeaderMap;
use rostrum_core::db::filter::SearchFilter;
use rostrum_core::feed::{fetch_author_feed, fetch_feed, CursorPage};
use chrono::{DateTime, Utc};
use rostrum_core::models::discussion::{
    CreateDiscussionRequest, DiscussionDetail, DiscussionPreview, UpdateDiscussionRequest,
};
use rostrum_core::AppError;

fn validate_payload(
    title: &str,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    max_participant_count: u32,
) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title must not be blank".to_string()));
    }
    if start_at > end_at {
        return Err(AppError::Validation(
            "startAt must not be after endAt".to_string(),
        ));
    }
    if max_participant_count == 0 {
        return Err(AppError::Validation(
            "maxParticipantCount must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Create a new discussion authored by the caller.
///
/// # Errors
/// Returns an error if the author does not exist, validation fails, or
/// persistence fails.
pub async fn create_discussion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateDiscussionRequest>,
) -> Result<(StatusCode, Json<DiscussionDetail>), HttpError> {
    let author_id = authenticated_user_id(&headers)?;
    let author = state
        .db
        .users
        .get(author_id)?
        .ok_or(AppError::NotFound("user"))?;
    validate_payload(&req.title, req.start_at, req.end_at, req.max_participant_count)?;

    let row = state.db.discussions.create(&req, author_id)?;
    let detail = DiscussionDetail::from_row(&row, Some(&author), Utc::now());
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Browse the global feed, newest first.
///
/// # Errors
/// Returns an error for invalid parameters or storage failures.
pub async fn feed(
    State(state): State<AppState>,
    Query(params): Query<FeedParams>,
) -> Result<Json<CursorPage<DiscussionPreview>>, HttpError> {
    let now = Utc::now();
    let request = feed_request(&params, SearchFilter::None, now)?;
    Ok(Json(fetch_feed(&state.db, &request)?))
}

/// Search the feed by text or author nickname.
///
/// # Errors
/// Returns an error for invalid parameters or storage failures.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<CursorPage<DiscussionPreview>>, HttpError> {
    let now = Utc::now();
    let search = search_filter(params.search_by.as_deref(), params.query.as_deref())?;
    let request = feed_request(&params.feed_params(), search, now)?;
    Ok(Json(fetch_feed(&state.db, &request)?))
}

/// Feed of the caller's own discussions.
///
/// # Errors
/// Returns an error if the caller is unknown or parameters are invalid.
pub async fn my_discussions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<FeedParams>,
) -> Result<Json<CursorPage<DiscussionPreview>>, HttpError> {
    let user_id = authenticated_user_id(&headers)?;
    let now = Utc::now();
    let request = feed_request(&params, SearchFilter::None, now)?;
    Ok(Json(fetch_author_feed(&state.db, &request, user_id)?))
}

/// Fetch one discussion by id.
///
/// # Errors
/// Returns an error if the discussion does not exist or lookup fails.
pub async fn get_discussion(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<DiscussionDetail>, HttpError> {
    let row = state
        .db
        .discussions
        .get(id)?
        .ok_or(AppError::NotFound("discussion"))?;
    let author = state.db.users.get(row.author_id)?;
    Ok(Json(DiscussionDetail::from_row(
        &row,
        author.as_ref(),
        Utc::now(),
    )))
}

/// Replace a discussion's editable fields. Only the author may update it.
///
/// # Errors
/// Returns an error if the discussion is missing, the caller is not its
/// author, or the new values fail validation.
pub async fn update_discussion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<UpdateDiscussionRequest>,
) -> Result<Json<DiscussionDetail>, HttpError> {
    let user_id = authenticated_user_id(&headers)?;
    let author = state
        .db
        .users
        .get(user_id)?
        .ok_or(AppError::NotFound("user"))?;
    let row = state
        .db
        .discussions
        .get(id)?
        .ok_or(AppError::NotFound("discussion"))?;
    if row.author_id != user_id {
        return Err(AppError::Validation(
            "only the author can update a discussion".to_string(),
        )
        .into());
    }
    validate_payload(&req.title, req.start_at, req.end_at, req.max_participant_count)?;

    let updated = state.db.discussions.update(id, &req)?;
    Ok(Json(DiscussionDetail::from_row(
        &updated,
        Some(&author),
        Utc::now(),
    )))
}

/// Take a seat in a discussion for the caller.
///
/// # Errors
/// Returns an error if the user or discussion is missing, the discussion
/// has started or is full, or the caller already participates.
pub async fn participate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let user_id = authenticated_user_id(&headers)?;
    if !state.db.users.exists(user_id)? {
        return Err(AppError::NotFound("user").into());
    }
    let now = Utc::now();
    let row = state.db.discussions.add_participant(id, user_id, now)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "participantCount": row.participant_count,
    })))
}

/// Soft-delete a discussion. Only the author may delete it.
///
/// # Errors
/// Returns an error if the discussion is missing or the caller is not
/// its author.
pub async fn delete_discussion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<serde_json::Value>, HttpError> {
    let user_id = authenticated_user_id(&headers)?;
    let row = state
        .db
        .discussions
        .get(id)?
        .ok_or(AppError::NotFound("discussion"))?;
    if row.author_id != user_id {
        return Err(AppError::Validation(
            "only the author can delete a discussion".to_string(),
        )
        .into());
    }

    if state.db.discussions.soft_delete(id)? {
        Ok(Json(serde_json::json!({ "success": true })))
    } else {
        Err(AppError::NotFound("discussion").into())
    }
}
