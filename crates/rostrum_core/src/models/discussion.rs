//! Discussion rows, categories and feed view objects.

use crate::error::AppError;
use crate::models::user::User;
use crate::status::LifecycleState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discussion topic category. A closed set; unknown wire tokens are
/// rejected at parse time, before any query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Backend,
    Frontend,
    Android,
    Common,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Backend,
        Category::Frontend,
        Category::Android,
        Category::Common,
    ];

    /// Wire token for this category.
    pub fn token(self) -> &'static str {
        match self {
            Self::Backend => "backend",
            Self::Frontend => "frontend",
            Self::Android => "android",
            Self::Common => "common",
        }
    }

    /// Parse a wire token.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for unknown tokens.
    pub fn from_token(token: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|category| category.token() == token)
            .ok_or_else(|| AppError::Validation(format!("invalid category token: '{token}'")))
    }
}

/// Discussion row stored in the database.
///
/// `created_at` is assigned once at creation and never changes; together
/// with `id` it forms the canonical feed sort key. `deleted_at` is a
/// tombstone: a non-null value excludes the row from every listing but the
/// row itself stays in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub place: String,
    pub category: Category,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub participant_count: u32,
    pub max_participant_count: u32,
    pub author_id: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Discussion {
    /// Derived lifecycle state at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> LifecycleState {
        LifecycleState::derive(
            self.start_at,
            self.end_at,
            self.participant_count,
            self.max_participant_count,
            now,
        )
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Request payload for creating a discussion.
///
/// `start_at <= end_at` is the write path's problem; the feed core
/// tolerates rows that violate it without re-validating.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDiscussionRequest {
    pub title: String,
    pub content: String,
    pub place: String,
    pub category: Category,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub max_participant_count: u32,
}

/// Request payload for updating a discussion. A full replacement of the
/// editable fields; `created_at` and the participant counter are not
/// editable.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDiscussionRequest {
    pub title: String,
    pub content: String,
    pub place: String,
    pub category: Category,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub max_participant_count: u32,
}

/// Feed row view object returned by every listing endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionPreview {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub author_avatar: Option<String>,
    pub place: String,
    pub category: Category,
    pub status: LifecycleState,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub participant_count: u32,
    pub max_participant_count: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl DiscussionPreview {
    /// Map a row (plus its eagerly joined author) to a view object.
    ///
    /// `now` must be the same instant used to build the page's filter
    /// predicate, so the displayed state and the filtered-in decision
    /// cannot disagree within one page.
    pub fn from_row(row: &Discussion, author: Option<&User>, now: DateTime<Utc>) -> Self {
        Self {
            id: row.id,
            title: row.title.clone(),
            author: author.map(|user| user.nickname.clone()).unwrap_or_default(),
            author_avatar: author.and_then(|user| user.avatar_uri.clone()),
            place: row.place.clone(),
            category: row.category,
            status: row.status_at(now),
            start_at: row.start_at,
            end_at: row.end_at,
            participant_count: row.participant_count,
            max_participant_count: row.max_participant_count,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

/// Detail view object for a single discussion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionDetail {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author: String,
    pub author_avatar: Option<String>,
    pub place: String,
    pub category: Category,
    pub status: LifecycleState,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub participant_count: u32,
    pub max_participant_count: u32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl DiscussionDetail {
    pub fn from_row(row: &Discussion, author: Option<&User>, now: DateTime<Utc>) -> Self {
        Self {
            id: row.id,
            title: row.title.clone(),
            content: row.content.clone(),
            author: author.map(|user| user.nickname.clone()).unwrap_or_default(),
            author_avatar: author.and_then(|user| user.avatar_uri.clone()),
            place: row.place.clone(),
            category: row.category,
            status: row.status_at(now),
            start_at: row.start_at,
            end_at: row.end_at,
            participant_count: row.participant_count,
            max_participant_count: row.max_participant_count,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}
