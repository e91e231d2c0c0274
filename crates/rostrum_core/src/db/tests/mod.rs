//! Shared fixtures for database layer tests.

mod participants;

use crate::db::filter::{FilterSpec, SearchFilter};
use crate::db::Database;
use crate::feed::FeedRequest;
use crate::models::discussion::{Category, Discussion};
use crate::models::user::{CreateUserRequest, User};
use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

pub(crate) fn setup_test_db() -> (Database, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(dir.path().to_str().unwrap()).unwrap();
    (db, dir)
}

pub(crate) fn seed_user(db: &Database, nickname: &str) -> User {
    db.users
        .create(&CreateUserRequest {
            nickname: nickname.to_string(),
            avatar_uri: None,
        })
        .unwrap()
}

/// Insert a row with a pinned `created_at`, so ordering tests control the
/// sort key instead of racing the wall clock.
pub(crate) fn seed_discussion_at(
    db: &Database,
    author_id: u64,
    created_at: DateTime<Utc>,
) -> Discussion {
    seed_discussion_with(db, author_id, created_at, |_| {})
}

pub(crate) fn seed_discussion_with(
    db: &Database,
    author_id: u64,
    created_at: DateTime<Utc>,
    customize: impl FnOnce(&mut Discussion),
) -> Discussion {
    let id = db.discussions.next_id().unwrap();
    let mut row = Discussion {
        id,
        title: format!("discussion {id}"),
        content: format!("notes for discussion {id}"),
        place: "online".to_string(),
        category: Category::Common,
        start_at: created_at + Duration::days(1),
        end_at: created_at + Duration::days(1) + Duration::hours(2),
        participant_count: 1,
        max_participant_count: 5,
        author_id,
        created_at,
        modified_at: created_at,
        deleted_at: None,
    };
    customize(&mut row);
    db.discussions.put_row(&row).unwrap();
    row
}

pub(crate) fn browse(size: i64, cursor: Option<String>, now: DateTime<Utc>) -> FeedRequest {
    FeedRequest {
        filter: FilterSpec::default(),
        search: SearchFilter::None,
        cursor,
        size,
        now,
    }
}
