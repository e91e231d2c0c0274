//! Participation write path and discussion updates.

use super::{seed_discussion_with, seed_user, setup_test_db};
use crate::error::AppError;
use crate::models::discussion::{Category, CreateDiscussionRequest, UpdateDiscussionRequest};
use crate::status::LifecycleState;
use chrono::{DateTime, Duration, Utc};

fn create_request(max_participant_count: u32, start_at: DateTime<Utc>) -> CreateDiscussionRequest {
    CreateDiscussionRequest {
        title: "Pairing session".to_string(),
        content: "bring a laptop".to_string(),
        place: "online".to_string(),
        category: Category::Common,
        start_at,
        end_at: start_at + Duration::hours(2),
        max_participant_count,
    }
}

fn update_request(max_participant_count: u32, start_at: DateTime<Utc>) -> UpdateDiscussionRequest {
    UpdateDiscussionRequest {
        title: "Pairing session, round two".to_string(),
        content: "bring two laptops".to_string(),
        place: "office".to_string(),
        category: Category::Backend,
        start_at,
        end_at: start_at + Duration::hours(3),
        max_participant_count,
    }
}

#[test]
fn joining_fills_seats_and_reaches_open_full() {
    let (db, _dir) = setup_test_db();
    let author = seed_user(&db, "host");
    let guest = seed_user(&db, "guest");
    let straggler = seed_user(&db, "straggler");
    let now = Utc::now();
    let start = now + Duration::days(1);

    let row = db
        .discussions
        .create(&create_request(2, start), author.id)
        .unwrap();
    assert_eq!(row.participant_count, 1);
    assert_eq!(row.status_at(now), LifecycleState::Open);

    let row = db.discussions.add_participant(row.id, guest.id, now).unwrap();
    assert_eq!(row.participant_count, 2);
    // The last seat flips the derived state.
    assert_eq!(row.status_at(now), LifecycleState::OpenFull);

    let err = db
        .discussions
        .add_participant(row.id, straggler.id, now)
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn author_and_repeat_joins_are_duplicates() {
    let (db, _dir) = setup_test_db();
    let author = seed_user(&db, "host");
    let guest = seed_user(&db, "guest");
    let now = Utc::now();

    let row = db
        .discussions
        .create(&create_request(5, now + Duration::days(1)), author.id)
        .unwrap();

    // The author already holds the first seat.
    let err = db
        .discussions
        .add_participant(row.id, author.id, now)
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    db.discussions.add_participant(row.id, guest.id, now).unwrap();
    let err = db
        .discussions
        .add_participant(row.id, guest.id, now)
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Still only the two of them.
    let row = db.discussions.get(row.id).unwrap().unwrap();
    assert_eq!(row.participant_count, 2);
}

#[test]
fn joining_after_start_is_rejected() {
    let (db, _dir) = setup_test_db();
    let author = seed_user(&db, "host");
    let guest = seed_user(&db, "guest");
    let now = Utc::now();

    let row = seed_discussion_with(&db, author.id, now - Duration::hours(2), |row| {
        row.start_at = now - Duration::hours(1);
        row.end_at = now + Duration::hours(1);
        row.max_participant_count = 10;
    });

    let err = db
        .discussions
        .add_participant(row.id, guest.id, now)
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn joining_missing_or_tombstoned_discussions_is_not_found() {
    let (db, _dir) = setup_test_db();
    let author = seed_user(&db, "host");
    let guest = seed_user(&db, "guest");
    let now = Utc::now();

    let err = db.discussions.add_participant(404, guest.id, now).unwrap_err();
    assert!(matches!(err, AppError::NotFound("discussion")));

    let row = db
        .discussions
        .create(&create_request(5, now + Duration::days(1)), author.id)
        .unwrap();
    assert!(db.discussions.soft_delete(row.id).unwrap());
    let err = db
        .discussions
        .add_participant(row.id, guest.id, now)
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("discussion")));
}

#[test]
fn update_replaces_fields_and_bumps_modified_at() {
    let (db, _dir) = setup_test_db();
    let author = seed_user(&db, "editor");
    let now = Utc::now();
    let start = now + Duration::days(1);

    let row = db
        .discussions
        .create(&create_request(5, start), author.id)
        .unwrap();

    let new_start = now + Duration::days(2);
    let updated = db
        .discussions
        .update(row.id, &update_request(8, new_start))
        .unwrap();
    assert_eq!(updated.title, "Pairing session, round two");
    assert_eq!(updated.category, Category::Backend);
    assert_eq!(updated.max_participant_count, 8);
    assert_eq!(updated.start_at, new_start);
    // The feed sort key is immutable, only modified_at moves.
    assert_eq!(updated.created_at, row.created_at);
    assert!(updated.modified_at > row.modified_at);

    let reread = db.discussions.get(row.id).unwrap().unwrap();
    assert_eq!(reread.title, updated.title);
}

#[test]
fn update_cannot_shrink_below_the_current_participant_count() {
    let (db, _dir) = setup_test_db();
    let author = seed_user(&db, "host");
    let guest = seed_user(&db, "guest");
    let now = Utc::now();
    let start = now + Duration::days(1);

    let row = db
        .discussions
        .create(&create_request(3, start), author.id)
        .unwrap();
    db.discussions.add_participant(row.id, guest.id, now).unwrap();

    let err = db
        .discussions
        .update(row.id, &update_request(1, start))
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Shrinking down to exactly the current count is fine.
    let updated = db.discussions.update(row.id, &update_request(2, start)).unwrap();
    assert_eq!(updated.max_participant_count, 2);
    assert_eq!(updated.status_at(now), LifecycleState::OpenFull);
}

#[test]
fn updating_missing_or_tombstoned_discussions_is_not_found() {
    let (db, _dir) = setup_test_db();
    let author = seed_user(&db, "editor");
    let now = Utc::now();
    let start = now + Duration::days(1);

    let err = db.discussions.update(404, &update_request(5, start)).unwrap_err();
    assert!(matches!(err, AppError::NotFound("discussion")));

    let row = db
        .discussions
        .create(&create_request(5, start), author.id)
        .unwrap();
    assert!(db.discussions.soft_delete(row.id).unwrap());
    let err = db
        .discussions
        .update(row.id, &update_request(5, start))
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound("discussion")));
}
