//! Discussion storage and the shared feed fetch.
//!
//! Every listing strategy (browse, text search, author search, own-feed,
//! scrap feed) runs through [`DiscussionDb::fetch_page`] with a
//! [`FeedPlan`]: one ordered scan of the feed index inside a single read
//! snapshot, with the filter, search and scope conditions evaluated per
//! row and the cursor lowered to an exclusive range start.

use crate::cursor::Cursor;
use crate::db::filter::{Predicate, SearchFilter};
use crate::db::scrap::scrapped_ids_in;
use crate::db::tables::{
    COUNTERS, DISCUSSIONS, DISCUSSIONS_BY_CREATED, DISCUSSION_SEQ, PARTICIPANTS, USERS,
};
use crate::db::user::decode_user;
use crate::error::AppError;
use crate::models::discussion::{CreateDiscussionRequest, Discussion, UpdateDiscussionRequest};
use crate::models::user::User;
use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::Bound;
use std::sync::Arc;

/// One fully resolved feed query. `limit` is the caller's page size plus
/// the look-ahead row.
#[derive(Debug, Clone)]
pub struct FeedPlan {
    /// Filter and scope conditions over the row itself.
    pub filter: Predicate,
    /// Orthogonal search dimension (may need the joined author).
    pub search: SearchFilter,
    /// Restrict to discussions scrapped by this user.
    pub scrapped_by: Option<u64>,
    /// Resume strictly after this boundary, or start at the newest row.
    pub cursor: Option<Cursor>,
    /// Maximum rows to return (`size + 1`).
    pub limit: usize,
}

pub(crate) fn decode_discussion(bytes: &[u8]) -> Result<Discussion, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

fn insert_row(write_txn: &redb::WriteTransaction, row: &Discussion) -> Result<(), AppError> {
    let encoded = bincode::serialize(row)?;
    let mut rows = write_txn.open_table(DISCUSSIONS)?;
    let mut index = write_txn.open_table(DISCUSSIONS_BY_CREATED)?;
    rows.insert(row.id, encoded.as_slice())?;
    index.insert(feed_index_key(row.created_at, row.id), ())?;
    Ok(())
}

/// Feed index key for a row: ascending key order is `created_at DESC, id
/// DESC`. Pre-epoch timestamps are clamped to keep the subtraction in
/// range.
fn feed_index_key(created_at: DateTime<Utc>, id: u64) -> (u64, u64) {
    let millis = created_at.timestamp_millis().max(0) as u64;
    (
        u64::MAX.saturating_sub(millis),
        u64::MAX.saturating_sub(id),
    )
}

/// Index key of a cursor boundary. Scanning from `Bound::Excluded` of
/// this key yields exactly the rows strictly after the boundary:
/// `created_at < c OR (created_at == c AND id < c_id)`.
fn cursor_index_key(cursor: &Cursor) -> (u64, u64) {
    let millis = cursor.created_at_millis.max(0) as u64;
    (
        u64::MAX.saturating_sub(millis),
        u64::MAX.saturating_sub(cursor.id),
    )
}

/// Accessor for discussion-related redb tables.
pub struct DiscussionDb {
    db: Arc<redb::Database>,
}

impl DiscussionDb {
    /// Initialize discussion tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(DISCUSSIONS)?;
        write_txn.open_table(DISCUSSIONS_BY_CREATED)?;
        write_txn.open_table(PARTICIPANTS)?;
        write_txn.open_table(COUNTERS)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Allocate the next monotonic discussion id.
    pub(crate) fn next_id(&self) -> Result<u64, AppError> {
        let write_txn = self.db.begin_write()?;
        let id = {
            let mut counters = write_txn.open_table(COUNTERS)?;
            let id = counters
                .get(DISCUSSION_SEQ)?
                .map(|guard| guard.value())
                .unwrap_or(0)
                + 1;
            counters.insert(DISCUSSION_SEQ, id)?;
            id
        };
        write_txn.commit()?;
        Ok(id)
    }

    /// Insert a row and its feed index entry atomically.
    pub(crate) fn put_row(&self, row: &Discussion) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        insert_row(&write_txn, row)?;
        write_txn.commit()?;
        Ok(())
    }

    /// Insert a new discussion authored by `author_id`.
    ///
    /// `created_at` is assigned here, once; it is the immutable half of
    /// the feed sort key.
    ///
    /// # Errors
    /// Returns an error when serialization or storage operations fail.
    pub fn create(
        &self,
        request: &CreateDiscussionRequest,
        author_id: u64,
    ) -> Result<Discussion, AppError> {
        let id = self.next_id()?;
        let now = Utc::now();
        let row = Discussion {
            id,
            title: request.title.clone(),
            content: request.content.clone(),
            place: request.place.clone(),
            category: request.category,
            start_at: request.start_at,
            end_at: request.end_at,
            // The author takes the first seat.
            participant_count: 1,
            max_participant_count: request.max_participant_count,
            author_id,
            created_at: now,
            modified_at: now,
            deleted_at: None,
        };

        let write_txn = self.db.begin_write()?;
        insert_row(&write_txn, &row)?;
        {
            // The author holds the first seat, so the membership record
            // exists from the start and a self-join is a duplicate.
            let mut participants = write_txn.open_table(PARTICIPANTS)?;
            participants.insert((row.id, author_id), now.timestamp_millis().max(0) as u64)?;
        }
        write_txn.commit()?;
        Ok(row)
    }

    /// Replace the editable fields of a discussion and bump `modified_at`.
    ///
    /// `created_at` never changes, so the feed index entry stays valid.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the row is missing or
    /// tombstoned, [`AppError::Validation`] when the new seat ceiling is
    /// below the current participant count, or a storage error.
    pub fn update(
        &self,
        id: u64,
        request: &UpdateDiscussionRequest,
    ) -> Result<Discussion, AppError> {
        let write_txn = self.db.begin_write()?;
        let row = {
            let mut rows = write_txn.open_table(DISCUSSIONS)?;
            let Some(guard) = rows.get(id)? else {
                return Err(AppError::NotFound("discussion"));
            };
            let mut row = decode_discussion(guard.value())?;
            drop(guard);
            if row.is_deleted() {
                return Err(AppError::NotFound("discussion"));
            }
            if request.max_participant_count < row.participant_count {
                return Err(AppError::Validation(format!(
                    "maxParticipantCount {} is below the current participant count {}",
                    request.max_participant_count, row.participant_count
                )));
            }
            row.title = request.title.clone();
            row.content = request.content.clone();
            row.place = request.place.clone();
            row.category = request.category;
            row.start_at = request.start_at;
            row.end_at = request.end_at;
            row.max_participant_count = request.max_participant_count;
            row.modified_at = Utc::now();
            let encoded = bincode::serialize(&row)?;
            rows.insert(id, encoded.as_slice())?;
            row
        };
        write_txn.commit()?;
        Ok(row)
    }

    /// Take a seat in a discussion for `user_id`.
    ///
    /// Joining is only possible before the discussion starts; `now` is
    /// the caller's request instant, the same one its response view uses.
    ///
    /// # Errors
    /// Returns [`AppError::NotFound`] when the row is missing or
    /// tombstoned, [`AppError::Validation`] when the discussion has
    /// already started, has no free seat, or the user already holds one,
    /// or a storage error.
    pub fn add_participant(
        &self,
        discussion_id: u64,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<Discussion, AppError> {
        let write_txn = self.db.begin_write()?;
        let row = {
            let mut rows = write_txn.open_table(DISCUSSIONS)?;
            let mut participants = write_txn.open_table(PARTICIPANTS)?;
            let Some(guard) = rows.get(discussion_id)? else {
                return Err(AppError::NotFound("discussion"));
            };
            let mut row = decode_discussion(guard.value())?;
            drop(guard);
            if row.is_deleted() {
                return Err(AppError::NotFound("discussion"));
            }
            if row.start_at <= now {
                return Err(AppError::Validation(
                    "discussion has already started".to_string(),
                ));
            }
            if participants.get((discussion_id, user_id))?.is_some() {
                return Err(AppError::Validation(
                    "user is already participating".to_string(),
                ));
            }
            if row.participant_count >= row.max_participant_count {
                return Err(AppError::Validation("discussion is full".to_string()));
            }
            participants.insert(
                (discussion_id, user_id),
                now.timestamp_millis().max(0) as u64,
            )?;
            row.participant_count += 1;
            let encoded = bincode::serialize(&row)?;
            rows.insert(discussion_id, encoded.as_slice())?;
            row
        };
        write_txn.commit()?;
        Ok(row)
    }

    /// Fetch a discussion by id. Tombstoned rows read as absent.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, id: u64) -> Result<Option<Discussion>, AppError> {
        let read_txn = self.db.begin_read()?;
        let rows = read_txn.open_table(DISCUSSIONS)?;
        match rows.get(id)? {
            Some(guard) => {
                let row = decode_discussion(guard.value())?;
                Ok((!row.is_deleted()).then_some(row))
            }
            None => Ok(None),
        }
    }

    /// Tombstone a discussion. The row and its index entry stay in place;
    /// listings exclude it by predicate.
    ///
    /// # Returns
    /// `true` when a live row was tombstoned, `false` when the row is
    /// missing or already deleted.
    ///
    /// # Errors
    /// Returns an error when storage access or serialization fails.
    pub fn soft_delete(&self, id: u64) -> Result<bool, AppError> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut rows = write_txn.open_table(DISCUSSIONS)?;
            let Some(guard) = rows.get(id)? else {
                return Ok(false);
            };
            let mut row = decode_discussion(guard.value())?;
            drop(guard);
            if row.is_deleted() {
                false
            } else {
                row.deleted_at = Some(Utc::now());
                let encoded = bincode::serialize(&row)?;
                rows.insert(id, encoded.as_slice())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(deleted)
    }

    /// Run one feed query: scan the feed index in canonical order from
    /// the cursor boundary and collect up to `plan.limit` matching rows,
    /// each paired with its eagerly joined author.
    ///
    /// The whole query runs inside one read snapshot; author lookups are
    /// memoized per query so repeated authors cost one fetch.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn fetch_page(&self, plan: &FeedPlan) -> Result<Vec<(Discussion, Option<User>)>, AppError> {
        if plan.limit == 0 {
            return Ok(Vec::new());
        }

        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(DISCUSSIONS_BY_CREATED)?;
        let rows_table = read_txn.open_table(DISCUSSIONS)?;
        let users_table = read_txn.open_table(USERS)?;

        let scrapped = match plan.scrapped_by {
            Some(user_id) => Some(scrapped_ids_in(&read_txn, user_id)?),
            None => None,
        };

        let range = match plan.cursor {
            Some(cursor) => index.range((
                Bound::Excluded(cursor_index_key(&cursor)),
                Bound::Unbounded,
            ))?,
            None => index.range::<(u64, u64)>(..)?,
        };

        let mut authors: HashMap<u64, Option<User>> = HashMap::new();
        let mut page = Vec::with_capacity(plan.limit);

        for item in range {
            let (key, _) = item?;
            let (_, reverse_id) = key.value();
            let id = u64::MAX - reverse_id;

            let Some(guard) = rows_table.get(id)? else {
                // Index entry without a canonical row; skip rather than fail
                // the whole page.
                tracing::warn!("feed index entry for missing discussion {id}");
                continue;
            };
            let row = decode_discussion(guard.value())?;
            if row.is_deleted() {
                continue;
            }
            if let Some(ref ids) = scrapped {
                if !ids.contains(&row.id) {
                    continue;
                }
            }
            if !plan.filter.matches(&row) {
                continue;
            }

            let author = match authors.entry(row.author_id) {
                Entry::Occupied(entry) => entry.into_mut(),
                Entry::Vacant(slot) => {
                    let user = match users_table.get(row.author_id)? {
                        Some(user_guard) => Some(decode_user(user_guard.value())?),
                        None => None,
                    };
                    slot.insert(user)
                }
            };
            if !plan.search.matches(&row, author.as_ref()) {
                continue;
            }

            page.push((row, author.clone()));
            if page.len() >= plan.limit {
                break;
            }
        }

        Ok(page)
    }
}
