//! Scrap (bookmark) storage operations backed by redb.

use crate::db::tables::SCRAPS;
use crate::error::AppError;
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};
use std::collections::HashSet;
use std::sync::Arc;

/// Accessor for the scrap ownership table.
pub struct ScrapDb {
    db: Arc<redb::Database>,
}

impl ScrapDb {
    /// Initialize the scrap table if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(SCRAPS)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Record that `user_id` scrapped `discussion_id`.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when the scrap already exists, or
    /// a storage error.
    pub fn add(&self, user_id: u64, discussion_id: u64) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut scraps = write_txn.open_table(SCRAPS)?;
            if scraps.get((user_id, discussion_id))?.is_some() {
                return Err(AppError::Validation(
                    "discussion is already scrapped".to_string(),
                ));
            }
            let millis = Utc::now().timestamp_millis().max(0) as u64;
            scraps.insert((user_id, discussion_id), millis)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Remove the scrap of `discussion_id` by `user_id`.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when no such scrap exists, or a
    /// storage error.
    pub fn remove(&self, user_id: u64, discussion_id: u64) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut scraps = write_txn.open_table(SCRAPS)?;
            if scraps.remove((user_id, discussion_id))?.is_none() {
                return Err(AppError::Validation(
                    "discussion is not scrapped".to_string(),
                ));
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Whether `user_id` has scrapped `discussion_id`.
    ///
    /// # Errors
    /// Returns an error when storage access fails.
    pub fn is_scrapped(&self, user_id: u64, discussion_id: u64) -> Result<bool, AppError> {
        let read_txn = self.db.begin_read()?;
        let scraps = read_txn.open_table(SCRAPS)?;
        Ok(scraps.get((user_id, discussion_id))?.is_some())
    }
}

/// Collect the discussion ids scrapped by one user, inside an existing
/// read snapshot. Used by the feed fetch so the scrap join and the index
/// scan see the same data.
pub(crate) fn scrapped_ids_in(
    read_txn: &redb::ReadTransaction,
    user_id: u64,
) -> Result<HashSet<u64>, AppError> {
    let scraps = read_txn.open_table(SCRAPS)?;
    let mut ids = HashSet::new();
    for item in scraps.range((user_id, 0)..=(user_id, u64::MAX))? {
        let (key, _) = item?;
        let (_, discussion_id) = key.value();
        ids.insert(discussion_id);
    }
    Ok(ids)
}
