//! User storage operations backed by redb.

use crate::db::tables::{COUNTERS, USERS, USER_SEQ};
use crate::error::AppError;
use crate::models::user::{CreateUserRequest, User};
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};
use std::sync::Arc;

pub(crate) fn decode_user(bytes: &[u8]) -> Result<User, AppError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Accessor for user-related redb tables.
pub struct UserDb {
    db: Arc<redb::Database>,
}

impl UserDb {
    /// Initialize user tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error when redb transaction/table initialization fails.
    pub fn new(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(USERS)?;
        write_txn.open_table(COUNTERS)?;
        write_txn.commit()?;
        Ok(Self { db })
    }

    /// Insert a new user with a freshly allocated monotonic id.
    ///
    /// # Errors
    /// Returns an error when serialization or storage operations fail.
    pub fn create(&self, request: &CreateUserRequest) -> Result<User, AppError> {
        let write_txn = self.db.begin_write()?;
        let user = {
            let mut counters = write_txn.open_table(COUNTERS)?;
            let id = counters
                .get(USER_SEQ)?
                .map(|guard| guard.value())
                .unwrap_or(0)
                + 1;
            counters.insert(USER_SEQ, id)?;

            let user = User {
                id,
                nickname: request.nickname.clone(),
                avatar_uri: request.avatar_uri.clone(),
                created_at: Utc::now(),
            };
            let encoded = bincode::serialize(&user)?;
            let mut users = write_txn.open_table(USERS)?;
            users.insert(id, encoded.as_slice())?;
            user
        };
        write_txn.commit()?;
        Ok(user)
    }

    /// Fetch a user by id.
    ///
    /// # Errors
    /// Returns an error when storage access or deserialization fails.
    pub fn get(&self, id: u64) -> Result<Option<User>, AppError> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(guard) => Ok(Some(decode_user(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Whether a user with this id exists.
    ///
    /// # Errors
    /// Returns an error when storage access fails.
    pub fn exists(&self, id: u64) -> Result<bool, AppError> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        Ok(users.get(id)?.is_some())
    }
}
