//! Database layer: redb-backed storage and the feed query strategies.

/// Per-entity discussion storage and the shared feed fetch.
pub mod discussion;
/// Filter predicates and search modes.
pub mod filter;
/// Scrap (bookmark) storage.
pub mod scrap;
/// redb table definitions.
pub mod tables;
/// User storage.
pub mod user;

#[cfg(test)]
mod tests;

use crate::error::AppError;
use std::path::Path;
use std::sync::Arc;

/// Database handle with access to per-entity accessors over one shared
/// redb database.
pub struct Database {
    pub db: Arc<redb::Database>,
    pub discussions: discussion::DiscussionDb,
    pub users: user::UserDb,
    pub scraps: scrap::ScrapDb,
}

impl Database {
    /// Open (or create) the database under `db_path`.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created or redb
    /// fails to open the file.
    pub fn new(db_path: &str) -> Result<Self, AppError> {
        let dir = Path::new(db_path);
        std::fs::create_dir_all(dir).map_err(|err| {
            AppError::Validation(format!("cannot create db directory '{db_path}': {err}"))
        })?;
        let file = dir.join(tables::REDB_FILE_NAME);
        tracing::debug!("Opening database at {}", file.display());
        let db = Arc::new(redb::Database::create(file)?);
        Self::from_shared(db)
    }

    /// Build a handle over an already opened redb database.
    ///
    /// # Errors
    /// Returns an error when table initialization fails.
    pub fn from_shared(db: Arc<redb::Database>) -> Result<Self, AppError> {
        let discussions = discussion::DiscussionDb::new(db.clone())?;
        let users = user::UserDb::new(db.clone())?;
        let scraps = scrap::ScrapDb::new(db.clone())?;
        Ok(Self {
            db,
            discussions,
            users,
            scraps,
        })
    }
}
