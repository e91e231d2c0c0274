//! Core domain library for Rostrum (config, storage, feed pagination).

/// Configuration loading and defaults.
pub mod config;
/// Opaque pagination cursor codec.
pub mod cursor;
/// Database access layer and feed query strategies.
pub mod db;
/// Application error types (storage/domain/validation).
pub mod error;
/// Feed orchestration: page-size validation, plan building, page assembly.
pub mod feed;
/// Data models for API requests and persistence.
pub mod models;
/// Derived discussion lifecycle state.
pub mod status;

pub use config::Config;
pub use db::Database;
pub use error::AppError;

/// Default HTTP port when `PORT` is not set.
pub const DEFAULT_PORT: u16 = 38500;
