//! Data models for persistence and the API surface.

/// Discussion rows, categories and view objects.
pub mod discussion;
/// User rows (discussion authors).
pub mod user;
