//! User rows. Users only matter to this core as discussion authors and
//! scrap owners; identity resolution itself lives outside.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User row stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub nickname: String,
    pub avatar_uri: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for creating a user.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub nickname: String,
    pub avatar_uri: Option<String>,
}
