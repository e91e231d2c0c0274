//! Discussion lifecycle state, derived from time and seat counts.
//!
//! The state is never stored. It is a pure function of the discussion's
//! schedule, its seat counts and a caller-supplied `now`, so recomputing it
//! at two different instants may legitimately give two different answers.
//! Callers that need a consistent view (a whole feed page) must capture
//! `now` once and reuse it.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived lifecycle state of a discussion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    /// Has not started and still has open seats.
    Open,
    /// Has not started and every seat is taken.
    OpenFull,
    /// Currently running (`start_at <= now <= end_at`).
    Active,
    /// Already over.
    Closed,
}

impl LifecycleState {
    pub const ALL: [LifecycleState; 4] = [
        LifecycleState::Open,
        LifecycleState::OpenFull,
        LifecycleState::Active,
        LifecycleState::Closed,
    ];

    /// Derive the state at `now`.
    ///
    /// Boundary semantics: `start_at == now` counts as already started
    /// (never `Open`/`OpenFull`), and `end_at == now` counts as still
    /// running (never `Closed`).
    pub fn derive(
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
        participant_count: u32,
        max_participant_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        if start_at > now {
            return if participant_count < max_participant_count {
                Self::Open
            } else {
                Self::OpenFull
            };
        }
        if now <= end_at {
            Self::Active
        } else {
            Self::Closed
        }
    }

    /// Wire token for this state.
    pub fn token(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::OpenFull => "openFull",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }

    /// Parse a wire token.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] for unknown tokens.
    pub fn from_token(token: &str) -> Result<Self, AppError> {
        Self::ALL
            .into_iter()
            .find(|state| state.token() == token)
            .ok_or_else(|| AppError::Validation(format!("invalid status token: '{token}'")))
    }
}
