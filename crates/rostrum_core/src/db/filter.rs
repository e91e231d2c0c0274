//! Composable feed filter predicates.
//!
//! The filter dimensions (categories, lifecycle states) arrive as
//! possibly-empty selection sets and must compose with an orthogonal
//! search mode. They are assembled here into a small expression tree that
//! the storage layer evaluates per row while scanning the feed index
//! (the "query language" of an embedded KV store). State conditions are the
//! algebraic inversion of [`LifecycleState::derive`], built against one
//! caller-supplied `now`; the two must stay equivalent (see the tests at
//! the bottom).

use crate::models::discussion::{Category, Discussion};
use crate::models::user::User;
use crate::status::LifecycleState;
use chrono::{DateTime, Utc};

/// Row field a time comparison applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    StartAt,
    EndAt,
}

/// Comparison direction for a time field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeCmp {
    Before,
    AtOrBefore,
    After,
    AtOrAfter,
}

/// Boolean expression over a discussion row.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// No restriction.
    True,
    /// Compare a time field against a fixed instant.
    Time(TimeField, TimeCmp, DateTime<Utc>),
    /// `participant_count < max_participant_count`.
    SeatsAvailable,
    /// `participant_count >= max_participant_count`.
    SeatsFull,
    /// Category is one of the selected set (non-empty).
    CategoryIn(Vec<Category>),
    /// Row is authored by the given user.
    AuthorIs(u64),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Evaluate against a row.
    pub fn matches(&self, row: &Discussion) -> bool {
        match self {
            Predicate::True => true,
            Predicate::Time(field, cmp, at) => {
                let value = match field {
                    TimeField::StartAt => row.start_at,
                    TimeField::EndAt => row.end_at,
                };
                match cmp {
                    TimeCmp::Before => value < *at,
                    TimeCmp::AtOrBefore => value <= *at,
                    TimeCmp::After => value > *at,
                    TimeCmp::AtOrAfter => value >= *at,
                }
            }
            Predicate::SeatsAvailable => row.participant_count < row.max_participant_count,
            Predicate::SeatsFull => row.participant_count >= row.max_participant_count,
            Predicate::CategoryIn(categories) => categories.contains(&row.category),
            Predicate::AuthorIs(author_id) => row.author_id == *author_id,
            Predicate::And(clauses) => clauses.iter().all(|clause| clause.matches(row)),
            Predicate::Or(clauses) => clauses.iter().any(|clause| clause.matches(row)),
        }
    }

    /// Narrow this predicate with another one.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::True, other) => other,
            (this, Predicate::True) => this,
            (Predicate::And(mut clauses), other) => {
                clauses.push(other);
                Predicate::And(clauses)
            }
            (this, other) => Predicate::And(vec![this, other]),
        }
    }
}

/// Per-request filter selections. Empty sets mean "no restriction".
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub categories: Vec<Category>,
    pub states: Vec<LifecycleState>,
}

impl FilterSpec {
    /// Build the row predicate for this spec, evaluated at `now`.
    ///
    /// `now` must be captured once per request; every state branch in the
    /// resulting expression compares against the same instant.
    pub fn predicate(&self, now: DateTime<Utc>) -> Predicate {
        let mut clauses = Vec::new();
        if !self.categories.is_empty() {
            clauses.push(Predicate::CategoryIn(self.categories.clone()));
        }
        if !self.states.is_empty() {
            let branches = self
                .states
                .iter()
                .map(|state| state_condition(*state, now))
                .collect();
            clauses.push(Predicate::Or(branches));
        }
        match clauses.len() {
            0 => Predicate::True,
            1 => clauses.pop().unwrap_or(Predicate::True),
            _ => Predicate::And(clauses),
        }
    }
}

/// Set-level condition equivalent to `derive(..) == state` at `now`.
fn state_condition(state: LifecycleState, now: DateTime<Utc>) -> Predicate {
    match state {
        LifecycleState::Open => Predicate::And(vec![
            Predicate::Time(TimeField::StartAt, TimeCmp::After, now),
            Predicate::SeatsAvailable,
        ]),
        LifecycleState::OpenFull => Predicate::And(vec![
            Predicate::Time(TimeField::StartAt, TimeCmp::After, now),
            Predicate::SeatsFull,
        ]),
        LifecycleState::Active => Predicate::And(vec![
            Predicate::Time(TimeField::StartAt, TimeCmp::AtOrBefore, now),
            Predicate::Time(TimeField::EndAt, TimeCmp::AtOrAfter, now),
        ]),
        LifecycleState::Closed => Predicate::Time(TimeField::EndAt, TimeCmp::Before, now),
    }
}

/// Free-text search dimension, orthogonal to [`FilterSpec`].
///
/// Queries are normalized at construction: surrounding whitespace is
/// trimmed and a blank query collapses to `None` (no restriction, not
/// "match nothing"). The stored needle is lowercased once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchFilter {
    #[default]
    None,
    /// Case-insensitive substring over title or content.
    TitleOrContent(String),
    /// Case-insensitive substring over the author's nickname.
    AuthorNickname(String),
}

impl SearchFilter {
    pub fn title_or_content(query: &str) -> Self {
        match normalize_query(query) {
            Some(needle) => Self::TitleOrContent(needle),
            None => Self::None,
        }
    }

    pub fn author_nickname(query: &str) -> Self {
        match normalize_query(query) {
            Some(needle) => Self::AuthorNickname(needle),
            None => Self::None,
        }
    }

    /// Evaluate against a row and its (already joined) author.
    pub fn matches(&self, row: &Discussion, author: Option<&User>) -> bool {
        match self {
            Self::None => true,
            Self::TitleOrContent(needle) => {
                contains_case_insensitive(&row.title, needle)
                    || contains_case_insensitive(&row.content, needle)
            }
            Self::AuthorNickname(needle) => author
                .map(|user| contains_case_insensitive(&user.nickname, needle))
                .unwrap_or(false),
        }
    }
}

fn normalize_query(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Substring match against a pre-lowercased needle, with an ASCII fast
/// path that avoids allocating for the haystack.
fn contains_case_insensitive(haystack: &str, needle_lower: &str) -> bool {
    if needle_lower.is_empty() {
        return true;
    }
    if needle_lower.is_ascii() {
        let needle = needle_lower.as_bytes();
        let hay = haystack.as_bytes();
        if needle.len() > hay.len() {
            return false;
        }
        for idx in 0..=hay.len() - needle.len() {
            if hay[idx..idx + needle.len()]
                .iter()
                .map(u8::to_ascii_lowercase)
                .eq(needle.iter().copied())
            {
                return true;
            }
        }
        return false;
    }
    haystack.to_lowercase().contains(needle_lower)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(
        category: Category,
        start_offset_hours: i64,
        end_offset_hours: i64,
        participants: u32,
        max: u32,
        now: DateTime<Utc>,
    ) -> Discussion {
        Discussion {
            id: 1,
            title: "Ownership in practice".to_string(),
            content: "Borrow checker war stories".to_string(),
            place: "online".to_string(),
            category,
            start_at: now + Duration::hours(start_offset_hours),
            end_at: now + Duration::hours(end_offset_hours),
            participant_count: participants,
            max_participant_count: max,
            author_id: 7,
            created_at: now,
            modified_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn empty_spec_matches_everything() {
        let now = Utc::now();
        let predicate = FilterSpec::default().predicate(now);
        assert_eq!(predicate, Predicate::True);
        assert!(predicate.matches(&row(Category::Backend, -2, -1, 0, 5, now)));
    }

    #[test]
    fn category_selection_is_an_or_over_the_set() {
        let now = Utc::now();
        let spec = FilterSpec {
            categories: vec![Category::Backend, Category::Frontend],
            states: Vec::new(),
        };
        let predicate = spec.predicate(now);
        assert!(predicate.matches(&row(Category::Backend, 1, 2, 0, 5, now)));
        assert!(predicate.matches(&row(Category::Frontend, -2, -1, 0, 5, now)));
        assert!(!predicate.matches(&row(Category::Android, 1, 2, 0, 5, now)));
    }

    #[test]
    fn state_conditions_stay_equivalent_to_derivation() {
        // The predicate builder and the derivation function must agree on
        // every fixture, including the start/end boundary instants.
        let now = Utc::now();
        let offsets = [-3i64, -1, 0, 1, 3];
        let counts = [(0u32, 5u32), (4, 5), (5, 5), (6, 5)];

        for state in LifecycleState::ALL {
            let condition = state_condition(state, now);
            for start in offsets {
                for end in offsets {
                    if start > end {
                        // The write path guarantees start_at <= end_at;
                        // equivalence only holds for valid rows.
                        continue;
                    }
                    for (participants, max) in counts {
                        let fixture = row(Category::Common, start, end, participants, max, now);
                        let derived = fixture.status_at(now);
                        assert_eq!(
                            condition.matches(&fixture),
                            derived == state,
                            "state {state:?}, start {start}h, end {end}h, seats {participants}/{max}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn multiple_states_or_together_and_compose_with_categories() {
        let now = Utc::now();
        let spec = FilterSpec {
            categories: vec![Category::Backend],
            states: vec![LifecycleState::Open, LifecycleState::Closed],
        };
        let predicate = spec.predicate(now);

        // Open + backend: in.
        assert!(predicate.matches(&row(Category::Backend, 1, 2, 0, 5, now)));
        // Closed + backend: in.
        assert!(predicate.matches(&row(Category::Backend, -2, -1, 0, 5, now)));
        // Active + backend: filtered by state.
        assert!(!predicate.matches(&row(Category::Backend, -1, 1, 0, 5, now)));
        // Open + android: filtered by category.
        assert!(!predicate.matches(&row(Category::Android, 1, 2, 0, 5, now)));
    }

    #[test]
    fn blank_search_queries_collapse_to_no_restriction() {
        assert_eq!(SearchFilter::title_or_content(""), SearchFilter::None);
        assert_eq!(SearchFilter::title_or_content("   "), SearchFilter::None);
        assert_eq!(SearchFilter::author_nickname("\t"), SearchFilter::None);
    }

    #[test]
    fn text_search_is_case_insensitive_over_title_and_content() {
        let now = Utc::now();
        let fixture = row(Category::Backend, 1, 2, 0, 5, now);
        assert!(SearchFilter::title_or_content("OWNERSHIP").matches(&fixture, None));
        assert!(SearchFilter::title_or_content("war stories").matches(&fixture, None));
        assert!(!SearchFilter::title_or_content("lifetimes").matches(&fixture, None));
    }

    #[test]
    fn author_search_requires_a_joined_author() {
        let now = Utc::now();
        let fixture = row(Category::Backend, 1, 2, 0, 5, now);
        let author = User {
            id: 7,
            nickname: "Ferris".to_string(),
            avatar_uri: None,
            created_at: now,
        };
        let filter = SearchFilter::author_nickname("fer");
        assert!(filter.matches(&fixture, Some(&author)));
        assert!(!filter.matches(&fixture, None));
    }
}
