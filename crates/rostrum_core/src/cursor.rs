//! Opaque pagination cursor: the sort key of the last row already returned.
//!
//! The wire format is `"<created-at-millis>_<id>"`. A numeric timestamp
//! keeps the token free of the delimiter character, so decoding can be
//! strict about part count. The token is only meaningful under the
//! canonical feed ordering (`created_at DESC, id DESC`).

use crate::error::AppError;
use crate::models::discussion::Discussion;

const CURSOR_PART_DELIMITER: char = '_';

/// Boundary sort key of a feed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// `created_at` of the boundary row, in milliseconds since the epoch.
    pub created_at_millis: i64,
    /// Identity of the boundary row, the tie-break within one millisecond.
    pub id: u64,
}

impl Cursor {
    /// Cursor pointing at `row` as the last returned item.
    pub fn from_row(row: &Discussion) -> Self {
        Self {
            created_at_millis: row.created_at.timestamp_millis(),
            id: row.id,
        }
    }

    /// Encode as an opaque client token.
    pub fn encode(&self) -> String {
        format!(
            "{}{}{}",
            self.created_at_millis, CURSOR_PART_DELIMITER, self.id
        )
    }

    /// Decode a client token.
    ///
    /// # Errors
    /// Returns [`AppError::MalformedCursor`] when the token does not have
    /// exactly two parts, or either part is not numeric.
    pub fn decode(token: &str) -> Result<Self, AppError> {
        let mut parts = token.split(CURSOR_PART_DELIMITER);
        let (Some(raw_millis), Some(raw_id), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AppError::MalformedCursor(format!(
                "expected '<timestamp>{CURSOR_PART_DELIMITER}<id>', got '{token}'"
            )));
        };
        let created_at_millis = raw_millis
            .parse::<i64>()
            .map_err(|_| AppError::MalformedCursor(format!("bad timestamp part: '{raw_millis}'")))?;
        let id = raw_id
            .parse::<u64>()
            .map_err(|_| AppError::MalformedCursor(format!("bad id part: '{raw_id}'")))?;
        Ok(Self {
            created_at_millis,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Cursor;

    #[test]
    fn encode_decode_round_trip() {
        for (millis, id) in [(0i64, 0u64), (1_700_000_000_123, 42), (-5, 7)] {
            let cursor = Cursor {
                created_at_millis: millis,
                id,
            };
            assert_eq!(Cursor::decode(&cursor.encode()).unwrap(), cursor);
        }
    }

    #[test]
    fn decode_rejects_wrong_part_count() {
        for token in ["", "12345", "1_2_3", "_", "1_2_"] {
            assert!(Cursor::decode(token).is_err(), "token: {token}");
        }
    }

    #[test]
    fn decode_rejects_non_numeric_parts() {
        assert!(Cursor::decode("2024-01-01T00:00_9").is_err());
        assert!(Cursor::decode("1700000000123_abc").is_err());
        assert!(Cursor::decode("1700000000123_-1").is_err());
    }
}
