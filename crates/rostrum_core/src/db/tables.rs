//! redb table definitions shared by storage modules.

use redb::TableDefinition;

/// File name for the redb database within the configured DB directory.
pub const REDB_FILE_NAME: &str = "rostrum.redb";

/// Canonical discussion rows (`Discussion`, bincode-encoded), keyed by id.
pub const DISCUSSIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("discussions");
/// Canonical user rows (`User`, bincode-encoded), keyed by id.
pub const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Feed index in canonical order: key is `(reverse-created-millis,
/// reverse-id)`, so an ascending key scan yields `created_at DESC, id
/// DESC`. Tombstoned rows keep their index entry and are excluded by
/// predicate during the scan.
pub const DISCUSSIONS_BY_CREATED: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("discussions_by_created");

/// Scrap (bookmark) ownership: `(user_id, discussion_id)` -> scrap
/// creation millis. The user-id prefix makes "all scraps of one user" a
/// contiguous range.
pub const SCRAPS: TableDefinition<(u64, u64), u64> = TableDefinition::new("scraps");

/// Participation records: `(discussion_id, user_id)` -> join millis. The
/// author's seat is recorded at creation; `participant_count` on the row
/// is the authoritative seat count and this table backs the duplicate
/// join check.
pub const PARTICIPANTS: TableDefinition<(u64, u64), u64> = TableDefinition::new("participants");

/// Monotonic id counters, keyed by entity name.
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Counter key for discussion ids.
pub const DISCUSSION_SEQ: &str = "discussions";
/// Counter key for user ids.
pub const USER_SEQ: &str = "users";
