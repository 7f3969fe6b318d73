//! Lock timeout sweep.
//!
//! A time-limited stone reserves its region to its owner. If nobody plays
//! nearby to age it, the sweep unlocks it once `lock_timeout` has passed, so
//! an abandoned claim can never block a region forever. Sweeping is lazy:
//! the engine runs it before any read that could observe a status.

use chrono::{DateTime, TimeDelta, Utc};

use crate::stone::{Coord, Status, Stone};
use crate::store::{BoardStore, StoreError};

/// Whether a time-limited stone has held its status for at least `timeout`.
pub fn is_expired(stone: &Stone, now: DateTime<Utc>, timeout: TimeDelta) -> bool {
    stone.status == Status::TimeLimited && now - stone.last_status_change_time >= timeout
}

/// Unlocks every expired time-limited stone. Returns the coordinates unlocked.
pub fn sweep<S: BoardStore>(
    store: &mut S,
    now: DateTime<Utc>,
    timeout: TimeDelta,
) -> Result<Vec<Coord>, StoreError> {
    let mut unlocked = Vec::new();
    for stone in store.stones_with_status(Status::TimeLimited)? {
        if is_expired(&stone, now, timeout) {
            store.update_status(stone.id, Status::Unlocked, now)?;
            tracing::trace!(at = %stone.at, owner = %stone.owner, "time-limited stone expired");
            unlocked.push(stone.at);
        }
    }
    Ok(unlocked)
}
