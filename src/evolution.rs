//! Status aging.
//!
//! Every accepted move ages each stone already in its region by one step.
//! This is what releases locks over the course of play without a strict
//! turn order.

use chrono::{DateTime, Utc};

use crate::stone::{Coord, Status, Stone};
use crate::store::{BoardStore, Region, StoreError};

/// One step along `Locked -> TimeLimited -> Unlocked`.
pub fn next_status(status: Status) -> Status {
    match status {
        Status::Locked => Status::TimeLimited,
        Status::TimeLimited | Status::Unlocked => Status::Unlocked,
    }
}

/// Ages a single stone. Writes nothing when the status would not change, so
/// an unlocked stone keeps its `last_status_change_time`.
///
/// Returns the new status if a transition happened.
pub fn evolve_status<S: BoardStore>(
    store: &mut S,
    stone: &Stone,
    now: DateTime<Utc>,
) -> Result<Option<Status>, StoreError> {
    let next = next_status(stone.status);
    if next == stone.status {
        return Ok(None);
    }
    store.update_status(stone.id, next, now)?;
    tracing::debug!(at = %stone.at, owner = %stone.owner, from = %stone.status, to = %next, "status evolved");
    Ok(Some(next))
}

/// Ages every stone of `region`, returning the coordinates that changed.
pub fn evolve_region<S: BoardStore>(
    store: &mut S,
    region: &Region,
    now: DateTime<Utc>,
) -> Result<Vec<(Coord, Status)>, StoreError> {
    let mut changed = Vec::new();
    for stone in region.stones() {
        if let Some(next) = evolve_status(store, stone, now)? {
            changed.push((stone.at, next));
        }
    }
    Ok(changed)
}
