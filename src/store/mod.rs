//! Board persistence.
//!
//! The rules engine only ever talks to the board through the [`BoardStore`]
//! trait. Two implementations are provided:
//!
//! - [`MemoryStore`] - an in-process sparse map, used by tests and the demo
//! - [`SqliteStore`] - a `rusqlite` database, used by the server
//!
//! Read-only flood fills only need [`StoneLookup`], which [`Region`]
//! snapshots implement as well.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::stone::{Coord, PlayerId, Status, Stone, StoneId};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Failure reported by a store. Any of these aborts the enclosing move.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored stone has unreadable status {0:?}")]
    CorruptStatus(String),
    #[error("stored timestamp {0} is out of range")]
    CorruptTimestamp(i64),
    #[error("coordinate {0} is already occupied")]
    Occupied(Coord),
    #[error("board lock poisoned by a panicking move")]
    Poisoned,
}

/// Exact-coordinate stone lookup.
pub trait StoneLookup {
    /// Returns `Ok(None)` when the coordinate is empty.
    fn get_stone(&self, at: Coord) -> Result<Option<Stone>, StoreError>;
}

/// Read/write access to the sparse board.
pub trait BoardStore: StoneLookup {
    /// All stones within [`crate::constants::REGION_RADIUS`] of `center` in both axes.
    fn retrieve_region(&self, center: Coord) -> Result<Region, StoreError>;

    /// Inserts a `Locked` stone with both timestamps set to `now`.
    ///
    /// Fails with [`StoreError::Occupied`] if the coordinate already holds a stone.
    fn place_stone(
        &mut self,
        owner: &PlayerId,
        at: Coord,
        now: DateTime<Utc>,
    ) -> Result<StoneId, StoreError>;

    /// Deletes the stone at `at`. No-op if the coordinate is empty.
    fn remove_stone(&mut self, at: Coord) -> Result<(), StoreError>;

    /// Sets the status and refreshes `last_status_change_time` to `now`.
    fn update_status(
        &mut self,
        id: StoneId,
        status: Status,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    fn stones_with_status(&self, status: Status) -> Result<Vec<Stone>, StoreError>;

    /// Every stone on the board, in coordinate order.
    fn all_stones(&self) -> Result<Vec<Stone>, StoreError>;

    fn count_owned_by(&self, owner: &PlayerId) -> Result<usize, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError>;

    /// Runs `f` as a single unit: if it returns an error, nothing it wrote
    /// remains visible.
    fn atomically<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, StoreError>;
}

/// Snapshot of the stones in the 13x13 window around a coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    center: Coord,
    stones: BTreeMap<Coord, Stone>,
}

impl Region {
    /// Builds a region, discarding any stone outside the window.
    pub fn new(center: Coord, stones: impl IntoIterator<Item = Stone>) -> Self {
        let stones = stones
            .into_iter()
            .filter(|s| center.in_region(s.at))
            .map(|s| (s.at, s))
            .collect();
        Self { center, stones }
    }

    pub fn center(&self) -> Coord {
        self.center
    }

    pub fn get(&self, at: Coord) -> Option<&Stone> {
        self.stones.get(&at)
    }

    pub fn contains(&self, at: Coord) -> bool {
        self.stones.contains_key(&at)
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stones.len()
    }

    /// Stones in coordinate order.
    pub fn stones(&self) -> impl Iterator<Item = &Stone> {
        self.stones.values()
    }
}

/// Coordinates outside the window read as empty.
impl StoneLookup for Region {
    fn get_stone(&self, at: Coord) -> Result<Option<Stone>, StoreError> {
        Ok(self.stones.get(&at).cloned())
    }
}
