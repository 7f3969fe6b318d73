//! In-process board store.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use super::{BoardStore, Region, StoneLookup, StoreError};
use crate::stone::{Coord, PlayerId, Status, Stone, StoneId};

/// Sparse board held in memory. Clones are independent snapshots.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    stones: BTreeMap<Coord, Stone>,
    by_id: HashMap<StoneId, Coord>,
    next_id: i64,
    /// Inverse of every write made inside the open transaction, oldest first.
    /// `None` outside [`BoardStore::atomically`].
    journal: Option<Vec<Undo>>,
}

/// One journal entry: how to reverse a single write.
#[derive(Debug, Clone)]
enum Undo {
    Inserted { at: Coord, next_id: i64 },
    Removed(Stone),
    StatusChanged {
        at: Coord,
        status: Status,
        changed: DateTime<Utc>,
    },
}

impl MemoryStore {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stones on the board.
    pub fn len(&self) -> usize {
        self.stones.len()
    }

    /// Inserts a stone with an explicit status and timestamps, bypassing the
    /// `Locked`-on-placement rule. Useful for restoring a saved board.
    pub fn insert_raw(
        &mut self,
        owner: &PlayerId,
        at: Coord,
        status: Status,
        placement_time: DateTime<Utc>,
        last_status_change_time: DateTime<Utc>,
    ) -> Result<StoneId, StoreError> {
        if self.stones.contains_key(&at) {
            return Err(StoreError::Occupied(at));
        }
        self.record(Undo::Inserted {
            at,
            next_id: self.next_id,
        });
        self.next_id += 1;
        let id = StoneId(self.next_id);
        self.stones.insert(
            at,
            Stone {
                id,
                at,
                owner: owner.clone(),
                placement_time,
                last_status_change_time,
                status,
            },
        );
        self.by_id.insert(id, at);
        Ok(id)
    }

    fn record(&mut self, undo: Undo) {
        if let Some(journal) = &mut self.journal {
            journal.push(undo);
        }
    }

    fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::Inserted { at, next_id } => {
                if let Some(stone) = self.stones.remove(&at) {
                    self.by_id.remove(&stone.id);
                }
                self.next_id = next_id;
            }
            Undo::Removed(stone) => {
                self.by_id.insert(stone.id, stone.at);
                self.stones.insert(stone.at, stone);
            }
            Undo::StatusChanged {
                at,
                status,
                changed,
            } => {
                if let Some(stone) = self.stones.get_mut(&at) {
                    stone.status = status;
                    stone.last_status_change_time = changed;
                }
            }
        }
    }
}

impl StoneLookup for MemoryStore {
    fn get_stone(&self, at: Coord) -> Result<Option<Stone>, StoreError> {
        Ok(self.stones.get(&at).cloned())
    }
}

impl BoardStore for MemoryStore {
    fn retrieve_region(&self, center: Coord) -> Result<Region, StoreError> {
        let (lo, hi) = center.region_bounds();
        // BTreeMap orders by x first, so the range bounds the column span and
        // the filter trims rows.
        let stones = self
            .stones
            .range(Coord::new(lo.x, i64::MIN)..=Coord::new(hi.x, i64::MAX))
            .filter(|(at, _)| at.y >= lo.y && at.y <= hi.y)
            .map(|(_, s)| s.clone());
        Ok(Region::new(center, stones))
    }

    fn place_stone(
        &mut self,
        owner: &PlayerId,
        at: Coord,
        now: DateTime<Utc>,
    ) -> Result<StoneId, StoreError> {
        self.insert_raw(owner, at, Status::Locked, now, now)
    }

    fn remove_stone(&mut self, at: Coord) -> Result<(), StoreError> {
        if let Some(stone) = self.stones.remove(&at) {
            self.by_id.remove(&stone.id);
            self.record(Undo::Removed(stone));
        }
        Ok(())
    }

    fn update_status(
        &mut self,
        id: StoneId,
        status: Status,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let Some(stone) = self
            .by_id
            .get(&id)
            .and_then(|at| self.stones.get_mut(at))
        else {
            return Ok(());
        };
        let undo = Undo::StatusChanged {
            at: stone.at,
            status: stone.status,
            changed: stone.last_status_change_time,
        };
        stone.status = status;
        stone.last_status_change_time = now;
        self.record(undo);
        Ok(())
    }

    fn stones_with_status(&self, status: Status) -> Result<Vec<Stone>, StoreError> {
        Ok(self
            .stones
            .values()
            .filter(|s| s.status == status)
            .cloned()
            .collect())
    }

    fn all_stones(&self) -> Result<Vec<Stone>, StoreError> {
        Ok(self.stones.values().cloned().collect())
    }

    fn count_owned_by(&self, owner: &PlayerId) -> Result<usize, StoreError> {
        Ok(self.stones.values().filter(|s| &s.owner == owner).count())
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.stones.is_empty())
    }

    fn atomically<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, StoreError>,
    {
        let outer = self.journal.replace(Vec::new());
        let result = f(self);
        let journal = self.journal.take().unwrap_or_default();
        self.journal = outer;
        match &result {
            Err(_) => {
                for undo in journal.into_iter().rev() {
                    self.revert(undo);
                }
            }
            // A nested commit stays undoable by the enclosing transaction.
            Ok(_) => {
                if let Some(outer) = &mut self.journal {
                    outer.extend(journal);
                }
            }
        }
        result
    }
}
