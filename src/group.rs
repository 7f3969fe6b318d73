//! Group and liberty search.
//!
//! A group is a maximal set of same-owner stones connected orthogonally.
//! The board is unbounded, so every search is driven by a [`StoneLookup`]
//! rather than an array scan, and stops as soon as it sees one liberty.

use std::collections::{BTreeSet, VecDeque};

use crate::stone::Coord;
use crate::store::{StoneLookup, StoreError};

/// Result of [`compute_group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupScan {
    /// Stones visited. Complete only when `has_liberty` is false.
    pub stones: BTreeSet<Coord>,
    pub has_liberty: bool,
}

impl GroupScan {
    pub fn is_captured(&self) -> bool {
        !self.has_liberty
    }
}

/// Breadth-first flood fill from `seed` over same-owner stones.
///
/// Returns `Ok(None)` if `seed` is empty. Short-circuits with a partial
/// group as soon as any stone in the group touches an empty coordinate.
pub fn compute_group<L>(lookup: &L, seed: Coord) -> Result<Option<GroupScan>, StoreError>
where
    L: StoneLookup + ?Sized,
{
    let Some(origin) = lookup.get_stone(seed)? else {
        return Ok(None);
    };
    let owner = origin.owner;

    let mut group = BTreeSet::from([seed]);
    // Every coordinate ever queued, so foreign stones are looked up once.
    let mut seen = BTreeSet::from([seed]);
    let mut frontier: VecDeque<Coord> = VecDeque::new();
    enqueue_neighbors(seed, &mut seen, &mut frontier);

    while let Some(pt) = frontier.pop_front() {
        match lookup.get_stone(pt)? {
            None => {
                return Ok(Some(GroupScan {
                    stones: group,
                    has_liberty: true,
                }));
            }
            Some(stone) if stone.owner == owner => {
                group.insert(pt);
                enqueue_neighbors(pt, &mut seen, &mut frontier);
            }
            Some(_) => {}
        }
    }

    Ok(Some(GroupScan {
        stones: group,
        has_liberty: false,
    }))
}

#[inline]
fn enqueue_neighbors(pt: Coord, seen: &mut BTreeSet<Coord>, frontier: &mut VecDeque<Coord>) {
    for n in pt.neighbors() {
        if seen.insert(n) {
            frontier.push_back(n);
        }
    }
}
