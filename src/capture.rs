//! Capture and suicide resolution.
//!
//! Runs once right after a stone is placed:
//!
//! 1. Every foreign group orthogonally adjacent to the new stone that has no
//!    liberty left is removed.
//! 2. Only if nothing was removed in step 1, the new stone's own group is
//!    checked and removed if it has no liberty (suicide).
//!
//! Because step 2 is skipped whenever step 1 captured something, a move can
//! never be both a capture and a suicide.

use crate::group::compute_group;
use crate::stone::Coord;
use crate::store::{BoardStore, StoreError};

/// Stones removed by [`perform_captures`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureReport {
    /// Foreign stones removed.
    pub captured: Vec<Coord>,
    /// The mover's own stones removed, including the placed one.
    pub suicided: Vec<Coord>,
}

impl CaptureReport {
    pub fn is_suicide(&self) -> bool {
        !self.suicided.is_empty()
    }
}

/// Resolves captures around the stone just placed at `at`.
///
/// Does nothing if `at` is empty.
pub fn perform_captures<S: BoardStore>(
    store: &mut S,
    at: Coord,
) -> Result<CaptureReport, StoreError> {
    let mut report = CaptureReport::default();
    let Some(placed) = store.get_stone(at)? else {
        return Ok(report);
    };

    // Phase 1: foreign groups that just lost their last liberty.
    let mut remaining: Vec<Coord> = at.neighbors().to_vec();
    while let Some(pt) = remaining.pop() {
        let Some(stone) = store.get_stone(pt)? else {
            continue;
        };
        if stone.owner == placed.owner {
            continue;
        }
        let Some(scan) = compute_group(&*store, pt)? else {
            continue;
        };
        if scan.is_captured() {
            for &removed in &scan.stones {
                store.remove_stone(removed)?;
                remaining.retain(|&r| r != removed);
            }
            tracing::info!(
                owner = %stone.owner,
                stones = scan.stones.len(),
                by = %placed.owner,
                at = %at,
                "group captured"
            );
            report.captured.extend(scan.stones);
        }
    }

    // Phase 2: suicide, only when nothing was captured.
    if report.captured.is_empty()
        && let Some(scan) = compute_group(&*store, at)?
        && scan.is_captured()
    {
        for &removed in &scan.stones {
            store.remove_stone(removed)?;
        }
        tracing::info!(
            owner = %placed.owner,
            stones = scan.stones.len(),
            at = %at,
            "suicide"
        );
        report.suicided.extend(scan.stones);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stone::PlayerId;
    use crate::store::{MemoryStore, StoneLookup};
    use chrono::{DateTime, Utc};

    fn place(store: &mut MemoryStore, owner: &str, x: i64, y: i64) {
        store
            .place_stone(&PlayerId::from(owner), Coord::new(x, y), DateTime::<Utc>::UNIX_EPOCH)
            .unwrap();
    }

    fn occupied(store: &MemoryStore, x: i64, y: i64) -> bool {
        store.get_stone(Coord::new(x, y)).unwrap().is_some()
    }

    #[test]
    fn test_single_stone_capture() {
        let mut store = MemoryStore::new();
        place(&mut store, "b", 5, 5);
        place(&mut store, "a", 4, 5);
        place(&mut store, "a", 6, 5);
        place(&mut store, "a", 5, 4);
        place(&mut store, "a", 5, 6);

        let report = perform_captures(&mut store, Coord::new(5, 6)).unwrap();
        assert_eq!(report.captured, vec![Coord::new(5, 5)]);
        assert!(!report.is_suicide());
        assert!(!occupied(&store, 5, 5));
        for (x, y) in [(4, 5), (6, 5), (5, 4), (5, 6)] {
            assert!(occupied(&store, x, y), "({x}, {y}) should remain");
        }
    }

    #[test]
    fn test_suicide_in_pocket() {
        let mut store = MemoryStore::new();
        for (x, y) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            place(&mut store, "b", x, y);
        }
        place(&mut store, "a", 0, 0);

        let report = perform_captures(&mut store, Coord::new(0, 0)).unwrap();
        assert!(report.captured.is_empty());
        assert_eq!(report.suicided, vec![Coord::new(0, 0)]);
        assert!(!occupied(&store, 0, 0));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_capture_beats_suicide() {
        // a plays into (0,0) which has no empty neighbor, but capturing b at
        // (1,0) gives it a liberty back.
        let mut store = MemoryStore::new();
        place(&mut store, "b", -1, 0);
        place(&mut store, "b", 0, -1);
        place(&mut store, "b", 0, 1);
        place(&mut store, "b", 1, 0);
        place(&mut store, "a", 2, 0);
        place(&mut store, "a", 1, -1);
        place(&mut store, "a", 1, 1);
        place(&mut store, "a", 0, 0);

        let report = perform_captures(&mut store, Coord::new(0, 0)).unwrap();
        assert_eq!(report.captured, vec![Coord::new(1, 0)]);
        assert!(!report.is_suicide());
        assert!(occupied(&store, 0, 0));
    }

    #[test]
    fn test_own_neighbour_not_examined_in_capture_phase() {
        // a's existing stone at (1,0) is enclosed once a fills (0,0); the
        // combined group has no liberty. Capturing b at (-1,0) must win and
        // leave both a stones on the board.
        let mut store = MemoryStore::new();
        place(&mut store, "a", 1, 0);
        place(&mut store, "c", 2, 0);
        place(&mut store, "c", 1, -1);
        place(&mut store, "c", 1, 1);
        place(&mut store, "c", 0, -1);
        place(&mut store, "c", 0, 1);
        place(&mut store, "b", -1, 0);
        place(&mut store, "a", -2, 0);
        place(&mut store, "a", -1, -1);
        place(&mut store, "a", -1, 1);
        place(&mut store, "a", 0, 0);

        let report = perform_captures(&mut store, Coord::new(0, 0)).unwrap();
        assert_eq!(report.captured, vec![Coord::new(-1, 0)]);
        assert!(!report.is_suicide());
        assert!(occupied(&store, 0, 0));
        assert!(occupied(&store, 1, 0));
    }

    #[test]
    fn test_group_with_liberty_survives() {
        let mut store = MemoryStore::new();
        place(&mut store, "b", 0, 0);
        place(&mut store, "b", 1, 0);
        place(&mut store, "a", -1, 0);
        place(&mut store, "a", 0, -1);
        place(&mut store, "a", 0, 1);
        place(&mut store, "a", 1, -1);
        // (1,1) and (2,0) still empty.
        let report = perform_captures(&mut store, Coord::new(1, -1)).unwrap();
        assert_eq!(report, CaptureReport::default());
        assert!(occupied(&store, 0, 0));
        assert!(occupied(&store, 1, 0));
    }

    #[test]
    fn test_two_groups_captured_at_once() {
        // a fills (0,0), capturing b at (-1,0) and c at (1,0).
        let mut store = MemoryStore::new();
        place(&mut store, "b", -1, 0);
        place(&mut store, "c", 1, 0);
        for (x, y) in [(-2, 0), (-1, -1), (-1, 1), (2, 0), (1, -1), (1, 1)] {
            place(&mut store, "a", x, y);
        }
        place(&mut store, "a", 0, 0);

        let mut report = perform_captures(&mut store, Coord::new(0, 0)).unwrap();
        report.captured.sort();
        assert_eq!(report.captured, vec![Coord::new(-1, 0), Coord::new(1, 0)]);
        assert_eq!(store.len(), 7);
    }

    #[test]
    fn test_empty_position_is_noop() {
        let mut store = MemoryStore::new();
        place(&mut store, "b", 1, 0);
        let report = perform_captures(&mut store, Coord::new(0, 0)).unwrap();
        assert_eq!(report, CaptureReport::default());
        assert_eq!(store.len(), 1);
    }
}
