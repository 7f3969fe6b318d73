//! The move pipeline.
//!
//! [`Engine`] is the only entry point that mutates a board. Each call takes
//! the board lock, opens one store transaction, sweeps expired locks and then
//! does its work, so concurrent moves can never interleave between
//! validation and placement.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::capture::{CaptureReport, perform_captures};
use crate::clock::{Clock, SystemClock};
use crate::config::RulesConfig;
use crate::constants::ORIGIN;
use crate::evolution::evolve_region;
use crate::stone::{Coord, PlayerId, Status, Stone, StoneId};
use crate::store::{BoardStore, MemoryStore, Region, StoreError};
use crate::sweep::sweep;
use crate::validation::{Rejection, check_move};

/// Failure of [`Engine::play`].
#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    /// The move broke a placement rule. Nothing was written.
    #[error(transparent)]
    Rejected(#[from] Rejection),
    /// The store failed. The whole move was rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything that changed because of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub stone: StoneId,
    pub at: Coord,
    /// Nearby stones whose status advanced, with their new status.
    pub evolved: Vec<(Coord, Status)>,
    pub captures: CaptureReport,
}

/// A board behind a lock, together with the clock and rules applied to it.
pub struct Engine<S, C = SystemClock> {
    store: Mutex<S>,
    clock: C,
    config: RulesConfig,
}

impl Engine<MemoryStore, SystemClock> {
    /// An empty in-memory board on wall-clock time.
    pub fn in_memory(config: RulesConfig) -> Self {
        Self::new(MemoryStore::new(), SystemClock, config)
    }
}

impl<S: BoardStore, C: Clock> Engine<S, C> {
    /// Wrap `store`. The board is used as found; call [`Engine::bootstrap`]
    /// to seed an empty one.
    pub fn new(store: S, clock: C, config: RulesConfig) -> Self {
        Self {
            store: Mutex::new(store),
            clock,
            config,
        }
    }

    /// The rules this engine enforces.
    pub fn config(&self) -> RulesConfig {
        self.config
    }

    /// The time source used to stamp moves and sweeps.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Gives back the store. Fails only if a move panicked while holding it.
    pub fn into_store(self) -> Result<S, StoreError> {
        self.store.into_inner().map_err(|_| StoreError::Poisoned)
    }

    fn lock(&self) -> Result<MutexGuard<'_, S>, StoreError> {
        self.store.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Runs `f` in one transaction after sweeping expired locks.
    fn transact<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut S, DateTime<Utc>) -> Result<T, StoreError>,
    {
        let mut store = self.lock()?;
        let now = self.clock.now();
        let timeout = self.config.lock_timeout;
        store.atomically(|s| {
            sweep(s, now, timeout)?;
            f(s, now)
        })
    }

    /// Places a stone for `player` at `at` if the rules allow it, then ages
    /// the neighbourhood and resolves captures.
    pub fn play(&self, player: &PlayerId, at: Coord) -> Result<MoveOutcome, PlayError> {
        let outcome = self.transact(|store, now| {
            let region = store.retrieve_region(at)?;
            if let Err(reason) = check_move(player, &region) {
                tracing::debug!(%player, %at, %reason, "move rejected");
                return Ok(Err(reason));
            }

            let evolved = evolve_region(store, &region, now)?;
            let stone = store.place_stone(player, at, now)?;
            let captures = perform_captures(store, at)?;
            tracing::info!(
                %player,
                %at,
                evolved = evolved.len(),
                captured = captures.captured.len(),
                suicide = captures.is_suicide(),
                "move played"
            );
            Ok(Ok(MoveOutcome {
                stone,
                at,
                evolved,
                captures,
            }))
        })?;
        Ok(outcome?)
    }

    /// Why `player` may not play at `at`, if anything. Writes nothing except
    /// the sweep.
    pub fn check_move(&self, player: &PlayerId, at: Coord) -> Result<(), PlayError> {
        let verdict =
            self.transact(|store, _| Ok(check_move(player, &store.retrieve_region(at)?)))?;
        Ok(verdict?)
    }

    /// Boolean form of [`Engine::check_move`].
    pub fn is_legal(&self, player: &PlayerId, at: Coord) -> Result<bool, StoreError> {
        match self.check_move(player, at) {
            Ok(()) => Ok(true),
            Err(PlayError::Rejected(_)) => Ok(false),
            Err(PlayError::Store(e)) => Err(e),
        }
    }

    /// The stone at `at`, after expired locks are swept.
    pub fn stone_at(&self, at: Coord) -> Result<Option<Stone>, StoreError> {
        self.transact(|store, _| store.get_stone(at))
    }

    /// The 13x13 window around `center`, after expired locks are swept.
    pub fn region(&self, center: Coord) -> Result<Region, StoreError> {
        self.transact(|store, _| store.retrieve_region(center))
    }

    /// The whole board, in coordinate order.
    pub fn stones(&self) -> Result<Vec<Stone>, StoreError> {
        self.transact(|store, _| store.all_stones())
    }

    /// Number of stones `player` currently has on the board.
    pub fn score(&self, player: &PlayerId) -> Result<usize, StoreError> {
        self.transact(|store, _| store.count_owned_by(player))
    }

    /// Runs the timeout sweep on its own. Returns the coordinates unlocked.
    pub fn sweep(&self) -> Result<Vec<Coord>, StoreError> {
        let mut store = self.lock()?;
        let now = self.clock.now();
        let timeout = self.config.lock_timeout;
        store.atomically(|s| sweep(s, now, timeout))
    }

    /// The first of `player`'s time-limited stones after `from` in coordinate
    /// order, wrapping around to the smallest.
    pub fn next_time_limited(
        &self,
        player: &PlayerId,
        from: Coord,
    ) -> Result<Option<Coord>, StoreError> {
        let mut mine: Vec<Coord> = self.transact(|store, _| {
            Ok(store
                .stones_with_status(Status::TimeLimited)?
                .into_iter()
                .filter(|s| &s.owner == player)
                .map(|s| s.at)
                .collect())
        })?;
        mine.sort();
        Ok(mine
            .iter()
            .copied()
            .find(|&at| at > from)
            .or_else(|| mine.first().copied()))
    }

    /// `player`'s stones that became time-limited at or after `since`.
    pub fn time_limited_since(
        &self,
        player: &PlayerId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Stone>, StoreError> {
        self.transact(|store, _| {
            Ok(store
                .stones_with_status(Status::TimeLimited)?
                .into_iter()
                .filter(|s| &s.owner == player && s.last_status_change_time >= since)
                .collect())
        })
    }

    /// Seeds an empty board with an unlocked stone at the origin so the first
    /// real move has something to extend from. Returns false if the board
    /// already had stones.
    pub fn bootstrap(&self, owner: &PlayerId) -> Result<bool, StoreError> {
        let mut store = self.lock()?;
        let now = self.clock.now();
        store.atomically(|s| {
            if !s.is_empty()? {
                return Ok(false);
            }
            let id = s.place_stone(owner, Coord::from(ORIGIN), now)?;
            s.update_status(id, Status::Unlocked, now)?;
            tracing::info!(%owner, "board bootstrapped at origin");
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::constants::{MAX_COORD, MIN_COORD};
    use chrono::TimeDelta;

    fn engine() -> Engine<MemoryStore, ManualClock> {
        let engine = Engine::new(
            MemoryStore::new(),
            ManualClock::at_epoch(),
            RulesConfig::with_timeout_secs(3600),
        );
        engine.bootstrap(&PlayerId::from("origin")).unwrap();
        engine
    }

    #[test]
    fn test_bootstrap_once() {
        let engine = engine();
        assert!(!engine.bootstrap(&PlayerId::from("origin")).unwrap());
        let stones = engine.stones().unwrap();
        assert_eq!(stones.len(), 1);
        assert_eq!(stones[0].status, Status::Unlocked);
        assert_eq!(stones[0].at, Coord::new(0, 0));
    }

    #[test]
    fn test_empty_board_rejects_everything() {
        let engine = Engine::new(
            MemoryStore::new(),
            ManualClock::at_epoch(),
            RulesConfig::default(),
        );
        let err = engine
            .play(&PlayerId::from("a"), Coord::new(0, 0))
            .unwrap_err();
        assert!(matches!(err, PlayError::Rejected(Rejection::EmptyRegion { .. })));
    }

    #[test]
    fn test_play_evolves_neighbours() {
        let engine = engine();
        let a = PlayerId::from("a");
        let b = PlayerId::from("b");
        engine.play(&a, Coord::new(1, 0)).unwrap();
        let outcome = engine.play(&b, Coord::new(2, 0)).unwrap();
        assert_eq!(outcome.evolved, vec![(Coord::new(1, 0), Status::TimeLimited)]);
        assert_eq!(
            engine.stone_at(Coord::new(2, 0)).unwrap().unwrap().status,
            Status::Locked
        );
    }

    #[test]
    fn test_rejection_writes_nothing() {
        let engine = engine();
        let a = PlayerId::from("a");
        engine.play(&a, Coord::new(1, 0)).unwrap();
        let err = engine.play(&a, Coord::new(3, 3)).unwrap_err();
        assert!(matches!(err, PlayError::Rejected(Rejection::OwnLocked { .. })));
        assert_eq!(engine.stones().unwrap().len(), 2);
        assert_eq!(
            engine.stone_at(Coord::new(1, 0)).unwrap().unwrap().status,
            Status::Locked
        );
    }

    #[test]
    fn test_timeout_releases_region() {
        let engine = engine();
        let a = PlayerId::from("a");
        let b = PlayerId::from("b");
        let c = PlayerId::from("c");
        engine.play(&a, Coord::new(1, 0)).unwrap();
        engine.play(&b, Coord::new(-1, 0)).unwrap();
        // a's stone is now time-limited and reserves the region.
        assert!(matches!(
            engine.check_move(&c, Coord::new(0, 2)),
            Err(PlayError::Rejected(Rejection::ForeignTimeLimited { .. }))
        ));

        engine.clock().advance(TimeDelta::seconds(3599));
        assert!(!engine.is_legal(&c, Coord::new(0, 2)).unwrap());

        engine.clock().advance(TimeDelta::seconds(1));
        assert!(engine.is_legal(&c, Coord::new(0, 2)).unwrap());
        let stone = engine.stone_at(Coord::new(1, 0)).unwrap().unwrap();
        assert_eq!(stone.status, Status::Unlocked);
        assert_eq!(stone.last_status_change_time, engine.clock().now());
    }

    #[test]
    fn test_next_time_limited_wraps() {
        let engine = engine();
        let a = PlayerId::from("a");
        let b = PlayerId::from("b");
        engine.play(&a, Coord::new(1, 0)).unwrap();
        engine.play(&b, Coord::new(2, 0)).unwrap();
        // a(1,0) is time-limited now.
        assert_eq!(
            engine.next_time_limited(&a, Coord::new(5, 5)).unwrap(),
            Some(Coord::new(1, 0))
        );
        assert_eq!(
            engine.next_time_limited(&a, Coord::new(-5, 0)).unwrap(),
            Some(Coord::new(1, 0))
        );
        assert_eq!(engine.next_time_limited(&b, Coord::new(0, 0)).unwrap(), None);
    }

    #[test]
    fn test_time_limited_since() {
        let engine = engine();
        let a = PlayerId::from("a");
        let b = PlayerId::from("b");
        engine.play(&a, Coord::new(1, 0)).unwrap();
        let before = engine.clock().now();
        engine.clock().advance(TimeDelta::seconds(10));
        engine.play(&b, Coord::new(2, 0)).unwrap();

        assert_eq!(engine.time_limited_since(&a, before).unwrap().len(), 1);
        let later = engine.clock().now() + TimeDelta::seconds(1);
        assert!(engine.time_limited_since(&a, later).unwrap().is_empty());
    }

    #[test]
    fn test_score_counts_stones() {
        let engine = engine();
        let a = PlayerId::from("a");
        engine.play(&a, Coord::new(1, 0)).unwrap();
        assert_eq!(engine.score(&a).unwrap(), 1);
        assert_eq!(engine.score(&PlayerId::from("nobody")).unwrap(), 0);
    }

    #[test]
    fn test_far_move_is_rejected_and_engine_survives() {
        let engine = engine();
        let a = PlayerId::from("a");
        let far = Coord::new(i64::MAX, 0);
        assert!(matches!(
            engine.play(&a, far),
            Err(PlayError::Rejected(Rejection::OutOfRange { at })) if at == far
        ));
        assert!(engine.region(far).unwrap().is_empty());
        assert!(matches!(
            engine.play(&a, Coord::new(MAX_COORD, MIN_COORD)),
            Err(PlayError::Rejected(Rejection::EmptyRegion { .. }))
        ));
        engine.play(&a, Coord::new(1, 0)).unwrap();
    }

    #[test]
    fn test_play_at_the_playable_edge() {
        let mut store = MemoryStore::new();
        let t = DateTime::<Utc>::UNIX_EPOCH;
        store
            .insert_raw(&PlayerId::from("a"), Coord::new(MAX_COORD, 0), Status::Unlocked, t, t)
            .unwrap();
        let engine = Engine::new(store, ManualClock::at_epoch(), RulesConfig::default());
        let b = PlayerId::from("b");
        let outcome = engine.play(&b, Coord::new(MAX_COORD, 1)).unwrap();
        assert_eq!(outcome.captures, CaptureReport::default());
        assert!(matches!(
            engine.play(&b, Coord::new(MAX_COORD + 1, 1)),
            Err(PlayError::Rejected(Rejection::OutOfRange { .. }))
        ));
    }
}
