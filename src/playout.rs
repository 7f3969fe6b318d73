//! Random self-play.
//!
//! Drives an [`Engine`] with random players placing stones next to existing
//! ones. Used by the `demo` command and to exercise board invariants over
//! long games.

use crate::clock::Clock;
use crate::engine::{Engine, PlayError};
use crate::stone::{Coord, PlayerId};
use crate::store::{BoardStore, StoreError};

/// How far from an existing stone a random candidate may land.
const SPREAD: i64 = 2;

/// Tally of a playout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayoutStats {
    pub attempts: usize,
    pub played: usize,
    pub rejected: usize,
    pub captured: usize,
    pub suicides: usize,
}

/// Make `attempts` random move attempts on `engine`.
///
/// Each attempt picks a random player and a random coordinate within
/// [`SPREAD`] of a random stone on the board. The board is read once up
/// front and then tracked from move outcomes. Rejected moves are
/// counted and skipped; store failures end the playout.
pub fn random_playout<S, C>(
    engine: &Engine<S, C>,
    players: &[PlayerId],
    attempts: usize,
    rng: &mut fastrand::Rng,
) -> Result<PlayoutStats, StoreError>
where
    S: BoardStore,
    C: Clock,
{
    let mut stats = PlayoutStats::default();
    if players.is_empty() {
        return Ok(stats);
    }

    // Stones this playout knows about. Only captures and suicides remove
    // stones, and both are reported in the move outcome.
    let mut anchors: Vec<Coord> = engine.stones()?.into_iter().map(|s| s.at).collect();

    for _ in 0..attempts {
        if anchors.is_empty() {
            break;
        }
        let anchor = anchors[rng.usize(..anchors.len())];
        let at = Coord::new(
            anchor.x.saturating_add(rng.i64(-SPREAD..=SPREAD)),
            anchor.y.saturating_add(rng.i64(-SPREAD..=SPREAD)),
        );
        let player = &players[rng.usize(..players.len())];

        stats.attempts += 1;
        match engine.play(player, at) {
            Ok(outcome) => {
                stats.played += 1;
                stats.captured += outcome.captures.captured.len();
                let report = &outcome.captures;
                anchors.push(at);
                if report.is_suicide() {
                    stats.suicides += 1;
                }
                if !report.captured.is_empty() || report.is_suicide() {
                    anchors.retain(|c| {
                        !report.captured.contains(c) && !report.suicided.contains(c)
                    });
                }
            }
            Err(PlayError::Rejected(_)) => stats.rejected += 1,
            Err(PlayError::Store(e)) => return Err(e),
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::RulesConfig;
    use crate::store::MemoryStore;

    #[test]
    fn test_playout_is_reproducible() {
        let run = |seed| {
            let engine = Engine::new(
                MemoryStore::new(),
                ManualClock::at_epoch(),
                RulesConfig::default(),
            );
            engine.bootstrap(&PlayerId::from("origin")).unwrap();
            let players = [PlayerId::from("a"), PlayerId::from("b")];
            let mut rng = fastrand::Rng::with_seed(seed);
            let stats = random_playout(&engine, &players, 200, &mut rng).unwrap();
            (stats, engine.stones().unwrap())
        };
        let (stats1, board1) = run(7);
        let (stats2, board2) = run(7);
        assert_eq!(stats1, stats2);
        assert_eq!(board1, board2);
        assert_eq!(stats1.attempts, 200);
        assert_eq!(stats1.played + stats1.rejected, 200);
        assert!(stats1.played > 0);
    }

    #[test]
    fn test_playout_continues_from_an_existing_board() {
        let engine = Engine::new(
            MemoryStore::new(),
            ManualClock::at_epoch(),
            RulesConfig::default(),
        );
        engine.bootstrap(&PlayerId::from("origin")).unwrap();
        let players = [PlayerId::from("a"), PlayerId::from("b"), PlayerId::from("c")];
        let mut rng = fastrand::Rng::with_seed(3);
        let first = random_playout(&engine, &players, 150, &mut rng).unwrap();
        let second = random_playout(&engine, &players, 150, &mut rng).unwrap();
        assert_eq!(first.attempts, 150);
        assert_eq!(second.attempts, 150);

        let total = 1 + first.played + second.played;
        let removed = first.captured + second.captured;
        assert!(engine.stones().unwrap().len() <= total - removed);
    }

    #[test]
    fn test_empty_board_does_nothing() {
        let engine = Engine::new(
            MemoryStore::new(),
            ManualClock::at_epoch(),
            RulesConfig::default(),
        );
        let mut rng = fastrand::Rng::with_seed(1);
        let stats = random_playout(&engine, &[PlayerId::from("a")], 10, &mut rng).unwrap();
        assert_eq!(stats, PlayoutStats::default());
    }
}
