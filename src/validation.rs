//! Move legality.
//!
//! Legality depends only on the 13x13 region around the candidate
//! coordinate. There is no turn order: who may play where is decided by the
//! lock status of the stones already in that region.

use crate::stone::{Coord, PlayerId, Status};
use crate::store::Region;

/// Why a move was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("illegal move: {at} is beyond the playable board")]
    OutOfRange { at: Coord },
    #[error("illegal move: {at} is already occupied")]
    Occupied { at: Coord },
    #[error("illegal move: no stone within reach of {at}")]
    EmptyRegion { at: Coord },
    #[error("illegal move: your stone at {at} is still locked")]
    OwnLocked { at: Coord },
    #[error("illegal move: locked stones of both {first} and {second} are nearby")]
    ContestedLocks { first: PlayerId, second: PlayerId },
    #[error("illegal move: {owner} holds a time-limited stone at {at}")]
    ForeignTimeLimited { at: Coord, owner: PlayerId },
}

/// Checks whether `player` may place a stone at `region.center()`.
///
/// `region` must have been retrieved around the candidate coordinate after
/// expired locks were swept. Stones are examined in coordinate order, so the
/// reported reason is deterministic.
pub fn check_move(player: &PlayerId, region: &Region) -> Result<(), Rejection> {
    let at = region.center();
    if !at.is_playable() {
        return Err(Rejection::OutOfRange { at });
    }
    if region.contains(at) {
        return Err(Rejection::Occupied { at });
    }
    if region.is_empty() {
        return Err(Rejection::EmptyRegion { at });
    }

    let mut foreign_locked: Option<&PlayerId> = None;
    for stone in region.stones() {
        let own = &stone.owner == player;
        match stone.status {
            Status::Locked if own => return Err(Rejection::OwnLocked { at: stone.at }),
            Status::Locked => match foreign_locked {
                None => foreign_locked = Some(&stone.owner),
                Some(first) if first != &stone.owner => {
                    return Err(Rejection::ContestedLocks {
                        first: first.clone(),
                        second: stone.owner.clone(),
                    });
                }
                Some(_) => {}
            },
            Status::TimeLimited if !own => {
                return Err(Rejection::ForeignTimeLimited {
                    at: stone.at,
                    owner: stone.owner.clone(),
                });
            }
            Status::TimeLimited | Status::Unlocked => {}
        }
    }
    Ok(())
}

/// Boolean form of [`check_move`].
pub fn is_legal(player: &PlayerId, region: &Region) -> bool {
    check_move(player, region).is_ok()
}
