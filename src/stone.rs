//! Stones, coordinates and the per-stone lock status.
//!
//! The board is unbounded, so a [`Coord`] is just a pair of signed integers.
//! Every stone carries one of three [`Status`] values which together form a
//! one-way lifecycle: `Locked` -> `TimeLimited` -> `Unlocked`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::constants::{DELTA, MAX_COORD, MIN_COORD, REGION_RADIUS};

/// A point on the infinite board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub x: i64,
    pub y: i64,
}

impl Coord {
    /// Create a coordinate. Any pair is representable; see
    /// [`Coord::is_playable`] for where stones may go.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Whether a stone may be placed here: both axes lie within
    /// `MIN_COORD..=MAX_COORD`.
    pub fn is_playable(self) -> bool {
        (MIN_COORD..=MAX_COORD).contains(&self.x) && (MIN_COORD..=MAX_COORD).contains(&self.y)
    }

    /// The 4 orthogonal neighbors (N, E, S, W). Saturates at the ends of
    /// `i64`, which only matters for unplayable points.
    #[inline]
    pub fn neighbors(self) -> [Coord; 4] {
        DELTA.map(|(dx, dy)| Coord::new(self.x.saturating_add(dx), self.y.saturating_add(dy)))
    }

    /// Whether `other` lies inside the region centred on `self`.
    #[inline]
    pub fn in_region(self, other: Coord) -> bool {
        let radius = REGION_RADIUS.unsigned_abs();
        self.x.abs_diff(other.x) <= radius && self.y.abs_diff(other.y) <= radius
    }

    /// Inclusive corners of the region centred on `self`, clipped to `i64`.
    pub fn region_bounds(self) -> (Coord, Coord) {
        (
            Coord::new(
                self.x.saturating_sub(REGION_RADIUS),
                self.y.saturating_sub(REGION_RADIUS),
            ),
            Coord::new(
                self.x.saturating_add(REGION_RADIUS),
                self.y.saturating_add(REGION_RADIUS),
            ),
        )
    }
}

impl From<(i64, i64)> for Coord {
    fn from((x, y): (i64, i64)) -> Self {
        Coord::new(x, y)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Identifies the player who owns a stone.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wrap a player name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable handle assigned to a stone by its store.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StoneId(pub i64);

/// Lock state of a stone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// Freshly placed. The owner may not play nearby.
    Locked,
    /// Aged once. Reserves the region to its owner until aged again or timed out.
    TimeLimited,
    /// Terminal state. Places no constraint on nearby moves.
    Unlocked,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Locked => "Locked",
            Status::TimeLimited => "TimeLimited",
            Status::Unlocked => "Unlocked",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of the known spellings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stone status: {0:?}")]
pub struct ParseStatusError(pub String);

impl FromStr for Status {
    type Err = ParseStatusError;

    /// Accepts the canonical names as well as the older `Pending` and
    /// `Self-Locked` spellings of the time-limited state.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "locked" => Ok(Status::Locked),
            "timelimited" | "time-limited" | "pending" | "self-locked" => Ok(Status::TimeLimited),
            "unlocked" => Ok(Status::Unlocked),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

/// A placed stone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stone {
    pub id: StoneId,
    pub at: Coord,
    pub owner: PlayerId,
    pub placement_time: DateTime<Utc>,
    pub last_status_change_time: DateTime<Utc>,
    pub status: Status,
}
