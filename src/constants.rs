//! Constants for region geometry and lock timing.
//!
//! The board itself has no edges; the only fixed geometry is the square
//! region examined around a move.

// =============================================================================
// Region Geometry
// =============================================================================

/// Distance from the centre of a region to its edge, in both axes.
pub const REGION_RADIUS: i64 = 6;

/// Side length of a region (13 for the default radius).
pub const REGION_SIZE: i64 = 2 * REGION_RADIUS + 1;

/// Smallest coordinate a stone may occupy, on either axis. Keeps every
/// region around a playable point, and every neighbor, inside `i64`.
pub const MIN_COORD: i64 = i64::MIN + REGION_RADIUS + 1;

/// Largest coordinate a stone may occupy, on either axis.
pub const MAX_COORD: i64 = i64::MAX - REGION_RADIUS - 1;

/// Coordinate of the stone that seeds an empty board.
pub const ORIGIN: (i64, i64) = (0, 0);

// =============================================================================
// Lock Timing
// =============================================================================

/// Default number of seconds a time-limited stone keeps its region reserved.
pub const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 86_400;

// =============================================================================
// Neighbor Offsets
// =============================================================================

/// Offsets to the orthogonal neighbors of a coordinate.
/// Order: North, East, South, West (y grows downwards).
pub const DELTA: [(i64, i64); 4] = [
    (0, -1), // North
    (1, 0),  // East
    (0, 1),  // South
    (-1, 0), // West
];
