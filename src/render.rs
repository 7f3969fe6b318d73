//! Plain-text drawing of a region.

use std::fmt;

use crate::constants::REGION_RADIUS;
use crate::stone::{Coord, PlayerId, Status, Stone};
use crate::store::Region;

/// A region as seen by one player (or by nobody).
///
/// Each cell is preceded by a separator that is `[` on the cursor and `]`
/// right after it:
///
/// ```text
/// -+-+-A[+]b-+-
/// ```
///
/// `+` is empty, an upper-case initial is a locked stone, a lower-case one
/// unlocked. Time-limited stones show as `!` for the viewer's own and `?`
/// for anyone else's. Cells past the end of `i64` are blank.
pub struct RegionView<'a> {
    region: &'a Region,
    viewer: Option<&'a PlayerId>,
}

impl<'a> RegionView<'a> {
    /// Draw `region`, marking `viewer`'s own time-limited stones.
    pub fn new(region: &'a Region, viewer: Option<&'a PlayerId>) -> Self {
        Self { region, viewer }
    }

    fn glyph(&self, stone: &Stone) -> char {
        let initial = stone.owner.as_str().chars().next().unwrap_or('#');
        match stone.status {
            Status::Locked => initial.to_ascii_uppercase(),
            Status::Unlocked => initial.to_ascii_lowercase(),
            Status::TimeLimited if self.viewer == Some(&stone.owner) => '!',
            Status::TimeLimited => '?',
        }
    }
}

impl fmt::Display for RegionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let center = self.region.center();
        for dy in -REGION_RADIUS..=REGION_RADIUS {
            for dx in -REGION_RADIUS..=REGION_RADIUS {
                let sep = match (dy, dx) {
                    (0, 0) => '[',
                    (0, 1) => ']',
                    _ => '-',
                };
                let ch = match (center.x.checked_add(dx), center.y.checked_add(dy)) {
                    (Some(x), Some(y)) => self
                        .region
                        .get(Coord::new(x, y))
                        .map_or('+', |s| self.glyph(s)),
                    _ => ' ',
                };
                write!(f, "{sep}{ch}")?;
            }
            writeln!(f, "-")?;
        }
        Ok(())
    }
}
