//! SQLite-backed board store.
//!
//! One table, one row per stone. Timestamps are stored as integer
//! milliseconds since the Unix epoch and statuses as their canonical names.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{BoardStore, Region, StoneLookup, StoreError};
use crate::stone::{Coord, PlayerId, Status, Stone, StoneId};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS stones (
        id                      INTEGER PRIMARY KEY AUTOINCREMENT,
        x                       INTEGER NOT NULL,
        y                       INTEGER NOT NULL,
        player                  TEXT NOT NULL,
        placement_time          INTEGER NOT NULL,
        last_status_change_time INTEGER NOT NULL,
        status                  TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS idx_stones_xy ON stones (x, y);
    CREATE INDEX IF NOT EXISTS idx_stones_status ON stones (status);
";

/// How long a write waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const COLUMNS: &str = "id, x, y, player, placement_time, last_status_change_time, status";

/// Board kept in a SQLite database.
pub struct SqliteStore {
    db: Connection,
}

impl SqliteStore {
    /// Open (or create) the board database at `path`. Several processes may
    /// share the file; writers wait up to a few seconds for each other.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::initialize(Connection::open(path)?)
    }

    /// A private board that disappears with the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(db: Connection) -> Result<Self, StoreError> {
        db.busy_timeout(BUSY_TIMEOUT)?;
        db.execute_batch(SCHEMA)?;
        Ok(Self { db })
    }

    /// Roll back whatever transaction is open, logging instead of failing so
    /// the caller's own error is the one reported.
    fn rollback_after(&self, cause: &StoreError) {
        if self.db.is_autocommit() {
            return;
        }
        if let Err(rollback) = self.db.execute_batch("ROLLBACK") {
            tracing::error!(error = %rollback, "rollback failed after {cause}");
        }
    }

    fn query_stones(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Stone>, StoreError> {
        let mut stmt = self.db.prepare(sql)?;
        let rows = stmt.query_map(params, RawStone::from_row)?;
        let mut stones = Vec::new();
        for row in rows {
            stones.push(row?.into_stone()?);
        }
        Ok(stones)
    }
}

/// A row as read from the table, before status and timestamps are checked.
struct RawStone {
    id: i64,
    x: i64,
    y: i64,
    player: String,
    placement_ms: i64,
    changed_ms: i64,
    status: String,
}

impl RawStone {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            x: row.get(1)?,
            y: row.get(2)?,
            player: row.get(3)?,
            placement_ms: row.get(4)?,
            changed_ms: row.get(5)?,
            status: row.get(6)?,
        })
    }

    fn into_stone(self) -> Result<Stone, StoreError> {
        let status = self
            .status
            .parse::<Status>()
            .map_err(|_| StoreError::CorruptStatus(self.status.clone()))?;
        Ok(Stone {
            id: StoneId(self.id),
            at: Coord::new(self.x, self.y),
            owner: PlayerId::new(self.player),
            placement_time: from_millis(self.placement_ms)?,
            last_status_change_time: from_millis(self.changed_ms)?,
            status,
        })
    }
}

fn from_millis(ms: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(ms).ok_or(StoreError::CorruptTimestamp(ms))
}

impl StoneLookup for SqliteStore {
    fn get_stone(&self, at: Coord) -> Result<Option<Stone>, StoreError> {
        let raw = self
            .db
            .query_row(
                &format!("SELECT {COLUMNS} FROM stones WHERE x = ?1 AND y = ?2"),
                params![at.x, at.y],
                RawStone::from_row,
            )
            .optional()?;
        raw.map(RawStone::into_stone).transpose()
    }
}

impl BoardStore for SqliteStore {
    fn retrieve_region(&self, center: Coord) -> Result<Region, StoreError> {
        let (lo, hi) = center.region_bounds();
        let stones = self.query_stones(
            &format!(
                "SELECT {COLUMNS} FROM stones
                 WHERE x BETWEEN ?1 AND ?2 AND y BETWEEN ?3 AND ?4"
            ),
            params![lo.x, hi.x, lo.y, hi.y],
        )?;
        Ok(Region::new(center, stones))
    }

    fn place_stone(
        &mut self,
        owner: &PlayerId,
        at: Coord,
        now: DateTime<Utc>,
    ) -> Result<StoneId, StoreError> {
        if self.get_stone(at)?.is_some() {
            return Err(StoreError::Occupied(at));
        }
        let ms = now.timestamp_millis();
        self.db.execute(
            "INSERT INTO stones (x, y, player, placement_time, last_status_change_time, status)
             VALUES (?1, ?2, ?3, ?4, ?4, ?5)",
            params![at.x, at.y, owner.as_str(), ms, Status::Locked.as_str()],
        )?;
        Ok(StoneId(self.db.last_insert_rowid()))
    }

    fn remove_stone(&mut self, at: Coord) -> Result<(), StoreError> {
        self.db.execute(
            "DELETE FROM stones WHERE x = ?1 AND y = ?2",
            params![at.x, at.y],
        )?;
        Ok(())
    }

    fn update_status(
        &mut self,
        id: StoneId,
        status: Status,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.db.execute(
            "UPDATE stones SET status = ?1, last_status_change_time = ?2 WHERE id = ?3",
            params![status.as_str(), now.timestamp_millis(), id.0],
        )?;
        Ok(())
    }

    fn stones_with_status(&self, status: Status) -> Result<Vec<Stone>, StoreError> {
        self.query_stones(
            &format!("SELECT {COLUMNS} FROM stones WHERE status = ?1 ORDER BY x, y"),
            params![status.as_str()],
        )
    }

    fn all_stones(&self) -> Result<Vec<Stone>, StoreError> {
        self.query_stones(
            &format!("SELECT {COLUMNS} FROM stones ORDER BY x, y"),
            params![],
        )
    }

    fn count_owned_by(&self, owner: &PlayerId) -> Result<usize, StoreError> {
        let count: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM stones WHERE player = ?1",
            params![owner.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn is_empty(&self) -> Result<bool, StoreError> {
        let any: Option<i64> = self
            .db
            .query_row("SELECT id FROM stones LIMIT 1", params![], |row| row.get(0))
            .optional()?;
        Ok(any.is_none())
    }

    fn atomically<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, StoreError>,
    {
        // Only a call that unwound through `f` can leave a transaction open.
        if !self.db.is_autocommit() {
            tracing::warn!("discarding a transaction abandoned by an earlier call");
            self.db.execute_batch("ROLLBACK")?;
        }

        self.db.execute_batch("BEGIN IMMEDIATE")?;
        let result = f(self).and_then(|value| {
            self.db.execute_batch("COMMIT")?;
            Ok(value)
        });
        if let Err(e) = &result {
            self.rollback_after(e);
        }
        result
    }
}
