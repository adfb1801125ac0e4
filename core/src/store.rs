//! SQLite persistence for recordings.
//!
//! RULE: Only store.rs talks to the database.
//! The recorder calls store methods; it never executes SQL directly.

use rusqlite::{params, Connection};
use crate::{
    error::InteractiveResult,
    types::{Frame, Step},
};
use std::path::Path;

/// File name of the recording database inside the record directory.
pub const RECORDING_DB: &str = "recording.db";

/// One stored frame, as read back by tooling and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub episode: u64,
    pub step:    Step,
    pub reward:  f32,
    pub frame:   Frame,
}

pub struct RecordingStore {
    conn: Connection,
}

impl RecordingStore {
    /// Open (or create) the recording database inside `dir`.
    /// The directory is created if missing.
    pub fn open_dir(dir: &Path) -> InteractiveResult<Self> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(RECORDING_DB))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> InteractiveResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> InteractiveResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_recording.sql"))?;
        Ok(())
    }

    // ── Recording ──────────────────────────────────────────────

    pub fn insert_recording(
        &self,
        recording_id: &str,
        env_name: &str,
        source: &str,
        started_at: &str,
    ) -> InteractiveResult<()> {
        self.conn.execute(
            "INSERT INTO recording (recording_id, env_name, source, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![recording_id, env_name, source, started_at],
        )?;
        Ok(())
    }

    pub fn recording_ids(&self) -> InteractiveResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT recording_id FROM recording ORDER BY started_at ASC"
        )?;
        let ids = stmt.query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    pub fn recording_source(&self, recording_id: &str) -> InteractiveResult<Option<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT source FROM recording WHERE recording_id = ?1"
        )?;
        let mut rows = stmt.query(params![recording_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None      => Ok(None),
        }
    }

    // ── Frames ─────────────────────────────────────────────────

    pub fn append_frame(
        &self,
        recording_id: &str,
        episode: u64,
        step: Step,
        reward: f32,
        frame: &Frame,
    ) -> InteractiveResult<()> {
        self.conn.execute(
            "INSERT INTO frame (recording_id, episode, step, reward, height, width, channels, pixels)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                recording_id,
                episode as i64,
                step as i64,
                reward as f64,
                frame.height as i64,
                frame.width as i64,
                frame.channels as i64,
                frame.pixels,
            ],
        )?;
        Ok(())
    }

    pub fn frame_count(&self, recording_id: &str) -> InteractiveResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM frame WHERE recording_id = ?1",
            params![recording_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn episode_count(&self, recording_id: &str) -> InteractiveResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT episode) FROM frame WHERE recording_id = ?1",
            params![recording_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn frames_for_episode(
        &self,
        recording_id: &str,
        episode: u64,
    ) -> InteractiveResult<Vec<FrameRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT episode, step, reward, height, width, channels, pixels
             FROM frame WHERE recording_id = ?1 AND episode = ?2
             ORDER BY id ASC"
        )?;
        let records = stmt.query_map(params![recording_id, episode as i64], |row| {
            Ok(FrameRecord {
                episode: row.get::<_, i64>(0)? as u64,
                step:    row.get::<_, i64>(1)? as u64,
                reward:  row.get::<_, f64>(2)? as f32,
                frame: Frame {
                    height:   row.get::<_, i64>(3)? as usize,
                    width:    row.get::<_, i64>(4)? as usize,
                    channels: row.get::<_, i64>(5)? as usize,
                    pixels:   row.get(6)?,
                },
            })
        })?.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
