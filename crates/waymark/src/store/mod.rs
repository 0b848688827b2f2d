//! Journal store for waymark.
//!
//! This module provides `SQLite`-based persistent storage for footprint
//! entries, travel goals, and finalized trips. The store is the single source
//! of truth: every other component observes it through the revision watch and
//! re-reads rather than holding its own copy.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::journal::{Entry, Goal};
use crate::track::{TrackPoint, Trip};

/// Date format used for calendar-date columns.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persistent store for entries, goals, and trips.
///
/// Mutations bump a revision counter observable via [`Store::watch`];
/// observers react by re-reading the collections they care about, so no
/// second copy of the data ever exists outside `SQLite`.
#[derive(Debug)]
pub struct Store {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection, shared across tasks.
    conn: Mutex<Connection>,
    /// Mutation counter; receivers wake on every committed change.
    revision: watch::Sender<u64>,
}

/// Counts and sizes describing the store contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of footprint entries.
    pub entry_count: i64,
    /// Number of travel goals.
    pub goal_count: i64,
    /// Number of finalized trips.
    pub trip_count: i64,
    /// Size of the database file in bytes (0 for in-memory stores).
    pub db_size_bytes: u64,
}

impl Store {
    /// Open or create a store database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema
    /// initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL keeps readers unblocked while the recorder flushes trips
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self {
            path,
            conn: Mutex::new(conn),
            revision: watch::Sender::new(0),
        })
    }

    /// Create an in-memory store instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
            revision: watch::Sender::new(0),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Subscribe to mutation notifications.
    ///
    /// The receiver carries a monotonically increasing revision; the value
    /// itself only signals "something changed, re-read what you need."
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current revision counter.
    #[must_use]
    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::internal("store connection lock poisoned"))
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    // === Entries ===

    /// Insert or replace an entry by identifier.
    ///
    /// An entry without an id is inserted and assigned one; an entry with an
    /// id overwrites any existing row with that id. Clamp invariants are
    /// applied before writing. Returns the entry's id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert_entry(&self, entry: &Entry) -> Result<i64> {
        let entry = entry.clone().normalized();
        let tags = serde_json::to_string(&entry.tags)?;
        let photos = serde_json::to_string(&entry.photos)?;
        let happened_on = entry.happened_on.format(DATE_FORMAT).to_string();
        let mood = entry.mood.to_string();

        let conn = self.conn()?;
        let id = if let Some(id) = entry.id {
            conn.execute(
                r"
                INSERT OR REPLACE INTO entries
                    (id, title, location, detail, mood, tags, distance_km,
                     photos, energy, happened_on, latitude, longitude)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ",
                params![
                    id,
                    entry.title,
                    entry.location,
                    entry.detail,
                    mood,
                    tags,
                    entry.distance_km,
                    photos,
                    entry.energy,
                    happened_on,
                    entry.latitude,
                    entry.longitude,
                ],
            )?;
            id
        } else {
            conn.execute(
                r"
                INSERT INTO entries
                    (title, location, detail, mood, tags, distance_km,
                     photos, energy, happened_on, latitude, longitude)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                ",
                params![
                    entry.title,
                    entry.location,
                    entry.detail,
                    mood,
                    tags,
                    entry.distance_km,
                    photos,
                    entry.energy,
                    happened_on,
                    entry.latitude,
                    entry.longitude,
                ],
            )?;
            conn.last_insert_rowid()
        };
        drop(conn);

        debug!("Upserted entry {}", id);
        self.bump();
        Ok(id)
    }

    /// Delete an entry by id.
    ///
    /// Returns `true` if an entry was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_entry(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()?
            .execute("DELETE FROM entries WHERE id = ?1", [id])?;
        if affected > 0 {
            self.bump();
        }
        Ok(affected > 0)
    }

    /// Get all entries, most recent date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        let conn = self.conn()?;
        Self::entries_with(&conn)
    }

    fn entries_with(conn: &Connection) -> Result<Vec<Entry>> {
        let mut stmt = conn.prepare(
            r"
            SELECT id, title, location, detail, mood, tags, distance_km,
                   photos, energy, happened_on, latitude, longitude
            FROM entries ORDER BY happened_on DESC, id DESC
            ",
        )?;
        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // === Goals ===

    /// Insert or replace a goal by identifier. Returns the goal's id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn upsert_goal(&self, goal: &Goal) -> Result<i64> {
        let goal = goal.clone().normalized();
        let target_date = goal.target_date.format(DATE_FORMAT).to_string();

        let conn = self.conn()?;
        let id = if let Some(id) = goal.id {
            conn.execute(
                r"
                INSERT OR REPLACE INTO goals
                    (id, title, target_location, target_date, notes, completed, progress)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
                params![
                    id,
                    goal.title,
                    goal.target_location,
                    target_date,
                    goal.notes,
                    goal.completed,
                    goal.progress,
                ],
            )?;
            id
        } else {
            conn.execute(
                r"
                INSERT INTO goals
                    (title, target_location, target_date, notes, completed, progress)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
                params![
                    goal.title,
                    goal.target_location,
                    target_date,
                    goal.notes,
                    goal.completed,
                    goal.progress,
                ],
            )?;
            conn.last_insert_rowid()
        };
        drop(conn);

        debug!("Upserted goal {}", id);
        self.bump();
        Ok(id)
    }

    /// Delete a goal by id.
    ///
    /// Returns `true` if a goal was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_goal(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()?
            .execute("DELETE FROM goals WHERE id = ?1", [id])?;
        if affected > 0 {
            self.bump();
        }
        Ok(affected > 0)
    }

    /// Get all goals, nearest target date first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn goals(&self) -> Result<Vec<Goal>> {
        let conn = self.conn()?;
        Self::goals_with(&conn)
    }

    fn goals_with(conn: &Connection) -> Result<Vec<Goal>> {
        let mut stmt = conn.prepare(
            r"
            SELECT id, title, target_location, target_date, notes, completed, progress
            FROM goals ORDER BY target_date ASC, id ASC
            ",
        )?;
        let goals = stmt
            .query_map([], Self::row_to_goal)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(goals)
    }

    /// Read entries and goals as one consistent snapshot.
    ///
    /// Both collections are read under a single connection lock so a
    /// concurrent mutation can never land between the two reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn snapshot(&self) -> Result<(Vec<Entry>, Vec<Goal>)> {
        let conn = self.conn()?;
        let entries = Self::entries_with(&conn)?;
        let goals = Self::goals_with(&conn)?;
        Ok((entries, goals))
    }

    // === Trips ===

    /// Insert a finalized trip. Returns the trip's id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_trip(&self, trip: &Trip) -> Result<i64> {
        let points = serde_json::to_string(&trip.points)?;
        let conn = self.conn()?;
        conn.execute(
            r"
            INSERT INTO trips (started_at, ended_at, distance_km, points)
            VALUES (?1, ?2, ?3, ?4)
            ",
            params![
                trip.started_at.to_rfc3339(),
                trip.ended_at.to_rfc3339(),
                trip.distance_km,
                points,
            ],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        debug!("Inserted trip {} ({} points)", id, trip.points.len());
        self.bump();
        Ok(id)
    }

    /// Get all trips, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn trips(&self) -> Result<Vec<Trip>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r"
            SELECT id, started_at, ended_at, distance_km, points
            FROM trips ORDER BY started_at DESC
            ",
        )?;
        let trips = stmt
            .query_map([], Self::row_to_trip)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(trips)
    }

    /// Get all track points recorded within a time range, ordered by
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn track_points_between(
        &self,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<TrackPoint>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r"
            SELECT id, started_at, ended_at, distance_km, points
            FROM trips WHERE ended_at >= ?1 AND started_at <= ?2
            ORDER BY started_at ASC
            ",
        )?;
        let trips = stmt
            .query_map(
                params![since.to_rfc3339(), until.to_rfc3339()],
                Self::row_to_trip,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        drop(stmt);
        drop(conn);

        let mut points: Vec<TrackPoint> = trips
            .into_iter()
            .flat_map(|trip| trip.points)
            .filter(|point| point.timestamp >= since && point.timestamp <= until)
            .collect();
        points.sort_by_key(|point| point.timestamp);
        Ok(points)
    }

    // === Backup support ===

    /// Apply a restored dataset in a single transaction.
    ///
    /// Every entry and goal is upserted by identifier; if any write fails the
    /// transaction rolls back and the store is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction fails; no partial state is kept.
    pub fn apply_backup(&self, entries: &[Entry], goals: &[Goal]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for entry in entries {
            let entry = entry.clone().normalized();
            let tags = serde_json::to_string(&entry.tags)?;
            let photos = serde_json::to_string(&entry.photos)?;
            tx.execute(
                r"
                INSERT OR REPLACE INTO entries
                    (id, title, location, detail, mood, tags, distance_km,
                     photos, energy, happened_on, latitude, longitude)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ",
                params![
                    entry.id,
                    entry.title,
                    entry.location,
                    entry.detail,
                    entry.mood.to_string(),
                    tags,
                    entry.distance_km,
                    photos,
                    entry.energy,
                    entry.happened_on.format(DATE_FORMAT).to_string(),
                    entry.latitude,
                    entry.longitude,
                ],
            )?;
        }

        for goal in goals {
            let goal = goal.clone().normalized();
            tx.execute(
                r"
                INSERT OR REPLACE INTO goals
                    (id, title, target_location, target_date, notes, completed, progress)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
                params![
                    goal.id,
                    goal.title,
                    goal.target_location,
                    goal.target_date.format(DATE_FORMAT).to_string(),
                    goal.notes,
                    goal.completed,
                    goal.progress,
                ],
            )?;
        }

        tx.commit()?;
        drop(conn);

        info!(
            "Restored {} entries and {} goals",
            entries.len(),
            goals.len()
        );
        self.bump();
        Ok(())
    }

    /// Get store statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;
        let entry_count: i64 = conn.query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))?;
        let goal_count: i64 = conn.query_row("SELECT COUNT(*) FROM goals", [], |r| r.get(0))?;
        let trip_count: i64 = conn.query_row("SELECT COUNT(*) FROM trips", [], |r| r.get(0))?;
        drop(conn);

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StoreStats {
            entry_count,
            goal_count,
            trip_count,
            db_size_bytes,
        })
    }

    // === Row conversion ===

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<Entry> {
        let tags_json: String = row.get(5)?;
        let photos_json: String = row.get(7)?;
        let mood_str: String = row.get(4)?;
        let happened_on_str: String = row.get(9)?;

        let entry = Entry {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            location: row.get(2)?,
            detail: row.get(3)?,
            mood: mood_str
                .parse()
                .map_err(|e: String| conversion_error(4, &e))?,
            tags: serde_json::from_str(&tags_json)
                .map_err(|e| conversion_error(5, &e.to_string()))?,
            distance_km: row.get(6)?,
            photos: serde_json::from_str(&photos_json)
                .map_err(|e| conversion_error(7, &e.to_string()))?,
            energy: row.get(8)?,
            happened_on: NaiveDate::parse_from_str(&happened_on_str, DATE_FORMAT)
                .map_err(|e| conversion_error(9, &e.to_string()))?,
            latitude: row.get(10)?,
            longitude: row.get(11)?,
        };
        Ok(entry)
    }

    fn row_to_goal(row: &rusqlite::Row) -> rusqlite::Result<Goal> {
        let target_date_str: String = row.get(3)?;
        Ok(Goal {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            target_location: row.get(2)?,
            target_date: NaiveDate::parse_from_str(&target_date_str, DATE_FORMAT)
                .map_err(|e| conversion_error(3, &e.to_string()))?,
            notes: row.get(4)?,
            completed: row.get(5)?,
            progress: row.get(6)?,
        })
    }

    fn row_to_trip(row: &rusqlite::Row) -> rusqlite::Result<Trip> {
        let started_at_str: String = row.get(1)?;
        let ended_at_str: String = row.get(2)?;
        let points_json: String = row.get(4)?;

        Ok(Trip {
            id: Some(row.get(0)?),
            started_at: parse_timestamp(&started_at_str, 1)?,
            ended_at: parse_timestamp(&ended_at_str, 2)?,
            distance_km: row.get(3)?,
            points: serde_json::from_str(&points_json)
                .map_err(|e| conversion_error(4, &e.to_string()))?,
        })
    }
}

fn parse_timestamp(value: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, &e.to_string()))
}

fn conversion_error(column: usize, message: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        message.to_string().into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Mood;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn sample_entry(title: &str, mood: Mood, happened_on: NaiveDate) -> Entry {
        Entry::new(
            title,
            "Kyoto",
            "detail",
            mood,
            vec!["temple".to_string()],
            4.2,
            Vec::new(),
            6,
            happened_on,
            Some((35.0, 135.7)),
        )
    }

    fn sample_trip() -> Trip {
        Trip {
            id: None,
            started_at: ts(100),
            ended_at: ts(200),
            distance_km: 1.5,
            points: vec![
                TrackPoint {
                    timestamp: ts(100),
                    latitude: 35.0,
                    longitude: 135.7,
                    accuracy_m: Some(5.0),
                },
                TrackPoint {
                    timestamp: ts(150),
                    latitude: 35.01,
                    longitude: 135.71,
                    accuracy_m: None,
                },
            ],
        }
    }

    #[test]
    fn test_upsert_entry_assigns_id() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .upsert_entry(&sample_entry("a", Mood::Calm, date(2024, 1, 1)))
            .unwrap();
        assert!(id > 0);

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, Some(id));
        assert_eq!(entries[0].title, "a");
        assert_eq!(entries[0].coordinates(), Some((35.0, 135.7)));
    }

    #[test]
    fn test_upsert_entry_overwrites_by_id() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .upsert_entry(&sample_entry("before", Mood::Calm, date(2024, 1, 1)))
            .unwrap();

        let mut updated = sample_entry("after", Mood::Excited, date(2024, 2, 2));
        updated.id = Some(id);
        let new_id = store.upsert_entry(&updated).unwrap();
        assert_eq!(new_id, id);

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "after");
        assert_eq!(entries[0].mood, Mood::Excited);
    }

    #[test]
    fn test_upsert_entry_clamps_invariants() {
        let store = Store::open_in_memory().unwrap();
        let mut entry = sample_entry("clamp", Mood::Tired, date(2024, 1, 1));
        entry.energy = 42;
        entry.distance_km = -1.0;
        store.upsert_entry(&entry).unwrap();

        let stored = &store.entries().unwrap()[0];
        assert_eq!(stored.energy, 10);
        assert!((stored.distance_km - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delete_entry() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .upsert_entry(&sample_entry("a", Mood::Calm, date(2024, 1, 1)))
            .unwrap();

        assert!(store.delete_entry(id).unwrap());
        assert!(!store.delete_entry(id).unwrap());
        assert!(store.entries().unwrap().is_empty());
    }

    #[test]
    fn test_entries_ordered_by_date_desc() {
        let store = Store::open_in_memory().unwrap();
        store
            .upsert_entry(&sample_entry("old", Mood::Calm, date(2023, 1, 1)))
            .unwrap();
        store
            .upsert_entry(&sample_entry("new", Mood::Calm, date(2024, 6, 1)))
            .unwrap();

        let entries = store.entries().unwrap();
        assert_eq!(entries[0].title, "new");
        assert_eq!(entries[1].title, "old");
    }

    #[test]
    fn test_goal_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let goal = Goal::new("Patagonia", "El Chaltén", date(2026, 11, 1), "spring", 5);
        let id = store.upsert_goal(&goal).unwrap();

        let goals = store.goals().unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].id, Some(id));
        assert_eq!(goals[0].title, "Patagonia");
        assert!(!goals[0].completed);
        assert_eq!(goals[0].progress, 5);

        assert!(store.delete_goal(id).unwrap());
        assert!(store.goals().unwrap().is_empty());
    }

    #[test]
    fn test_revision_bumps_on_mutation() {
        let store = Store::open_in_memory().unwrap();
        let before = store.revision();

        let id = store
            .upsert_entry(&sample_entry("a", Mood::Calm, date(2024, 1, 1)))
            .unwrap();
        assert_eq!(store.revision(), before + 1);

        store.delete_entry(id).unwrap();
        assert_eq!(store.revision(), before + 2);

        // Deleting a missing row changes nothing and does not notify
        store.delete_entry(id).unwrap();
        assert_eq!(store.revision(), before + 2);
    }

    #[tokio::test]
    async fn test_watch_sees_mutations() {
        let store = Store::open_in_memory().unwrap();
        let mut rx = store.watch();

        store
            .upsert_entry(&sample_entry("a", Mood::Calm, date(2024, 1, 1)))
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);
    }

    #[test]
    fn test_snapshot_reads_both_collections() {
        let store = Store::open_in_memory().unwrap();
        store
            .upsert_entry(&sample_entry("a", Mood::Calm, date(2024, 1, 1)))
            .unwrap();
        store
            .upsert_goal(&Goal::new("g", "loc", date(2026, 1, 1), "", 5))
            .unwrap();

        let (entries, goals) = store.snapshot().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(goals.len(), 1);
    }

    #[test]
    fn test_trip_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let trip = sample_trip();
        let id = store.insert_trip(&trip).unwrap();

        let trips = store.trips().unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].id, Some(id));
        assert_eq!(trips[0].points.len(), 2);
        assert_eq!(trips[0].started_at, trip.started_at);
    }

    #[test]
    fn test_track_points_between() {
        let store = Store::open_in_memory().unwrap();
        store.insert_trip(&sample_trip()).unwrap();

        // Window covering only the first point
        let points = store.track_points_between(ts(0), ts(120)).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].timestamp, ts(100));

        // Window covering both
        let points = store.track_points_between(ts(0), ts(300)).unwrap();
        assert_eq!(points.len(), 2);

        // Window covering neither
        let points = store.track_points_between(ts(300), ts(400)).unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_apply_backup_merges_by_id() {
        let store = Store::open_in_memory().unwrap();
        let kept_id = store
            .upsert_entry(&sample_entry("kept", Mood::Calm, date(2024, 1, 1)))
            .unwrap();
        let replaced_id = store
            .upsert_entry(&sample_entry("replaced", Mood::Calm, date(2024, 1, 2)))
            .unwrap();

        let mut overwrite = sample_entry("overwritten", Mood::Happy, date(2024, 3, 3));
        overwrite.id = Some(replaced_id);
        let fresh = sample_entry("fresh", Mood::Tired, date(2024, 4, 4));

        store.apply_backup(&[overwrite, fresh], &[]).unwrap();

        let entries = store.entries().unwrap();
        assert_eq!(entries.len(), 3);
        let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
        assert!(titles.contains(&"kept"));
        assert!(titles.contains(&"overwritten"));
        assert!(titles.contains(&"fresh"));
        assert!(!titles.contains(&"replaced"));

        let kept = entries.iter().find(|e| e.id == Some(kept_id)).unwrap();
        assert_eq!(kept.title, "kept");
    }

    #[test]
    fn test_stats() {
        let store = Store::open_in_memory().unwrap();
        store
            .upsert_entry(&sample_entry("a", Mood::Calm, date(2024, 1, 1)))
            .unwrap();
        store.insert_trip(&sample_trip()).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.goal_count, 0);
        assert_eq!(stats.trip_count, 1);
        assert_eq!(stats.db_size_bytes, 0);
    }
}
