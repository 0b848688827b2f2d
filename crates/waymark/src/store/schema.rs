//! `SQLite` schema definitions for the waymark store.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the entries table.
pub const CREATE_ENTRIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    location TEXT NOT NULL,
    detail TEXT NOT NULL,
    mood TEXT NOT NULL,
    tags TEXT NOT NULL,
    distance_km REAL NOT NULL,
    photos TEXT NOT NULL,
    energy INTEGER NOT NULL,
    happened_on TEXT NOT NULL,
    latitude REAL,
    longitude REAL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the goals table.
pub const CREATE_GOALS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS goals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    target_location TEXT NOT NULL,
    target_date TEXT NOT NULL,
    notes TEXT NOT NULL,
    completed INTEGER NOT NULL,
    progress INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
)
";

/// SQL statement to create the trips table. Points are stored as a JSON
/// array ordered by timestamp.
pub const CREATE_TRIPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS trips (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    ended_at TEXT NOT NULL,
    distance_km REAL NOT NULL,
    points TEXT NOT NULL
)
";

/// SQL statement to create an index on entry dates for year filtering.
pub const CREATE_ENTRY_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_entries_happened_on ON entries(happened_on DESC)
";

/// SQL statement to create an index on entry moods for filtering.
pub const CREATE_ENTRY_MOOD_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_entries_mood ON entries(mood)
";

/// SQL statement to create an index on goal target dates.
pub const CREATE_GOAL_DATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_goals_target_date ON goals(target_date)
";

/// SQL statement to create an index on trip start times for range queries.
pub const CREATE_TRIP_START_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_trips_started_at ON trips(started_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ENTRIES_TABLE,
    CREATE_GOALS_TABLE,
    CREATE_TRIPS_TABLE,
    CREATE_ENTRY_DATE_INDEX,
    CREATE_ENTRY_MOOD_INDEX,
    CREATE_GOAL_DATE_INDEX,
    CREATE_TRIP_START_INDEX,
    CREATE_METADATA_TABLE,
];
