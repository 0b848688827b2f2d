//! `waymark` - The core of a personal travel journal
//!
//! This library provides the engine behind a footprint-logging travel
//! journal: a continuous GPS track recorder, a reactive state-aggregation
//! pipeline, pure journal analytics, and a lossless backup codec, all sharing
//! one observable `SQLite` store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod analytics;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod journal;
pub mod logging;
pub mod prefs;
pub mod store;
pub mod track;

pub use aggregate::{AggregatedView, Aggregator, FilterState};
pub use analytics::{summarize, Summary};
pub use backup::BackupDocument;
pub use config::Config;
pub use error::{Error, Result};
pub use journal::{Entry, Goal, Mood};
pub use logging::init_logging;
pub use prefs::{PreferenceStore, Preferences, ThemeMode};
pub use store::{Store, StoreStats};
pub use track::{RawSample, Recorder, TrackPoint, TrackerStats, TrackingState, Trip};
