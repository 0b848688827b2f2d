//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};

use crate::journal::Mood;
use crate::prefs::ThemeMode;

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Title of the footprint
    pub title: String,

    /// Location name
    pub location: String,

    /// Free-text story and impressions
    #[arg(short, long, default_value = "")]
    pub detail: String,

    /// Mood (excited, happy, calm, nostalgic, tired)
    #[arg(short, long, default_value = "happy")]
    pub mood: Mood,

    /// Comma-separated tags
    #[arg(short, long)]
    pub tags: Option<String>,

    /// Distance in kilometers
    #[arg(long, default_value = "0")]
    pub distance: f64,

    /// Energy level (1-10)
    #[arg(short, long, default_value = "6")]
    pub energy: u8,

    /// Date (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Latitude (requires --lon)
    #[arg(long, requires = "lon")]
    pub lat: Option<f64>,

    /// Longitude (requires --lat)
    #[arg(long, requires = "lat")]
    pub lon: Option<f64>,
}

impl AddCommand {
    /// Parse the comma-separated tag list.
    #[must_use]
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect()
    }
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Year to browse (ignored while searching); defaults to the current year
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Keep only entries with this mood
    #[arg(short, long)]
    pub mood: Option<Mood>,

    /// Search query across titles, locations, and tags
    #[arg(long)]
    pub query: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Goal management commands.
#[derive(Debug, Subcommand)]
pub enum GoalCommand {
    /// Add a travel goal
    Add {
        /// Title of the goal
        title: String,

        /// Target location
        location: String,

        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,

        /// Free-text notes
        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// List all goals
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Toggle a goal's completion flag
    Done {
        /// Goal id
        id: i64,
    },

    /// Update a goal's progress percentage
    Progress {
        /// Goal id
        id: i64,

        /// Progress percent (0-100)
        percent: u8,
    },
}

/// Tracking commands.
#[derive(Debug, Subcommand)]
pub enum TrackCommand {
    /// Replay a recorded sample log through the recorder
    Replay {
        /// Path to a JSON file containing an array of raw samples
        file: PathBuf,

        /// Milliseconds between replayed samples
        #[arg(long, default_value = "10")]
        interval_ms: u64,
    },

    /// Show stored track points within a time range
    Points {
        /// Earliest timestamp (RFC 3339)
        #[arg(long)]
        since: DateTime<Utc>,

        /// Latest timestamp (RFC 3339)
        #[arg(long)]
        until: DateTime<Utc>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Profile command arguments.
///
/// With no options, shows the current profile.
#[derive(Debug, Args)]
pub struct ProfileCommand {
    /// Set the display nickname
    #[arg(long)]
    pub nickname: Option<String>,

    /// Set the avatar reference
    #[arg(long)]
    pub avatar: Option<String>,

    /// Set the theme mode (system, light, dark)
    #[arg(long)]
    pub theme: Option<ThemeMode>,
}

impl ProfileCommand {
    /// Whether this invocation changes anything.
    #[must_use]
    pub fn is_update(&self) -> bool {
        self.nickname.is_some() || self.avatar.is_some() || self.theme.is_some()
    }
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Destination file for the backup document
    pub file: PathBuf,
}

/// Import command arguments.
#[derive(Debug, Args)]
pub struct ImportCommand {
    /// Backup document to restore
    pub file: PathBuf,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
