//! Command-line interface for waymark.
//!
//! This module provides the CLI structure and command handlers for the
//! `waymark` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, ConfigCommand, ExportCommand, GoalCommand, ImportCommand, ListCommand,
    ProfileCommand, StatsCommand, TrackCommand,
};

/// waymark - your travel journal in the terminal
///
/// Log footprints, track trips, browse and search your journal, and back the
/// whole dataset up to a single JSON document.
#[derive(Debug, Parser)]
#[command(name = "waymark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a footprint entry
    Add(AddCommand),

    /// List entries through the journal filter
    List(ListCommand),

    /// Show journal statistics
    Stats(StatsCommand),

    /// Manage travel goals
    #[command(subcommand)]
    Goal(GoalCommand),

    /// Record and inspect GPS tracks
    #[command(subcommand)]
    Track(TrackCommand),

    /// Follow the aggregated journal view as it changes
    Watch,

    /// Show or update the user profile
    Profile(ProfileCommand),

    /// Export the full dataset to a backup document
    Export(ExportCommand),

    /// Restore a backup document
    Import(ImportCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::Mood;
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "waymark");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_mapping() {
        let cli = Cli::try_parse_from(["waymark", "-q", "stats"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Quiet);

        let cli = Cli::try_parse_from(["waymark", "stats"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Normal);

        let cli = Cli::try_parse_from(["waymark", "-v", "stats"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Verbose);

        let cli = Cli::try_parse_from(["waymark", "-vv", "stats"]).unwrap();
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "waymark", "add", "Harbor walk", "Porto", "--mood", "calm", "--tags", "coast,sunset",
            "--distance", "3.5",
        ])
        .unwrap();
        let Command::Add(cmd) = cli.command else {
            panic!("expected add command");
        };
        assert_eq!(cmd.title, "Harbor walk");
        assert_eq!(cmd.mood, Mood::Calm);
        assert_eq!(cmd.tag_list(), vec!["coast", "sunset"]);
        assert!((cmd.distance - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_add_rejects_unknown_mood() {
        let result = Cli::try_parse_from(["waymark", "add", "t", "l", "--mood", "grumpy"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_add_lat_requires_lon() {
        let result = Cli::try_parse_from(["waymark", "add", "t", "l", "--lat", "48.1"]);
        assert!(result.is_err());

        let cli =
            Cli::try_parse_from(["waymark", "add", "t", "l", "--lat", "48.1", "--lon", "11.5"])
                .unwrap();
        assert!(matches!(cli.command, Command::Add(_)));
    }

    #[test]
    fn test_parse_list_with_filters() {
        let cli = Cli::try_parse_from([
            "waymark", "list", "--year", "2023", "--mood", "excited", "--json",
        ])
        .unwrap();
        let Command::List(cmd) = cli.command else {
            panic!("expected list command");
        };
        assert_eq!(cmd.year, Some(2023));
        assert_eq!(cmd.mood, Some(Mood::Excited));
        assert!(cmd.json);
    }

    #[test]
    fn test_parse_goal_add() {
        let cli = Cli::try_parse_from([
            "waymark", "goal", "add", "Patagonia", "El Chaltén", "--date", "2026-11-01",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Goal(GoalCommand::Add { .. })
        ));
    }

    #[test]
    fn test_parse_track_replay() {
        let cli =
            Cli::try_parse_from(["waymark", "track", "replay", "samples.json"]).unwrap();
        let Command::Track(TrackCommand::Replay { file, interval_ms }) = cli.command else {
            panic!("expected track replay command");
        };
        assert_eq!(file, PathBuf::from("samples.json"));
        assert_eq!(interval_ms, 10);
    }

    #[test]
    fn test_parse_track_points() {
        let cli = Cli::try_parse_from([
            "waymark",
            "track",
            "points",
            "--since",
            "2024-05-01T00:00:00Z",
            "--until",
            "2024-05-02T00:00:00Z",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Track(TrackCommand::Points { .. })
        ));
    }

    #[test]
    fn test_parse_export_import() {
        let cli = Cli::try_parse_from(["waymark", "export", "backup.json"]).unwrap();
        assert!(matches!(cli.command, Command::Export(_)));

        let cli = Cli::try_parse_from(["waymark", "import", "backup.json"]).unwrap();
        assert!(matches!(cli.command, Command::Import(_)));
    }

    #[test]
    fn test_parse_with_config() {
        let cli =
            Cli::try_parse_from(["waymark", "-c", "/custom/config.toml", "stats"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_watch() {
        let cli = Cli::try_parse_from(["waymark", "watch"]).unwrap();
        assert!(matches!(cli.command, Command::Watch));
    }

    #[test]
    fn test_parse_profile() {
        let cli = Cli::try_parse_from(["waymark", "profile"]).unwrap();
        let Command::Profile(cmd) = cli.command else {
            panic!("expected profile command");
        };
        assert!(!cmd.is_update());

        let cli = Cli::try_parse_from([
            "waymark", "profile", "--nickname", "Ada", "--theme", "dark",
        ])
        .unwrap();
        let Command::Profile(cmd) = cli.command else {
            panic!("expected profile command");
        };
        assert!(cmd.is_update());
        assert_eq!(cmd.nickname.as_deref(), Some("Ada"));
        assert_eq!(cmd.theme, Some(crate::prefs::ThemeMode::Dark));
    }
}
