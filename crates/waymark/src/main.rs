//! `waymark` - CLI for the travel journal core
//!
//! This binary provides the command-line interface for logging footprints,
//! replaying GPS tracks, browsing the journal, and backup/restore.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{Datelike, Local};
use clap::Parser;
use tokio::sync::mpsc;

use waymark::aggregate::{visible_entries, Aggregator, FilterState};
use waymark::analytics::summarize;
use waymark::backup;
use waymark::cli::{
    AddCommand, Cli, Command, ConfigCommand, GoalCommand, ListCommand, ProfileCommand,
    TrackCommand,
};
use waymark::journal::{Entry, Goal};
use waymark::prefs::PreferenceStore;
use waymark::store::Store;
use waymark::track::{pump, LocationSource, Recorder, ReplaySource};
use waymark::{init_logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Add(cmd) => handle_add(&config, &cmd),
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Stats(cmd) => handle_stats(&config, cmd.json),
        Command::Goal(cmd) => handle_goal(&config, &cmd),
        Command::Track(cmd) => handle_track(&config, cmd).await,
        Command::Watch => handle_watch(&config).await,
        Command::Profile(cmd) => handle_profile(&config, cmd),
        Command::Export(cmd) => handle_export(&config, &cmd.file),
        Command::Import(cmd) => handle_import(&config, &cmd.file),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<Arc<Store>> {
    let path = config.database_path();
    let store = Store::open(&path)
        .with_context(|| format!("opening journal store at {}", path.display()))?;
    Ok(Arc::new(store))
}

fn open_prefs(config: &Config) -> anyhow::Result<Arc<PreferenceStore>> {
    let path = config.preferences_path();
    let prefs = PreferenceStore::open(&path)
        .with_context(|| format!("opening preferences at {}", path.display()))?;
    Ok(Arc::new(prefs))
}

fn handle_add(config: &Config, cmd: &AddCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;

    let coordinates = match (cmd.lat, cmd.lon) {
        (Some(lat), Some(lon)) => Some((lat, lon)),
        _ => None,
    };
    let entry = Entry::new(
        cmd.title.clone(),
        cmd.location.clone(),
        cmd.detail.clone(),
        cmd.mood,
        cmd.tag_list(),
        cmd.distance,
        Vec::new(),
        cmd.energy,
        cmd.date.unwrap_or_else(|| Local::now().date_naive()),
        coordinates,
    );

    let id = store.upsert_entry(&entry)?;
    println!("Added entry {id}: {} ({})", entry.title, entry.mood);
    Ok(())
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let entries = store.entries()?;

    let filter = FilterState {
        mood: cmd.mood,
        query: cmd.query.clone().unwrap_or_default(),
        year: cmd.year.unwrap_or_else(|| Local::now().year()),
    };
    let visible = visible_entries(&entries, &filter);

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&visible)?);
        return Ok(());
    }

    if visible.is_empty() {
        println!("No entries match.");
        return Ok(());
    }
    for entry in &visible {
        let id = entry.id.unwrap_or_default();
        let mood = entry.mood.to_string();
        println!(
            "{:>4}  {}  {:<9} {:>6.1} km  {} | {}",
            id, entry.happened_on, mood, entry.distance_km, entry.title, entry.location,
        );
    }
    println!("{} of {} entries shown", visible.len(), entries.len());
    Ok(())
}

fn handle_stats(config: &Config, json: bool) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let entries = store.entries()?;
    let summary = summarize(&entries);
    let stats = store.stats()?;

    if json {
        let value = serde_json::json!({
            "total_entries": summary.total_entries,
            "total_distance_km": summary.total_distance_km,
            "mood_counts": summary
                .mood_counts
                .iter()
                .map(|(mood, count)| (mood.to_string(), *count))
                .collect::<std::collections::BTreeMap<_, _>>(),
            "entries_per_year": summary.entries_per_year,
            "longest_streak_days": summary.longest_streak_days,
            "goals": stats.goal_count,
            "trips": stats.trip_count,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Journal statistics");
    println!("------------------");
    println!("Entries:         {}", summary.total_entries);
    println!("Total distance:  {:.1} km", summary.total_distance_km);
    println!("Longest streak:  {} days", summary.longest_streak_days);
    println!("Goals:           {}", stats.goal_count);
    println!("Trips:           {}", stats.trip_count);
    if let Some(mood) = summary.dominant_mood() {
        println!("Dominant mood:   {mood}");
    }
    if !summary.entries_per_year.is_empty() {
        println!();
        println!("Per year:");
        for (year, count) in &summary.entries_per_year {
            println!("  {year}: {count}");
        }
    }
    Ok(())
}

fn handle_goal(config: &Config, cmd: &GoalCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    match cmd {
        GoalCommand::Add {
            title,
            location,
            date,
            notes,
        } => {
            // New goals start with a sliver of progress
            let goal = Goal::new(title.clone(), location.clone(), *date, notes.clone(), 5);
            let id = store.upsert_goal(&goal)?;
            println!("Added goal {id}: {title}");
        }
        GoalCommand::List { json } => {
            let goals = store.goals()?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&goals)?);
            } else if goals.is_empty() {
                println!("No goals yet.");
            } else {
                for goal in &goals {
                    let mark = if goal.completed { "x" } else { " " };
                    println!(
                        "{:>4}  [{}] {:>3}%  {}  {} | {}",
                        goal.id.unwrap_or_default(),
                        mark,
                        goal.progress,
                        goal.target_date,
                        goal.title,
                        goal.target_location,
                    );
                }
            }
        }
        GoalCommand::Done { id } => {
            let mut goal = find_goal(&store, *id)?;
            goal.completed = !goal.completed;
            store.upsert_goal(&goal)?;
            let state = if goal.completed { "completed" } else { "reopened" };
            println!("Goal {id} {state}: {}", goal.title);
        }
        GoalCommand::Progress { id, percent } => {
            let mut goal = find_goal(&store, *id)?;
            goal.progress = *percent;
            let goal = goal.normalized();
            store.upsert_goal(&goal)?;
            println!("Goal {id} progress set to {}%", goal.progress);
        }
    }
    Ok(())
}

fn find_goal(store: &Store, id: i64) -> anyhow::Result<Goal> {
    store
        .goals()?
        .into_iter()
        .find(|goal| goal.id == Some(id))
        .with_context(|| format!("no goal with id {id}"))
}

async fn handle_track(config: &Config, cmd: TrackCommand) -> anyhow::Result<()> {
    let store = open_store(config)?;
    match cmd {
        TrackCommand::Replay { file, interval_ms } => {
            let mut source = ReplaySource::from_path(&file, Duration::from_millis(interval_ms))
                .with_context(|| format!("loading samples from {}", file.display()))?;
            println!("Replaying {} samples...", source.len());

            let recorder = Recorder::new(config.tracking.clone(), Arc::clone(&store));
            recorder.start();

            let (tx, rx) = mpsc::channel(config.tracking.sample_channel_capacity);
            source.start(tx).await?;
            pump(&recorder, rx).await;

            let stats = recorder.stats();
            let trip = recorder.stop()?;
            println!(
                "Accepted {} samples, rejected {} (malformed {}, inaccurate {}, stale {}, redundant {})",
                stats.accepted,
                stats.total_rejected(),
                stats.malformed,
                stats.inaccurate,
                stats.stale,
                stats.too_close,
            );
            match trip {
                Some(trip) => println!(
                    "Trip {} saved: {:.2} km over {}s with {} points",
                    trip.id.unwrap_or_default(),
                    trip.distance_km,
                    trip.duration().num_seconds(),
                    trip.points.len(),
                ),
                None => println!("No points accepted; nothing saved."),
            }
        }
        TrackCommand::Points { since, until, json } => {
            let points = store.track_points_between(since, until)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else if points.is_empty() {
                println!("No track points in range.");
            } else {
                for point in &points {
                    println!(
                        "{}  {:>10.5}, {:>11.5}",
                        point.timestamp, point.latitude, point.longitude
                    );
                }
                println!("{} points", points.len());
            }
        }
    }
    Ok(())
}

async fn handle_watch(config: &Config) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let prefs = open_prefs(config)?;
    let aggregator = Aggregator::new(store, prefs, config.aggregator.clone());

    println!("Watching the journal; press Ctrl-C to stop.");
    let mut subscriber = aggregator.subscribe();
    while let Some(view) = subscriber.recv().await {
        if view.is_loading {
            println!("(loading)");
            continue;
        }
        println!(
            "{} entries ({} visible), {} goals, {:.1} km total [filter: year {}{}{}]",
            view.entries.len(),
            view.visible_entries.len(),
            view.goals.len(),
            view.summary.total_distance_km,
            view.filter.year,
            view.filter
                .mood
                .map(|mood| format!(", mood {mood}"))
                .unwrap_or_default(),
            if view.filter.query_is_blank() {
                String::new()
            } else {
                format!(", query \"{}\"", view.filter.query.trim())
            },
        );
    }
    Ok(())
}

fn handle_profile(config: &Config, cmd: ProfileCommand) -> anyhow::Result<()> {
    let prefs = open_prefs(config)?;

    if cmd.is_update() {
        let current = prefs.current();
        prefs.set_profile(
            cmd.nickname.unwrap_or(current.nickname),
            cmd.avatar.unwrap_or(current.avatar),
        )?;
        if let Some(theme) = cmd.theme {
            prefs.set_theme(theme)?;
        }
    }

    let current = prefs.current();
    println!("Nickname: {}", current.nickname);
    println!("Avatar:   {}", current.avatar);
    println!("Theme:    {}", current.theme);
    Ok(())
}

fn handle_export(config: &Config, file: &std::path::Path) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let prefs = open_prefs(config)?;

    let document = backup::export(&store, &prefs)?;
    let json = backup::to_json(&document)?;
    std::fs::write(file, json)
        .with_context(|| format!("writing backup to {}", file.display()))?;
    println!(
        "Exported {} entries and {} goals to {}",
        document.entries.len(),
        document.goals.len(),
        file.display(),
    );
    Ok(())
}

fn handle_import(config: &Config, file: &std::path::Path) -> anyhow::Result<()> {
    let store = open_store(config)?;
    let prefs = open_prefs(config)?;

    let json = std::fs::read_to_string(file)
        .with_context(|| format!("reading backup from {}", file.display()))?;
    let stats = backup::import(&store, &prefs, &json)?;
    println!(
        "Imported {} entries and {} goals from {}",
        stats.entries,
        stats.goals,
        file.display(),
    );
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:    {}", config.database_path().display());
                println!("  Preferences path: {}", config.preferences_path().display());
                println!();
                println!("[Tracking]");
                println!("  Max accuracy:     {} m", config.tracking.max_accuracy_m);
                println!("  Min distance:     {} m", config.tracking.min_distance_m);
                println!("  Max silence:      {} s", config.tracking.max_silence_secs);
                println!();
                println!("[Aggregator]");
                println!("  Grace window:     {} ms", config.aggregator.grace_ms);
                println!(
                    "  Year range:       {}..current+{}",
                    config.aggregator.year_min, config.aggregator.year_horizon
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
