//! Reactive state aggregation.
//!
//! The aggregator combines the journal store, the active filters, and the
//! user preferences into one immutable [`AggregatedView`], recomputed
//! whenever any input changes. The view is the only thing the presentation
//! layer reads; it is always internally consistent because every recompute
//! reads the current value of every input and publishes one value atomically.
//!
//! Output goes through the replay-one multicast in [`shared`]: late joiners
//! immediately receive the latest view, and the pipeline survives brief
//! windows with no subscribers (transient view teardown) before shutting
//! down its upstream subscriptions.

pub mod shared;

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{Datelike, Local};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::analytics::{summarize, Summary};
use crate::config::AggregatorConfig;
use crate::error::Result;
use crate::journal::{Entry, Goal, Mood};
use crate::prefs::{PreferenceStore, Preferences, ThemeMode};
use crate::store::Store;

pub use shared::{Shared, Subscriber};

/// The active entry filters. Derived state, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    /// Keep only entries with this mood, when set.
    pub mood: Option<Mood>,
    /// Free-text search query; blank means no search.
    pub query: String,
    /// Year to browse when not searching.
    pub year: i32,
}

impl FilterState {
    /// A filter with no mood, no query, and the given year.
    #[must_use]
    pub fn for_year(year: i32) -> Self {
        Self {
            mood: None,
            query: String::new(),
            year,
        }
    }

    /// Whether the search query is effectively empty.
    #[must_use]
    pub fn query_is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// The single consistent snapshot consumed by presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedView {
    /// Every entry in the store, most recent date first.
    pub entries: Vec<Entry>,
    /// The entries passing the current filter.
    pub visible_entries: Vec<Entry>,
    /// Every goal in the store.
    pub goals: Vec<Goal>,
    /// Analytics over the full entry list.
    pub summary: Summary,
    /// The filter state this view was computed with.
    pub filter: FilterState,
    /// Theme mode from preferences.
    pub theme: ThemeMode,
    /// Display nickname from preferences.
    pub nickname: String,
    /// Avatar reference from preferences.
    pub avatar: String,
    /// True until the first computation completes. Distinct from "loaded
    /// with zero data."
    pub is_loading: bool,
}

impl AggregatedView {
    /// The placeholder published before any computation completes.
    #[must_use]
    pub fn loading(preferences: &Preferences, year: i32) -> Self {
        Self {
            entries: Vec::new(),
            visible_entries: Vec::new(),
            goals: Vec::new(),
            summary: Summary::default(),
            filter: FilterState::for_year(year),
            theme: preferences.theme,
            nickname: preferences.nickname.clone(),
            avatar: preferences.avatar.clone(),
            is_loading: true,
        }
    }
}

/// Apply the visibility filter to produce the visible entry list.
///
/// Searching is meant to find matches across all time, so a non-blank query
/// disables the year restriction entirely; the mood filter applies either
/// way. The result is always a subset of `entries` and applying the filter
/// twice changes nothing.
#[must_use]
pub fn visible_entries(entries: &[Entry], filter: &FilterState) -> Vec<Entry> {
    let searching = !filter.query_is_blank();
    let query = filter.query.trim().to_lowercase();

    entries
        .iter()
        .filter(|entry| searching || entry.year() == filter.year)
        .filter(|entry| filter.mood.map_or(true, |mood| entry.mood == mood))
        .filter(|entry| {
            if !searching {
                return true;
            }
            entry.title.to_lowercase().contains(&query)
                || entry.location.to_lowercase().contains(&query)
                || entry.has_tag_matching(&query)
        })
        .cloned()
        .collect()
}

/// The reactive state aggregator.
///
/// Owns the filter signals; observes the store and the preference store. A
/// driver task recomputes and multicasts the view while anyone is
/// subscribed, lingers for a grace window when the last subscriber leaves,
/// and is respawned on demand by the next [`Aggregator::subscribe`].
#[derive(Debug)]
pub struct Aggregator {
    store: Arc<Store>,
    prefs: Arc<PreferenceStore>,
    config: AggregatorConfig,
    mood_tx: watch::Sender<Option<Mood>>,
    query_tx: watch::Sender<String>,
    year_tx: watch::Sender<i32>,
    output: Shared<AggregatedView>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl Aggregator {
    /// Create an aggregator over the given store and preferences.
    ///
    /// The year filter starts at the current year, and the output channel is
    /// seeded with the loading placeholder.
    #[must_use]
    pub fn new(store: Arc<Store>, prefs: Arc<PreferenceStore>, config: AggregatorConfig) -> Self {
        let year = Local::now().year();
        let output = Shared::new();
        output.publish(AggregatedView::loading(&prefs.current(), year));

        Self {
            store,
            prefs,
            config,
            mood_tx: watch::Sender::new(None),
            query_tx: watch::Sender::new(String::new()),
            year_tx: watch::Sender::new(year),
            output,
            driver: Mutex::new(None),
        }
    }

    /// Subscribe to the aggregated view stream.
    ///
    /// The subscriber immediately receives the most recently computed view
    /// (or the loading placeholder), then every subsequent recompute. The
    /// driver task is started if it is not already running.
    #[must_use]
    pub fn subscribe(&self) -> Subscriber<AggregatedView> {
        let subscriber = self.output.subscribe();
        self.ensure_driver();
        subscriber
    }

    /// The most recently published view.
    #[must_use]
    pub fn latest_view(&self) -> Option<AggregatedView> {
        self.output.latest()
    }

    /// The current filter state.
    #[must_use]
    pub fn current_filter(&self) -> FilterState {
        FilterState {
            mood: *self.mood_tx.borrow(),
            query: self.query_tx.borrow().clone(),
            year: *self.year_tx.borrow(),
        }
    }

    /// Toggle the mood filter: selecting the active mood clears it.
    pub fn toggle_mood(&self, mood: Mood) {
        self.mood_tx.send_modify(|current| {
            *current = if *current == Some(mood) {
                None
            } else {
                Some(mood)
            };
        });
    }

    /// Replace the search query.
    pub fn set_search(&self, query: impl Into<String>) {
        self.query_tx.send_replace(query.into());
    }

    /// Move the year filter by `delta`, clamped to the configured range.
    pub fn shift_year(&self, delta: i32) {
        let (min, max) = self.year_bounds();
        self.year_tx
            .send_modify(|year| *year = (*year + delta).clamp(min, max));
    }

    /// Set the year filter directly, clamped to the configured range.
    pub fn set_year(&self, year: i32) {
        let (min, max) = self.year_bounds();
        self.year_tx.send_replace(year.clamp(min, max));
    }

    fn year_bounds(&self) -> (i32, i32) {
        (
            self.config.year_min,
            Local::now().year() + self.config.year_horizon,
        )
    }

    /// Compute one view from the current value of every input.
    fn compute(
        store: &Store,
        preferences: &Preferences,
        filter: &FilterState,
    ) -> Result<AggregatedView> {
        let (entries, goals) = store.snapshot()?;
        let visible = visible_entries(&entries, filter);
        let summary = summarize(&entries);
        Ok(AggregatedView {
            visible_entries: visible,
            goals,
            summary,
            filter: filter.clone(),
            theme: preferences.theme,
            nickname: preferences.nickname.clone(),
            avatar: preferences.avatar.clone(),
            is_loading: false,
            entries,
        })
    }

    /// Spawn the driver task unless one is already running.
    fn ensure_driver(&self) {
        let mut driver = self.driver.lock().unwrap_or_else(PoisonError::into_inner);
        if driver.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let store = Arc::clone(&self.store);
        let prefs = Arc::clone(&self.prefs);
        let output = self.output.clone();
        let grace = self.config.grace_window();
        let mood_rx = self.mood_tx.subscribe();
        let query_rx = self.query_tx.subscribe();
        let year_rx = self.year_tx.subscribe();

        *driver = Some(tokio::spawn(async move {
            drive(store, prefs, output, grace, mood_rx, query_rx, year_rx).await;
        }));
    }
}

/// The aggregation driver loop.
///
/// Recomputes and publishes on entry, then waits for any input to change.
/// When the last subscriber disconnects it lingers for the grace window; a
/// resubscription within the window reuses this pipeline, otherwise the loop
/// exits and drops its upstream subscriptions.
async fn drive(
    store: Arc<Store>,
    prefs: Arc<PreferenceStore>,
    output: Shared<AggregatedView>,
    grace: std::time::Duration,
    mut mood_rx: watch::Receiver<Option<Mood>>,
    mut query_rx: watch::Receiver<String>,
    mut year_rx: watch::Receiver<i32>,
) {
    let mut store_rx = store.watch();
    let mut prefs_rx = prefs.watch();
    debug!("aggregation driver started");

    loop {
        let filter = FilterState {
            mood: *mood_rx.borrow_and_update(),
            query: query_rx.borrow_and_update().clone(),
            year: *year_rx.borrow_and_update(),
        };
        let preferences = prefs_rx.borrow_and_update().clone();
        store_rx.mark_unchanged();

        match Aggregator::compute(&store, &preferences, &filter) {
            Ok(view) => output.publish(view),
            // Store I/O failures never terminate the pipeline; keep
            // observing and retry on the next change.
            Err(e) => warn!("aggregation recompute failed: {e}"),
        }

        tokio::select! {
            changed = store_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                trace!("store changed");
            }
            changed = prefs_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                trace!("preferences changed");
            }
            changed = mood_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                trace!("mood filter changed");
            }
            changed = query_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                trace!("search query changed");
            }
            changed = year_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                trace!("year filter changed");
            }
            () = output.idle() => {
                debug!("last subscriber disconnected; lingering for grace window");
                tokio::select! {
                    () = output.rejoined() => {
                        trace!("subscriber returned within grace window");
                    }
                    () = tokio::time::sleep(grace) => {
                        if output.subscriber_count() == 0 {
                            debug!("grace window elapsed; tearing down pipeline");
                            break;
                        }
                    }
                }
            }
        }
    }
    debug!("aggregation driver stopped");
}
