//! Continuous location tracking.
//!
//! This module owns the tracking lifecycle: a [`Recorder`] ingests raw
//! samples from a [`LocationSource`], filters noise, accumulates an ordered
//! path, and on stop finalizes the session into a persisted [`Trip`].
//!
//! Exactly one session may be active at a time, enforced by the recorder's
//! own state rather than any global. Sample acceptance is synchronous and
//! never touches storage; the only storage access is the trip flush in
//! [`Recorder::stop`].

pub mod filter;
pub mod source;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace};

use crate::config::TrackingConfig;
use crate::error::Result;
use crate::store::Store;

pub use filter::{RejectReason, SampleFilter, Verdict};
pub use source::{LocationSource, ReplaySource};

/// A raw sample as emitted by location hardware.
///
/// Coordinates are optional because hardware is unreliable; samples with
/// missing or invalid coordinates are dropped silently and counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Reported latitude, if any.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Reported longitude, if any.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Reported accuracy radius in meters, if any.
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    /// When the sample was taken.
    pub timestamp: DateTime<Utc>,
}

/// One accepted GPS point within a session.
///
/// Timestamps are strictly increasing within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    /// When the point was recorded.
    pub timestamp: DateTime<Utc>,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Reported accuracy radius in meters, if known.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub accuracy_m: Option<f64>,
}

/// A finalized tracking session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Unique identifier for this trip (assigned by the store).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    /// Timestamp of the first accepted point.
    pub started_at: DateTime<Utc>,
    /// Timestamp of the last accepted point.
    pub ended_at: DateTime<Utc>,
    /// Total haversine distance over the path, in kilometers.
    pub distance_km: f64,
    /// The ordered point sequence.
    pub points: Vec<TrackPoint>,
}

impl Trip {
    /// Duration between the first and last accepted point.
    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.ended_at - self.started_at
    }
}

/// Whether a tracking session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    /// No session is active; samples are ignored.
    #[default]
    Idle,
    /// A session is active and accepting samples.
    Active,
}

impl std::fmt::Display for TrackingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Counters describing what happened to ingested samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    /// Samples accepted into the path.
    pub accepted: u64,
    /// Samples with missing or invalid coordinates.
    pub malformed: u64,
    /// Samples rejected for poor accuracy.
    pub inaccurate: u64,
    /// Samples rejected for non-increasing timestamps.
    pub stale: u64,
    /// Samples rejected by the distance/silence gate.
    pub too_close: u64,
    /// Samples that arrived while no session was active.
    pub while_idle: u64,
}

impl TrackerStats {
    /// Total number of rejected samples, for any reason.
    #[must_use]
    pub fn total_rejected(&self) -> u64 {
        self.malformed + self.inaccurate + self.stale + self.too_close + self.while_idle
    }
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    malformed: AtomicU64,
    inaccurate: AtomicU64,
    stale: AtomicU64,
    too_close: AtomicU64,
    while_idle: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> TrackerStats {
        TrackerStats {
            accepted: self.accepted.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            inaccurate: self.inaccurate.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            too_close: self.too_close.load(Ordering::Relaxed),
            while_idle: self.while_idle.load(Ordering::Relaxed),
        }
    }

    fn count(&self, reason: RejectReason) {
        let counter = match reason {
            RejectReason::Malformed => &self.malformed,
            RejectReason::Inaccurate => &self.inaccurate,
            RejectReason::Stale => &self.stale,
            RejectReason::TooClose => &self.too_close,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// State held only while a session is active.
#[derive(Debug)]
struct Session {
    /// Last accepted point; the filter's reference for the next verdict.
    last: Option<TrackPoint>,
    /// Running haversine total over accepted points, in meters.
    distance_m: f64,
}

/// The continuous location recorder.
///
/// Owns the single process-wide tracking session and the observable tracking
/// signals. All signals are `watch` channels, so a new observer immediately
/// sees the latest known value.
#[derive(Debug)]
pub struct Recorder {
    filter: SampleFilter,
    store: Arc<Store>,
    session: Mutex<Option<Session>>,
    state_tx: watch::Sender<TrackingState>,
    location_tx: watch::Sender<Option<TrackPoint>>,
    path_tx: watch::Sender<Vec<TrackPoint>>,
    counters: Counters,
}

impl Recorder {
    /// Create a recorder flushing finalized trips into the given store.
    #[must_use]
    pub fn new(config: TrackingConfig, store: Arc<Store>) -> Self {
        Self {
            filter: SampleFilter::new(config),
            store,
            session: Mutex::new(None),
            state_tx: watch::Sender::new(TrackingState::Idle),
            location_tx: watch::Sender::new(None),
            path_tx: watch::Sender::new(Vec::new()),
            counters: Counters::default(),
        }
    }

    /// Start a tracking session.
    ///
    /// Idempotent: starting while already active keeps the existing session
    /// and its path untouched.
    pub fn start(&self) {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if session.is_some() {
            debug!("start() while already active; keeping existing session");
            return;
        }
        *session = Some(Session {
            last: None,
            distance_m: 0.0,
        });
        self.path_tx.send_replace(Vec::new());
        self.location_tx.send_replace(None);
        self.state_tx.send_replace(TrackingState::Active);
        info!("tracking session started");
    }

    /// Stop the active session and persist the finalized trip.
    ///
    /// The state flips to Idle immediately; the trip write completes before
    /// this returns. A session with no accepted points is discarded without
    /// error. Stopping while Idle is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the trip write fails; the session is still closed.
    pub fn stop(&self) -> Result<Option<Trip>> {
        // State flip and path capture happen under the session lock so a
        // racing start() or ingest() cannot interleave with a half-closed
        // session.
        let (session, points) = {
            let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(session) = guard.take() else {
                debug!("stop() while idle; nothing to do");
                return Ok(None);
            };
            self.state_tx.send_replace(TrackingState::Idle);
            let points = self.path_tx.send_replace(Vec::new());
            self.location_tx.send_replace(None);
            (session, points)
        };

        let (Some(first), Some(last)) = (points.first(), points.last()) else {
            info!("tracking session stopped with no accepted points; discarding");
            return Ok(None);
        };

        let mut trip = Trip {
            id: None,
            started_at: first.timestamp,
            ended_at: last.timestamp,
            distance_km: session.distance_m / 1_000.0,
            points,
        };
        let id = self.store.insert_trip(&trip)?;
        trip.id = Some(id);
        info!(
            trip_id = id,
            points = trip.points.len(),
            distance_km = trip.distance_km,
            "tracking session finalized"
        );
        Ok(Some(trip))
    }

    /// Ingest one raw sample.
    ///
    /// Synchronous and non-blocking: never touches storage. While Idle the
    /// sample is ignored. Returns the accepted point, if any; rejections are
    /// counted, never surfaced as errors.
    pub fn ingest(&self, sample: &RawSample) -> Option<TrackPoint> {
        let mut guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(session) = guard.as_mut() else {
            self.counters.while_idle.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        match self.filter.assess(sample, session.last.as_ref()) {
            Verdict::Rejected(reason) => {
                trace!(%reason, "sample rejected");
                self.counters.count(reason);
                None
            }
            Verdict::Accepted(point) => {
                if let Some(last) = &session.last {
                    session.distance_m += filter::haversine_m(
                        last.latitude,
                        last.longitude,
                        point.latitude,
                        point.longitude,
                    );
                }
                session.last = Some(point.clone());
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);

                // Signals update synchronously with acceptance, still under
                // the session lock so the path stays timestamp-ordered.
                self.path_tx.send_modify(|path| path.push(point.clone()));
                self.location_tx.send_replace(Some(point.clone()));
                Some(point)
            }
        }
    }

    /// Subscribe to the tracking state signal.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<TrackingState> {
        self.state_tx.subscribe()
    }

    /// Current tracking state.
    #[must_use]
    pub fn current_state(&self) -> TrackingState {
        *self.state_tx.borrow()
    }

    /// Subscribe to the latest accepted location signal.
    #[must_use]
    pub fn location(&self) -> watch::Receiver<Option<TrackPoint>> {
        self.location_tx.subscribe()
    }

    /// Subscribe to the live path-so-far signal.
    #[must_use]
    pub fn path(&self) -> watch::Receiver<Vec<TrackPoint>> {
        self.path_tx.subscribe()
    }

    /// Snapshot of the ingest counters.
    #[must_use]
    pub fn stats(&self) -> TrackerStats {
        self.counters.snapshot()
    }
}

/// Forward samples from a source channel into the recorder until the channel
/// closes.
///
/// Storage latency never blocks this path: ingestion is synchronous and the
/// trip flush only happens in [`Recorder::stop`], after the pump is done.
pub async fn pump(recorder: &Recorder, mut rx: mpsc::Receiver<RawSample>) {
    while let Some(sample) = rx.recv().await {
        recorder.ingest(&sample);
    }
    debug!("sample channel closed, pump finished");
}
