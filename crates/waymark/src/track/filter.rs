//! Acceptance filter for raw location samples.
//!
//! Every sample a location source emits passes through this filter before it
//! may join a session path. The filter is pure and synchronous: GPS callbacks
//! must never wait on storage or channel backpressure to learn a verdict.

use tracing::trace;

use crate::config::TrackingConfig;

use super::{RawSample, TrackPoint};

/// Why a sample was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Coordinates missing, non-finite, or outside valid ranges.
    Malformed,
    /// Reported accuracy radius above the configured cutoff.
    Inaccurate,
    /// Timestamp not strictly greater than the last accepted point's.
    Stale,
    /// Too close to the last accepted point with no silence gap elapsed.
    TooClose,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed"),
            Self::Inaccurate => write!(f, "inaccurate"),
            Self::Stale => write!(f, "stale"),
            Self::TooClose => write!(f, "too_close"),
        }
    }
}

/// The filter's verdict on one sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The sample passed every check; append this point to the path.
    Accepted(TrackPoint),
    /// The sample was dropped for the given reason.
    Rejected(RejectReason),
}

/// Noise and redundancy filter for location samples.
///
/// Thresholds come from [`TrackingConfig`]; they are tuning knobs, not part
/// of the acceptance contract.
#[derive(Debug, Clone)]
pub struct SampleFilter {
    config: TrackingConfig,
}

impl SampleFilter {
    /// Create a filter with the given thresholds.
    #[must_use]
    pub fn new(config: TrackingConfig) -> Self {
        Self { config }
    }

    /// Assess one raw sample against the last accepted point.
    ///
    /// Checks run cheapest-first: shape, accuracy, timestamp ordering, then
    /// the distance/silence gate. The first failing check decides the
    /// verdict.
    #[must_use]
    pub fn assess(&self, sample: &RawSample, last: Option<&TrackPoint>) -> Verdict {
        let (Some(latitude), Some(longitude)) = (sample.latitude, sample.longitude) else {
            return Verdict::Rejected(RejectReason::Malformed);
        };
        if !latitude.is_finite()
            || !longitude.is_finite()
            || latitude.abs() > 90.0
            || longitude.abs() > 180.0
        {
            return Verdict::Rejected(RejectReason::Malformed);
        }

        if let Some(accuracy) = sample.accuracy_m {
            if !accuracy.is_finite() || accuracy > self.config.max_accuracy_m {
                trace!(accuracy, "sample rejected for accuracy");
                return Verdict::Rejected(RejectReason::Inaccurate);
            }
        }

        let point = TrackPoint {
            timestamp: sample.timestamp,
            latitude,
            longitude,
            accuracy_m: sample.accuracy_m,
        };

        let Some(last) = last else {
            return Verdict::Accepted(point);
        };

        if point.timestamp <= last.timestamp {
            return Verdict::Rejected(RejectReason::Stale);
        }

        let moved_m = haversine_m(last.latitude, last.longitude, latitude, longitude);
        let elapsed = point.timestamp - last.timestamp;
        let silence_elapsed = elapsed
            .to_std()
            .is_ok_and(|elapsed| elapsed > self.config.max_silence());

        if moved_m < self.config.min_distance_m && !silence_elapsed {
            trace!(moved_m, "sample rejected as redundant");
            return Verdict::Rejected(RejectReason::TooClose);
        }

        Verdict::Accepted(point)
    }
}

/// Haversine distance between two coordinates, in meters.
#[must_use]
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    use geo::{Distance, Haversine, Point};
    Haversine::distance(Point::new(lon1, lat1), Point::new(lon2, lat2))
}
