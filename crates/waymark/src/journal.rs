//! Core journal types for waymark.
//!
//! This module defines the fundamental data structures for representing
//! logged footprint entries and travel goals.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lowest energy level an entry may carry.
pub const ENERGY_MIN: u8 = 1;

/// Highest energy level an entry may carry.
pub const ENERGY_MAX: u8 = 10;

/// Highest progress percentage a goal may carry.
pub const PROGRESS_MAX: u8 = 100;

/// The mood attached to a footprint entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Buzzing, couldn't sit still.
    Excited,
    /// A good day.
    Happy,
    /// Quiet and content.
    Calm,
    /// Somewhere that brought back memories.
    Nostalgic,
    /// Worn out, worth it anyway.
    Tired,
}

impl Mood {
    /// All moods, in display order.
    pub const ALL: [Mood; 5] = [
        Self::Excited,
        Self::Happy,
        Self::Calm,
        Self::Nostalgic,
        Self::Tired,
    ];
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Excited => write!(f, "excited"),
            Self::Happy => write!(f, "happy"),
            Self::Calm => write!(f, "calm"),
            Self::Nostalgic => write!(f, "nostalgic"),
            Self::Tired => write!(f, "tired"),
        }
    }
}

impl std::str::FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "excited" => Ok(Self::Excited),
            "happy" => Ok(Self::Happy),
            "calm" => Ok(Self::Calm),
            "nostalgic" => Ok(Self::Nostalgic),
            "tired" => Ok(Self::Tired),
            other => Err(format!("unknown mood: {other}")),
        }
    }
}

/// One logged footprint entry.
///
/// Invariants are enforced by clamping rather than rejection: `energy` always
/// lands in `1..=10`, `distance_km` is never negative, and coordinates are
/// either both present or both absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier for this entry (assigned by the store).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Short title of the footprint.
    pub title: String,

    /// Human-readable location name.
    pub location: String,

    /// Free-text story and impressions.
    pub detail: String,

    /// Mood when this footprint was logged.
    pub mood: Mood,

    /// Tags for searching; matching is case-insensitive.
    pub tags: Vec<String>,

    /// Distance travelled, in kilometers. Never negative.
    pub distance_km: f64,

    /// References to stored photos, in display order.
    pub photos: Vec<String>,

    /// Energy level, clamped to `1..=10`.
    pub energy: u8,

    /// The calendar date this footprint happened on.
    pub happened_on: NaiveDate,

    /// Latitude, present only together with `longitude`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Longitude, present only together with `latitude`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl Entry {
    /// Create a new entry, normalizing all invariant fields.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        location: impl Into<String>,
        detail: impl Into<String>,
        mood: Mood,
        tags: Vec<String>,
        distance_km: f64,
        photos: Vec<String>,
        energy: u8,
        happened_on: NaiveDate,
        coordinates: Option<(f64, f64)>,
    ) -> Self {
        let (latitude, longitude) = match coordinates {
            Some((lat, lon)) => (Some(lat), Some(lon)),
            None => (None, None),
        };
        Self {
            id: None,
            title: title.into(),
            location: location.into(),
            detail: detail.into(),
            mood,
            tags,
            distance_km,
            photos,
            energy,
            happened_on,
            latitude,
            longitude,
        }
        .normalized()
    }

    /// Return this entry with all clamp invariants applied.
    ///
    /// Energy is clamped to `1..=10`, distance to non-negative, and a
    /// half-present coordinate pair is dropped entirely.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.energy = self.energy.clamp(ENERGY_MIN, ENERGY_MAX);
        if !self.distance_km.is_finite() || self.distance_km < 0.0 {
            self.distance_km = 0.0;
        }
        if self.latitude.is_some() != self.longitude.is_some() {
            self.latitude = None;
            self.longitude = None;
        }
        self
    }

    /// The coordinate pair, if both halves are present.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// The calendar year this entry happened in.
    #[must_use]
    pub fn year(&self) -> i32 {
        use chrono::Datelike;
        self.happened_on.year()
    }

    /// Check whether any tag matches `needle`, case-insensitively.
    #[must_use]
    pub fn has_tag_matching(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

/// A planned future travel objective.
///
/// `completed` and `progress` are independent: finishing a goal does not force
/// progress to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier for this goal (assigned by the store).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Short title of the goal.
    pub title: String,

    /// Where this goal points to.
    pub target_location: String,

    /// When the goal should be reached.
    pub target_date: NaiveDate,

    /// Free-text notes.
    pub notes: String,

    /// Whether the goal has been completed.
    pub completed: bool,

    /// Progress percentage, clamped to `0..=100`.
    pub progress: u8,
}

impl Goal {
    /// Create a new goal, normalizing invariant fields.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        target_location: impl Into<String>,
        target_date: NaiveDate,
        notes: impl Into<String>,
        progress: u8,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            target_location: target_location.into(),
            target_date,
            notes: notes.into(),
            completed: false,
            progress,
        }
        .normalized()
    }

    /// Return this goal with the progress clamp applied.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.progress = self.progress.min(PROGRESS_MAX);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_entry() -> Entry {
        Entry::new(
            "West lake loop",
            "Hangzhou",
            "Rained the whole afternoon.",
            Mood::Calm,
            vec!["lake".to_string(), "Cycling".to_string()],
            23.5,
            vec!["p1.jpg".to_string()],
            7,
            date(2024, 4, 2),
            Some((30.25, 120.15)),
        )
    }

    #[test]
    fn test_mood_display_roundtrip() {
        for mood in Mood::ALL {
            let parsed: Mood = mood.to_string().parse().unwrap();
            assert_eq!(parsed, mood);
        }
    }

    #[test]
    fn test_mood_from_str_unknown() {
        assert!("grumpy".parse::<Mood>().is_err());
    }

    #[test]
    fn test_mood_serde_stable_names() {
        let json = serde_json::to_string(&Mood::Nostalgic).unwrap();
        assert_eq!(json, "\"nostalgic\"");
        let back: Mood = serde_json::from_str("\"excited\"").unwrap();
        assert_eq!(back, Mood::Excited);
    }

    #[test]
    fn test_entry_new() {
        let entry = sample_entry();
        assert!(entry.id.is_none());
        assert_eq!(entry.energy, 7);
        assert_eq!(entry.year(), 2024);
        assert_eq!(entry.coordinates(), Some((30.25, 120.15)));
    }

    #[test]
    fn test_entry_energy_clamped() {
        let mut entry = sample_entry();
        entry.energy = 0;
        assert_eq!(entry.normalized().energy, ENERGY_MIN);

        let mut entry = sample_entry();
        entry.energy = 99;
        assert_eq!(entry.normalized().energy, ENERGY_MAX);
    }

    #[test]
    fn test_entry_distance_clamped() {
        let mut entry = sample_entry();
        entry.distance_km = -3.0;
        assert!((entry.normalized().distance_km - 0.0).abs() < f64::EPSILON);

        let mut entry = sample_entry();
        entry.distance_km = f64::NAN;
        assert!((entry.normalized().distance_km - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_entry_half_coordinates_dropped() {
        let mut entry = sample_entry();
        entry.longitude = None;
        let entry = entry.normalized();
        assert!(entry.latitude.is_none());
        assert!(entry.coordinates().is_none());
    }

    #[test]
    fn test_entry_tag_matching_case_insensitive() {
        let entry = sample_entry();
        assert!(entry.has_tag_matching("cycl"));
        assert!(entry.has_tag_matching("LAKE"));
        assert!(!entry.has_tag_matching("mountain"));
    }

    #[test]
    fn test_entry_serde_roundtrip() {
        let entry = sample_entry();
        let json = serde_json::to_string(&entry).unwrap();
        let back: Entry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }

    #[test]
    fn test_goal_progress_clamped() {
        let goal = Goal::new("See the aurora", "Tromsø", date(2027, 1, 15), "", 150);
        assert_eq!(goal.progress, PROGRESS_MAX);
    }

    #[test]
    fn test_goal_completed_independent_of_progress() {
        let mut goal = Goal::new("Walk the Camino", "Santiago", date(2026, 9, 1), "", 40);
        goal.completed = true;
        let goal = goal.normalized();
        assert!(goal.completed);
        assert_eq!(goal.progress, 40);
    }

    #[test]
    fn test_goal_serde_roundtrip() {
        let goal = Goal::new("Ride the steppe", "Mongolia", date(2026, 6, 20), "dry season", 5);
        let json = serde_json::to_string(&goal).unwrap();
        let back: Goal = serde_json::from_str(&json).unwrap();
        assert_eq!(goal, back);
    }
}
