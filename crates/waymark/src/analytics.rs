//! Journal analytics.
//!
//! Pure summary statistics over footprint entries. `summarize` is
//! deterministic, side-effect-free, and insensitive to input order, so the
//! aggregator can recompute it on every tick without memoization.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;

use crate::journal::{Entry, Mood};

/// Summary statistics over a set of entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// Total number of entries.
    pub total_entries: usize,
    /// Sum of all entry distances, in kilometers.
    pub total_distance_km: f64,
    /// Number of entries per mood. Moods with no entries are absent.
    pub mood_counts: HashMap<Mood, usize>,
    /// Number of entries per calendar year, ordered by year.
    pub entries_per_year: BTreeMap<i32, usize>,
    /// Longest run of consecutive calendar days with at least one entry.
    pub longest_streak_days: usize,
}

impl Summary {
    /// The mood logged most often, if any entries exist.
    ///
    /// Ties break toward the mood earlier in [`Mood::ALL`] so the result is
    /// deterministic regardless of input order.
    #[must_use]
    pub fn dominant_mood(&self) -> Option<Mood> {
        // max_by_key keeps the last maximum, so walk ALL in reverse.
        Mood::ALL
            .iter()
            .rev()
            .copied()
            .filter(|mood| self.mood_counts.contains_key(mood))
            .max_by_key(|mood| self.mood_counts.get(mood).copied().unwrap_or(0))
    }
}

/// Compute summary statistics for the given entries.
///
/// Runs in time linear in the number of entries. An empty slice yields a
/// zero-valued summary.
#[must_use]
pub fn summarize(entries: &[Entry]) -> Summary {
    let mut summary = Summary {
        total_entries: entries.len(),
        ..Summary::default()
    };

    let mut days: HashSet<NaiveDate> = HashSet::with_capacity(entries.len());
    for entry in entries {
        summary.total_distance_km += entry.distance_km;
        *summary.mood_counts.entry(entry.mood).or_insert(0) += 1;
        *summary.entries_per_year.entry(entry.year()).or_insert(0) += 1;
        days.insert(entry.happened_on);
    }

    summary.longest_streak_days = longest_streak(&days);
    summary
}

/// Longest run of consecutive days in `days`.
///
/// Walks forward only from days that begin a run, so each day is visited a
/// constant number of times.
fn longest_streak(days: &HashSet<NaiveDate>) -> usize {
    let mut longest = 0;
    for day in days {
        if day
            .pred_opt()
            .is_some_and(|previous| days.contains(&previous))
        {
            continue; // not the start of a run
        }
        let mut length = 1;
        let mut cursor = *day;
        while let Some(next) = cursor.succ_opt() {
            if !days.contains(&next) {
                break;
            }
            length += 1;
            cursor = next;
        }
        longest = longest.max(length);
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(mood: Mood, distance_km: f64, happened_on: NaiveDate) -> Entry {
        Entry::new(
            "t",
            "l",
            "",
            mood,
            Vec::new(),
            distance_km,
            Vec::new(),
            5,
            happened_on,
            None,
        )
    }

    #[test]
    fn test_summarize_empty() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_entries, 0);
        assert!((summary.total_distance_km - 0.0).abs() < f64::EPSILON);
        assert!(summary.mood_counts.is_empty());
        assert!(summary.entries_per_year.is_empty());
        assert_eq!(summary.longest_streak_days, 0);
        assert_eq!(summary.dominant_mood(), None);
    }

    #[test]
    fn test_summarize_counts_and_distance() {
        let entries = vec![
            entry(Mood::Excited, 5.0, date(2023, 3, 1)),
            entry(Mood::Calm, 3.0, date(2024, 3, 1)),
            entry(Mood::Calm, 2.5, date(2024, 8, 12)),
        ];
        let summary = summarize(&entries);

        assert_eq!(summary.total_entries, 3);
        assert!((summary.total_distance_km - 10.5).abs() < 1e-9);
        assert_eq!(summary.mood_counts[&Mood::Calm], 2);
        assert_eq!(summary.mood_counts[&Mood::Excited], 1);
        assert_eq!(summary.entries_per_year[&2023], 1);
        assert_eq!(summary.entries_per_year[&2024], 2);
        assert_eq!(summary.dominant_mood(), Some(Mood::Calm));
    }

    #[test]
    fn test_summarize_order_invariant() {
        let mut entries = vec![
            entry(Mood::Excited, 5.0, date(2023, 3, 1)),
            entry(Mood::Calm, 3.0, date(2024, 3, 1)),
            entry(Mood::Tired, 7.0, date(2024, 3, 2)),
            entry(Mood::Happy, 1.0, date(2022, 12, 31)),
        ];
        let forward = summarize(&entries);
        entries.reverse();
        let backward = summarize(&entries);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_streak_single_day() {
        let entries = vec![entry(Mood::Happy, 1.0, date(2024, 5, 5))];
        assert_eq!(summarize(&entries).longest_streak_days, 1);
    }

    #[test]
    fn test_streak_consecutive_days() {
        let entries = vec![
            entry(Mood::Happy, 1.0, date(2024, 5, 5)),
            entry(Mood::Calm, 1.0, date(2024, 5, 6)),
            entry(Mood::Tired, 1.0, date(2024, 5, 7)),
            // gap
            entry(Mood::Excited, 1.0, date(2024, 5, 9)),
            entry(Mood::Excited, 1.0, date(2024, 5, 10)),
        ];
        assert_eq!(summarize(&entries).longest_streak_days, 3);
    }

    #[test]
    fn test_streak_duplicate_days_count_once() {
        let entries = vec![
            entry(Mood::Happy, 1.0, date(2024, 5, 5)),
            entry(Mood::Calm, 1.0, date(2024, 5, 5)),
            entry(Mood::Tired, 1.0, date(2024, 5, 6)),
        ];
        assert_eq!(summarize(&entries).longest_streak_days, 2);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let entries = vec![
            entry(Mood::Happy, 1.0, date(2024, 4, 30)),
            entry(Mood::Happy, 1.0, date(2024, 5, 1)),
        ];
        assert_eq!(summarize(&entries).longest_streak_days, 2);
    }

    #[test]
    fn test_dominant_mood_tie_is_deterministic() {
        let entries = vec![
            entry(Mood::Calm, 1.0, date(2024, 1, 1)),
            entry(Mood::Excited, 1.0, date(2024, 1, 2)),
        ];
        // Excited precedes Calm in Mood::ALL, so the tie breaks toward it.
        assert_eq!(summarize(&entries).dominant_mood(), Some(Mood::Excited));
    }
}
