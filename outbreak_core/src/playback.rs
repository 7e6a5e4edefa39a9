//! Selection state and the index arithmetic behind playback.
//!
//! Automatic playback wraps inside the active date window; manual stepping
//! clamps at its edges. Both operate on the same window.

use std::time::Duration;

use chrono::NaiveDate;

use outbreak_schema::DiseaseFilter;

use crate::timeline::{DateRange, Timeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Paused,
    Playing,
}

impl PlaybackState {
    pub fn toggled(self) -> Self {
        match self {
            PlaybackState::Paused => PlaybackState::Playing,
            PlaybackState::Playing => PlaybackState::Paused,
        }
    }

    pub fn is_playing(self) -> bool {
        self == PlaybackState::Playing
    }
}

/// Everything the user (or playback) can change about the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub disease: DiseaseFilter,
    pub time_index: usize,
    pub range: DateRange,
    pub playback: PlaybackState,
    pub play_speed: f64,
}

impl SelectionState {
    /// Full date range, positioned on the latest date, paused at 1x.
    pub fn initial(timeline: &Timeline, disease: DiseaseFilter) -> Self {
        Self {
            disease,
            time_index: timeline.len().saturating_sub(1),
            range: DateRange::spanning(timeline),
            playback: PlaybackState::Paused,
            play_speed: 1.0,
        }
    }

    pub fn current_date(&self, timeline: &Timeline) -> Option<NaiveDate> {
        timeline.get(self.time_index)
    }
}

/// Index the next playback tick should land on, or `None` to hold position.
///
/// Outside the window the tick snaps to the window's first date; at the
/// window's last date it wraps back to the first.
pub fn next_playback_index(timeline: &Timeline, range: &DateRange, current: usize) -> Option<usize> {
    let window = timeline.window(range);
    if window.is_empty() {
        return None;
    }
    if !window.contains(&current) {
        return Some(window.start);
    }
    if current + 1 < window.end {
        Some(current + 1)
    } else {
        Some(window.start)
    }
}

/// Manual step by `delta`, clamped to the window. `None` leaves the index
/// untouched: empty window, or the current date lies outside it.
pub fn step_index(
    timeline: &Timeline,
    range: &DateRange,
    current: usize,
    delta: i64,
) -> Option<usize> {
    let window = timeline.window(range);
    if window.is_empty() || !window.contains(&current) {
        return None;
    }
    let last = (window.end - 1) as i64;
    let target = (current as i64).saturating_add(delta).clamp(window.start as i64, last);
    Some(target as usize)
}

/// Time between playback ticks: `base / max(floor, speed)`.
pub fn playback_period(base: Duration, speed: f64, floor: f64) -> Duration {
    let effective = if speed.is_finite() {
        speed.max(floor)
    } else {
        floor
    };
    let nanos = base.as_nanos() as f64 / effective;
    Duration::from_nanos(nanos.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    fn builtin_timeline() -> Timeline {
        Timeline::build(Dataset::builtin().cities())
    }

    fn middle_range() -> DateRange {
        DateRange::new(Some(day(21)), Some(day(23)))
    }

    #[test]
    fn initial_selection_sits_on_last_date() {
        let timeline = builtin_timeline();
        let selection = SelectionState::initial(&timeline, DiseaseFilter::All);
        assert_eq!(selection.time_index, 4);
        assert_eq!(selection.current_date(&timeline), Some(day(24)));
        assert_eq!(selection.range, DateRange::new(Some(day(20)), Some(day(24))));
        assert!(!selection.playback.is_playing());
    }

    #[test]
    fn playback_snaps_into_window_from_outside() {
        let timeline = builtin_timeline();
        assert_eq!(next_playback_index(&timeline, &middle_range(), 4), Some(1));
        assert_eq!(next_playback_index(&timeline, &middle_range(), 0), Some(1));
    }

    #[test]
    fn playback_advances_then_wraps() {
        let timeline = builtin_timeline();
        assert_eq!(next_playback_index(&timeline, &middle_range(), 1), Some(2));
        assert_eq!(next_playback_index(&timeline, &middle_range(), 3), Some(1));
    }

    #[test]
    fn playback_holds_on_empty_window() {
        let timeline = builtin_timeline();
        let empty = DateRange::new(Some(day(28)), None);
        assert_eq!(next_playback_index(&timeline, &empty, 2), None);
        assert_eq!(next_playback_index(&Timeline::default(), &DateRange::unbounded(), 0), None);
    }

    #[test]
    fn manual_step_clamps_where_playback_wraps() {
        let timeline = builtin_timeline();
        let range = middle_range();
        assert_eq!(step_index(&timeline, &range, 3, 1), Some(3));
        assert_eq!(next_playback_index(&timeline, &range, 3), Some(1));
        assert_eq!(step_index(&timeline, &range, 1, -1), Some(1));
        assert_eq!(step_index(&timeline, &range, 1, 5), Some(3));
    }

    #[test]
    fn manual_step_outside_window_is_ignored() {
        let timeline = builtin_timeline();
        assert_eq!(step_index(&timeline, &middle_range(), 4, -1), None);
    }

    #[test]
    fn doubling_speed_halves_the_period() {
        let base = Duration::from_millis(800);
        let single = playback_period(base, 1.0, 0.25);
        let double = playback_period(base, 2.0, 0.25);
        assert_eq!(single, Duration::from_millis(800));
        assert_eq!(double * 2, single);
    }

    #[test]
    fn slow_speeds_are_floored() {
        let base = Duration::from_millis(800);
        assert_eq!(playback_period(base, 0.1, 0.25), Duration::from_millis(3200));
        assert_eq!(playback_period(base, f64::NAN, 0.25), Duration::from_millis(3200));
    }
}
