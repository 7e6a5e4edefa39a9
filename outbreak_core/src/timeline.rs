use std::collections::BTreeSet;
use std::ops::Range;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use outbreak_schema::CityRecord;

/// Ascending, duplicate-free dates present anywhere in the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    steps: Vec<NaiveDate>,
}

impl Timeline {
    pub fn build(cities: &[CityRecord]) -> Self {
        let dates: BTreeSet<NaiveDate> = cities
            .iter()
            .flat_map(|record| record.series.keys().copied())
            .collect();
        Self {
            steps: dates.into_iter().collect(),
        }
    }

    pub fn steps(&self) -> &[NaiveDate] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NaiveDate> {
        self.steps.get(index).copied()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.steps.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.steps.last().copied()
    }

    /// Middle label of the timeline axis.
    pub fn midpoint(&self) -> Option<NaiveDate> {
        if self.steps.is_empty() {
            return None;
        }
        self.get((self.steps.len() - 1) / 2)
    }

    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.steps.binary_search(&date).ok()
    }

    /// Indices whose dates fall inside `range`.
    ///
    /// The steps are sorted, so the in-range subset is always contiguous. An
    /// inverted or non-overlapping range yields an empty window.
    pub fn window(&self, range: &DateRange) -> Range<usize> {
        let start = range
            .start
            .map_or(0, |start| self.steps.partition_point(|date| *date < start));
        let end = range.end.map_or(self.steps.len(), |end| {
            self.steps.partition_point(|date| *date <= end)
        });
        start..end.max(start)
    }
}

/// Inclusive date bounds; a missing bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// The full extent of `timeline`.
    pub fn spanning(timeline: &Timeline) -> Self {
        Self {
            start: timeline.first(),
            end: timeline.last(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |start| date >= start) && self.end.map_or(true, |end| date <= end)
    }
}
