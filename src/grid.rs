use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use log::{debug, trace};
use serde::Serialize;

use crate::distribute::distribute_entry_across_hours;
use crate::entry::{Placement, TimeEntry, sum_minutes};
use crate::format::exclusion_footnote;

pub const HOURS_PER_DAY: usize = 24;

const UNTITLED_TASK: &str = "Untitled task";

/// Entries that could not be placed on the hour axis, next to the count of
/// those that could.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Exclusions {
    pub excluded_minutes: i64,
    pub excluded_entries: usize,
    pub included_entries: usize,
}

impl Exclusions {
    fn exclude(&mut self, entry: &TimeEntry) {
        self.excluded_minutes = self.excluded_minutes.saturating_add(entry.counted_minutes());
        self.excluded_entries += 1;
    }

    /// "Excluding 45m (2 entries) without a start time", or `None` when
    /// every entry had a start time.
    pub fn footnote(&self) -> Option<String> {
        if self.excluded_entries == 0 {
            return None;
        }
        Some(exclusion_footnote(self.excluded_minutes, self.excluded_entries))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellItem {
    pub task_name: String,
    pub goal_id: Option<String>,
    pub goal_title: Option<String>,
    pub goal_color: Option<String>,
    pub minutes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeGridCell {
    pub total_minutes: i64,
    /// Contributors, largest first.
    pub items: Vec<CellItem>,
}

impl TimeGridCell {
    fn add(&mut self, entry: &TimeEntry, minutes: i64) {
        self.total_minutes = self.total_minutes.saturating_add(minutes);

        let task_name = item_task_name(entry);
        let existing = self.items.iter_mut().find(|item| {
            item.task_name == task_name && item.goal_id.as_deref() == entry.goal_id.as_deref()
        });
        match existing {
            Some(item) => item.minutes = item.minutes.saturating_add(minutes),
            None => self.items.push(CellItem {
                task_name,
                goal_id: entry.goal_id.clone(),
                goal_title: entry.goal_title().map(str::to_string),
                goal_color: entry.goal_color().map(str::to_string),
                minutes,
            }),
        }
    }

    pub fn dominant(&self) -> Option<&CellItem> {
        self.items.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridDay {
    pub day: NaiveDate,
    pub hours: Vec<TimeGridCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeGrid {
    pub grid: Vec<GridDay>,
    #[serde(flatten)]
    pub exclusions: Exclusions,
}

impl TimeGrid {
    pub fn cell(&self, day: NaiveDate, hour: u32) -> Option<&TimeGridCell> {
        self.grid
            .iter()
            .find(|row| row.day == day)
            .and_then(|row| row.hours.get(hour as usize))
    }

    /// The cell with the most minutes; earliest day and hour win ties.
    pub fn busiest_cell(&self) -> Option<(NaiveDate, u32, &TimeGridCell)> {
        let mut best: Option<(NaiveDate, u32, &TimeGridCell)> = None;
        for row in &self.grid {
            for (hour, cell) in row.hours.iter().enumerate() {
                let better = match best {
                    Some((_, _, current)) => cell.total_minutes > current.total_minutes,
                    None => cell.total_minutes > 0,
                };
                if better {
                    best = Some((row.day, hour as u32, cell));
                }
            }
        }
        best
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    pub bins: Vec<i64>,
    #[serde(flatten)]
    pub exclusions: Exclusions,
}

impl Histogram {
    pub fn total_minutes(&self) -> i64 {
        sum_minutes(self.bins.iter().copied())
    }

    /// Hour with the most minutes; the earliest hour wins ties.
    pub fn peak_hour(&self) -> Option<u32> {
        let mut peak: Option<(usize, i64)> = None;
        for (hour, minutes) in self.bins.iter().copied().enumerate() {
            if minutes > peak.map_or(0, |(_, best)| best) {
                peak = Some((hour, minutes));
            }
        }
        peak.map(|(hour, _)| hour as u32)
    }
}

/// Builds a day-by-hour grid over `days`.
///
/// Segments landing on a day outside `days` are dropped; entries without a
/// start time only feed the exclusion counters.
pub fn build_time_grid(entries: &[TimeEntry], days: &[NaiveDate]) -> TimeGrid {
    let mut row_for_day: HashMap<NaiveDate, usize> = HashMap::new();
    let mut grid = Vec::new();
    for day in days {
        if row_for_day.contains_key(day) {
            continue;
        }
        row_for_day.insert(*day, grid.len());
        grid.push(GridDay {
            day: *day,
            hours: vec![TimeGridCell::default(); HOURS_PER_DAY],
        });
    }

    let mut exclusions = Exclusions::default();
    for entry in entries {
        let started_at = match entry.placement() {
            Placement::Timed(started_at) => started_at,
            Placement::Untimed => {
                exclusions.exclude(entry);
                continue;
            }
        };
        exclusions.included_entries += 1;

        for segment in distribute_entry_across_hours(started_at, entry.duration_minutes) {
            let Some(&row) = row_for_day.get(&segment.day) else {
                trace!(
                    "entry {} spills {}m onto {} outside the grid",
                    entry.id, segment.minutes, segment.day
                );
                continue;
            };
            grid[row].hours[segment.hour as usize].add(entry, segment.minutes);
        }
    }

    for cell in grid.iter_mut().flat_map(|row| row.hours.iter_mut()) {
        cell.items.sort_by(|left, right| right.minutes.cmp(&left.minutes));
    }

    debug!(
        "time grid: {} days, {} included, {} excluded ({}m)",
        grid.len(),
        exclusions.included_entries,
        exclusions.excluded_entries,
        exclusions.excluded_minutes
    );

    TimeGrid { grid, exclusions }
}

/// Collapses hour segments into 24 bins, optionally only those landing on
/// `allowed_days`.
pub fn build_hourly_histogram(
    entries: &[TimeEntry],
    allowed_days: Option<&[NaiveDate]>,
) -> Histogram {
    let allowed = allowed_days.map(|days| days.iter().copied().collect::<HashSet<_>>());
    let mut bins = vec![0_i64; HOURS_PER_DAY];
    let mut exclusions = Exclusions::default();

    for entry in entries {
        let started_at = match entry.placement() {
            Placement::Timed(started_at) => started_at,
            Placement::Untimed => {
                exclusions.exclude(entry);
                continue;
            }
        };
        exclusions.included_entries += 1;

        for segment in distribute_entry_across_hours(started_at, entry.duration_minutes) {
            if let Some(allowed) = &allowed {
                if !allowed.contains(&segment.day) {
                    continue;
                }
            }
            let bin = &mut bins[segment.hour as usize];
            *bin = bin.saturating_add(segment.minutes);
        }
    }

    debug!(
        "hourly histogram: {} included, {} excluded ({}m)",
        exclusions.included_entries, exclusions.excluded_entries, exclusions.excluded_minutes
    );

    Histogram { bins, exclusions }
}

fn item_task_name(entry: &TimeEntry) -> String {
    entry
        .task_name
        .as_deref()
        .or(entry.task_title.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNTITLED_TASK)
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{build_hourly_histogram, build_time_grid};
    use crate::entry::TimeEntry;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        date(day).and_hms_opt(hour, minute, 0).unwrap()
    }

    fn timed(id: &str, day: u32, hour: u32, minute: u32, minutes: i64) -> TimeEntry {
        TimeEntry::new(id, date(day), minutes).with_start(at(day, hour, minute))
    }

    #[test]
    fn ranks_cell_contributors() {
        let entries = vec![
            timed("e1", 4, 9, 0, 10).with_task(None, "Email"),
            timed("e2", 4, 9, 10, 40).with_task(None, "Review"),
            timed("e3", 4, 9, 50, 5).with_task(None, "Email"),
            timed("e4", 4, 9, 55, 5)
                .with_task(None, "Email")
                .with_goal("g1", "Inbox", None),
        ];

        let grid = build_time_grid(&entries, &[date(4)]);
        let cell = grid.cell(date(4), 9).expect("cell");

        assert_eq!(cell.total_minutes, 60);
        let summary = cell
            .items
            .iter()
            .map(|item| (item.task_name.as_str(), item.goal_id.as_deref(), item.minutes))
            .collect::<Vec<_>>();
        assert_eq!(
            summary,
            vec![
                ("Review", None, 40),
                ("Email", None, 15),
                ("Email", Some("g1"), 5),
            ]
        );
        assert_eq!(cell.dominant().map(|item| item.task_name.as_str()), Some("Review"));
    }

    #[test]
    fn drops_segments_outside_window() {
        let entries = vec![timed("e1", 4, 23, 0, 120)];

        let grid = build_time_grid(&entries, &[date(4)]);
        assert_eq!(grid.cell(date(4), 23).unwrap().total_minutes, 60);
        assert!(grid.cell(date(5), 0).is_none());
        assert_eq!(grid.exclusions.included_entries, 1);
        assert_eq!(grid.exclusions.excluded_entries, 0);
    }

    #[test]
    fn collapses_duplicate_days() {
        let grid = build_time_grid(&[], &[date(4), date(5), date(4)]);
        assert_eq!(grid.grid.len(), 2);
        assert!(grid.grid.iter().all(|row| row.hours.len() == 24));
        assert!(grid.busiest_cell().is_none());
    }

    #[test]
    fn finds_busiest_cell() {
        let entries = vec![timed("e1", 4, 8, 0, 20), timed("e2", 5, 14, 0, 50)];
        let grid = build_time_grid(&entries, &[date(4), date(5)]);
        let (day, hour, cell) = grid.busiest_cell().expect("busiest cell");
        assert_eq!((day, hour, cell.total_minutes), (date(5), 14, 50));
    }

    #[test]
    fn histogram_tracks_exclusions() {
        let entries = vec![
            timed("e1", 4, 23, 30, 90),
            TimeEntry::new("e2", date(4), 45),
            TimeEntry::new("e3", date(4), 15),
        ];

        let histogram = build_hourly_histogram(&entries, None);

        assert_eq!(histogram.bins.len(), 24);
        assert_eq!(histogram.bins[23], 30);
        assert_eq!(histogram.bins[0], 60);
        assert_eq!(histogram.total_minutes(), 90);
        assert_eq!(histogram.peak_hour(), Some(0));
        assert_eq!(histogram.exclusions.excluded_minutes, 60);
        assert_eq!(histogram.exclusions.excluded_entries, 2);
        assert_eq!(histogram.exclusions.included_entries, 1);
        assert_eq!(
            histogram.exclusions.footnote().as_deref(),
            Some("Excluding 1h (2 entries) without a start time")
        );
    }

    #[test]
    fn histogram_honours_allowed_days() {
        let entries = vec![timed("e1", 4, 23, 30, 90)];
        let histogram = build_hourly_histogram(&entries, Some(&[date(5)][..]));
        assert_eq!(histogram.bins[23], 0);
        assert_eq!(histogram.bins[0], 60);
        assert_eq!(histogram.total_minutes(), 60);
    }

    #[test]
    fn non_positive_durations_place_nothing() {
        let entries = vec![
            timed("e1", 4, 9, 0, 0),
            timed("e2", 4, 10, 30, -15),
            TimeEntry::new("e3", date(4), -5),
        ];

        let grid = build_time_grid(&entries, &[date(4)]);
        assert_eq!(grid.exclusions.excluded_entries, 1);
        assert_eq!(grid.exclusions.excluded_minutes, 0);
        assert_eq!(grid.exclusions.included_entries, 2);
        assert!(
            grid.grid
                .iter()
                .flat_map(|row| row.hours.iter())
                .all(|cell| cell.total_minutes == 0 && cell.items.is_empty())
        );
        assert_eq!(
            grid.exclusions.footnote().as_deref(),
            Some("Excluding 0m (1 entry) without a start time")
        );

        let histogram = build_hourly_histogram(&entries, None);
        assert!(histogram.bins.iter().all(|minutes| *minutes == 0));
        assert_eq!(histogram.exclusions, grid.exclusions);
    }

    #[test]
    fn out_of_range_durations_do_not_panic() {
        let entries = vec![
            timed("e1", 4, 9, 0, i64::MAX),
            timed("e2", 4, 9, 0, 30),
            TimeEntry::new("e3", date(4), i64::MAX),
            TimeEntry::new("e4", date(4), i64::MAX),
        ];

        let histogram = build_hourly_histogram(&entries, None);
        assert_eq!(histogram.total_minutes(), 30);
        assert_eq!(histogram.exclusions.included_entries, 2);
        assert_eq!(histogram.exclusions.excluded_minutes, i64::MAX);

        let grid = build_time_grid(&entries, &[date(4)]);
        assert_eq!(grid.cell(date(4), 9).unwrap().total_minutes, 30);
        assert_eq!(grid.exclusions.excluded_entries, 2);
    }

    #[test]
    fn empty_input_is_well_formed() {
        let histogram = build_hourly_histogram(&[], None);
        assert_eq!(histogram.total_minutes(), 0);
        assert_eq!(histogram.peak_hour(), None);
        assert!(histogram.exclusions.footnote().is_none());
    }
}
