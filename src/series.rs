use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use log::{debug, trace};
use serde::Serialize;

use crate::calendar::{BucketKey, Granularity, bucket_label, derive_bucket_key, enumerate_buckets};
use crate::dimension::{Dimension, GroupKey, GroupResolver};
use crate::entry::{TimeEntry, sum_minutes};
use crate::ranking::{GroupTotals, Stack, select_top_groups};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub granularity: Granularity,
    pub dimension: Dimension,
    pub top_n: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl SeriesRequest {
    pub fn new(granularity: Granularity, dimension: Dimension, top_n: usize) -> Self {
        Self {
            granularity,
            dimension,
            top_n,
            start_date: None,
            end_date: None,
        }
    }

    pub fn between(mut self, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self.end_date = Some(end_date);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesRow {
    pub bucket: BucketKey,
    pub label: String,
    /// Minutes per stack, aligned with [`StackedSeries::stacks`].
    pub minutes: Vec<i64>,
    pub total_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackedSeries {
    pub data: Vec<SeriesRow>,
    pub stacks: Vec<Stack>,
    pub total_minutes: i64,
}

impl StackedSeries {
    pub fn stack_index(&self, key: &GroupKey) -> Option<usize> {
        self.stacks.iter().position(|stack| &stack.key == key)
    }

    pub fn minutes_for(&self, row: &SeriesRow, key: &GroupKey) -> Option<i64> {
        self.stack_index(key)
            .and_then(|index| row.minutes.get(index).copied())
    }
}

pub fn build_stacked_series(entries: &[TimeEntry], request: &SeriesRequest) -> StackedSeries {
    build_stacked_series_with(entries, request, &GroupResolver::default())
}

pub fn build_stacked_series_with(
    entries: &[TimeEntry],
    request: &SeriesRequest,
    resolver: &GroupResolver,
) -> StackedSeries {
    let mut matrix: BTreeMap<BucketKey, HashMap<GroupKey, i64>> = BTreeMap::new();
    let mut group_totals = GroupTotals::new();
    let mut total_minutes: i64 = 0;

    for entry in entries {
        let minutes = entry.counted_minutes();
        if minutes == 0 {
            trace!("skipping entry {} with non-positive duration", entry.id);
            continue;
        }

        let bucket = derive_bucket_key(entry.calendar_date, request.granularity);
        let group = resolver.resolve(entry, request.dimension);

        let cell = matrix
            .entry(bucket)
            .or_default()
            .entry(group.key.clone())
            .or_insert(0);
        *cell = cell.saturating_add(minutes);
        group_totals.add(group, minutes);
        total_minutes = total_minutes.saturating_add(minutes);
    }

    let buckets = series_buckets(&matrix, request);
    let ranking = select_top_groups(&group_totals, request.top_n, request.dimension);

    let data = buckets
        .into_iter()
        .map(|bucket| {
            let cells = matrix.get(&bucket);
            let minutes = ranking
                .stacks
                .iter()
                .map(|stack| match cells {
                    None => 0,
                    Some(cells) if stack.key.is_other() => sum_minutes(
                        cells
                            .iter()
                            .filter(|(key, _)| ranking.folded.contains(*key))
                            .map(|(_, minutes)| *minutes),
                    ),
                    Some(cells) => cells.get(&stack.key).copied().unwrap_or(0),
                })
                .collect::<Vec<_>>();
            SeriesRow {
                bucket,
                label: bucket_label(bucket, request.granularity),
                total_minutes: sum_minutes(minutes.iter().copied()),
                minutes,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        "stacked series: {} entries, {} buckets, {} groups, {} stacks",
        entries.len(),
        data.len(),
        group_totals.len(),
        ranking.stacks.len()
    );

    StackedSeries {
        data,
        stacks: ranking.stacks,
        total_minutes,
    }
}

fn series_buckets(
    matrix: &BTreeMap<BucketKey, HashMap<GroupKey, i64>>,
    request: &SeriesRequest,
) -> Vec<BucketKey> {
    let observed_first = matrix.keys().next().map(BucketKey::start_date);
    let observed_last = matrix.keys().next_back().map(BucketKey::start_date);

    let (start_date, end_date) = match (request.start_date, request.end_date) {
        (None, None) => return matrix.keys().copied().collect(),
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, observed_last.unwrap_or(start)),
        (None, Some(end)) => (observed_first.unwrap_or(end), end),
    };

    enumerate_buckets(request.granularity, start_date, end_date)
}
