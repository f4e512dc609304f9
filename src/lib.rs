//! Temporal aggregation for time-tracking reports.
//!
//! Every builder here is a pure function of an entry snapshot and request
//! parameters: stacked bucket series, day-by-hour grids and hourly
//! histograms are recomputed per call and nothing is cached between calls.

pub mod calendar;
pub mod config;
pub mod dimension;
pub mod distribute;
pub mod entry;
pub mod format;
pub mod grid;
pub mod ranking;
pub mod series;
pub mod storage;

pub use calendar::{
    BucketKey, Granularity, RollingRange, bucket_label, derive_bucket_key, enumerate_buckets,
    rolling_range, rolling_range_from_today,
};
pub use dimension::{Dimension, GroupKey, GroupResolver, ResolvedGroup, resolve_group};
pub use distribute::{HourSegment, distribute_entry_across_hours};
pub use entry::{GoalRef, Placement, TimeEntry};
pub use format::format_minutes;
pub use grid::{
    CellItem, Exclusions, GridDay, Histogram, TimeGrid, TimeGridCell, build_hourly_histogram,
    build_time_grid,
};
pub use ranking::{GroupTotals, Ranking, Stack, select_top_groups};
pub use series::{
    SeriesRequest, SeriesRow, StackedSeries, build_stacked_series, build_stacked_series_with,
};
