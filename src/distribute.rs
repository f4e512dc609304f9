use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use log::trace;
use serde::Serialize;

/// The part of one entry that falls inside a single calendar hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HourSegment {
    pub day: NaiveDate,
    pub hour: u32,
    pub minutes: i64,
}

/// Splits `[started_at, started_at + duration_minutes)` at every hour
/// boundary, crossing midnight as needed.
///
/// `started_at` is truncated to the minute first. Segment minutes always sum
/// to `duration_minutes`. A non-positive duration, or one whose end falls
/// outside the representable calendar, yields no segments.
pub fn distribute_entry_across_hours(
    started_at: NaiveDateTime,
    duration_minutes: i64,
) -> Vec<HourSegment> {
    let mut segments = Vec::new();
    if duration_minutes <= 0 {
        return segments;
    }

    let start = truncate_to_minute(started_at);
    let Some(end) = Duration::try_minutes(duration_minutes)
        .and_then(|duration| start.checked_add_signed(duration))
    else {
        trace!("skipping {duration_minutes}m starting {start}: end is out of range");
        return segments;
    };

    let mut cursor = start;
    while cursor < end {
        let slice_end = truncate_to_hour(cursor)
            .checked_add_signed(Duration::hours(1))
            .map_or(end, |hour_end| hour_end.min(end));
        let minutes = (slice_end - cursor).num_minutes();

        if minutes > 0 {
            segments.push(HourSegment {
                day: cursor.date(),
                hour: cursor.hour(),
                minutes,
            });
        }

        cursor = slice_end;
    }

    segments
}

fn truncate_to_minute(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .date()
        .and_hms_opt(timestamp.hour(), timestamp.minute(), 0)
        .expect("whole-minute time must be valid")
}

fn truncate_to_hour(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp
        .date()
        .and_hms_opt(timestamp.hour(), 0, 0)
        .expect("top of the hour must be valid")
}
