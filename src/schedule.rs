use std::ops::Range;

use chrono::{DateTime, Datelike, Days, Timelike, Utc};

/// Map wall-clock time to this run's contiguous catalog slice.
///
/// A week is divided into `7 * runs_per_day` slots (slot 0 starts Sunday
/// 00:00) and the catalog is spread across them with floor-divided
/// boundaries. The returned range keeps one element past the floor boundary,
/// so adjacent slots may overlap by at most one index; the union of all
/// slots in a week covers the whole catalog with no gaps.
///
/// Pure in `now`: identical inputs always produce the identical range.
pub fn current_slice(
    catalog_len: usize,
    now: DateTime<Utc>,
    runs_per_day: u32,
    run_period_hours: u32,
) -> Range<usize> {
    if catalog_len == 0 || runs_per_day == 0 || run_period_hours == 0 {
        return 0..0;
    }

    let runs_per_week = 7 * runs_per_day as usize;
    let day = now.weekday().num_days_from_sunday() as usize;
    let slot = day * runs_per_day as usize + (now.hour() / run_period_hours) as usize;

    let start = (slot * catalog_len / runs_per_week).min(catalog_len);
    let end = ((slot + 1) * catalog_len / runs_per_week + 1).min(catalog_len);

    start..end.max(start)
}

/// Sunday-anchored date of the week containing `now`; keys one week's
/// exports together.
pub fn week_start_key(now: DateTime<Utc>) -> String {
    let back = Days::new(u64::from(now.weekday().num_days_from_sunday()));
    let sunday = now.date_naive() - back;
    sunday.format("%Y-%m-%d").to_string()
}
