use chrono::{DateTime, Duration, NaiveDate, Utc};
use tracing::debug;

use crate::models::{BookedInterval, SchedulingError, TimeWindow};

/// Fixed enumeration step for candidate start times, independent of the
/// requested service duration.
pub const DEFAULT_STEP_MINUTES: i32 = 15;

/// Enumerate candidate start times inside the given working windows for
/// `target_date`, at a fixed `step_minutes` granularity.
///
/// Windows are walked independently: they may be unsorted, non-contiguous
/// (morning + afternoon shift) or even overlapping; degenerate windows
/// (`start >= end`) are skipped. A candidate is emitted only if the whole
/// service fits before the window end. On `now`'s own date, start times
/// already in the past are suppressed without ending the walk, since later
/// slots in the same window may still be ahead of the clock. Dates entirely
/// in the past yield no candidates. The result is sorted ascending.
pub fn generate_candidate_slots(
    windows: &[TimeWindow],
    duration_minutes: i32,
    target_date: NaiveDate,
    now: DateTime<Utc>,
    step_minutes: i32,
) -> Result<Vec<DateTime<Utc>>, SchedulingError> {
    if duration_minutes <= 0 {
        return Err(SchedulingError::InvalidDuration(duration_minutes));
    }
    if step_minutes <= 0 {
        return Err(SchedulingError::InvalidStep(step_minutes));
    }

    let today = now.date_naive();
    if target_date < today {
        return Ok(Vec::new());
    }

    let duration = Duration::minutes(duration_minutes as i64);
    let step = Duration::minutes(step_minutes as i64);

    let mut candidates = Vec::new();

    for window in windows {
        if window.is_degenerate() {
            debug!("Skipping degenerate window {} - {}", window.start, window.end);
            continue;
        }

        let window_end = target_date.and_time(window.end).and_utc();
        let mut cursor = target_date.and_time(window.start).and_utc();

        while cursor + duration <= window_end {
            if !(target_date == today && cursor < now) {
                candidates.push(cursor);
            }
            cursor += step;
        }
    }

    candidates.sort();
    Ok(candidates)
}

/// Drop candidates whose `[start, start + duration)` interval intersects any
/// booked `[start, end)` interval. Half-open semantics: slots that merely
/// touch a booking at a boundary survive.
pub fn filter_available(
    candidates: &[DateTime<Utc>],
    duration_minutes: i32,
    booked: &[BookedInterval],
) -> Vec<DateTime<Utc>> {
    let duration = Duration::minutes(duration_minutes as i64);

    candidates
        .iter()
        .copied()
        .filter(|&start| {
            let end = start + duration;
            !booked
                .iter()
                .any(|interval| start < interval.end && end > interval.start)
        })
        .collect()
}
