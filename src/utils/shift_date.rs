use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// How early before a shift start a check-in still counts for that day.
pub const DEFAULT_EARLY_WINDOW_HOURS: i64 = 2;

/// Calendar date an attendance record belongs to.
///
/// A check-in at or after `shift_start - early_window` on the current day is
/// logged today; anything earlier belongs to the previous day's shift
/// (e.g. just past midnight on a night shift).
pub fn resolve_attendance_date(
    now: NaiveDateTime,
    shift_start: NaiveTime,
    early_window: Duration,
) -> NaiveDate {
    let threshold = now.date().and_time(shift_start) - early_window;

    if now >= threshold {
        now.date()
    } else {
        now.date() - Duration::days(1)
    }
}
