use chrono::{NaiveTime, Timelike};

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Minute of day, seconds dropped.
#[inline]
fn minute_of_day(t: NaiveTime) -> i64 {
    (t.hour() * 60 + t.minute()) as i64
}

/// Minutes from `start` to `end` as times of day.
/// An `end` earlier than `start` is read as the next day.
pub fn minutes_between(start: NaiveTime, end: NaiveTime) -> i64 {
    let start = minute_of_day(start);
    let mut end = minute_of_day(end);

    if end < start {
        end += MINUTES_PER_DAY;
    }

    end - start
}

/// Lateness against the shift start, 0 when on time or early.
pub fn lateness(check_in: NaiveTime, shift_start: NaiveTime) -> i64 {
    (minute_of_day(check_in) - minute_of_day(shift_start)).max(0)
}

/// Net worked minutes, gross span may cross midnight.
pub fn worked_minutes(check_in: NaiveTime, check_out: NaiveTime, break_minutes: i64) -> i64 {
    (minutes_between(check_in, check_out) - break_minutes).max(0)
}

/// Minutes a break ended past the return deadline.
pub fn break_overrun(break_end: Option<NaiveTime>, deadline: NaiveTime) -> i64 {
    match break_end {
        Some(end) => (minute_of_day(end) - minute_of_day(deadline)).max(0),
        None => 0,
    }
}

/// Minutes missing from the nominal working day.
pub fn shortfall(nominal_minutes: i64, worked: Option<i64>) -> i64 {
    (nominal_minutes - worked.unwrap_or(0)).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn minutes_between_same_time_is_zero() {
        for (h, m) in [(0, 0), (8, 0), (12, 30), (23, 59)] {
            assert_eq!(minutes_between(t(h, m), t(h, m)), 0);
        }
    }

    #[test]
    fn minutes_between_wraps_past_midnight() {
        assert_eq!(minutes_between(t(8, 0), t(7, 59)), 1439);
        assert_eq!(minutes_between(t(23, 0), t(1, 0)), 120);
    }

    #[test]
    fn minutes_between_ignores_seconds() {
        let start = NaiveTime::from_hms_opt(8, 0, 59).unwrap();
        let end = NaiveTime::from_hms_opt(8, 10, 1).unwrap();
        assert_eq!(minutes_between(start, end), 10);

        let a = NaiveTime::from_hms_opt(9, 15, 40).unwrap();
        let b = NaiveTime::from_hms_opt(9, 15, 5).unwrap();
        assert_eq!(minutes_between(a, b), 0);
    }

    #[test]
    fn lateness_is_floored_and_never_negative() {
        assert_eq!(lateness(t(8, 15), t(8, 0)), 15);
        assert_eq!(lateness(t(7, 55), t(8, 0)), 0);
        assert_eq!(lateness(t(8, 0), t(8, 0)), 0);
        assert_eq!(lateness(NaiveTime::from_hms_opt(8, 0, 59).unwrap(), t(8, 0)), 0);
    }

    #[test]
    fn lateness_does_not_wrap() {
        // same-day difference only
        assert_eq!(lateness(t(23, 50), t(0, 0)), 1430);
        assert_eq!(lateness(t(0, 10), t(0, 0)), 10);
        assert_eq!(lateness(t(0, 10), t(22, 0)), 0);
    }

    #[test]
    fn worked_minutes_day_and_overnight() {
        assert_eq!(worked_minutes(t(8, 0), t(17, 0), 60), 480);
        assert_eq!(worked_minutes(t(22, 0), t(6, 0), 0), 480);
        assert_eq!(worked_minutes(t(8, 0), t(9, 0), 120), 0);
    }

    #[test]
    fn break_overrun_against_deadline() {
        assert_eq!(break_overrun(None, t(14, 0)), 0);
        assert_eq!(break_overrun(Some(t(13, 59)), t(14, 0)), 0);
        assert_eq!(break_overrun(Some(t(14, 25)), t(14, 0)), 25);
    }

    #[test]
    fn shortfall_defaults_missing_work_to_zero() {
        assert_eq!(shortfall(480, Some(420)), 60);
        assert_eq!(shortfall(480, Some(500)), 0);
        assert_eq!(shortfall(480, None), 480);
    }
}
