use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

use crate::utils::time_calc;

/// Approved absence category, from the leave store's `leave_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveCategory {
    Permit,
    Sick,
    Leave,
}

impl LeaveCategory {
    pub fn from_leave_type(leave_type: &str) -> Option<Self> {
        match leave_type.trim().to_ascii_lowercase().as_str() {
            "unpaid" | "permit" => Some(Self::Permit),
            "sick" => Some(Self::Sick),
            "annual" | "leave" => Some(Self::Leave),
            _ => None,
        }
    }
}

/// Day classification shown on attendance recaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum DayStatus {
    #[serde(rename = "H")]
    Present,
    #[serde(rename = "I")]
    Permit,
    #[serde(rename = "S")]
    Sick,
    #[serde(rename = "C")]
    Leave,
    #[serde(rename = "A")]
    Absent,
    #[serde(rename = "L")]
    Holiday,
}

impl From<LeaveCategory> for DayStatus {
    fn from(category: LeaveCategory) -> Self {
        match category {
            LeaveCategory::Permit => DayStatus::Permit,
            LeaveCategory::Sick => DayStatus::Sick,
            LeaveCategory::Leave => DayStatus::Leave,
        }
    }
}

/// Active attendance record joined with its shift's nominal minutes.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RecapRow {
    pub work_date: NaiveDate,
    pub lateness_minutes: i64,
    pub worked_minutes: Option<i64>,
    pub nominal_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RecapDay {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    /// `None` for days still ahead.
    pub status: Option<DayStatus>,
    pub lateness_minutes: i64,
    pub worked_minutes: Option<i64>,
    pub shortfall_minutes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct RecapTotals {
    pub present: u32,
    pub permit: u32,
    pub sick: u32,
    pub leave: u32,
    pub absent: u32,
    pub holiday: u32,
    pub lateness_minutes: i64,
    pub worked_minutes: i64,
    pub shortfall_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyRecap {
    pub employee_id: u64,
    #[schema(example = "2026-01")]
    pub month: String,
    pub totals: RecapTotals,
    pub days: Vec<RecapDay>,
}

/// First and last day of a month, `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next - Duration::days(1)))
}

/// Classifies every day of the month.
///
/// Precedence: future day, Sunday or holiday, approved leave, attendance,
/// absence.
pub fn build_monthly_recap(
    employee_id: u64,
    year: i32,
    month: u32,
    today: NaiveDate,
    rows: &[RecapRow],
    leaves: &HashMap<NaiveDate, LeaveCategory>,
    holidays: &HashSet<NaiveDate>,
) -> Option<MonthlyRecap> {
    let (first, last) = month_bounds(year, month)?;
    let by_date: HashMap<NaiveDate, &RecapRow> = rows.iter().map(|r| (r.work_date, r)).collect();

    let mut totals = RecapTotals::default();
    let mut days = Vec::new();
    let mut date = first;

    while date <= last {
        let mut day = RecapDay {
            date,
            status: None,
            lateness_minutes: 0,
            worked_minutes: None,
            shortfall_minutes: 0,
        };

        if date <= today {
            let status = if date.weekday() == Weekday::Sun || holidays.contains(&date) {
                DayStatus::Holiday
            } else if let Some(category) = leaves.get(&date) {
                DayStatus::from(*category)
            } else if let Some(row) = by_date.get(&date) {
                day.lateness_minutes = row.lateness_minutes;
                day.worked_minutes = row.worked_minutes;
                day.shortfall_minutes = time_calc::shortfall(row.nominal_minutes, row.worked_minutes);
                DayStatus::Present
            } else {
                DayStatus::Absent
            };

            match status {
                DayStatus::Present => totals.present += 1,
                DayStatus::Permit => totals.permit += 1,
                DayStatus::Sick => totals.sick += 1,
                DayStatus::Leave => totals.leave += 1,
                DayStatus::Absent => totals.absent += 1,
                DayStatus::Holiday => totals.holiday += 1,
            }
            totals.lateness_minutes += day.lateness_minutes;
            totals.worked_minutes += day.worked_minutes.unwrap_or(0);
            totals.shortfall_minutes += day.shortfall_minutes;
            day.status = Some(status);
        }

        days.push(day);
        date += Duration::days(1);
    }

    Some(MonthlyRecap {
        employee_id,
        month: format!("{year}-{month:02}"),
        totals,
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        // January 2026 starts on a Thursday; Sundays are 4, 11, 18, 25
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn row(day: u32, lateness: i64, worked: Option<i64>) -> RecapRow {
        RecapRow {
            work_date: d(day),
            lateness_minutes: lateness,
            worked_minutes: worked,
            nominal_minutes: 480,
        }
    }

    fn status_of(recap: &MonthlyRecap, day: u32) -> Option<DayStatus> {
        recap.days[(day - 1) as usize].status
    }

    #[test]
    fn month_bounds_handles_december_and_leap_years() {
        assert_eq!(month_bounds(2025, 12), Some((NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap())));
        assert_eq!(month_bounds(2024, 2).unwrap().1.day(), 29);
        assert_eq!(month_bounds(2024, 13), None);
    }

    #[test]
    fn leave_types_map_to_categories() {
        assert_eq!(LeaveCategory::from_leave_type("annual"), Some(LeaveCategory::Leave));
        assert_eq!(LeaveCategory::from_leave_type("Sick"), Some(LeaveCategory::Sick));
        assert_eq!(LeaveCategory::from_leave_type("unpaid"), Some(LeaveCategory::Permit));
        assert_eq!(LeaveCategory::from_leave_type("sabbatical"), None);
    }

    #[test]
    fn classification_precedence() {
        let rows = vec![
            row(5, 15, Some(450)),
            row(4, 0, Some(480)),  // Sunday wins
            row(6, 0, Some(480)),  // holiday wins
            row(7, 0, Some(480)),  // leave wins
        ];
        let leaves = HashMap::from([(d(7), LeaveCategory::Sick), (d(8), LeaveCategory::Leave)]);
        let holidays = HashSet::from([d(6)]);

        let recap = build_monthly_recap(1000, 2026, 1, d(9), &rows, &leaves, &holidays).unwrap();

        assert_eq!(recap.month, "2026-01");
        assert_eq!(recap.days.len(), 31);
        assert_eq!(status_of(&recap, 4), Some(DayStatus::Holiday));
        assert_eq!(status_of(&recap, 5), Some(DayStatus::Present));
        assert_eq!(status_of(&recap, 6), Some(DayStatus::Holiday));
        assert_eq!(status_of(&recap, 7), Some(DayStatus::Sick));
        assert_eq!(status_of(&recap, 8), Some(DayStatus::Leave));
        assert_eq!(status_of(&recap, 9), Some(DayStatus::Absent));
        assert_eq!(status_of(&recap, 10), None);
    }

    #[test]
    fn totals_accumulate_present_days() {
        let rows = vec![row(5, 15, Some(450)), row(6, 5, None)];

        let recap =
            build_monthly_recap(1000, 2026, 1, d(6), &rows, &HashMap::new(), &HashSet::new()).unwrap();

        let totals = &recap.totals;
        assert_eq!(totals.present, 2);
        // 1, 2, 3 are weekdays without records; 4 is Sunday
        assert_eq!(totals.absent, 3);
        assert_eq!(totals.holiday, 1);
        assert_eq!(totals.lateness_minutes, 20);
        assert_eq!(totals.worked_minutes, 450);
        assert_eq!(totals.shortfall_minutes, 30 + 480);
    }

    #[test]
    fn whole_month_in_the_past_has_no_pending_days() {
        let recap = build_monthly_recap(
            1,
            2026,
            1,
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            &[],
            &HashMap::new(),
            &HashSet::new(),
        )
        .unwrap();

        assert!(recap.days.iter().all(|day| day.status.is_some()));
        assert_eq!(recap.totals.holiday, 4);
        assert_eq!(recap.totals.absent, 27);
    }
}
