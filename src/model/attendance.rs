use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One attendance cycle of an employee (a work date, or a night shift
/// spanning midnight).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = 1000)]
    pub employee_id: u64,

    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub work_date: NaiveDate,

    #[schema(example = 1)]
    pub shift_id: u64,

    #[schema(example = "08:05:00", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,

    pub check_in_location_id: Option<u64>,

    #[schema(example = "17:02:00", value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,

    pub check_out_location_id: Option<u64>,

    /// Sum of closed break durations.
    #[schema(example = 60)]
    pub break_minutes: i64,

    #[schema(example = 5)]
    pub lateness_minutes: i64,

    /// Set once checked out.
    #[schema(example = 477)]
    pub worked_minutes: Option<i64>,

    pub active: bool,
}

impl AttendanceRecord {
    /// Fresh record for a check-in; the id is assigned by storage.
    pub fn opened(
        employee_id: u64,
        work_date: NaiveDate,
        shift_id: u64,
        check_in: NaiveTime,
        check_in_location_id: u64,
        lateness_minutes: i64,
    ) -> Self {
        Self {
            id: 0,
            employee_id,
            work_date,
            shift_id,
            check_in: Some(check_in),
            check_in_location_id: Some(check_in_location_id),
            check_out: None,
            check_out_location_id: None,
            break_minutes: 0,
            lateness_minutes,
            worked_minutes: None,
            active: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.active && self.check_out.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct BreakInterval {
    #[schema(example = 10)]
    pub id: u64,

    #[schema(example = 1)]
    pub attendance_id: u64,

    #[sqlx(rename = "break_start")]
    #[schema(example = "12:00:00", value_type = String)]
    pub start: NaiveTime,

    #[sqlx(rename = "break_end")]
    #[schema(example = "13:00:00", value_type = Option<String>)]
    pub end: Option<NaiveTime>,

    #[schema(example = 60)]
    pub duration_minutes: Option<i64>,

    pub return_location_id: Option<u64>,

    pub active: bool,
}

impl BreakInterval {
    pub fn started(attendance_id: u64, start: NaiveTime) -> Self {
        Self {
            id: 0,
            attendance_id,
            start,
            end: None,
            duration_minutes: None,
            return_location_id: None,
            active: true,
        }
    }

    pub fn is_open(&self) -> bool {
        self.active && self.end.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.active && self.end.is_some()
    }
}
