pub mod attendance;
pub mod error;
pub mod presensi;

use chrono::NaiveTime;

use crate::attendance::error::{AttendanceError, AttendanceResult, RejectionKind};

/// Parses an optional `HH:MM` (or `HH:MM:SS`) request field.
pub fn parse_clock(field: &str, raw: Option<&str>) -> AttendanceResult<Option<NaiveTime>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };

    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map(Some)
        .map_err(|_| {
            AttendanceError::validation(
                RejectionKind::InvalidCorrection,
                format!("{field} must be HH:MM"),
            )
        })
}
