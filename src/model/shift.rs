use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct ShiftDefinition {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Normal")]
    pub name: String,

    #[schema(example = "08:00:00", value_type = String)]
    pub start_time: NaiveTime,

    #[schema(example = "17:00:00", value_type = String)]
    pub end_time: NaiveTime,

    /// Nominal working minutes per day.
    #[schema(example = 480)]
    pub nominal_minutes: i64,
}

/// Fixed break injected at check-in for shifts with a mandated pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}
