use crate::api::attendance::{CheckInRequest, LocationRequest};
use crate::api::presensi::{ManualPresensi, UpdatePresensi};
use crate::attendance::ledger::{AttendanceReceipt, AttendanceState, DailyStatus};
use crate::attendance::location::AuthorizedLocation;
use crate::attendance::recap::{DayStatus, MonthlyRecap, RecapDay, RecapTotals};
use crate::model::attendance::{AttendanceRecord, BreakInterval};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance engine of the HRM system

Records when employees start and end work, take breaks, and where they were
when they did.

### 🔹 Key Features
- **Attendance**
  - Check-in, break start/end and check-out, each validated against the
    employee's geofences (or WFH eligibility) and optionally a face match
  - Night shifts spanning midnight stay on one record
- **Presensi (Admin)**
  - Manual entry, correction, recalculation and soft delete of records
  - Monthly recap per employee (H/I/S/C/A/L)

### 🔐 Security
All endpoints require a **JWT Bearer** access token.
Presensi endpoints are limited to **Admin**, recaps to **Admin** or **HR**.

### 📦 Response Format
- Rejections carry a human-readable `message` and a stable `kind`
- 422 for unmet preconditions, 403 for location/shift/face refusals

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::break_start,
        crate::api::attendance::break_end,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::validate_location,

        crate::api::presensi::create_manual_presensi,
        crate::api::presensi::update_presensi,
        crate::api::presensi::recalculate_presensi,
        crate::api::presensi::delete_presensi,
        crate::api::presensi::monthly_recap
    ),
    components(
        schemas(
            CheckInRequest,
            LocationRequest,
            UpdatePresensi,
            ManualPresensi,
            AttendanceRecord,
            BreakInterval,
            AuthorizedLocation,
            AttendanceReceipt,
            AttendanceState,
            DailyStatus,
            DayStatus,
            RecapDay,
            RecapTotals,
            MonthlyRecap
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Employee attendance APIs"),
        (name = "Presensi", description = "Attendance administration APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
