use crate::api::parse_clock;
use crate::attendance::error::{AttendanceError, RejectionKind};
use crate::attendance::ledger::{AttendanceCorrection, AttendanceLedger, AttendanceReceipt, ManualEntry};
use crate::attendance::recap::MonthlyRecap;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePresensi {
    #[schema(example = "08:00")]
    pub check_in: Option<String>,
    #[schema(example = 3)]
    pub check_in_location_id: Option<u64>,
    #[schema(example = "17:00")]
    pub check_out: Option<String>,
    #[schema(example = 3)]
    pub check_out_location_id: Option<u64>,
    #[schema(example = "12:00")]
    pub break_start: Option<String>,
    #[schema(example = "13:00")]
    pub break_end: Option<String>,
    #[schema(example = 3)]
    pub break_location_id: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ManualPresensi {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(example = 1)]
    pub shift_id: Option<u64>,
    #[schema(example = "08:00")]
    pub check_in: String,
    #[schema(example = 3)]
    pub check_in_location_id: u64,
    #[schema(example = "17:00")]
    pub check_out: Option<String>,
    pub check_out_location_id: Option<u64>,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
    pub break_location_id: Option<u64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecapQuery {
    /// Defaults to the current year
    #[param(example = 2026)]
    pub year: Option<i32>,
    /// 1-12, defaults to the current month
    #[param(example = 1)]
    pub month: Option<u32>,
}

/// Admin correction of an attendance record
#[utoipa::path(
    put,
    path = "/api/presensi/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record ID")
    ),
    request_body = UpdatePresensi,
    responses(
        (status = 200, description = "Attendance updated", body = AttendanceReceipt),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 422, description = "Record missing or correction invalid", body = Object, example = json!({
            "message": "attendance record not found",
            "kind": "record_not_found"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presensi"
)]
pub async fn update_presensi(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    path: web::Path<u64>,
    body: web::Json<UpdatePresensi>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let record_id = path.into_inner();
    let body = body.into_inner();

    let correction = AttendanceCorrection {
        check_in: parse_clock("check_in", body.check_in.as_deref())?,
        check_in_location_id: body.check_in_location_id,
        check_out: parse_clock("check_out", body.check_out.as_deref())?,
        check_out_location_id: body.check_out_location_id,
        break_start: parse_clock("break_start", body.break_start.as_deref())?,
        break_end: parse_clock("break_end", body.break_end.as_deref())?,
        break_return_location_id: body.break_location_id,
    };

    let receipt = ledger.admin_correct(record_id, correction).await?;
    tracing::info!(record_id, admin = auth.user_id, "Attendance corrected by admin");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance updated",
        "data": receipt
    })))
}

/// Re-derives break, lateness and worked minutes of a record
#[utoipa::path(
    post,
    path = "/api/presensi/{id}/recalculate",
    params(
        ("id" = u64, Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Attendance recalculated", body = AttendanceReceipt),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 422, description = "Record not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presensi"
)]
pub async fn recalculate_presensi(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let receipt = ledger.recalculate(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance recalculated",
        "data": receipt
    })))
}

/// Soft delete of an attendance record
#[utoipa::path(
    delete,
    path = "/api/presensi/{id}",
    params(
        ("id" = u64, Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Attendance deleted", body = Object, example = json!({
            "message": "Attendance deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 422, description = "Record not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presensi"
)]
pub async fn delete_presensi(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let record_id = path.into_inner();

    ledger.deactivate(record_id).await?;
    tracing::info!(record_id, admin = auth.user_id, "Attendance deleted by admin");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance deleted"
    })))
}

/// Manual attendance entry
#[utoipa::path(
    post,
    path = "/api/presensi/manual",
    request_body = ManualPresensi,
    responses(
        (status = 201, description = "Attendance created", body = AttendanceReceipt),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 422, description = "Attendance already exists on this date", body = Object, example = json!({
            "message": "attendance already exists on this date",
            "kind": "record_exists"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presensi"
)]
pub async fn create_manual_presensi(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    body: web::Json<ManualPresensi>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let body = body.into_inner();

    let check_in = parse_clock("check_in", Some(&body.check_in))?.ok_or_else(|| {
        AttendanceError::validation(RejectionKind::InvalidCorrection, "check_in is required")
    })?;

    let entry = ManualEntry {
        employee_id: body.employee_id,
        work_date: body.work_date,
        shift_id: body.shift_id,
        check_in,
        check_in_location_id: body.check_in_location_id,
        check_out: parse_clock("check_out", body.check_out.as_deref())?,
        check_out_location_id: body.check_out_location_id,
        break_start: parse_clock("break_start", body.break_start.as_deref())?,
        break_end: parse_clock("break_end", body.break_end.as_deref())?,
        break_return_location_id: body.break_location_id,
    };

    let receipt = ledger.admin_create(entry).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Attendance created",
        "data": receipt
    })))
}

/// Monthly attendance recap of one employee
#[utoipa::path(
    get,
    path = "/api/presensi/recap/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        RecapQuery
    ),
    responses(
        (status = 200, description = "Monthly recap", body = MonthlyRecap),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 422, description = "Invalid month"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Presensi"
)]
pub async fn monthly_recap(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    query: web::Query<RecapQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let today = config.local_now().date();
    let recap = ledger
        .monthly_recap(
            path.into_inner(),
            query.year.unwrap_or(today.year()),
            query.month.unwrap_or(today.month()),
            today,
        )
        .await?;

    Ok(HttpResponse::Ok().json(recap))
}
