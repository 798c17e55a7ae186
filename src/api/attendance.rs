use crate::attendance::error::{AttendanceError, AttendanceResult, RejectionKind};
use crate::attendance::ledger::{AttendanceLedger, AttendanceReceipt, DailyStatus};
use crate::attendance::location::AuthorizedLocation;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::geofence::Coordinate;
use actix_web::{HttpResponse, Responder, web};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64_STANDARD};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckInRequest {
    #[schema(example = -5.1477)]
    pub latitude: f64,
    #[schema(example = 119.4327)]
    pub longitude: f64,
    /// Defaults to the regular shift.
    #[schema(example = 1)]
    pub shift_id: Option<u64>,
    /// Base64 JPEG, optionally as a data URL.
    #[schema(example = "/9j/4AAQSkZJRgABAQ...")]
    pub face_image: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LocationRequest {
    #[schema(example = -5.1477)]
    pub latitude: f64,
    #[schema(example = 119.4327)]
    pub longitude: f64,
    #[schema(example = "/9j/4AAQSkZJRgABAQ...")]
    pub face_image: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusQuery {
    /// Work date to show when nothing is open, defaults to today
    #[param(value_type = Option<String>, format = "date", example = "2026-01-05")]
    pub date: Option<NaiveDate>,
}

fn decode_face(raw: Option<&str>) -> AttendanceResult<Vec<u8>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Vec::new());
    };

    let payload = match raw.strip_prefix("data:") {
        Some(data_url) => data_url.split_once(',').map_or(data_url, |(_, data)| data),
        None => raw,
    };

    BASE64_STANDARD.decode(payload).map_err(|_| {
        AttendanceError::validation(RejectionKind::InvalidFaceImage, "face_image must be base64")
    })
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Checked in successfully", body = AttendanceReceipt),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Location, shift or face rejected", body = Object, example = json!({
            "message": "not at an allowed location",
            "kind": "outside_allowed_location"
        })),
        (status = 422, description = "Already checked in", body = Object, example = json!({
            "message": "already has active attendance",
            "kind": "already_checked_in"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    config: web::Data<Config>,
    body: web::Json<CheckInRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let face = decode_face(body.face_image.as_deref())?;

    let receipt = ledger
        .check_in(
            employee_id,
            config.local_now(),
            body.shift_id,
            Coordinate::new(body.latitude, body.longitude),
            &face,
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully",
        "data": receipt
    })))
}

/// Break start endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/break/start",
    responses(
        (status = 200, description = "Break started", body = AttendanceReceipt),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "No open record, break already active or too early", body = Object, example = json!({
            "message": "break cannot start before 11:30",
            "kind": "break_too_early"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn break_start(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let receipt = ledger.break_start(employee_id, config.local_now()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Break started",
        "data": receipt
    })))
}

/// Break end endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/break/end",
    request_body = LocationRequest,
    responses(
        (status = 200, description = "Break ended", body = AttendanceReceipt),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Location or face rejected"),
        (status = 422, description = "No active break", body = Object, example = json!({
            "message": "no active break",
            "kind": "no_active_break"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn break_end(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    config: web::Data<Config>,
    body: web::Json<LocationRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let face = decode_face(body.face_image.as_deref())?;

    let receipt = ledger
        .break_end(
            employee_id,
            config.local_now(),
            Coordinate::new(body.latitude, body.longitude),
            &face,
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Break ended",
        "data": receipt
    })))
}

/// Check-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance/check-out",
    request_body = LocationRequest,
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceReceipt),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Location or face rejected"),
        (status = 422, description = "No open record or break still open", body = Object, example = json!({
            "message": "finish your break first",
            "kind": "break_still_open"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    config: web::Data<Config>,
    body: web::Json<LocationRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let face = decode_face(body.face_image.as_deref())?;

    let receipt = ledger
        .check_out(
            employee_id,
            config.local_now(),
            Coordinate::new(body.latitude, body.longitude),
            &face,
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully",
        "data": receipt
    })))
}

/// Today's attendance of the caller
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    params(StatusQuery),
    responses(
        (status = 200, description = "Attendance status", body = DailyStatus),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn today(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    config: web::Data<Config>,
    query: web::Query<StatusQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let date = query.date.unwrap_or_else(|| config.local_now().date());

    let status = ledger.daily_status(employee_id, date).await?;

    Ok(HttpResponse::Ok().json(status))
}

/// Checks whether the caller may record attendance from a coordinate
#[utoipa::path(
    post,
    path = "/api/attendance/location",
    request_body = LocationRequest,
    responses(
        (status = 200, description = "Location accepted", body = AuthorizedLocation),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Location rejected", body = Object, example = json!({
            "message": "you are at Head Office but not registered there",
            "kind": "location_not_granted"
        })),
        (status = 422, description = "Malformed coordinates"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn validate_location(
    auth: AuthUser,
    ledger: web::Data<AttendanceLedger>,
    body: web::Json<LocationRequest>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let location = ledger
        .authorize_location(employee_id, Coordinate::new(body.latitude, body.longitude))
        .await?;

    Ok(HttpResponse::Ok().json(location))
}
