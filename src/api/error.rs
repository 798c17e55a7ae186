use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;

use crate::attendance::error::AttendanceError;

impl ResponseError for AttendanceError {
    fn status_code(&self) -> StatusCode {
        match self {
            AttendanceError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AttendanceError::Authorization { .. } => StatusCode::FORBIDDEN,
            AttendanceError::Dependency(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AttendanceError::Validation { kind, message }
            | AttendanceError::Authorization { kind, message } => {
                HttpResponse::build(self.status_code()).json(json!({
                    "message": message,
                    "kind": kind.as_ref()
                }))
            }
            AttendanceError::Dependency(e) => {
                tracing::error!(error = %e, "Attendance store failed");
                HttpResponse::InternalServerError().json(json!({
                    "message": "Internal Server Error"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::error::{RejectionKind, StoreError};

    #[test]
    fn status_codes_follow_the_taxonomy() {
        let validation = AttendanceError::validation(RejectionKind::NoActiveBreak, "no active break");
        let authorization =
            AttendanceError::authorization(RejectionKind::FaceMismatch, "face does not match");
        let dependency = AttendanceError::from(StoreError::Unavailable("down".into()));

        assert_eq!(validation.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(authorization.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(dependency.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(dependency.error_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
