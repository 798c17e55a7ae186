use strum_macros::{AsRefStr, Display};
use thiserror::Error;

/// Stable machine-readable reason attached to every rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RejectionKind {
    AlreadyCheckedIn,
    NotCheckedIn,
    InvalidRecord,
    BreakAlreadyActive,
    NoActiveBreak,
    BreakTooEarly,
    BreakStillOpen,
    InvalidCoordinate,
    UnknownShift,
    RecordNotFound,
    RecordExists,
    InvalidCorrection,
    InvalidPeriod,
    InvalidFaceImage,
    ShiftNotAllowed,
    OutsideAllowedLocation,
    LocationNotGranted,
    FaceMismatch,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum BiometricError {
    #[error("face service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("face service answered {0}")]
    Status(u16),
}

/// Outcome of a refused or failed attendance operation.
#[derive(Debug, Error)]
pub enum AttendanceError {
    /// A precondition was not met.
    #[error("{message}")]
    Validation {
        kind: RejectionKind,
        message: String,
    },

    /// The employee may not do this here, or is not who they claim.
    #[error("{message}")]
    Authorization {
        kind: RejectionKind,
        message: String,
    },

    /// A collaborator failed; details stay in the logs.
    #[error("attendance service unavailable")]
    Dependency(#[from] StoreError),
}

impl AttendanceError {
    pub fn validation(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            message: message.into(),
        }
    }

    pub fn authorization(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self::Authorization {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> Option<RejectionKind> {
        match self {
            Self::Validation { kind, .. } | Self::Authorization { kind, .. } => Some(*kind),
            Self::Dependency(_) => None,
        }
    }
}

pub type AttendanceResult<T> = Result<T, AttendanceError>;
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_display_is_the_message() {
        let err = AttendanceError::validation(
            RejectionKind::AlreadyCheckedIn,
            "already has active attendance",
        );
        assert_eq!(err.to_string(), "already has active attendance");
        assert_eq!(err.kind(), Some(RejectionKind::AlreadyCheckedIn));
        assert_eq!(RejectionKind::AlreadyCheckedIn.as_ref(), "already_checked_in");
    }

    #[test]
    fn dependency_failure_hides_details() {
        let err: AttendanceError = StoreError::Unavailable("db-7 refused".into()).into();
        assert_eq!(err.to_string(), "attendance service unavailable");
        assert_eq!(err.kind(), None);
    }
}
