use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::attendance::error::{AttendanceError, AttendanceResult, RejectionKind};
use crate::attendance::store::AttendanceStore;
use crate::model::geofence::Coordinate;
use crate::utils::geo;

pub const WFH_LOCATION_NAME: &str = "WFH";

/// Location an employee is allowed to record attendance from.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthorizedLocation {
    #[schema(example = 3)]
    pub geofence_id: u64,
    #[schema(example = "Head Office")]
    pub name: String,
    pub is_wfh: bool,
    /// Distance to the geofence center, absent for WFH.
    #[schema(example = 12.4)]
    pub distance_m: Option<f64>,
}

#[derive(Clone)]
pub struct LocationPolicy {
    store: Arc<dyn AttendanceStore>,
    wfh_location_id: u64,
}

impl LocationPolicy {
    pub fn new(store: Arc<dyn AttendanceStore>, wfh_location_id: u64) -> Self {
        Self {
            store,
            wfh_location_id,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn authorize(
        &self,
        employee_id: u64,
        point: Coordinate,
    ) -> AttendanceResult<AuthorizedLocation> {
        if !point.is_valid() {
            return Err(AttendanceError::validation(
                RejectionKind::InvalidCoordinate,
                "invalid coordinates",
            ));
        }

        let geofences = self.store.list_active_geofences().await?;

        let Some(found) = geo::find_valid_geofence(point, &geofences) else {
            if self.store.is_wfh_eligible(employee_id).await? {
                tracing::info!(employee_id, "Attendance accepted as WFH");
                return Ok(AuthorizedLocation {
                    geofence_id: self.wfh_location_id,
                    name: WFH_LOCATION_NAME.to_string(),
                    is_wfh: true,
                    distance_m: None,
                });
            }

            return Err(AttendanceError::authorization(
                RejectionKind::OutsideAllowedLocation,
                "not at an allowed location",
            ));
        };

        let grants = self.store.employee_grants(employee_id).await?;
        if !grants.contains(&found.geofence_id) {
            return Err(AttendanceError::authorization(
                RejectionKind::LocationNotGranted,
                format!("you are at {} but not registered there", found.name),
            ));
        }

        Ok(AuthorizedLocation {
            geofence_id: found.geofence_id,
            name: found.name,
            is_wfh: false,
            distance_m: Some(found.distance_m),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::memory::MemoryStore;

    const OFFICE: Coordinate = Coordinate::new(-5.1477, 119.4327);
    const FAR_AWAY: Coordinate = Coordinate::new(-6.2000, 106.8166);

    fn policy(store: MemoryStore) -> LocationPolicy {
        LocationPolicy::new(Arc::new(store), 900)
    }

    fn store() -> MemoryStore {
        MemoryStore::default()
            .with_geofence(3, "Head Office", OFFICE.latitude, OFFICE.longitude)
            .with_grant(1, 3)
    }

    #[actix_web::test]
    async fn granted_geofence_is_accepted() {
        let found = policy(store()).authorize(1, OFFICE).await.unwrap();

        assert_eq!(found.geofence_id, 3);
        assert_eq!(found.name, "Head Office");
        assert!(!found.is_wfh);
        assert_eq!(found.distance_m, Some(0.0));
    }

    #[actix_web::test]
    async fn ungranted_geofence_names_the_location() {
        let err = policy(store()).authorize(2, OFFICE).await.unwrap_err();

        assert_eq!(err.kind(), Some(RejectionKind::LocationNotGranted));
        assert!(err.to_string().contains("Head Office"));
        assert!(matches!(err, AttendanceError::Authorization { .. }));
    }

    #[actix_web::test]
    async fn outside_every_geofence() {
        let err = policy(store()).authorize(1, FAR_AWAY).await.unwrap_err();
        assert_eq!(err.kind(), Some(RejectionKind::OutsideAllowedLocation));

        let found = policy(store().with_wfh(1)).authorize(1, FAR_AWAY).await.unwrap();
        assert!(found.is_wfh);
        assert_eq!(found.geofence_id, 900);
        assert_eq!(found.name, WFH_LOCATION_NAME);
    }

    #[actix_web::test]
    async fn wfh_does_not_bypass_a_matched_geofence_grant() {
        let err = policy(store().with_wfh(2)).authorize(2, OFFICE).await.unwrap_err();
        assert_eq!(err.kind(), Some(RejectionKind::LocationNotGranted));
    }

    #[actix_web::test]
    async fn malformed_coordinates_are_validation_errors() {
        let err = policy(store())
            .authorize(1, Coordinate::new(f64::NAN, 119.0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AttendanceError::Validation { kind: RejectionKind::InvalidCoordinate, .. }
        ));
    }

    #[actix_web::test]
    async fn store_failure_is_a_dependency_error() {
        let store = store();
        store.fail();
        let err = policy(store).authorize(1, OFFICE).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Dependency(_)));
    }
}
