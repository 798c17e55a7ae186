use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    #[schema(example = -5.1477)]
    pub latitude: f64,
    #[schema(example = 119.4327)]
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Attendance location with an allowed radius around its center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Geofence {
    #[schema(example = 3)]
    pub id: u64,

    #[schema(example = "Head Office")]
    pub name: String,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    #[schema(example = 50.0)]
    pub radius_meters: Option<f64>,

    pub active: bool,
}

impl Geofence {
    pub fn center(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.latitude?, self.longitude?))
    }
}
