pub mod attendance;
pub mod geofence;
pub mod role;
pub mod shift;
