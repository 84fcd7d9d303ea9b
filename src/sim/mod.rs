/// Headless driving simulation on top of the generated world
///
/// The vehicle reads the terrain height once per frame; the chase camera only
/// reads the vehicle.

pub mod camera;
pub mod vehicle;

pub use self::camera::ChaseCamera;
pub use self::vehicle::{DriveInput, VehicleState};
