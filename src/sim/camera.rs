use super::vehicle::VehicleState;
use crate::config::VehicleSettings;
use crate::mesh::Vertex3D;
use serde::{Deserialize, Serialize};

/// Third-person camera trailing the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaseCamera {
    pub position: Vertex3D,
    pub look_at: Vertex3D,
    pub distance: f32,
    pub height: f32,
    /// Higher is snappier; 0 freezes the camera
    pub stiffness: f32,
}

impl ChaseCamera {
    /// Camera already sitting at its rest offset behind `vehicle`.
    pub fn behind(vehicle: &VehicleState, settings: &VehicleSettings) -> Self {
        let mut camera = Self {
            position: Vertex3D::new(0.0, 0.0, 0.0),
            look_at: Vertex3D::new(vehicle.x, vehicle.y, vehicle.z),
            distance: settings.camera_distance,
            height: settings.camera_height,
            stiffness: settings.camera_stiffness,
        };
        camera.position = camera.target(vehicle);
        camera
    }

    /// Rest position: behind the vehicle along its heading, raised by `height`.
    pub fn target(&self, vehicle: &VehicleState) -> Vertex3D {
        let (fx, fz) = vehicle.forward();
        Vertex3D::new(
            vehicle.x - fx * self.distance,
            vehicle.y + self.height,
            vehicle.z - fz * self.distance,
        )
    }

    /// Eases toward the rest position with a frame-rate independent factor.
    pub fn follow(&mut self, vehicle: &VehicleState, dt: f32) {
        let factor = 1.0 - (-self.stiffness * dt).exp();
        self.position = self.position.lerp(&self.target(vehicle), factor);
        self.look_at = Vertex3D::new(vehicle.x, vehicle.y, vehicle.z);
    }
}
