use crate::config::VehicleSettings;
use crate::procgen::HeightSampler;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Per-frame driver input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveInput {
    /// -1.0 (full reverse) to 1.0 (full forward)
    pub throttle: f32,
    /// 0.0 to 1.0
    pub brake: f32,
    /// -1.0 (right) to 1.0 (left)
    pub steer: f32,
}

/// Kinematic box vehicle that rides on the terrain surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Heading around +Y; 0 faces +Z
    pub heading_rad: f32,
    pub speed: f32,
}

impl VehicleState {
    /// Vehicle parked at `(x, z)` facing +Z, resting on the ground.
    pub fn spawn(x: f32, z: f32, heights: &impl HeightSampler, settings: &VehicleSettings) -> Self {
        Self {
            x,
            y: heights.height(x, z) + settings.ride_height,
            z,
            heading_rad: 0.0,
            speed: 0.0,
        }
    }

    /// Unit forward direction on the XZ plane.
    pub fn forward(&self) -> (f32, f32) {
        (self.heading_rad.sin(), self.heading_rad.cos())
    }

    /// Advances the vehicle by `dt` seconds and clamps it to the ground.
    pub fn step(
        &mut self,
        input: &DriveInput,
        heights: &impl HeightSampler,
        settings: &VehicleSettings,
        dt: f32,
    ) {
        let throttle = input.throttle.clamp(-1.0, 1.0);
        let brake = input.brake.clamp(0.0, 1.0);
        let steer = input.steer.clamp(-1.0, 1.0);

        // Longitudinal
        self.speed += throttle * settings.acceleration * dt;
        let brake_delta = brake * settings.brake_deceleration * dt;
        self.speed = if self.speed > 0.0 {
            (self.speed - brake_delta).max(0.0)
        } else {
            (self.speed + brake_delta).min(0.0)
        };
        self.speed -= self.speed * settings.drag * dt;
        self.speed = self.speed.clamp(-settings.max_reverse_speed, settings.max_speed);

        // Steering authority grows with speed so a parked car cannot spin
        if settings.max_speed > 0.0 {
            let authority = (self.speed / settings.max_speed).clamp(-1.0, 1.0);
            self.heading_rad = normalize_angle(self.heading_rad + steer * settings.turn_rate * authority * dt);
        }

        let (fx, fz) = self.forward();
        self.x += fx * self.speed * dt;
        self.z += fz * self.speed * dt;

        self.y = heights.height(self.x, self.z) + settings.ride_height;
    }
}

/// Normalize angle to -PI to PI range
fn normalize_angle(angle: f32) -> f32 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(x: f32, z: f32) -> f32 {
        0.1 * z + 0.05 * x
    }

    #[test]
    fn test_spawn_on_ground() {
        let settings = VehicleSettings::default();
        let car = VehicleState::spawn(10.0, 20.0, &ramp, &settings);
        assert!((car.y - (ramp(10.0, 20.0) + settings.ride_height)).abs() < 1e-5);
        assert_eq!(car.speed, 0.0);
    }

    #[test]
    fn test_throttle_accelerates_forward() {
        let settings = VehicleSettings::default();
        let mut car = VehicleState::spawn(0.0, 0.0, &ramp, &settings);
        let input = DriveInput {
            throttle: 1.0,
            ..Default::default()
        };

        for _ in 0..60 {
            car.step(&input, &ramp, &settings, 1.0 / 60.0);
        }

        assert!(car.speed > 0.0);
        assert!(car.z > 0.0);
        assert!(car.x.abs() < 1e-4);
        assert!((car.y - (ramp(car.x, car.z) + settings.ride_height)).abs() < 1e-4);
    }

    #[test]
    fn test_speed_is_capped() {
        let settings = VehicleSettings::default();
        let mut car = VehicleState::spawn(0.0, 0.0, &ramp, &settings);
        let input = DriveInput {
            throttle: 1.0,
            ..Default::default()
        };

        for _ in 0..10_000 {
            car.step(&input, &ramp, &settings, 1.0 / 60.0);
        }

        assert!(car.speed <= settings.max_speed);
    }

    #[test]
    fn test_brake_never_reverses() {
        let settings = VehicleSettings::default();
        let mut car = VehicleState::spawn(0.0, 0.0, &ramp, &settings);
        car.speed = 5.0;
        let input = DriveInput {
            brake: 1.0,
            ..Default::default()
        };

        for _ in 0..120 {
            car.step(&input, &ramp, &settings, 1.0 / 60.0);
        }

        assert_eq!(car.speed, 0.0);
    }

    #[test]
    fn test_steering_needs_speed() {
        let settings = VehicleSettings::default();
        let mut car = VehicleState::spawn(0.0, 0.0, &ramp, &settings);
        let input = DriveInput {
            steer: 1.0,
            ..Default::default()
        };

        car.step(&input, &ramp, &settings, 0.1);
        assert_eq!(car.heading_rad, 0.0);

        car.speed = settings.max_speed;
        car.step(&input, &ramp, &settings, 0.1);
        assert!(car.heading_rad > 0.0);
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-4 || (normalize_angle(3.0 * PI) + PI).abs() < 1e-4);
        assert!((normalize_angle(0.5) - 0.5).abs() < 1e-6);
        assert!((normalize_angle(-2.0 * PI - 0.5) + 0.5).abs() < 1e-4);
    }
}
