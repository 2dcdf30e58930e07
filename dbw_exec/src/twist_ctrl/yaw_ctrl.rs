//! # Yaw controller
//!
//! Converts a yaw rate demand into a steering wheel angle using the kinematic
//! single-track (bicycle) model of the vehicle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;
use util::maths::clamp_abs;

use super::{VehicleParams, MIN_SPEED_FLOOR_MS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Stateless yaw rate to steering angle conversion.
#[derive(Debug, Serialize, Clone)]
pub struct YawController {
    wheel_base_m: f64,
    steer_ratio: f64,
    max_lat_accel_mss: f64,
    max_steer_angle_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl YawController {
    /// Build the controller from the vehicle constants.
    ///
    /// The parameters are expected to have been validated already.
    pub fn new(vehicle: &VehicleParams) -> Self {
        Self {
            wheel_base_m: vehicle.wheel_base_m,
            steer_ratio: vehicle.steer_ratio,
            max_lat_accel_mss: vehicle.max_lat_accel_mss,
            max_steer_angle_rad: vehicle.max_steer_angle_rad,
        }
    }

    /// Get the steering wheel angle which produces the target yaw rate.
    ///
    /// The yaw rate demand is first rescaled from the target speed to the
    /// current speed, so that the same twist command produces the same
    /// turning radius whilst the vehicle is still accelerating towards the
    /// target speed. It is then limited so the lateral acceleration at the
    /// current speed does not exceed the vehicle's limit.
    ///
    /// The result is limited to the steering hardware range
    /// (`max_steer_angle_rad`).
    ///
    /// Units: meters/second, radians/second in, radians out.
    pub fn get_steering(
        &self,
        target_linear_vel_ms: f64,
        target_angular_vel_rads: f64,
        current_linear_vel_ms: f64,
    ) -> f64 {
        let mut angular_vel_rads = target_angular_vel_rads;

        if target_linear_vel_ms != 0.0 {
            // Multiply first, a tiny target speed would overflow the ratio
            // and give 0 * inf for a straight ahead demand
            let rescaled_rads =
                target_angular_vel_rads * current_linear_vel_ms / target_linear_vel_ms;

            if !rescaled_rads.is_nan() {
                angular_vel_rads = rescaled_rads;
            }
        }

        let speed_ms = current_linear_vel_ms.max(MIN_SPEED_FLOOR_MS);

        // Yaw rate at which the lateral acceleration limit is reached
        let max_yaw_rate_rads = self.max_lat_accel_mss / speed_ms;
        angular_vel_rads = clamp_abs(angular_vel_rads, max_yaw_rate_rads);

        let wheel_angle_rad = self.wheel_base_m * angular_vel_rads / speed_ms;

        clamp_abs(wheel_angle_rad * self.steer_ratio, self.max_steer_angle_rad)
    }

    /// Largest steering wheel angle either side of centre.
    pub fn steer_limit_rad(&self) -> f64 {
        self.max_steer_angle_rad
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use util::maths::approx_eq;

    fn yaw_ctrl() -> YawController {
        YawController::new(&VehicleParams::default())
    }

    #[test]
    fn test_straight() {
        let yc = yaw_ctrl();

        assert_eq!(yc.get_steering(10.0, 0.0, 10.0), 0.0);
        for speed in [0.5, 3.0, 25.0].iter() {
            assert_eq!(yc.get_steering(10.0, 0.0, *speed), 0.0);
        }
    }

    #[test]
    fn test_lateral_accel_saturation() {
        let v = VehicleParams::default();
        let yc = yaw_ctrl();

        let steer = yc.get_steering(5.0, 100.0, 5.0);
        let expected = v.wheel_base_m * (v.max_lat_accel_mss / 5.0) / 5.0 * v.steer_ratio;

        assert!(approx_eq(steer, expected, 1e-9));
        assert!(steer < v.max_steer_angle_rad);

        // Symmetric to the right
        assert!(approx_eq(yc.get_steering(5.0, -100.0, 5.0), -expected, 1e-9));
    }

    #[test]
    fn test_rescale_to_current_speed() {
        let v = VehicleParams::default();
        let yc = yaw_ctrl();

        // Half the target speed means half the yaw rate
        let steer = yc.get_steering(10.0, 0.1, 5.0);
        let expected = v.wheel_base_m * 0.05 / 5.0 * v.steer_ratio;

        assert!(approx_eq(steer, expected, 1e-9));
    }

    #[test]
    fn test_zero_target_speed_keeps_yaw_rate() {
        let v = VehicleParams::default();
        let yc = yaw_ctrl();

        let steer = yc.get_steering(0.0, 0.1, 5.0);
        let expected = v.wheel_base_m * 0.1 / 5.0 * v.steer_ratio;

        assert!(approx_eq(steer, expected, 1e-9));
    }

    #[test]
    fn test_tiny_target_speed() {
        let v = VehicleParams::default();
        let yc = yaw_ctrl();

        // Straight ahead stays straight ahead
        assert_eq!(yc.get_steering(1e-310, 0.0, 5.0), 0.0);
        assert_eq!(yc.get_steering(-1e-310, 0.0, 5.0), 0.0);

        // A turn demand saturates at the lateral acceleration limit
        let steer = yc.get_steering(1e-310, 0.1, 5.0);
        let expected = v.wheel_base_m * (v.max_lat_accel_mss / 5.0) / 5.0 * v.steer_ratio;

        assert!(steer.is_finite());
        assert!(approx_eq(steer, expected, 1e-9));
    }

    #[test]
    fn test_standstill_is_finite_and_limited() {
        let yc = yaw_ctrl();

        let steer = yc.get_steering(0.0, 0.5, 0.0);

        assert!(steer.is_finite());
        assert_eq!(steer, yc.steer_limit_rad());
        assert_eq!(yc.get_steering(0.0, -0.5, 0.0), -yc.steer_limit_rad());
    }
}
