//! Twist control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use super::{FUEL_DENSITY_KGPGAL, MIN_CONTROL_RATE_HZ};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for twist control, as loaded from `twist_ctrl.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Params {
    /// Physical constants of the vehicle
    pub vehicle: VehicleParams,

    /// Controller tuning
    pub ctrl: CtrlParams,
}

/// Physical constants of the vehicle.
///
/// The defaults describe the reference vehicle and are enough to run the
/// software, a real deployment needs calibrated values.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct VehicleParams {
    /// Curb mass of the vehicle.
    ///
    /// Units: kilograms
    pub vehicle_mass_kg: f64,

    /// Fuel tank capacity, used to estimate the fuel mass added to the curb
    /// mass.
    ///
    /// Units: US gallons
    pub fuel_capacity_gal: f64,

    /// Decelerations smaller than this are not worth braking for, the vehicle
    /// coasts instead.
    ///
    /// Units: meters/second^2
    pub brake_deadband_mss: f64,

    /// Most negative acceleration the vehicle may be commanded to.
    ///
    /// Units: meters/second^2
    pub decel_limit_mss: f64,

    /// Most positive acceleration the vehicle may be commanded to.
    ///
    /// Units: meters/second^2
    pub accel_limit_mss: f64,

    /// Units: meters
    pub wheel_radius_m: f64,

    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheel_base_m: f64,

    /// Ratio of steering wheel angle to road wheel angle.
    pub steer_ratio: f64,

    /// Largest lateral acceleration allowed while turning.
    ///
    /// Units: meters/second^2
    pub max_lat_accel_mss: f64,

    /// Largest steering wheel angle either side of centre.
    ///
    /// Units: radians
    pub max_steer_angle_rad: f64,
}

/// Tuning of the twist controller.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CtrlParams {
    /// Speed controller proportional gain
    pub speed_k_p: f64,

    /// Speed controller integral gain
    pub speed_k_i: f64,

    /// Speed controller derivative gain
    pub speed_k_d: f64,

    /// Lower bound of the speed controller output (and its integral term).
    ///
    /// Units: meters/second^2
    pub speed_min_output_mss: f64,

    /// Upper bound of the speed controller output (and its integral term).
    ///
    /// Units: meters/second^2
    pub speed_max_output_mss: f64,

    /// Time constant of the velocity low pass filter. Zero disables
    /// filtering.
    ///
    /// Units: seconds
    pub vel_filter_tau_s: f64,

    /// Rate at which `Controller::control` is called. The gains above are
    /// tuned against this rate.
    ///
    /// Units: hertz
    pub control_rate_hz: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A parameter set which would produce wrong control outputs.
#[derive(Debug, Error, PartialEq)]
pub enum ParamsError {
    #[error("{0} must be finite (got {1})")]
    NotFinite(&'static str, f64),

    #[error("{0} must be greater than zero (got {1})")]
    NotPositive(&'static str, f64),

    #[error("{0} must not be negative (got {1})")]
    Negative(&'static str, f64),

    #[error("decel_limit_mss must be less than zero (got {0})")]
    DecelLimitNotNegative(f64),

    #[error("accel_limit_mss must be greater than zero (got {0})")]
    AccelLimitNotPositive(f64),

    #[error("Output range is empty, min ({min}) is greater than max ({max})")]
    InvalidOutputRange { min: f64, max: f64 },

    #[error("Control rate must be at least {} Hz (got {0} Hz)", MIN_CONTROL_RATE_HZ)]
    ControlRateTooLow(f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the full parameter set.
    pub fn validate(&self) -> Result<(), ParamsError> {
        self.vehicle.validate()?;
        self.ctrl.validate()
    }
}

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            vehicle_mass_kg: 1736.35,
            fuel_capacity_gal: 13.5,
            brake_deadband_mss: 0.1,
            decel_limit_mss: -5.0,
            accel_limit_mss: 1.0,
            wheel_radius_m: 0.2413,
            wheel_base_m: 2.8498,
            steer_ratio: 14.8,
            max_lat_accel_mss: 3.0,
            max_steer_angle_rad: 8.0,
        }
    }
}

impl VehicleParams {
    /// Check the vehicle constants are physically meaningful.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let all = [
            ("vehicle_mass_kg", self.vehicle_mass_kg),
            ("fuel_capacity_gal", self.fuel_capacity_gal),
            ("brake_deadband_mss", self.brake_deadband_mss),
            ("decel_limit_mss", self.decel_limit_mss),
            ("accel_limit_mss", self.accel_limit_mss),
            ("wheel_radius_m", self.wheel_radius_m),
            ("wheel_base_m", self.wheel_base_m),
            ("steer_ratio", self.steer_ratio),
            ("max_lat_accel_mss", self.max_lat_accel_mss),
            ("max_steer_angle_rad", self.max_steer_angle_rad),
        ];
        for (name, value) in all.iter() {
            check_finite(*name, *value)?;
        }

        if self.decel_limit_mss >= 0.0 {
            return Err(ParamsError::DecelLimitNotNegative(self.decel_limit_mss));
        }
        if self.accel_limit_mss <= 0.0 {
            return Err(ParamsError::AccelLimitNotPositive(self.accel_limit_mss));
        }

        check_positive("vehicle_mass_kg", self.vehicle_mass_kg)?;
        check_positive("wheel_radius_m", self.wheel_radius_m)?;
        check_positive("wheel_base_m", self.wheel_base_m)?;
        check_positive("steer_ratio", self.steer_ratio)?;
        check_positive("max_lat_accel_mss", self.max_lat_accel_mss)?;
        check_positive("max_steer_angle_rad", self.max_steer_angle_rad)?;
        check_non_negative("fuel_capacity_gal", self.fuel_capacity_gal)?;
        check_non_negative("brake_deadband_mss", self.brake_deadband_mss)
    }

    /// Curb mass plus the mass of a full tank of fuel.
    ///
    /// Units: kilograms
    pub fn total_mass_kg(&self) -> f64 {
        self.vehicle_mass_kg + self.fuel_capacity_gal * FUEL_DENSITY_KGPGAL
    }
}

impl Default for CtrlParams {
    fn default() -> Self {
        Self {
            speed_k_p: 0.3,
            speed_k_i: 0.1,
            speed_k_d: 0.0,
            speed_min_output_mss: -5.0,
            speed_max_output_mss: 1.0,
            vel_filter_tau_s: 0.5,
            control_rate_hz: 10.0,
        }
    }
}

impl CtrlParams {
    /// Check the controller tuning.
    pub fn validate(&self) -> Result<(), ParamsError> {
        check_finite("speed_k_p", self.speed_k_p)?;
        check_finite("speed_k_i", self.speed_k_i)?;
        check_finite("speed_k_d", self.speed_k_d)?;
        check_finite("speed_min_output_mss", self.speed_min_output_mss)?;
        check_finite("speed_max_output_mss", self.speed_max_output_mss)?;
        check_finite("vel_filter_tau_s", self.vel_filter_tau_s)?;
        check_finite("control_rate_hz", self.control_rate_hz)?;

        if self.speed_min_output_mss > self.speed_max_output_mss {
            return Err(ParamsError::InvalidOutputRange {
                min: self.speed_min_output_mss,
                max: self.speed_max_output_mss,
            });
        }

        check_non_negative("vel_filter_tau_s", self.vel_filter_tau_s)?;

        if self.control_rate_hz < MIN_CONTROL_RATE_HZ {
            return Err(ParamsError::ControlRateTooLow(self.control_rate_hz));
        }

        Ok(())
    }

    /// Time between two calls of the controller.
    ///
    /// Units: seconds
    pub fn sample_period_s(&self) -> f64 {
        1.0 / self.control_rate_hz
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

pub(crate) fn check_finite(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParamsError::NotFinite(name, value))
    }
}

pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParamsError::NotPositive(name, value))
    }
}

pub(crate) fn check_non_negative(name: &'static str, value: f64) -> Result<(), ParamsError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ParamsError::Negative(name, value))
    }
}
