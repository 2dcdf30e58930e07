//! # Twist control module
//!
//! Twist control converts a twist command (target linear speed and yaw rate)
//! and the measured vehicle speed into the three drive-by-wire actuator
//! demands: throttle pedal fraction, brake torque and steering wheel angle.
//!
//! The module is built from four pieces:
//!
//! - `LowPassFilter` smooths the noisy velocity measurement.
//! - `PidController` regulates the speed error into an acceleration demand,
//!   which is then split into throttle or brake.
//! - `YawController` converts the yaw rate demand into a steering wheel angle
//!   using a kinematic single-track model.
//! - `EngageState` tracks whether the controller has authority over the
//!   vehicle. While a human is driving the speed controller is held reset so
//!   that no error accumulates that would make the vehicle lurch when control
//!   is handed back.
//!
//! `Controller` combines these into a single per-cycle `control()` call, and
//! `TwistCtrl` wraps the controller as a cyclic module of the executable.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controller;
pub mod engage;
pub mod lowpass;
pub mod params;
pub mod pid;
pub mod state;
pub mod yaw_ctrl;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use controller::*;
pub use engage::*;
pub use lowpass::LowPassFilter;
pub use params::*;
pub use pid::PidController;
pub use state::*;
pub use yaw_ctrl::YawController;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Density of gasoline, used to estimate the mass of the fuel on board.
///
/// Units: kilograms/US gallon
pub const FUEL_DENSITY_KGPGAL: f64 = 2.858;

/// Speed floor used in place of the current speed when dividing by it, so
/// that near-standstill speeds do not blow up the yaw calculations.
///
/// Units: meters/second
pub const MIN_SPEED_FLOOR_MS: f64 = 0.1;

/// Lowest control rate the speed controller gains are valid for.
///
/// Units: hertz
pub const MIN_CONTROL_RATE_HZ: f64 = 10.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TwistCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum TwistCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(ParamsError),

    #[error("Could not initialise the archives: {0}")]
    ArchiveInitError(String),

    #[error("Input {0} is not finite (got {1})")]
    NonFiniteInput(&'static str, f64),
}
