//! # Drive-By-Wire Equipment Commands
//!
//! Commands sent to the vehicle's throttle, brake and steering actuators. The layout mirrors the
//! vehicle's DBW command messages: each actuator gets its own command carrying an `enable` flag,
//! a command type and the value itself.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Throttle pedal command.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct ThrottleCmd {
    /// If false the actuator ignores the command and returns control to the driver
    pub enable: bool,

    /// How `pedal_cmd` shall be interpreted
    pub pedal_cmd_type: PedalCmdType,

    /// The pedal demand.
    ///
    /// Units: fraction of pedal travel in [0, 1] for `PedalCmdType::Percent`
    pub pedal_cmd: f64,
}

/// Brake pedal command.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct BrakeCmd {
    /// If false the actuator ignores the command and returns control to the driver
    pub enable: bool,

    /// How `pedal_cmd` shall be interpreted
    pub pedal_cmd_type: PedalCmdType,

    /// The brake demand.
    ///
    /// Units: newton meters for `PedalCmdType::Torque`
    pub pedal_cmd: f64,
}

/// Steering wheel command.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct SteeringCmd {
    /// If false the actuator ignores the command and returns control to the driver
    pub enable: bool,

    /// Signed steering wheel angle, positive to the left.
    ///
    /// Units: radians
    pub steering_wheel_angle_cmd_rad: f64,
}

/// The full set of actuator commands produced on one control cycle.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct ActuatorCmds {
    pub throttle: ThrottleCmd,
    pub brake: BrakeCmd,
    pub steering: SteeringCmd,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Interpretation of a pedal command value.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub enum PedalCmdType {
    /// Fraction of full pedal travel
    Percent,

    /// Torque at the wheels in newton meters
    Torque,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ActuatorCmds {
    /// Build enabled commands from the controller outputs.
    ///
    /// `throttle` is a pedal fraction, `brake_nm` a wheel torque and `steer_rad` a steering wheel
    /// angle.
    pub fn enabled(throttle: f64, brake_nm: f64, steer_rad: f64) -> Self {
        Self {
            throttle: ThrottleCmd {
                enable: true,
                pedal_cmd_type: PedalCmdType::Percent,
                pedal_cmd: throttle,
            },
            brake: BrakeCmd {
                enable: true,
                pedal_cmd_type: PedalCmdType::Torque,
                pedal_cmd: brake_nm,
            },
            steering: SteeringCmd {
                enable: true,
                steering_wheel_angle_cmd_rad: steer_rad,
            },
        }
    }
}

impl Default for ActuatorCmds {
    /// Neutral, disabled commands.
    fn default() -> Self {
        Self {
            throttle: ThrottleCmd {
                enable: false,
                pedal_cmd_type: PedalCmdType::Percent,
                pedal_cmd: 0.0,
            },
            brake: BrakeCmd {
                enable: false,
                pedal_cmd_type: PedalCmdType::Torque,
                pedal_cmd: 0.0,
            },
            steering: SteeringCmd {
                enable: false,
                steering_wheel_angle_cmd_rad: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_enabled_cmds() {
        let cmds = ActuatorCmds::enabled(0.25, 0.0, -0.5);

        assert!(cmds.throttle.enable && cmds.brake.enable && cmds.steering.enable);
        assert_eq!(cmds.throttle.pedal_cmd_type, PedalCmdType::Percent);
        assert_eq!(cmds.brake.pedal_cmd_type, PedalCmdType::Torque);
        assert_eq!(cmds.throttle.pedal_cmd, 0.25);
        assert_eq!(cmds.steering.steering_wheel_angle_cmd_rad, -0.5);
    }

    #[test]
    fn test_default_is_disabled() {
        let cmds = ActuatorCmds::default();

        assert!(!cmds.throttle.enable);
        assert!(!cmds.brake.enable);
        assert!(!cmds.steering.enable);
    }
}
