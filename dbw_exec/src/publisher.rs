//! # Actuator Publisher
//!
//! Sends the controller's demands to the vehicle's throttle, brake and steering actuators.
//! Publishing only takes place while drive-by-wire is enabled, so the driver keeps control of
//! the actuators otherwise.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::dbw::ActuatorCmds;
use log::debug;
use serde::Serialize;
use util::{archive::Archiver, session::Session};

use crate::twist_ctrl::ControlOutputs;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A sink for actuator commands.
pub trait ActuatorPublisher {
    /// Transmit one cycle's commands.
    fn publish(&mut self, cmds: &ActuatorCmds) -> Result<(), PublishError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Publisher which records the commands into the session archive and the log.
///
/// Stands in for the vehicle bus when replaying input scripts.
pub struct ArchivePublisher {
    arch: Archiver,

    num_published: u64,
}

/// Flat CSV record of a published command set.
#[derive(Serialize)]
struct CmdRecord {
    time_s: f64,
    throttle_enable: bool,
    throttle_pedal_cmd: f64,
    brake_enable: bool,
    brake_pedal_cmd_nm: f64,
    steering_enable: bool,
    steering_wheel_angle_cmd_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("Could not initialise the command archive: {0}")]
    ArchiveInitError(String),

    #[error("Could not archive the commands: {0}")]
    ArchiveWriteError(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArchivePublisher {
    /// Create a publisher writing to `actuator_cmds.csv` in the session archive.
    pub fn new(session: &Session) -> Result<Self, PublishError> {
        let arch = Archiver::from_path(session, "actuator_cmds.csv")
            .map_err(|e| PublishError::ArchiveInitError(e.to_string()))?;

        Ok(Self {
            arch,
            num_published: 0,
        })
    }

    /// Create a publisher which only logs the commands.
    pub fn log_only() -> Self {
        Self {
            arch: Archiver::default(),
            num_published: 0,
        }
    }

    pub fn num_published(&self) -> u64 {
        self.num_published
    }
}

impl ActuatorPublisher for ArchivePublisher {
    fn publish(&mut self, cmds: &ActuatorCmds) -> Result<(), PublishError> {
        debug!(
            "Publishing throttle {:.3}, brake {:.1} Nm, steering {:.4} rad",
            cmds.throttle.pedal_cmd,
            cmds.brake.pedal_cmd,
            cmds.steering.steering_wheel_angle_cmd_rad
        );

        self.arch
            .serialise(CmdRecord {
                time_s: util::session::get_elapsed_seconds(),
                throttle_enable: cmds.throttle.enable,
                throttle_pedal_cmd: cmds.throttle.pedal_cmd,
                brake_enable: cmds.brake.enable,
                brake_pedal_cmd_nm: cmds.brake.pedal_cmd,
                steering_enable: cmds.steering.enable,
                steering_wheel_angle_cmd_rad: cmds.steering.steering_wheel_angle_cmd_rad,
            })
            .map_err(|e| PublishError::ArchiveWriteError(e.to_string()))?;

        self.num_published += 1;

        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Publish the controller outputs if drive-by-wire is enabled.
///
/// Returns `Ok(true)` if the commands were published and `Ok(false)` if they were withheld.
pub fn forward_outputs<P: ActuatorPublisher + ?Sized>(
    publisher: &mut P,
    dbw_enabled: bool,
    outputs: &ControlOutputs,
) -> Result<bool, PublishError> {
    if !dbw_enabled {
        return Ok(false);
    }

    publisher.publish(&ActuatorCmds::enabled(
        outputs.throttle,
        outputs.brake_nm,
        outputs.steer_rad,
    ))?;

    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::eqpt::dbw::PedalCmdType;

    /// Publisher which keeps everything it is given.
    #[derive(Default)]
    struct RecordingPublisher {
        published: Vec<ActuatorCmds>,
    }

    impl ActuatorPublisher for RecordingPublisher {
        fn publish(&mut self, cmds: &ActuatorCmds) -> Result<(), PublishError> {
            self.published.push(*cmds);
            Ok(())
        }
    }

    fn outputs() -> ControlOutputs {
        ControlOutputs {
            throttle: 0.4,
            brake_nm: 0.0,
            steer_rad: -0.2,
        }
    }

    #[test]
    fn test_withheld_while_disabled() {
        let mut publisher = RecordingPublisher::default();

        assert!(!forward_outputs(&mut publisher, false, &outputs()).unwrap());
        assert!(publisher.published.is_empty());
    }

    #[test]
    fn test_published_while_enabled() {
        let mut publisher = RecordingPublisher::default();

        assert!(forward_outputs(&mut publisher, true, &outputs()).unwrap());
        assert_eq!(publisher.published.len(), 1);

        let cmds = publisher.published[0];
        assert!(cmds.throttle.enable);
        assert_eq!(cmds.throttle.pedal_cmd_type, PedalCmdType::Percent);
        assert_eq!(cmds.throttle.pedal_cmd, 0.4);
        assert_eq!(cmds.brake.pedal_cmd_type, PedalCmdType::Torque);
        assert_eq!(cmds.brake.pedal_cmd, 0.0);
        assert_eq!(cmds.steering.steering_wheel_angle_cmd_rad, -0.2);
    }

    #[test]
    fn test_log_only_publisher() {
        let mut publisher = ArchivePublisher::log_only();

        forward_outputs(&mut publisher, true, &outputs()).unwrap();
        forward_outputs(&mut publisher, false, &outputs()).unwrap();

        assert_eq!(publisher.num_published(), 1);
    }
}
