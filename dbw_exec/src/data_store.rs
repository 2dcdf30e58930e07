//! # Data Store
//!
//! Holds the latest value of every input along with the time it was received, and the outputs
//! of the cyclic modules. Inputs are written as messages arrive (last writer wins) and read once
//! per cycle by the control step.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::input::InputMsg;
use log::{info, warn};

use crate::twist_ctrl::{self, ControlInputs, ControlOutputs};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Gives the reason drive-by-wire has been forced off, regardless of the enable input.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum DisableCause {
    /// The velocity measurement or twist command has stopped arriving
    InputTimeout,
}

/// Whether enough inputs have been received to run the controller.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum InputReadiness {
    /// At least one required input has never been received.
    NotReady {
        missing_current_vel: bool,
        missing_twist_cmd: bool,
    },

    /// All inputs are present, the controller can run on them.
    Ready(ControlInputs),
}

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// A value along with the simulation time it was received at.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Stamped<T> {
    pub value: T,
    pub recv_time_s: f64,
}

/// The most recent twist command.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TwistSetpoint {
    pub linear_ms: f64,
    pub angular_rads: f64,
}

/// Global data store for the executable.
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// True if this cycle falls on a 1Hz boundary
    pub is_1_hz_cycle: bool,

    /// Simulation elapsed time
    pub sim_time_s: f64,

    // Inputs
    pub current_vel_ms: Option<Stamped<f64>>,
    pub twist_cmd: Option<Stamped<TwistSetpoint>>,

    /// The enable flag as last commanded
    pub dbw_enabled: bool,

    /// Set while drive-by-wire is forced off.
    pub forced_disable: Option<DisableCause>,

    // TwistCtrl
    pub twist_ctrl_output: Option<ControlOutputs>,
    pub twist_ctrl_status_rpt: twist_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of cycles on which the controller rejected its inputs
    pub num_proc_errors: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DataStore {
    pub fn new(initial_dbw_enabled: bool) -> Self {
        Self {
            num_cycles: 0,
            is_1_hz_cycle: false,
            sim_time_s: 0.0,
            current_vel_ms: None,
            twist_cmd: None,
            dbw_enabled: initial_dbw_enabled,
            forced_disable: None,
            twist_ctrl_output: None,
            twist_ctrl_status_rpt: twist_ctrl::StatusReport::default(),
            num_consec_cycle_overruns: 0,
            num_proc_errors: 0,
        }
    }

    /// Store an incoming message, stamped with the current simulation time.
    pub fn apply_msg(&mut self, msg: &InputMsg) {
        match *msg {
            InputMsg::CurrentVelocity { linear_ms } => {
                self.current_vel_ms = Some(Stamped {
                    value: linear_ms,
                    recv_time_s: self.sim_time_s,
                });
            }
            InputMsg::TwistCmd {
                linear_ms,
                angular_rads,
            } => {
                self.twist_cmd = Some(Stamped {
                    value: TwistSetpoint {
                        linear_ms,
                        angular_rads,
                    },
                    recv_time_s: self.sim_time_s,
                });
            }
            InputMsg::DbwEnabled { enabled } => {
                if enabled != self.dbw_enabled {
                    info!("DBW enable input changed to {}", enabled);
                }
                self.dbw_enabled = enabled;
            }
        }
    }

    /// Forces drive-by-wire off with the given cause.
    pub fn force_disable(&mut self, cause: DisableCause) {
        if self.forced_disable.is_none() {
            warn!("Drive-by-wire forced off, cause: {:?}", cause);
            self.forced_disable = Some(cause);
        }
    }

    /// Attempts to lift a forced disable by clearing the given cause.
    ///
    /// Returns `Ok(())` if the cause matched (or nothing was forced), and `Err(())` if the
    /// disable was raised for a different cause and so remains in place.
    pub fn clear_disable(&mut self, cause: DisableCause) -> Result<(), ()> {
        match self.forced_disable {
            Some(root_cause) if root_cause == cause => {
                info!("Forced disable ({:?}) cleared", cause);
                self.forced_disable = None;
                Ok(())
            }
            Some(_) => Err(()),
            None => Ok(()),
        }
    }

    /// Force drive-by-wire off if a received input has not been refreshed within `timeout_s`.
    ///
    /// Inputs which have never been received are not considered stale, `readiness` already
    /// keeps the controller from running without them.
    pub fn check_input_timeouts(&mut self, timeout_s: f64) {
        let now_s = self.sim_time_s;
        let is_stale = |recv_time_s: f64| now_s - recv_time_s > timeout_s;

        let vel_stale = self
            .current_vel_ms
            .map_or(false, |v| is_stale(v.recv_time_s));
        let twist_stale = self.twist_cmd.map_or(false, |t| is_stale(t.recv_time_s));

        if vel_stale || twist_stale {
            if self.forced_disable.is_none() {
                warn!(
                    "Input timeout after {:.2} s (velocity stale: {}, twist stale: {})",
                    timeout_s, vel_stale, twist_stale
                );
            }
            self.force_disable(DisableCause::InputTimeout);
        } else {
            self.clear_disable(DisableCause::InputTimeout).ok();
        }
    }

    /// The enable flag the controller shall use this cycle.
    pub fn effective_dbw_enabled(&self) -> bool {
        self.dbw_enabled && self.forced_disable.is_none()
    }

    /// Gather the controller inputs, if all of them have been received.
    pub fn readiness(&self) -> InputReadiness {
        match (self.current_vel_ms, self.twist_cmd) {
            (Some(vel), Some(twist)) => InputReadiness::Ready(ControlInputs {
                current_vel_ms: vel.value,
                dbw_enabled: self.effective_dbw_enabled(),
                target_linear_vel_ms: twist.value.linear_ms,
                target_angular_vel_rads: twist.value.angular_rads,
            }),
            (vel, twist) => InputReadiness::NotReady {
                missing_current_vel: vel.is_none(),
                missing_twist_cmd: twist.is_none(),
            },
        }
    }

    /// Perform actions required at the start of a cycle.
    ///
    /// Clears the previous cycle's outputs, advances the simulation clock and sets the 1Hz
    /// cycle flag. The clock is derived from the cycle count so that scripted runs are
    /// repeatable regardless of how long each cycle actually took.
    pub fn cycle_start(&mut self, cycle_period_s: f64) {
        let cycles_per_second = ((1.0 / cycle_period_s).round() as u64).max(1);
        self.is_1_hz_cycle = self.num_cycles % cycles_per_second == 0;

        self.twist_ctrl_output = None;
        self.twist_ctrl_status_rpt = twist_ctrl::StatusReport::default();

        self.sim_time_s = self.num_cycles as f64 * cycle_period_s;
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        self.num_cycles += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const PERIOD_S: f64 = 0.1;

    fn run_cycles(ds: &mut DataStore, n: u64) {
        for _ in 0..n {
            ds.cycle_end();
            ds.cycle_start(PERIOD_S);
        }
    }

    #[test]
    fn test_readiness() {
        let mut ds = DataStore::new(true);
        ds.cycle_start(PERIOD_S);

        assert_eq!(
            ds.readiness(),
            InputReadiness::NotReady {
                missing_current_vel: true,
                missing_twist_cmd: true
            }
        );

        ds.apply_msg(&InputMsg::CurrentVelocity { linear_ms: 4.0 });
        assert_eq!(
            ds.readiness(),
            InputReadiness::NotReady {
                missing_current_vel: false,
                missing_twist_cmd: true
            }
        );

        ds.apply_msg(&InputMsg::TwistCmd {
            linear_ms: 5.0,
            angular_rads: 0.1,
        });
        assert_eq!(
            ds.readiness(),
            InputReadiness::Ready(ControlInputs {
                current_vel_ms: 4.0,
                dbw_enabled: true,
                target_linear_vel_ms: 5.0,
                target_angular_vel_rads: 0.1,
            })
        );
    }

    #[test]
    fn test_last_writer_wins() {
        let mut ds = DataStore::new(false);

        ds.apply_msg(&InputMsg::CurrentVelocity { linear_ms: 1.0 });
        ds.apply_msg(&InputMsg::CurrentVelocity { linear_ms: 2.0 });
        ds.apply_msg(&InputMsg::DbwEnabled { enabled: true });

        assert_eq!(ds.current_vel_ms.map(|v| v.value), Some(2.0));
        assert!(ds.effective_dbw_enabled());
    }

    #[test]
    fn test_input_timeout() {
        let mut ds = DataStore::new(true);
        ds.cycle_start(PERIOD_S);

        ds.apply_msg(&InputMsg::CurrentVelocity { linear_ms: 1.0 });
        ds.apply_msg(&InputMsg::TwistCmd {
            linear_ms: 1.0,
            angular_rads: 0.0,
        });

        run_cycles(&mut ds, 5);
        ds.check_input_timeouts(1.0);
        assert!(ds.effective_dbw_enabled());

        run_cycles(&mut ds, 10);
        ds.check_input_timeouts(1.0);
        assert_eq!(ds.forced_disable, Some(DisableCause::InputTimeout));
        assert!(!ds.effective_dbw_enabled());

        match ds.readiness() {
            InputReadiness::Ready(i) => assert!(!i.dbw_enabled),
            r => panic!("Expected ready, got {:?}", r),
        }

        // Fresh inputs lift the timeout
        ds.apply_msg(&InputMsg::CurrentVelocity { linear_ms: 1.0 });
        ds.apply_msg(&InputMsg::TwistCmd {
            linear_ms: 1.0,
            angular_rads: 0.0,
        });
        ds.check_input_timeouts(1.0);
        assert!(ds.effective_dbw_enabled());
    }

    #[test]
    fn test_clear_disable_cause_must_match() {
        let mut ds = DataStore::new(true);

        assert!(ds.clear_disable(DisableCause::InputTimeout).is_ok());

        ds.force_disable(DisableCause::InputTimeout);
        assert!(!ds.effective_dbw_enabled());
        assert!(ds.clear_disable(DisableCause::InputTimeout).is_ok());
        assert!(ds.effective_dbw_enabled());
    }

    #[test]
    fn test_cycle_clock() {
        let mut ds = DataStore::new(true);

        ds.cycle_start(PERIOD_S);
        assert!(ds.is_1_hz_cycle);
        assert_eq!(ds.sim_time_s, 0.0);

        run_cycles(&mut ds, 3);
        assert!(!ds.is_1_hz_cycle);
        assert!((ds.sim_time_s - 0.3).abs() < 1e-12);

        run_cycles(&mut ds, 7);
        assert!(ds.is_1_hz_cycle);
        assert!((ds.sim_time_s - 1.0).abs() < 1e-12);
    }
}
