//! Implementations for the TwistCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, trace};
use serde::Serialize;

// Internal
use super::{
    ControlInputs, ControlOutputs, Controller, EngageState, Params, TwistCtrlError,
};
use util::{
    archive::{Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Twist control module state
pub struct TwistCtrl {
    params: Params,

    controller: Controller,

    /// Number of processed cycles
    num_cycles: u64,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    pub(crate) output: Option<ControlOutputs>,
    arch_output: Archiver,
}

/// Status report for TwistCtrl processing.
#[derive(Clone, Copy, Serialize, Debug, PartialEq)]
pub struct StatusReport {
    /// Cycle the report was produced on
    pub cycle: u64,

    /// Engage state after this cycle
    pub engage_state: EngageState,

    /// Filtered forward speed in meters/second
    pub filtered_vel_ms: f64,

    /// Speed error in meters/second
    pub vel_error_ms: f64,

    /// Acceleration demand in meters/second^2
    pub accel_cmd_mss: f64,

    /// Speed controller integral term in meters/second^2
    pub speed_i_term_mss: f64,

    /// True if the acceleration demand was limited
    pub accel_limited: bool,

    /// True if a deceleration inside the brake deadband was demanded
    pub in_brake_deadband: bool,

    /// True if the steering demand is at the hardware limit
    pub steer_limited: bool,
}

/// Archive record of the module's outputs.
#[derive(Serialize)]
struct OutputRecord {
    cycle: u64,
    throttle: f64,
    brake_nm: f64,
    steer_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for StatusReport {
    fn default() -> Self {
        Self {
            cycle: 0,
            engage_state: EngageState::Disengaged,
            filtered_vel_ms: 0.0,
            vel_error_ms: 0.0,
            accel_cmd_mss: 0.0,
            speed_i_term_mss: 0.0,
            accel_limited: false,
            in_brake_deadband: false,
            steer_limited: false,
        }
    }
}

impl TwistCtrl {
    /// Build the module from already loaded parameters, without archiving.
    pub fn from_params(params: Params) -> Result<Self, TwistCtrlError> {
        let controller = Controller::new(&params).map_err(TwistCtrlError::InvalidParams)?;

        Ok(Self {
            params,
            controller,
            num_cycles: 0,
            report: StatusReport::default(),
            arch_report: Archiver::default(),
            output: None,
            arch_output: Archiver::default(),
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The control cycle period the module was configured for, in seconds.
    pub fn cycle_period_s(&self) -> f64 {
        self.controller.sample_time_s()
    }
}

impl State for TwistCtrl {
    type InitData = &'static str;
    type InitError = TwistCtrlError;

    type InputData = ControlInputs;
    type OutputData = ControlOutputs;
    type StatusReport = StatusReport;
    type ProcError = TwistCtrlError;

    /// Initialise the TwistCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(init_data: Self::InitData, session: &Session) -> Result<Self, Self::InitError> {
        // Load the parameters
        let params: Params = params::load(init_data).map_err(TwistCtrlError::ParamLoadError)?;

        // Keep a copy of exactly what was flown with this session
        if let Err(e) = session.save_json("twist_ctrl/params.json", &params) {
            log::warn!("Could not save TwistCtrl parameters to the session: {}", e);
        }

        let mut twist_ctrl = Self::from_params(params)?;

        twist_ctrl.arch_report = Archiver::from_path(session, "twist_ctrl/status_report.csv")
            .map_err(|e| TwistCtrlError::ArchiveInitError(e.to_string()))?;
        twist_ctrl.arch_output = Archiver::from_path(session, "twist_ctrl/output.csv")
            .map_err(|e| TwistCtrlError::ArchiveInitError(e.to_string()))?;

        info!(
            "TwistCtrl running at {} Hz, total vehicle mass {:.1} kg",
            twist_ctrl.params.ctrl.control_rate_hz,
            twist_ctrl.params.vehicle.total_mass_kg()
        );

        Ok(twist_ctrl)
    }

    /// Perform cyclic processing of Twist Control.
    ///
    /// Non-finite inputs are rejected before they reach the controller, since
    /// a single NaN would stay in the filter and integrator memory.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        check_input("current_vel_ms", input_data.current_vel_ms)?;
        check_input("target_linear_vel_ms", input_data.target_linear_vel_ms)?;
        check_input("target_angular_vel_rads", input_data.target_angular_vel_rads)?;

        let output = self.controller.control(
            input_data.current_vel_ms,
            input_data.dbw_enabled,
            input_data.target_linear_vel_ms,
            input_data.target_angular_vel_rads,
        );

        let cycle = self.controller.last_cycle();
        self.report = StatusReport {
            cycle: self.num_cycles,
            engage_state: self.controller.engage_state(),
            filtered_vel_ms: cycle.filtered_vel_ms,
            vel_error_ms: cycle.vel_error_ms,
            accel_cmd_mss: cycle.accel_cmd_mss,
            speed_i_term_mss: self.controller.speed_pid().i_term(),
            accel_limited: cycle.accel_limited,
            in_brake_deadband: cycle.in_brake_deadband,
            steer_limited: output.steer_rad.abs() >= self.params.vehicle.max_steer_angle_rad,
        };

        trace!("TwistCtrl output: {:?}", output);

        self.output = Some(output);
        self.num_cycles += 1;

        Ok((output, self.report))
    }
}

impl Archived for TwistCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;

        if let Some(o) = self.output {
            self.arch_output.serialise(OutputRecord {
                cycle: self.report.cycle,
                throttle: o.throttle,
                brake_nm: o.brake_nm,
                steer_rad: o.steer_rad,
            })?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn check_input(name: &'static str, value: f64) -> Result<(), TwistCtrlError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TwistCtrlError::NonFiniteInput(name, value))
    }
}
