//! # Twist controller
//!
//! The per-cycle orchestration of the velocity filter, the speed and yaw
//! controllers and the engage state machine.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::Serialize;
use util::maths::clamp;

// Internal
use super::{
    EngageState, EngageTransition, LowPassFilter, Params, ParamsError, PidController,
    VehicleParams, YawController,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Inputs to one control cycle.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct ControlInputs {
    /// Measured forward speed.
    ///
    /// Units: meters/second
    pub current_vel_ms: f64,

    /// True if the controller has authority over the vehicle.
    pub dbw_enabled: bool,

    /// Target forward speed.
    ///
    /// Units: meters/second
    pub target_linear_vel_ms: f64,

    /// Target yaw rate, positive to the left.
    ///
    /// Units: radians/second
    pub target_angular_vel_rads: f64,
}

/// Outputs of one control cycle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct ControlOutputs {
    /// Throttle pedal demand as a fraction of travel, in [0, 1].
    pub throttle: f64,

    /// Brake torque demand, never negative.
    ///
    /// Units: newton meters
    pub brake_nm: f64,

    /// Steering wheel angle demand, positive to the left.
    ///
    /// Units: radians
    pub steer_rad: f64,
}

/// The twist controller.
///
/// Owns all temporal state of the control law: the speed controller's
/// integrator, the velocity filter's memory and the engage state.
#[derive(Debug, Clone)]
pub struct Controller {
    vehicle: VehicleParams,

    /// Curb mass plus fuel mass, in kilograms
    total_mass_kg: f64,

    /// Fixed time between two cycles
    sample_time_s: f64,

    speed_pid: PidController,
    yaw_ctrl: YawController,
    vel_filter: LowPassFilter,
    engage_state: EngageState,

    /// Monitoring quantities from the last cycle
    last_cycle: CycleInfo,
}

/// Intermediate quantities of the last control cycle, for status reporting.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize)]
pub struct CycleInfo {
    /// Filtered forward speed.
    ///
    /// Units: meters/second
    pub filtered_vel_ms: f64,

    /// Target minus filtered speed.
    ///
    /// Units: meters/second
    pub vel_error_ms: f64,

    /// Acceleration demand after limiting.
    ///
    /// Units: meters/second^2
    pub accel_cmd_mss: f64,

    /// True if the acceleration demand was cut by the vehicle limits.
    pub accel_limited: bool,

    /// True if a deceleration was demanded but was inside the brake deadband.
    pub in_brake_deadband: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Controller {
    /// Create a new controller.
    ///
    /// Invalid parameters are rejected here, a controller built from them
    /// would silently produce wrong demands.
    pub fn new(params: &Params) -> Result<Self, ParamsError> {
        params.validate()?;

        let sample_time_s = params.ctrl.sample_period_s();

        Ok(Self {
            vehicle: params.vehicle.clone(),
            total_mass_kg: params.vehicle.total_mass_kg(),
            sample_time_s,
            speed_pid: PidController::new(
                params.ctrl.speed_k_p,
                params.ctrl.speed_k_i,
                params.ctrl.speed_k_d,
                params.ctrl.speed_min_output_mss,
                params.ctrl.speed_max_output_mss,
            )?,
            yaw_ctrl: YawController::new(&params.vehicle),
            vel_filter: LowPassFilter::new(params.ctrl.vel_filter_tau_s, sample_time_s)?,
            engage_state: EngageState::default(),
            last_cycle: CycleInfo::default(),
        })
    }

    /// Run one control cycle.
    ///
    /// While `dbw_enabled` is false the speed controller is held reset and
    /// neither throttle nor brake is demanded. The velocity filter and the
    /// steering demand keep updating so that the controller is current when
    /// control is handed back. The caller must not actuate the outputs while
    /// DBW is disabled.
    pub fn control(
        &mut self,
        current_vel_ms: f64,
        dbw_enabled: bool,
        linear_vel_setpoint_ms: f64,
        angular_vel_setpoint_rads: f64,
    ) -> ControlOutputs {
        let filtered_vel_ms = self.vel_filter.filter(current_vel_ms);

        let steer_rad = self.yaw_ctrl.get_steering(
            linear_vel_setpoint_ms,
            angular_vel_setpoint_rads,
            filtered_vel_ms,
        );

        let vel_error_ms = linear_vel_setpoint_ms - filtered_vel_ms;

        let transition = self.engage_state.update(dbw_enabled);
        match transition {
            EngageTransition::Engage => info!("DBW engaged, speed controller reset"),
            EngageTransition::Disengage => info!("DBW disengaged, driver has control"),
            _ => (),
        }
        if transition.resets_controller() {
            self.speed_pid.reset();
        }

        let (raw_accel_mss, accel_cmd_mss) = if self.engage_state.is_engaged() {
            let raw = self.speed_pid.step(vel_error_ms, self.sample_time_s);
            (raw, self.limit_accel(raw))
        } else {
            (0f64, 0f64)
        };

        let (throttle, brake_nm) = self.accel_to_pedals(accel_cmd_mss);

        self.last_cycle = CycleInfo {
            filtered_vel_ms,
            vel_error_ms,
            accel_cmd_mss,
            accel_limited: accel_cmd_mss != raw_accel_mss,
            in_brake_deadband: accel_cmd_mss < 0.0 && brake_nm == 0.0,
        };

        debug!(
            "TwistCtrl: v_filt = {:.3} m/s, v_err = {:.3} m/s, a_cmd = {:.3} m/s^2, \
            throttle = {:.3}, brake = {:.1} Nm, steer = {:.3} rad",
            filtered_vel_ms, vel_error_ms, accel_cmd_mss, throttle, brake_nm, steer_rad
        );

        ControlOutputs {
            throttle,
            brake_nm,
            steer_rad,
        }
    }

    /// Split an acceleration demand into throttle and brake demands.
    ///
    /// Positive demands are mapped linearly onto the throttle pedal with the
    /// acceleration limit at full travel. Negative demands are converted into
    /// the wheel torque which decelerates the full vehicle mass at that rate,
    /// unless they are inside the brake deadband in which case the vehicle
    /// coasts.
    ///
    /// Returns `(throttle, brake_nm)`.
    pub fn accel_to_pedals(&self, accel_cmd_mss: f64) -> (f64, f64) {
        if accel_cmd_mss > 0.0 {
            let throttle = accel_cmd_mss.min(self.vehicle.accel_limit_mss)
                / self.vehicle.accel_limit_mss;

            (clamp(throttle, 0.0, 1.0), 0.0)
        } else {
            let decel_mss = accel_cmd_mss.abs();

            if decel_mss < self.vehicle.brake_deadband_mss {
                (0.0, 0.0)
            } else {
                (0.0, decel_mss * self.total_mass_kg * self.vehicle.wheel_radius_m)
            }
        }
    }

    /// Limit an acceleration demand to the vehicle's capability.
    pub fn limit_accel(&self, accel_mss: f64) -> f64 {
        clamp(
            accel_mss,
            self.vehicle.decel_limit_mss,
            self.vehicle.accel_limit_mss,
        )
    }

    pub fn engage_state(&self) -> EngageState {
        self.engage_state
    }

    pub fn speed_pid(&self) -> &PidController {
        &self.speed_pid
    }

    pub fn last_cycle(&self) -> &CycleInfo {
        &self.last_cycle
    }

    /// Fixed time between two cycles, in seconds.
    pub fn sample_time_s(&self) -> f64 {
        self.sample_time_s
    }
}

#[cfg(test)]
mod test {
    use super::super::FUEL_DENSITY_KGPGAL;
    use super::*;
    use util::maths::approx_eq;

    /// Default parameters with the velocity filter disabled, so that the
    /// filtered velocity is the measured velocity.
    fn unfiltered_params() -> Params {
        let mut p = Params::default();
        p.ctrl.vel_filter_tau_s = 0.0;
        p
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut p = Params::default();
        p.vehicle.wheel_base_m = 0.0;
        assert!(Controller::new(&p).is_err());

        let mut p = Params::default();
        p.vehicle.decel_limit_mss = 1.0;
        assert!(Controller::new(&p).is_err());
    }

    #[test]
    fn test_disabled_never_throttles() {
        let mut ctrl = Controller::new(&Params::default()).unwrap();

        for i in 0..100 {
            // Large positive speed error which would otherwise wind up
            let out = ctrl.control(i as f64 * 0.01, false, 20.0, 0.1);

            assert_eq!(out.throttle, 0.0);
            assert_eq!(out.brake_nm, 0.0);
            assert_eq!(ctrl.speed_pid().i_term(), 0.0);
            assert_eq!(ctrl.engage_state(), EngageState::Disengaged);
        }
    }

    #[test]
    fn test_disabled_keeps_steering_and_filter_current() {
        let mut ctrl = Controller::new(&Params::default()).unwrap();

        ctrl.control(5.0, false, 5.0, 0.0);
        let out = ctrl.control(5.0, false, 5.0, 0.1);

        assert!(out.steer_rad > 0.0);
        assert!((ctrl.last_cycle().filtered_vel_ms - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_reengage_with_zero_error_is_proportional_only() {
        let mut ctrl = Controller::new(&unfiltered_params()).unwrap();

        // Wind up the integrator while engaged
        for _ in 0..50 {
            ctrl.control(2.0, true, 10.0, 0.0);
        }
        assert!(ctrl.speed_pid().i_term() > 0.0);

        // Driver takes over for a while
        for _ in 0..10 {
            ctrl.control(10.0, false, 10.0, 0.0);
        }

        // Handed back with no speed error
        ctrl.control(10.0, true, 10.0, 0.0);

        assert_eq!(ctrl.last_cycle().accel_cmd_mss, 0.0);
        assert_eq!(ctrl.speed_pid().i_term(), 0.0);
    }

    #[test]
    fn test_reengage_starts_from_empty_memory() {
        let mut p = unfiltered_params();
        p.ctrl.speed_k_p = 0.3;
        p.ctrl.speed_k_i = 0.1;
        p.ctrl.speed_k_d = 0.05;
        let mut ctrl = Controller::new(&p).unwrap();
        let dt = ctrl.sample_time_s();

        // Saturate the integrator while engaged
        for _ in 0..200 {
            ctrl.control(2.0, true, 10.0, 0.0);
        }
        assert_eq!(ctrl.speed_pid().i_term(), p.ctrl.speed_max_output_mss);

        // Driver takes over with a large error which must not be integrated
        for _ in 0..10 {
            ctrl.control(0.0, false, 10.0, 0.0);
        }

        // Handed back with a small error
        let error = 0.5;
        ctrl.control(9.5, true, 10.0, 0.0);

        // Only this cycle's error contributes, the derivative is taken
        // against a zeroed previous error
        let i_term = p.ctrl.speed_k_i * error * dt;
        let d_term = p.ctrl.speed_k_d * error / dt;
        let expected = ctrl.speed_pid().p_term(error) + i_term + d_term;

        assert!(approx_eq(ctrl.speed_pid().i_term(), i_term, 1e-12));
        assert!(approx_eq(ctrl.last_cycle().accel_cmd_mss, expected, 1e-12));
        assert!(!ctrl.last_cycle().accel_limited);
    }

    #[test]
    fn test_reengage_matches_fresh_controller() {
        let mut ctrl = Controller::new(&unfiltered_params()).unwrap();

        for _ in 0..50 {
            ctrl.control(0.0, true, 15.0, 0.0);
        }
        ctrl.control(3.0, false, 15.0, 0.0);

        let mut fresh = Controller::new(&unfiltered_params()).unwrap();

        assert_eq!(
            ctrl.control(3.0, true, 4.0, 0.0),
            fresh.control(3.0, true, 4.0, 0.0)
        );
    }

    #[test]
    fn test_full_throttle_at_accel_limit() {
        let ctrl = Controller::new(&Params::default()).unwrap();

        assert_eq!(ctrl.accel_to_pedals(1.0), (1.0, 0.0));
        assert_eq!(ctrl.accel_to_pedals(0.5), (0.5, 0.0));
        assert_eq!(ctrl.accel_to_pedals(3.0), (1.0, 0.0));
    }

    #[test]
    fn test_brake_deadband_coasts() {
        let ctrl = Controller::new(&Params::default()).unwrap();

        assert_eq!(ctrl.accel_to_pedals(-0.05), (0.0, 0.0));
        assert_eq!(ctrl.accel_to_pedals(0.0), (0.0, 0.0));
    }

    #[test]
    fn test_brake_torque() {
        let ctrl = Controller::new(&Params::default()).unwrap();

        let (throttle, brake_nm) = ctrl.accel_to_pedals(-1.0);
        let expected = 1.0 * (1736.35 + 13.5 * FUEL_DENSITY_KGPGAL) * 0.2413;

        assert_eq!(throttle, 0.0);
        assert!((brake_nm - expected).abs() < 1e-9);
    }

    #[test]
    fn test_accel_limits() {
        let ctrl = Controller::new(&Params::default()).unwrap();

        assert_eq!(ctrl.limit_accel(-9.0), -5.0);
        assert_eq!(ctrl.limit_accel(4.0), 1.0);
        assert_eq!(ctrl.limit_accel(0.3), 0.3);
    }

    #[test]
    fn test_speed_tracking() {
        let mut ctrl = Controller::new(&Params::default()).unwrap();

        // Too slow: throttle, no brake
        let out = ctrl.control(5.0, true, 10.0, 0.0);
        assert!(out.throttle > 0.0 && out.throttle <= 1.0);
        assert_eq!(out.brake_nm, 0.0);

        // Much too fast: brake, no throttle
        let mut ctrl = Controller::new(&Params::default()).unwrap();
        let out = ctrl.control(30.0, true, 5.0, 0.0);
        assert_eq!(out.throttle, 0.0);
        assert!(out.brake_nm > 0.0);
        assert_eq!(ctrl.last_cycle().accel_cmd_mss, -5.0);
    }

    #[test]
    fn test_outputs_in_range() {
        let mut ctrl = Controller::new(&Params::default()).unwrap();

        let speeds = [0.0, 0.05, 3.0, 12.0, 40.0];
        let targets = [-2.0, 0.0, 5.0, 25.0];
        let yaw_rates = [-3.0, -0.2, 0.0, 0.4, 10.0];

        for (i, v) in speeds.iter().enumerate() {
            for t in targets.iter() {
                for w in yaw_rates.iter() {
                    let out = ctrl.control(*v, i % 2 == 0, *t, *w);

                    assert!(out.throttle >= 0.0 && out.throttle <= 1.0);
                    assert!(out.brake_nm >= 0.0);
                    assert!(out.steer_rad.abs() <= 8.0);
                }
            }
        }
    }
}
