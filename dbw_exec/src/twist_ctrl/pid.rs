//! # PID controller
//!
//! A discrete PID controller with a clamped output. The integral term is
//! clamped to the same range as the output to bound windup while the output
//! is saturated, and `reset` must be called whenever the controller has not
//! been in control of the plant.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;
use util::maths::clamp;

// Internal
use super::params::{check_finite, ParamsError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller
#[derive(Debug, Serialize, Clone)]
pub struct PidController {
    /// Proportional gain
    k_p: f64,

    /// Integral gain
    k_i: f64,

    /// Dervative gain
    k_d: f64,

    /// Lower output limit
    min_output: f64,

    /// Upper output limit
    max_output: f64,

    /// The integral accumulation, already multiplied by `k_i`
    i_term: f64,

    /// Error passed in on the previous step
    prev_error: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given gains and output limits.
    pub fn new(
        k_p: f64,
        k_i: f64,
        k_d: f64,
        min_output: f64,
        max_output: f64,
    ) -> Result<Self, ParamsError> {
        check_finite("k_p", k_p)?;
        check_finite("k_i", k_i)?;
        check_finite("k_d", k_d)?;
        check_finite("min_output", min_output)?;
        check_finite("max_output", max_output)?;

        if min_output > max_output {
            return Err(ParamsError::InvalidOutputRange {
                min: min_output,
                max: max_output,
            });
        }

        Ok(Self {
            k_p,
            k_i,
            k_d,
            min_output,
            max_output,
            i_term: 0f64,
            prev_error: 0f64,
        })
    }

    /// Get the value of the controller for the given error.
    ///
    /// `sample_time_s` is the time since the previous step. If it is not a
    /// positive number the integral and derivative terms are left out of this
    /// step, rather than producing a spike.
    pub fn step(&mut self, error: f64, sample_time_s: f64) -> f64 {
        let p = self.k_p * error;

        let d = if sample_time_s > 0.0 && sample_time_s.is_finite() {
            // Accumulate and bound the integral
            self.i_term += self.k_i * error * sample_time_s;
            self.i_term = clamp(self.i_term, self.min_output, self.max_output);

            self.k_d * (error - self.prev_error) / sample_time_s
        } else {
            0f64
        };

        self.prev_error = error;

        clamp(p + self.i_term + d, self.min_output, self.max_output)
    }

    /// Clear the integral and derivative memory.
    pub fn reset(&mut self) {
        self.i_term = 0f64;
        self.prev_error = 0f64;
    }

    /// The current integral term.
    pub fn i_term(&self) -> f64 {
        self.i_term
    }

    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }

    /// The proportional contribution for the given error.
    pub fn p_term(&self, error: f64) -> f64 {
        self.k_p * error
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DT: f64 = 0.1;

    #[test]
    fn test_proportional_only() {
        let mut pid = PidController::new(0.5, 0.0, 0.0, -10.0, 10.0).unwrap();

        assert_eq!(pid.step(2.0, DT), 1.0);
        assert_eq!(pid.step(-4.0, DT), -2.0);
        assert_eq!(pid.i_term(), 0.0);
    }

    #[test]
    fn test_integral_accumulates() {
        let mut pid = PidController::new(0.0, 1.0, 0.0, -10.0, 10.0).unwrap();

        pid.step(1.0, DT);
        pid.step(1.0, DT);
        let out = pid.step(1.0, DT);

        assert!((pid.i_term() - 0.3).abs() < 1e-12);
        assert!((out - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_integral_anti_windup() {
        let mut pid = PidController::new(0.0, 1.0, 0.0, -1.0, 1.0).unwrap();

        for _ in 0..1000 {
            pid.step(10.0, DT);
        }
        assert_eq!(pid.i_term(), 1.0);

        // Unwinds immediately once the error changes sign
        pid.step(-1.0, DT);
        assert!((pid.i_term() - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_derivative() {
        let mut pid = PidController::new(0.0, 0.0, 0.2, -10.0, 10.0).unwrap();

        // First step differences against the zeroed previous error
        assert!((pid.step(1.0, DT) - 2.0).abs() < 1e-12);
        assert!((pid.step(1.0, DT)).abs() < 1e-12);
        assert!((pid.step(0.5, DT) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_output_clamp() {
        let mut pid = PidController::new(10.0, 0.0, 0.0, -5.0, 1.0).unwrap();

        assert_eq!(pid.step(3.0, DT), 1.0);
        assert_eq!(pid.step(-3.0, DT), -5.0);
    }

    #[test]
    fn test_reset() {
        let mut pid = PidController::new(0.3, 0.1, 0.05, -5.0, 1.0).unwrap();

        for _ in 0..20 {
            pid.step(2.0, DT);
        }
        assert!(pid.i_term() > 0.0);

        pid.reset();
        assert_eq!(pid.i_term(), 0.0);
        assert_eq!(pid.prev_error(), 0.0);

        // After a reset the controller behaves like a new one
        let mut fresh = PidController::new(0.3, 0.1, 0.05, -5.0, 1.0).unwrap();
        assert_eq!(pid.step(0.7, DT), fresh.step(0.7, DT));
    }

    #[test]
    fn test_bad_sample_time() {
        let mut pid = PidController::new(1.0, 1.0, 1.0, -10.0, 10.0).unwrap();

        assert_eq!(pid.step(2.0, 0.0), 2.0);
        assert_eq!(pid.step(2.0, -0.1), 2.0);
        assert_eq!(pid.step(2.0, std::f64::NAN), 2.0);
        assert_eq!(pid.i_term(), 0.0);
    }

    #[test]
    fn test_invalid_range() {
        assert!(PidController::new(1.0, 0.0, 0.0, 1.0, -1.0).is_err());
    }
}
