//! # Low pass filter
//!
//! First order exponential smoothing of a scalar measurement stream, used to
//! condition the velocity measurement before it reaches the speed controller.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use super::params::{check_finite, check_non_negative, check_positive, ParamsError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A first order low pass filter running at a fixed sample period.
#[derive(Debug, Serialize, Clone)]
pub struct LowPassFilter {
    /// Weight of a new sample, `dt / (tau + dt)`
    alpha: f64,

    /// The current smoothed value, `None` until the first sample
    last_value: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LowPassFilter {
    /// Create a filter with time constant `tau_s` sampled every
    /// `sample_period_s` seconds.
    ///
    /// A zero time constant gives a filter which passes samples straight
    /// through.
    pub fn new(tau_s: f64, sample_period_s: f64) -> Result<Self, ParamsError> {
        check_finite("vel_filter_tau_s", tau_s)?;
        check_non_negative("vel_filter_tau_s", tau_s)?;
        check_finite("sample_period_s", sample_period_s)?;
        check_positive("sample_period_s", sample_period_s)?;

        Ok(Self {
            alpha: sample_period_s / (tau_s + sample_period_s),
            last_value: None,
        })
    }

    /// Filter a new sample, returning the smoothed value.
    ///
    /// The first sample is returned unchanged since there is no history to
    /// blend it with.
    pub fn filter(&mut self, sample: f64) -> f64 {
        let value = match self.last_value {
            Some(last) => self.alpha * sample + (1.0 - self.alpha) * last,
            None => sample,
        };

        self.last_value = Some(value);
        value
    }

    /// The current smoothed value, or `None` if no sample has been filtered.
    pub fn last_value(&self) -> Option<f64> {
        self.last_value
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Forget all history, the next sample will pass through unchanged.
    pub fn reset(&mut self) {
        self.last_value = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_first_sample_passes_through() {
        for tau_s in [0.0, 0.5, 100.0].iter() {
            let mut lpf = LowPassFilter::new(*tau_s, 0.1).unwrap();
            assert_eq!(lpf.last_value(), None);
            assert_eq!(lpf.filter(7.25), 7.25);
            assert_eq!(lpf.last_value(), Some(7.25));
        }
    }

    #[test]
    fn test_alpha() {
        let lpf = LowPassFilter::new(0.5, 0.1).unwrap();
        assert!((lpf.alpha() - 0.1 / 0.6).abs() < 1e-12);

        let lpf = LowPassFilter::new(0.0, 0.1).unwrap();
        assert_eq!(lpf.alpha(), 1.0);
    }

    #[test]
    fn test_blend() {
        let mut lpf = LowPassFilter::new(0.5, 0.1).unwrap();
        let alpha = lpf.alpha();

        lpf.filter(0.0);
        let v = lpf.filter(6.0);

        assert!((v - alpha * 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_input_converges() {
        let mut lpf = LowPassFilter::new(0.5, 0.1).unwrap();
        lpf.filter(0.0);

        let mut v = 0.0;
        for _ in 0..200 {
            v = lpf.filter(12.0);
        }

        assert!((v - 12.0).abs() < 1e-9);

        // Steady state stays put
        assert!((lpf.filter(12.0) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset() {
        let mut lpf = LowPassFilter::new(0.5, 0.1).unwrap();
        lpf.filter(3.0);
        lpf.filter(4.0);
        lpf.reset();

        assert_eq!(lpf.filter(-1.0), -1.0);
    }

    #[test]
    fn test_invalid_config() {
        assert!(LowPassFilter::new(-0.1, 0.1).is_err());
        assert!(LowPassFilter::new(0.5, 0.0).is_err());
        assert!(LowPassFilter::new(std::f64::NAN, 0.1).is_err());
    }
}
