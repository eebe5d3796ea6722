//! Single-threaded left-endpoint Riemann sum
//!
//! The sum is accumulated as `sum += dx * f(x)` while `x` advances by `dx`
//! from the lower bound, for exactly `step_count` terms. The upper bound is
//! never sampled. `x` is advanced incrementally, not recomputed from the step
//! index, so the samples are exactly `a`, `a + dx`, `(a + dx) + dx`, ...

use crate::error::{Error, Result};
use crate::integrand::Integrand;
use crate::job::{IntegrationJob, Interval};
use crate::round::round;

/// Number of decimal digits kept by default
pub const DEFAULT_ROUND_DIGITS: u32 = 8;

/// Left-endpoint rectangle rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeftRiemann {
    /// Decimal digits the result is rounded to (None = unrounded)
    pub round_digits: Option<u32>,
}

impl Default for LeftRiemann {
    fn default() -> Self {
        Self {
            round_digits: Some(DEFAULT_ROUND_DIGITS),
        }
    }
}

impl LeftRiemann {
    /// Create an integrator that rounds to 8 decimal digits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the rounding precision
    pub fn with_round_digits(mut self, digits: Option<u32>) -> Self {
        self.round_digits = digits;
        self
    }

    /// Integrate `f` over `interval` using `step_count` samples
    pub fn integrate<I>(&self, f: &I, interval: Interval, step_count: usize) -> Result<f64>
    where
        I: Integrand + ?Sized,
    {
        if step_count == 0 {
            return Err(Error::invalid_argument("step_count must be at least 1"));
        }
        interval.validate()?;

        let dx = interval.width() / step_count as f64;
        let mut area = 0.0;
        let mut x = interval.lower;

        for _ in 0..step_count {
            area += dx * f.evaluate(x)?;
            x += dx;
        }

        Ok(match self.round_digits {
            Some(digits) => round(area, digits),
            None => area,
        })
    }

    /// Integrate `f` over the slice described by `job`
    pub fn integrate_job<I>(&self, f: &I, job: &IntegrationJob) -> Result<f64>
    where
        I: Integrand + ?Sized,
    {
        self.integrate(f, job.interval, job.step_count)
    }
}

/// Integrate `f` over `[a, b]` with `step_count` samples, rounded to 8 digits
pub fn integrate<I>(f: &I, a: f64, b: f64, step_count: usize) -> Result<f64>
where
    I: Integrand + ?Sized,
{
    LeftRiemann::new().integrate(f, Interval::new(a, b), step_count)
}
