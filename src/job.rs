//! Units of work exchanged between the aggregator and its workers

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A closed integration interval `[lower, upper]`
///
/// `lower` may exceed `upper`; the integral then carries the opposite sign.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct Interval {
    /// Lower bound
    pub lower: f64,

    /// Upper bound
    pub upper: f64,
}

impl Interval {
    /// Create a new interval
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Signed width `upper - lower`
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// True when both bounds coincide
    pub fn is_degenerate(&self) -> bool {
        self.lower == self.upper
    }

    /// Reject NaN and infinite bounds
    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(Error::invalid_argument(format!(
                "interval bounds must be finite, got [{}, {}]",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

impl From<(f64, f64)> for Interval {
    fn from((lower, upper): (f64, f64)) -> Self {
        Self::new(lower, upper)
    }
}

/// One independent slice of an integration request
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct IntegrationJob {
    /// Position of this job in the partition, starting at 0
    pub index: usize,

    /// Sub-interval covered by this job
    pub interval: Interval,

    /// Number of samples taken over the sub-interval
    pub step_count: usize,
}

impl IntegrationJob {
    /// Create a new job
    pub fn new(index: usize, interval: Interval, step_count: usize) -> Self {
        Self {
            index,
            interval,
            step_count,
        }
    }
}

/// The value produced by a single job
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct PartialResult {
    /// Index of the job that produced this value
    pub job_index: usize,

    /// Index of the worker that ran the job
    pub worker_index: usize,

    /// Partial integral over the job's sub-interval
    pub value: f64,
}

impl PartialResult {
    /// Create a new partial result
    pub fn new(job_index: usize, worker_index: usize, value: f64) -> Self {
        Self {
            job_index,
            worker_index,
            value,
        }
    }
}
