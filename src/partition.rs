//! Splitting an integration request into independent jobs
//!
//! The interval is cut into `parts` contiguous slices of equal width. Slice
//! `i` spans `[a + i*step, a + (i+1)*step]` with `step = (b - a) / parts`,
//! except that the last slice ends exactly at `b`. Neighbouring slices share
//! the same computed boundary, so the tiling has no gaps or overlaps.

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::job::{IntegrationJob, Interval};

/// What to do with `total_steps % parts` leftover steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub enum RemainderPolicy {
    /// Every job gets `total_steps / parts`; the remainder is dropped
    #[default]
    Floor,

    /// The first `total_steps % parts` jobs get one extra step each
    Distribute,
}

impl RemainderPolicy {
    /// Step count assigned to job `index` out of `parts`
    pub fn steps_for(&self, index: usize, total_steps: usize, parts: usize) -> usize {
        let share = total_steps / parts;
        match self {
            RemainderPolicy::Floor => share,
            RemainderPolicy::Distribute => {
                if index < total_steps % parts {
                    share + 1
                } else {
                    share
                }
            }
        }
    }

    /// Total number of steps actually evaluated across all jobs
    pub fn effective_steps(&self, total_steps: usize, parts: usize) -> usize {
        match self {
            RemainderPolicy::Floor => (total_steps / parts) * parts,
            RemainderPolicy::Distribute => total_steps,
        }
    }
}

/// Equal-width partitioner
#[derive(Debug, Clone, Copy, Default)]
pub struct Partitioner {
    policy: RemainderPolicy,
}

impl Partitioner {
    /// Create a partitioner with the given remainder policy
    pub fn new(policy: RemainderPolicy) -> Self {
        Self { policy }
    }

    /// The remainder policy in use
    pub fn policy(&self) -> RemainderPolicy {
        self.policy
    }

    /// Split `interval` and `total_steps` into `parts` jobs
    ///
    /// Fails if any job would end up with zero steps, which happens when
    /// `total_steps < parts`.
    pub fn partition(
        &self,
        interval: Interval,
        total_steps: usize,
        parts: usize,
    ) -> Result<Vec<IntegrationJob>> {
        if parts == 0 {
            return Err(Error::invalid_argument("worker_count must be at least 1"));
        }
        if total_steps == 0 {
            return Err(Error::invalid_argument("total_steps must be at least 1"));
        }
        if total_steps < parts {
            return Err(Error::invalid_argument(format!(
                "total_steps ({}) must be at least worker_count ({})",
                total_steps, parts
            )));
        }
        interval.validate()?;

        let step = interval.width() / parts as f64;
        let boundary = |i: usize| {
            if i == parts {
                interval.upper
            } else {
                interval.lower + i as f64 * step
            }
        };

        let jobs = (0..parts)
            .map(|i| {
                IntegrationJob::new(
                    i,
                    Interval::new(boundary(i), boundary(i + 1)),
                    self.policy.steps_for(i, total_steps, parts),
                )
            })
            .collect();

        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tiles(jobs: &[IntegrationJob], interval: Interval) {
        assert_eq!(jobs.first().unwrap().interval.lower, interval.lower);
        assert_eq!(jobs.last().unwrap().interval.upper, interval.upper);
        for pair in jobs.windows(2) {
            assert_eq!(pair[0].interval.upper, pair[1].interval.lower);
        }
    }

    #[test]
    fn test_partition_tiles_interval() {
        let partitioner = Partitioner::default();

        for parts in [1, 2, 3, 7, 16] {
            let interval = Interval::new(0.1, 2.9);
            let jobs = partitioner.partition(interval, 1_000, parts).unwrap();
            assert_eq!(jobs.len(), parts);
            assert_tiles(&jobs, interval);

            for (i, job) in jobs.iter().enumerate() {
                assert_eq!(job.index, i);
            }
        }
    }

    #[test]
    fn test_partition_reversed_interval() {
        let interval = Interval::new(5.0, -1.0);
        let jobs = Partitioner::default().partition(interval, 60, 4).unwrap();

        assert_tiles(&jobs, interval);
        assert!(jobs.iter().all(|job| job.interval.width() < 0.0));
    }

    #[test]
    fn test_single_part_is_whole_interval() {
        let interval = Interval::new(0.0, std::f64::consts::FRAC_PI_2);
        let jobs = Partitioner::default().partition(interval, 100_000, 1).unwrap();

        assert_eq!(jobs, vec![IntegrationJob::new(0, interval, 100_000)]);
    }

    #[test]
    fn test_floor_drops_remainder() {
        let jobs = Partitioner::new(RemainderPolicy::Floor)
            .partition(Interval::new(0.0, 1.0), 100_001, 4)
            .unwrap();

        assert!(jobs.iter().all(|job| job.step_count == 25_000));
        assert_eq!(RemainderPolicy::Floor.effective_steps(100_001, 4), 100_000);
    }

    #[test]
    fn test_distribute_keeps_remainder() {
        let jobs = Partitioner::new(RemainderPolicy::Distribute)
            .partition(Interval::new(0.0, 1.0), 10, 4)
            .unwrap();

        let steps: Vec<usize> = jobs.iter().map(|job| job.step_count).collect();
        assert_eq!(steps, vec![3, 3, 2, 2]);
        assert_eq!(steps.iter().sum::<usize>(), 10);
        assert_eq!(RemainderPolicy::Distribute.effective_steps(10, 4), 10);
    }

    #[test]
    fn test_partition_rejects_bad_arguments() {
        let partitioner = Partitioner::default();
        let interval = Interval::new(0.0, 1.0);

        assert!(matches!(
            partitioner.partition(interval, 100, 0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            partitioner.partition(interval, 0, 4),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            partitioner.partition(interval, 3, 4),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            partitioner.partition(Interval::new(0.0, f64::NAN), 100, 4),
            Err(Error::InvalidArgument(_))
        ));
    }
}
