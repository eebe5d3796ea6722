//! Parallel aggregation of left Riemann sums
//!
//! A request is partitioned into one job per worker, the jobs run on a pool
//! spawned for this call only, and the partial sums are added up in
//! partition order once all of them are in.

use crate::error::{Error, Result};
use crate::integrand::Integrand;
use crate::job::{Interval, PartialResult};
use crate::partition::{Partitioner, RemainderPolicy};
use crate::pool::{PoolConfig, WorkerPool};
use crate::scalar::{LeftRiemann, DEFAULT_ROUND_DIGITS};
use std::sync::Arc;

/// Settings for a [`ParallelIntegrator`]
#[derive(Debug, Clone)]
pub struct IntegratorConfig {
    /// Pool settings; `num_workers` is the default worker count
    pub pool: PoolConfig,

    /// Handling of steps that do not divide evenly between workers
    pub remainder: RemainderPolicy,

    /// Decimal digits each partial sum is rounded to (None = unrounded)
    pub round_digits: Option<u32>,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            remainder: RemainderPolicy::default(),
            round_digits: Some(DEFAULT_ROUND_DIGITS),
        }
    }
}

impl IntegratorConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers
    pub fn with_num_workers(mut self, num: usize) -> Self {
        self.pool.num_workers = num;
        self
    }

    /// Replace the pool configuration
    pub fn with_pool_config(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Set the remainder policy
    pub fn with_remainder_policy(mut self, policy: RemainderPolicy) -> Self {
        self.remainder = policy;
        self
    }

    /// Set the rounding precision of partial sums
    pub fn with_round_digits(mut self, digits: Option<u32>) -> Self {
        self.round_digits = digits;
        self
    }

    fn rule(&self) -> LeftRiemann {
        LeftRiemann::new().with_round_digits(self.round_digits)
    }
}

/// One integration task as supplied by a caller
#[derive(Debug, Clone)]
pub struct IntegrationRequest<I> {
    /// Function to integrate
    pub integrand: I,

    /// Integration bounds
    pub interval: Interval,

    /// Total number of samples across all workers
    pub total_steps: usize,

    /// Number of workers, and therefore of jobs
    pub worker_count: usize,
}

impl<I> IntegrationRequest<I> {
    /// Create a new request
    pub fn new(integrand: I, interval: Interval, total_steps: usize, worker_count: usize) -> Self {
        Self {
            integrand,
            interval,
            total_steps,
            worker_count,
        }
    }

    /// Check counts and bounds without doing any work
    pub fn validate(&self) -> Result<()> {
        if self.total_steps == 0 {
            return Err(Error::invalid_argument("total_steps must be at least 1"));
        }
        if self.worker_count == 0 {
            return Err(Error::invalid_argument("worker_count must be at least 1"));
        }
        self.interval.validate()
    }
}

/// Integrator that spreads a request over a fresh worker pool
#[derive(Debug, Clone, Default)]
pub struct ParallelIntegrator {
    config: IntegratorConfig,
}

impl ParallelIntegrator {
    /// Create an integrator with the given configuration
    pub fn new(config: IntegratorConfig) -> Self {
        Self { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &IntegratorConfig {
        &self.config
    }

    /// Integrate `f` over `interval` using the configured worker count
    pub fn integrate<I>(&self, f: I, interval: Interval, total_steps: usize) -> Result<f64>
    where
        I: Integrand + 'static,
    {
        self.integrate_shared(Arc::new(f), interval, total_steps, self.config.pool.num_workers)
    }

    /// Run a request, using its worker count in place of the configured one
    pub fn run<I>(&self, request: IntegrationRequest<I>) -> Result<f64>
    where
        I: Integrand + 'static,
    {
        request.validate()?;
        self.integrate_shared(
            Arc::new(request.integrand),
            request.interval,
            request.total_steps,
            request.worker_count,
        )
    }

    /// Integrate an already shared integrand on `worker_count` workers
    pub fn integrate_shared<I>(
        &self,
        f: Arc<I>,
        interval: Interval,
        total_steps: usize,
        worker_count: usize,
    ) -> Result<f64>
    where
        I: Integrand + ?Sized + 'static,
    {
        let jobs = Partitioner::new(self.config.remainder).partition(
            interval,
            total_steps,
            worker_count,
        )?;

        log::debug!(
            "integrating over [{}, {}] with {} of {} steps on {} workers",
            interval.lower,
            interval.upper,
            self.config.remainder.effective_steps(total_steps, worker_count),
            total_steps,
            worker_count
        );

        let pool_config = self.config.pool.clone().with_num_workers(worker_count);
        let mut pool = WorkerPool::spawn(&pool_config, f, self.config.rule())?;

        let queued = pool.dispatch(jobs)?;
        pool.close();

        let mut partials = pool.collect(queued)?;
        log::debug!(
            "collected {} of {} dispatched jobs",
            pool.results_received(),
            pool.jobs_dispatched()
        );
        pool.shutdown()?;

        Ok(reduce(&mut partials))
    }
}

/// Sum partial results in job order
///
/// Sorting first makes the total independent of completion order.
pub fn reduce(partials: &mut [PartialResult]) -> f64 {
    partials.sort_by_key(|p| p.job_index);
    partials.iter().map(|p| p.value).sum()
}

/// Integrate `f` over `[a, b]` with `total_steps` samples split across
/// `worker_count` workers
///
/// Uses the default configuration: leftover steps are dropped and partial
/// sums are rounded to 8 digits.
pub fn integrate_parallel<I>(
    f: I,
    a: f64,
    b: f64,
    total_steps: usize,
    worker_count: usize,
) -> Result<f64>
where
    I: Integrand + 'static,
{
    ParallelIntegrator::default().run(IntegrationRequest::new(
        f,
        Interval::new(a, b),
        total_steps,
        worker_count,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrand::{FnIntegrand, TryFnIntegrand};
    use crate::scalar::integrate;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_single_worker_matches_scalar() {
        let f = FnIntegrand::new(f64::atan);
        let scalar = integrate(&f, 0.0, FRAC_PI_2, 100_000).unwrap();
        let parallel = integrate_parallel(f, 0.0, FRAC_PI_2, 100_000, 1).unwrap();

        assert_eq!(scalar, parallel);
    }

    #[test]
    fn test_workers_agree_on_identity() {
        for workers in [1, 2, 4, 8] {
            let result =
                integrate_parallel(FnIntegrand::new(|x: f64| x), 0.0, 1.0, 100_000, workers)
                    .unwrap();
            assert_abs_diff_eq!(result, 0.5, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_parallel_close_to_scalar() {
        let f = FnIntegrand::new(|x: f64| x.sin() * x.exp());
        let scalar = integrate(&f, -1.0, 2.0, 80_000).unwrap();
        let parallel = integrate_parallel(f, -1.0, 2.0, 80_000, 4).unwrap();

        // same step budget, only the sample grid alignment differs
        assert_abs_diff_eq!(scalar, parallel, epsilon = 1e-6);
    }

    #[test]
    fn test_zero_function() {
        let result = integrate_parallel(FnIntegrand::new(|_: f64| 0.0), -2.0, 9.0, 1_000, 4).unwrap();
        assert_eq!(result, 0.0);
    }

    #[test]
    fn test_degenerate_interval() {
        let result =
            integrate_parallel(FnIntegrand::new(|x: f64| x * x), 3.0, 3.0, 1_000, 4).unwrap();
        assert_eq!(result, 0.0);
    }

    #[test]
    fn test_reversed_interval() {
        let forward =
            integrate_parallel(FnIntegrand::new(|_: f64| 1.0), 0.0, 2.0, 1_000, 4).unwrap();
        let backward =
            integrate_parallel(FnIntegrand::new(|_: f64| 1.0), 2.0, 0.0, 1_000, 4).unwrap();

        assert_abs_diff_eq!(forward, 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(backward, -2.0, epsilon = 1e-8);
    }

    #[test]
    fn test_reduce_is_order_independent() {
        let values = [0.1, 0.2, 0.3, 1e-9, 12345.678, -0.7];
        let mut forward: Vec<PartialResult> = values
            .iter()
            .enumerate()
            .map(|(i, &v)| PartialResult::new(i, 0, v))
            .collect();
        let mut shuffled = forward.clone();
        shuffled.reverse();
        shuffled.swap(0, 2);

        let a = reduce(&mut forward);
        let b = reduce(&mut shuffled);
        assert_eq!(a.to_bits(), b.to_bits());

        // a naive sum in another order differs by rounding at most
        let naive: f64 = values.iter().rev().sum();
        assert_abs_diff_eq!(a, naive, epsilon = 1e-9);
    }

    #[test]
    fn test_remainder_policies() {
        let counter = Arc::new(AtomicUsize::new(0));

        let counting = {
            let counter = Arc::clone(&counter);
            FnIntegrand::new(move |x: f64| {
                counter.fetch_add(1, Ordering::Relaxed);
                x
            })
        };
        integrate_parallel(counting, 0.0, 1.0, 100_001, 4).unwrap();
        assert_eq!(counter.swap(0, Ordering::Relaxed), 100_000);

        let counting = {
            let counter = Arc::clone(&counter);
            FnIntegrand::new(move |x: f64| {
                counter.fetch_add(1, Ordering::Relaxed);
                x
            })
        };
        let integrator = ParallelIntegrator::new(
            IntegratorConfig::new()
                .with_num_workers(4)
                .with_remainder_policy(RemainderPolicy::Distribute),
        );
        integrator
            .integrate(counting, Interval::new(0.0, 1.0), 100_001)
            .unwrap();
        assert_eq!(counter.load(Ordering::Relaxed), 100_001);
    }

    #[test]
    fn test_evaluation_error_surfaces() {
        let f = TryFnIntegrand::new(|x: f64| {
            if x > 0.7 {
                Err(format!("no value at {}", x))
            } else {
                Ok(x)
            }
        });

        let err = integrate_parallel(f, 0.0, 1.0, 10_000, 4).unwrap_err();
        assert!(matches!(err, Error::Evaluation { x, .. } if x > 0.7));
    }

    #[test]
    fn test_fail_fast_does_not_wait_for_slow_job() {
        // job 0 fails on its first sample, job 1 would take about 2s
        let f = TryFnIntegrand::new(|x: f64| {
            if x < 0.5 {
                Err("left half undefined")
            } else {
                thread::sleep(Duration::from_millis(200));
                Ok(x)
            }
        });

        let start = Instant::now();
        let result = integrate_parallel(f, 0.0, 1.0, 20, 2);
        let elapsed = start.elapsed();

        assert!(matches!(result, Err(Error::Evaluation { x, .. }) if x < 0.5));
        assert!(elapsed < Duration::from_secs(1), "waited {:?}", elapsed);
    }

    #[test]
    fn test_panic_surfaces() {
        let f = FnIntegrand::new(|x: f64| {
            if x > 0.9 {
                panic!("singularity");
            }
            x
        });

        let err = integrate_parallel(f, 0.0, 1.0, 1_000, 2).unwrap_err();
        assert!(matches!(err, Error::WorkerPanicked(ref msg) if msg == "singularity"));
    }

    #[test]
    fn test_invalid_arguments() {
        let f = || FnIntegrand::new(|x: f64| x);

        for (steps, workers) in [(0, 4), (100, 0), (3, 4)] {
            assert!(matches!(
                integrate_parallel(f(), 0.0, 1.0, steps, workers),
                Err(Error::InvalidArgument(_))
            ));
        }
        assert!(matches!(
            integrate_parallel(f(), f64::NEG_INFINITY, 1.0, 100, 2),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_integrate_shared_dyn() {
        let f: Arc<dyn Integrand> = Arc::new(FnIntegrand::new(|x: f64| 2.0 * x));
        let result = ParallelIntegrator::default()
            .integrate_shared(f, Interval::new(0.0, 1.0), 10_000, 3)
            .unwrap();
        assert_abs_diff_eq!(result, 1.0, epsilon = 1e-3);
    }
}
