//! Per-call worker pool
//!
//! A pool is spawned for one integration request, fed all of its jobs,
//! drained of results and then torn down. It keeps no state between calls.
//!
//! Collection is fail-fast: the first failed job raises the cancellation
//! flag and is returned immediately. Jobs still queued are skipped by the
//! workers; a job already running finishes in the background and its result
//! is dropped.

use crate::channel::{Channel, ChannelStats, Receiver, Sender};
use crate::error::{Error, Result};
use crate::integrand::Integrand;
use crate::job::{IntegrationJob, PartialResult};
use crate::scalar::LeftRiemann;
use crate::worker::{spawn, IntegrationWorker, JobOutcome, WorkerConfig, WorkerHandle, WorkerReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Worker pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of workers in the pool
    pub num_workers: usize,

    /// Configuration template for workers
    pub worker_config: WorkerConfig,

    /// Whether to enable CPU affinity pinning
    pub enable_cpu_affinity: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_workers: num_cpus::get(),
            worker_config: WorkerConfig::default(),
            enable_cpu_affinity: false,
        }
    }
}

impl PoolConfig {
    /// Create a new pool configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of workers
    pub fn with_num_workers(mut self, num: usize) -> Self {
        self.num_workers = num;
        self
    }

    /// Set the worker configuration template
    pub fn with_worker_config(mut self, config: WorkerConfig) -> Self {
        self.worker_config = config;
        self
    }

    /// Enable CPU affinity pinning
    pub fn with_cpu_affinity(mut self, enable: bool) -> Self {
        self.enable_cpu_affinity = enable;
        self
    }
}

/// A fixed set of worker threads sharing one job queue
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
    job_tx: Option<Sender<IntegrationJob>>,
    job_stats: Arc<ChannelStats>,
    result_rx: Receiver<JobOutcome>,
    cancelled: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawn `config.num_workers` workers that integrate `integrand` with `rule`
    pub fn spawn<I>(config: &PoolConfig, integrand: Arc<I>, rule: LeftRiemann) -> Result<Self>
    where
        I: Integrand + ?Sized + 'static,
    {
        if config.num_workers == 0 {
            return Err(Error::invalid_argument("worker_count must be at least 1"));
        }

        let (job_tx, job_rx) = Channel::mpmc(config.worker_config.queue_capacity.max(1));
        let (result_tx, result_rx) = Channel::unbounded();
        let cancelled = Arc::new(AtomicBool::new(false));

        // dropping a half-built pool closes the queue and joins what was spawned
        let mut pool = Self {
            workers: Vec::with_capacity(config.num_workers),
            job_stats: job_tx.stats(),
            job_tx: Some(job_tx),
            result_rx,
            cancelled: Arc::clone(&cancelled),
        };

        // pin against the same core list the worker resolves its index in
        let cores = if config.enable_cpu_affinity {
            core_affinity::get_core_ids().map_or(0, |ids| ids.len())
        } else {
            0
        };
        if config.enable_cpu_affinity && cores == 0 {
            log::warn!("CPU affinity requested but no core ids are available");
        }

        for i in 0..config.num_workers {
            let mut worker_config = config.worker_config.clone();
            worker_config.cpu_affinity = affinity_for(i, cores);

            let worker = IntegrationWorker::new(
                i,
                Arc::clone(&integrand),
                rule,
                job_rx.clone(),
                result_tx.clone(),
                Arc::clone(&cancelled),
            );
            pool.workers.push(spawn(worker, worker_config)?);
        }

        log::debug!("spawned pool of {} workers", pool.workers.len());
        Ok(pool)
    }

    /// Get the number of workers
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Queue every job; returns the number queued
    pub fn dispatch<J>(&self, jobs: J) -> Result<usize>
    where
        J: IntoIterator<Item = IntegrationJob>,
    {
        let job_tx = self
            .job_tx
            .as_ref()
            .ok_or_else(|| Error::SendError("job queue already closed".to_string()))?;

        let mut queued = 0;
        for job in jobs {
            job_tx.send(job)?;
            queued += 1;
        }
        Ok(queued)
    }

    /// Close the job queue so workers exit once it drains
    pub fn close(&mut self) {
        self.job_tx.take();
    }

    /// Block until `expected` results arrive or the first job fails
    pub fn collect(&self, expected: usize) -> Result<Vec<PartialResult>> {
        let mut partials = Vec::with_capacity(expected);

        while partials.len() < expected {
            match self.result_rx.recv()? {
                Ok(partial) => partials.push(partial),
                Err(e) => {
                    self.cancel();
                    log::warn!(
                        "cancelling after {} of {} results: {}",
                        partials.len(),
                        expected,
                        e
                    );
                    return Err(e);
                }
            }
        }

        Ok(partials)
    }

    /// Ask workers to skip any job they have not started
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Number of jobs queued so far, still valid after `close`
    pub fn jobs_dispatched(&self) -> u64 {
        self.job_stats.sent()
    }

    /// Number of outcomes received so far
    pub fn results_received(&self) -> u64 {
        self.result_rx.stats().received()
    }

    /// Close the queue and wait for every worker to exit
    pub fn shutdown(mut self) -> Result<Vec<WorkerReport>> {
        self.close();

        let mut reports = Vec::with_capacity(self.workers.len());
        let mut errors = Vec::new();

        for worker in self.workers.iter_mut() {
            match worker.join() {
                Ok(report) => reports.push(report),
                Err(e) => {
                    log::warn!("failed to join {}: {}", worker.name(), e);
                    errors.push(e);
                }
            }
        }

        match errors.into_iter().next() {
            Some(e) => Err(e),
            None => Ok(reports),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.close();

        let cancelled = self.is_cancelled();

        for worker in self.workers.iter_mut() {
            // a running job may still be mid-integration; let it finish unobserved
            if cancelled && !worker.is_finished() {
                log::debug!("detaching {} after cancellation", worker.name());
                worker.detach();
                continue;
            }
            if let Err(e) = worker.join() {
                log::warn!("failed to join {}: {}", worker.name(), e);
            }
        }
    }
}

/// Core index for worker `i`, or None when pinning is off or unavailable
fn affinity_for(i: usize, cores: usize) -> Option<usize> {
    if cores == 0 {
        None
    } else {
        Some(i % cores)
    }
}
