//! Worker threads that run integration jobs
//!
//! A worker pulls jobs from a shared queue, integrates each slice with the
//! scalar rule and reports one outcome per job on the result channel. Workers
//! share nothing but the read-only integrand and a cancellation flag.

use crate::channel::{Receiver, Sender};
use crate::error::{Error, Result};
use crate::integrand::Integrand;
use crate::job::{IntegrationJob, PartialResult};
use crate::scalar::LeftRiemann;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Position of a worker within its pool
pub type WorkerId = usize;

/// Outcome of one job as seen by the aggregator
pub type JobOutcome = Result<PartialResult>;

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Worker name (for debugging/monitoring)
    pub name: Option<String>,

    /// CPU core to pin this worker to (None = no pinning)
    pub cpu_affinity: Option<usize>,

    /// Job queue capacity
    pub queue_capacity: usize,

    /// Stack size for worker thread (None = default)
    pub stack_size: Option<usize>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: None,
            cpu_affinity: None,
            queue_capacity: 1024,
            stack_size: None,
        }
    }
}

impl WorkerConfig {
    /// Create a new worker configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set CPU affinity
    pub fn with_cpu_affinity(mut self, cpu: usize) -> Self {
        self.cpu_affinity = Some(cpu);
        self
    }

    /// Set queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set stack size
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }
}

/// Per-worker tally, returned when the thread exits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Jobs integrated successfully
    pub completed: usize,

    /// Jobs that failed or panicked
    pub failed: usize,

    /// Jobs skipped after cancellation
    pub skipped: usize,
}

/// A worker bound to one integrand and one pair of channels
pub struct IntegrationWorker<I: ?Sized> {
    id: WorkerId,
    integrand: Arc<I>,
    rule: LeftRiemann,
    jobs: Receiver<IntegrationJob>,
    results: Sender<JobOutcome>,
    cancelled: Arc<AtomicBool>,
}

impl<I> IntegrationWorker<I>
where
    I: Integrand + ?Sized + 'static,
{
    /// Create a new worker
    pub fn new(
        id: WorkerId,
        integrand: Arc<I>,
        rule: LeftRiemann,
        jobs: Receiver<IntegrationJob>,
        results: Sender<JobOutcome>,
        cancelled: Arc<AtomicBool>,
    ) -> Self {
        Self {
            id,
            integrand,
            rule,
            jobs,
            results,
            cancelled,
        }
    }

    /// Run one job, converting a panic in the integrand into an error
    pub fn run_job(&self, job: &IntegrationJob) -> JobOutcome {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.rule.integrate_job(&*self.integrand, job)
        }));

        match outcome {
            Ok(value) => value.map(|v| PartialResult::new(job.index, self.id, v)),
            Err(payload) => Err(Error::WorkerPanicked(panic_message(payload))),
        }
    }

    /// Drain the job queue until it closes
    pub fn run(self) -> WorkerReport {
        let mut report = WorkerReport::default();

        for job in self.jobs.iter() {
            if self.cancelled.load(Ordering::Acquire) {
                log::debug!("worker {} skipping job {} after cancellation", self.id, job.index);
                report.skipped += 1;
                continue;
            }

            let outcome = self.run_job(&job);
            match &outcome {
                Ok(partial) => {
                    log::debug!(
                        "worker {} finished job {} ({} steps) = {}",
                        self.id,
                        job.index,
                        job.step_count,
                        partial.value
                    );
                    report.completed += 1;
                }
                Err(e) => {
                    log::warn!("worker {} failed job {}: {}", self.id, job.index, e);
                    self.cancelled.store(true, Ordering::Release);
                    report.failed += 1;
                }
            }

            if self.results.send(outcome).is_err() {
                // aggregator already returned; nothing left to report to
                log::debug!("worker {} result channel closed", self.id);
            }
        }

        let undelivered = self.results.stats().send_errors();
        if undelivered > 0 {
            log::debug!(
                "worker {} exiting; {} results went undelivered pool-wide",
                self.id,
                undelivered
            );
        }

        report
    }
}

/// Handle to a running worker thread
pub struct WorkerHandle {
    name: String,
    thread_handle: Option<JoinHandle<WorkerReport>>,
}

impl WorkerHandle {
    /// Get the thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Wait for the thread to exit
    pub fn join(&mut self) -> Result<WorkerReport> {
        match self.thread_handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|payload| Error::WorkerPanicked(panic_message(payload))),
            None => Ok(WorkerReport::default()),
        }
    }

    /// Let the thread finish on its own without waiting for it
    pub fn detach(&mut self) {
        self.thread_handle.take();
    }
}

/// Spawn a worker on its own thread
pub fn spawn<I>(worker: IntegrationWorker<I>, config: WorkerConfig) -> Result<WorkerHandle>
where
    I: Integrand + ?Sized + 'static,
{
    let id = worker.id;
    let name = match &config.name {
        Some(name) => format!("worker-{}-{}", id, name),
        None => format!("worker-{}", id),
    };

    let mut thread_builder = thread::Builder::new().name(name.clone());

    if let Some(stack_size) = config.stack_size {
        thread_builder = thread_builder.stack_size(stack_size);
    }

    let cpu_affinity = config.cpu_affinity;
    let thread_handle = thread_builder
        .spawn(move || {
            if let Some(cpu) = cpu_affinity {
                if let Some(core_ids) = core_affinity::get_core_ids() {
                    if cpu < core_ids.len() {
                        core_affinity::set_for_current(core_ids[cpu]);
                    }
                }
            }

            worker.run()
        })
        .map_err(|e| Error::SpawnError(e.to_string()))?;

    Ok(WorkerHandle {
        name,
        thread_handle: Some(thread_handle),
    })
}

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
