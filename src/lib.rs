//! # Parallel Riemann Integration
//!
//! Numerical definite integrals by the left-endpoint rectangle rule, either
//! on the calling thread or spread over a pool of worker threads.
//!
//! ## Key Features
//!
//! - **Left Riemann sums**: samples `f` at `a, a+dx, ...` and never at `b`
//! - **Equal-width partitioning**: one contiguous slice per worker
//! - **Per-call worker pools**: spawned for one request and torn down after it
//! - **Fail-fast collection**: the first failing slice ends the call
//! - **Deterministic reduction**: partial sums are added in slice order
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!   request ────> │ Partitioner  │
//!                 └──────┬───────┘
//!                        │ jobs
//!          ┌─────────────┼─────────────┐
//!          ▼             ▼             ▼
//!    ┌──────────┐  ┌──────────┐  ┌──────────┐
//!    │ Worker 0 │  │ Worker 1 │  │ Worker N │   LeftRiemann per slice
//!    └────┬─────┘  └────┬─────┘  └────┬─────┘
//!         └─────────────┼─────────────┘
//!                       ▼ partial sums
//!                 ┌──────────────┐
//!                 │    reduce    │ ────> total
//!                 └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use riemann_pool::prelude::*;
//!
//! let area = integrate_parallel(FnIntegrand::new(|x: f64| x), 0.0, 1.0, 100_000, 4)?;
//! assert!((area - 0.5).abs() < 1e-3);
//! # Ok::<(), riemann_pool::Error>(())
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod channel;
pub mod error;
pub mod integrand;
pub mod job;
pub mod parallel;
pub mod partition;
pub mod pool;
pub mod round;
pub mod scalar;
pub mod worker;

// Re-exports
pub use error::{Error, Result};
pub use integrand::{FnIntegrand, Integrand, TryFnIntegrand};
pub use job::{IntegrationJob, Interval, PartialResult};
pub use parallel::{integrate_parallel, IntegrationRequest, IntegratorConfig, ParallelIntegrator};
pub use partition::{Partitioner, RemainderPolicy};
pub use pool::{PoolConfig, WorkerPool};
pub use scalar::{integrate, LeftRiemann};
pub use worker::WorkerConfig;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::integrand::{FnIntegrand, Integrand, TryFnIntegrand};
    pub use crate::job::Interval;
    pub use crate::parallel::{integrate_parallel, IntegratorConfig, ParallelIntegrator};
    pub use crate::partition::RemainderPolicy;
    pub use crate::scalar::{integrate, LeftRiemann};
}
