//! Functions that can be integrated
//!
//! An integrand is shared read-only between workers, so it must be
//! `Send + Sync`. Evaluation is fallible; infallible closures are adapted
//! with [`FnIntegrand`], fallible ones with [`TryFnIntegrand`].

use crate::error::{Error, Result};
use std::fmt::Display;
use std::sync::Arc;

/// A real-valued function of one real variable
pub trait Integrand: Send + Sync {
    /// Evaluate the function at `x`
    fn evaluate(&self, x: f64) -> Result<f64>;
}

impl<T: Integrand + ?Sized> Integrand for &T {
    fn evaluate(&self, x: f64) -> Result<f64> {
        (**self).evaluate(x)
    }
}

impl<T: Integrand + ?Sized> Integrand for Box<T> {
    fn evaluate(&self, x: f64) -> Result<f64> {
        (**self).evaluate(x)
    }
}

impl<T: Integrand + ?Sized> Integrand for Arc<T> {
    fn evaluate(&self, x: f64) -> Result<f64> {
        (**self).evaluate(x)
    }
}

/// Adapter for closures that cannot fail
#[derive(Debug, Clone, Copy)]
pub struct FnIntegrand<F> {
    func: F,
}

impl<F> FnIntegrand<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    /// Wrap an infallible function
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> Integrand for FnIntegrand<F>
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    #[inline]
    fn evaluate(&self, x: f64) -> Result<f64> {
        Ok((self.func)(x))
    }
}

/// Adapter for closures that report failure through `Result`
///
/// The closure's error is rendered with `Display` and surfaced as
/// [`Error::Evaluation`] along with the failing sample point.
#[derive(Debug, Clone, Copy)]
pub struct TryFnIntegrand<F> {
    func: F,
}

impl<F, E> TryFnIntegrand<F>
where
    F: Fn(f64) -> std::result::Result<f64, E> + Send + Sync,
    E: Display,
{
    /// Wrap a fallible function
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, E> Integrand for TryFnIntegrand<F>
where
    F: Fn(f64) -> std::result::Result<f64, E> + Send + Sync,
    E: Display,
{
    #[inline]
    fn evaluate(&self, x: f64) -> Result<f64> {
        (self.func)(x).map_err(|e| Error::evaluation(x, e))
    }
}
