//! Shows how a failing integrand surfaces from the pooled path

use riemann_pool::prelude::*;

fn main() {
    println!("=== Fail-fast Example ===\n");

    // log(x) is undefined at 0, the first sample of the first slice
    let log = TryFnIntegrand::new(|x: f64| {
        if x <= 0.0 {
            Err(format!("log undefined for {}", x))
        } else {
            Ok(x.ln())
        }
    });

    match integrate_parallel(log, 0.0, 1.0, 1_000_000, 4) {
        Ok(value) => println!("unexpected value: {}", value),
        Err(e) => println!("integration failed: {}", e),
    }

    // shifting the lower bound past the singularity succeeds
    let log = TryFnIntegrand::new(|x: f64| {
        if x <= 0.0 {
            Err(format!("log undefined for {}", x))
        } else {
            Ok(x.ln())
        }
    });

    let integrator = ParallelIntegrator::new(
        IntegratorConfig::new()
            .with_num_workers(4)
            .with_remainder_policy(RemainderPolicy::Distribute),
    );
    match integrator.integrate(log, Interval::new(1e-9, 1.0), 1_000_001) {
        Ok(value) => println!("integral of ln over [1e-9, 1] = {:.6}", value),
        Err(e) => println!("integration failed: {}", e),
    }
}
