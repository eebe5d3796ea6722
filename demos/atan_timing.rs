//! Times repeated integration of atan over [0, pi/2], serially and pooled

use riemann_pool::prelude::*;
use std::f64::consts::FRAC_PI_2;
use std::time::{Duration, Instant};

const STEPS: usize = 100_000;
const RUNS: u32 = 100;

fn time_runs(mut run: impl FnMut() -> Result<f64>) -> Result<(f64, Duration)> {
    let start = Instant::now();
    let mut value = 0.0;
    for _ in 0..RUNS {
        value = run()?;
    }
    Ok((value, start.elapsed()))
}

fn main() -> Result<()> {
    println!("=== atan over [0, pi/2], {} steps, {} runs ===\n", STEPS, RUNS);

    let f = FnIntegrand::new(f64::atan);
    let (value, elapsed) = time_runs(|| integrate(&f, 0.0, FRAC_PI_2, STEPS))?;
    println!("scalar     : {:.8} in {:.5} s", value, elapsed.as_secs_f64());

    for workers in [1, 2, 4, 8] {
        let (value, elapsed) =
            time_runs(|| integrate_parallel(FnIntegrand::new(f64::atan), 0.0, FRAC_PI_2, STEPS, workers))?;
        println!(
            "{} worker(s): {:.8} in {:.5} s",
            workers,
            value,
            elapsed.as_secs_f64()
        );
    }

    Ok(())
}
