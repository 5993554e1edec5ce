use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info};
use thiserror::Error;

use crate::backend::BackendKind;
use crate::convolution::{convolve_parallel_with, convolve_serial};
use crate::error::ConvolutionError;
use crate::signal::{generate_random_vector, generate_seeded_vector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Serial,
    Parallel,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Serial => f.write_str("serial"),
            Mode::Parallel => f.write_str("parallel"),
        }
    }
}

/// One measured run: signal length, kernel length, thread count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkConfig {
    pub n: usize,
    pub m: usize,
    pub threads: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRecord {
    pub mode: Mode,
    pub config: BenchmarkConfig,
    pub elapsed: Duration,
    /// Serial time over this run's time. `None` for the serial baseline.
    pub speedup: Option<f64>,
    /// Largest deviation from the serial result, when verification is on.
    pub max_abs_diff: Option<f64>,
}

impl BenchmarkRecord {
    pub fn millis(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("repeat count must be at least 1")]
    ZeroRepeats,

    #[error("thread count must be at least 1")]
    ZeroThreads,

    #[error("{mode} convolution failed for n={}, m={}, threads={}", .config.n, .config.m, .config.threads)]
    Convolution {
        mode: Mode,
        config: BenchmarkConfig,
        #[source]
        source: ConvolutionError,
    },

    #[error("parallel result differs from serial by {max_abs_diff} for n={}, m={}, threads={}", .config.n, .config.m, .config.threads)]
    Mismatch {
        config: BenchmarkConfig,
        max_abs_diff: f64,
    },
}

/// The benchmark matrix: every signal length against every thread count.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkPlan {
    pub sizes: Vec<usize>,
    pub kernel_len: usize,
    pub threads: Vec<usize>,
    pub backend: BackendKind,
    /// Timed repetitions per run, averaged.
    pub repeats: usize,
    /// Fixed seed for reproducible inputs, entropy otherwise.
    pub seed: Option<u64>,
    pub verify: bool,
}

impl Default for BenchmarkPlan {
    fn default() -> Self {
        BenchmarkPlan {
            sizes: vec![10, 100, 1_000, 10_000, 100_000],
            kernel_len: 10,
            threads: vec![2, 4, 8, 16],
            backend: BackendKind::Threads,
            repeats: 1,
            seed: None,
            verify: false,
        }
    }
}

impl BenchmarkPlan {
    /// Number of records `run_plan` produces: a serial baseline plus one run
    /// per thread count, for each size.
    pub fn total_runs(&self) -> usize {
        self.sizes.len() * (1 + self.threads.len())
    }

    fn inputs(&self, size_index: usize, n: usize) -> (Vec<f64>, Vec<f64>) {
        match self.seed {
            Some(seed) => {
                let base = seed.wrapping_add(2 * size_index as u64);
                (
                    generate_seeded_vector(n, base),
                    generate_seeded_vector(self.kernel_len, base.wrapping_add(1)),
                )
            }
            None => (
                generate_random_vector(n),
                generate_random_vector(self.kernel_len),
            ),
        }
    }
}

pub fn speedup(serial: Duration, parallel: Duration) -> f64 {
    let parallel = parallel.as_secs_f64();
    if parallel == 0.0 {
        return f64::INFINITY;
    }
    serial.as_secs_f64() / parallel
}

pub fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

// Runs `f` at least once, `repeats` times in all, and returns the mean
// duration with the last result.
fn time_average<T, E, F>(repeats: usize, mut f: F) -> Result<(Duration, T), E>
where
    F: FnMut() -> Result<T, E>,
{
    let start = Instant::now();
    let mut last = f()?;
    let mut total = start.elapsed();

    for _ in 1..repeats {
        let start = Instant::now();
        last = f()?;
        total += start.elapsed();
    }
    Ok((total.div_f64(repeats.max(1) as f64), last))
}

/// Runs the whole plan, calling `on_record` as each measurement lands.
///
/// Inputs are generated once per size and shared by the serial baseline and
/// every parallel run of that size.
pub fn run_plan<F>(plan: &BenchmarkPlan, mut on_record: F) -> Result<Vec<BenchmarkRecord>, BenchmarkError>
where
    F: FnMut(&BenchmarkRecord),
{
    if plan.repeats == 0 {
        return Err(BenchmarkError::ZeroRepeats);
    }
    if plan.threads.contains(&0) {
        return Err(BenchmarkError::ZeroThreads);
    }

    let backend = plan.backend.backend();
    let mut records = Vec::with_capacity(plan.total_runs());

    for (size_index, &n) in plan.sizes.iter().enumerate() {
        let (signal, kernel) = plan.inputs(size_index, n);
        info!("n={} m={}: serial baseline", n, plan.kernel_len);

        let serial_config = BenchmarkConfig { n, m: plan.kernel_len, threads: 1 };
        let (serial_time, baseline) = time_average(plan.repeats, || convolve_serial(&signal, &kernel))
            .map_err(|source| BenchmarkError::Convolution {
                mode: Mode::Serial,
                config: serial_config,
                source,
            })?;

        let record = BenchmarkRecord {
            mode: Mode::Serial,
            config: serial_config,
            elapsed: serial_time,
            speedup: None,
            max_abs_diff: None,
        };
        on_record(&record);
        records.push(record);

        for &threads in &plan.threads {
            debug!("n={} m={}: {} backend, {} threads", n, plan.kernel_len, backend.name(), threads);

            let config = BenchmarkConfig { n, m: plan.kernel_len, threads };
            let (elapsed, output) = time_average(plan.repeats, || {
                convolve_parallel_with(backend, &signal, &kernel, threads)
            })
            .map_err(|source| BenchmarkError::Convolution {
                mode: Mode::Parallel,
                config,
                source,
            })?;

            let diff = if plan.verify {
                let diff = max_abs_diff(&baseline, &output);
                if diff != 0.0 {
                    return Err(BenchmarkError::Mismatch { config, max_abs_diff: diff });
                }
                Some(diff)
            } else {
                None
            };

            let record = BenchmarkRecord {
                mode: Mode::Parallel,
                config,
                elapsed,
                speedup: Some(speedup(serial_time, elapsed)),
                max_abs_diff: diff,
            };
            on_record(&record);
            records.push(record);
        }
    }

    Ok(records)
}
