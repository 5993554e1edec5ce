use std::any::Any;
use std::fmt;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::thread;

use log::{debug, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::error::WorkerFault;

/// A unit of work for one worker: computes `range` of the output.
///
/// The closure already holds the inputs and the worker's own slice of the
/// output buffer, so running it needs nothing from the backend.
pub struct WorkerTask<'a> {
    pub worker: usize,
    pub range: Range<usize>,
    job: Box<dyn FnOnce() + Send + 'a>,
}

impl<'a> WorkerTask<'a> {
    pub fn new<F>(worker: usize, range: Range<usize>, job: F) -> Self
    where
        F: FnOnce() + Send + 'a,
    {
        WorkerTask { worker, range, job: Box::new(job) }
    }

    pub fn run(self) {
        (self.job)()
    }
}

impl fmt::Debug for WorkerTask<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerTask")
            .field("worker", &self.worker)
            .field("range", &self.range)
            .finish()
    }
}

/// Result of one worker, in the order the tasks were handed in.
pub type WorkerOutcome = Result<(), WorkerFault>;

/// Fork-join provider for worker tasks.
///
/// `fork_join` must launch every task before waiting on any of them and must
/// not return until each launched task has finished. It returns exactly one
/// outcome per task, in task order.
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    fn fork_join(&self, tasks: Vec<WorkerTask<'_>>) -> Vec<WorkerOutcome>;
}

/// One OS thread per task, joined through `std::thread::scope`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopedThreads;

impl Backend for ScopedThreads {
    fn name(&self) -> &'static str {
        "threads"
    }

    fn fork_join(&self, tasks: Vec<WorkerTask<'_>>) -> Vec<WorkerOutcome> {
        thread::scope(|s| {
            let handles: Vec<_> = tasks
                .into_iter()
                .map(|task| {
                    let worker = task.worker;
                    debug!("spawning worker {} for {:?}", worker, task.range);
                    let spawned = thread::Builder::new()
                        .name(format!("conv-worker-{}", worker))
                        .spawn_scoped(s, move || task.run());
                    (worker, spawned)
                })
                .collect();

            handles
                .into_iter()
                .map(|(worker, spawned)| {
                    let outcome = match spawned {
                        Ok(handle) => handle
                            .join()
                            .map_err(|payload| WorkerFault::Join(panic_message(payload))),
                        Err(e) => Err(WorkerFault::Launch(e.to_string())),
                    };
                    if let Err(fault) = &outcome {
                        warn!("worker {}: {}", worker, fault);
                    }
                    outcome
                })
                .collect()
        })
    }
}

/// A rayon pool built per call, sized to one pool thread per task.
///
/// Weaker than the trait's fork-join contract: rayon may run several tasks on
/// one pool thread, and a task may finish before another has started. Every
/// task has still finished by the time `fork_join` returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonPool;

impl Backend for RayonPool {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn fork_join(&self, tasks: Vec<WorkerTask<'_>>) -> Vec<WorkerOutcome> {
        if tasks.is_empty() {
            return Vec::new();
        }

        let pool = match ThreadPoolBuilder::new()
            .num_threads(tasks.len())
            .thread_name(|i| format!("conv-rayon-{}", i))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!("rayon pool of {} threads failed to start: {}", tasks.len(), e);
                let fault = WorkerFault::Launch(e.to_string());
                return tasks.iter().map(|_| Err(fault.clone())).collect();
            }
        };

        pool.install(|| {
            tasks
                .into_par_iter()
                .map(|task| {
                    let worker = task.worker;
                    debug!("running worker {} for {:?}", worker, task.range);
                    let outcome = panic::catch_unwind(AssertUnwindSafe(move || task.run()))
                        .map_err(|payload| WorkerFault::Join(panic_message(payload)));
                    if let Err(fault) = &outcome {
                        warn!("worker {}: {}", worker, fault);
                    }
                    outcome
                })
                .collect::<Vec<_>>()
        })
    }
}

/// Backend selection, as named on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Threads,
    Rayon,
}

impl BackendKind {
    pub fn backend(self) -> &'static dyn Backend {
        match self {
            BackendKind::Threads => &ScopedThreads,
            BackendKind::Rayon => &RayonPool,
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "threads" | "thread" | "std" => Ok(BackendKind::Threads),
            "rayon" => Ok(BackendKind::Rayon),
            other => Err(format!("unknown backend '{}', expected 'threads' or 'rayon'", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.backend().name())
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
