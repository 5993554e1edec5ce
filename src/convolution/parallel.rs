use std::mem;

use log::debug;

use crate::backend::{Backend, ScopedThreads, WorkerTask};
use crate::error::{ConvolutionError, RangeFailure, WorkerFault};
use crate::partition::{partition, WorkAssignment};

use super::kernel::{fill_range, output_len, zeroed_buffer};

/// Full linear convolution split across `threads` OS threads.
///
/// Agrees bit for bit with `convolve_serial`. See `convolve_parallel_with`
/// for the partitioning and failure rules.
pub fn convolve_parallel(
    signal: &[f64],
    kernel: &[f64],
    threads: usize,
) -> Result<Vec<f64>, ConvolutionError> {
    convolve_parallel_with(&ScopedThreads, signal, kernel, threads)
}

/// Full linear convolution, with the workers run by `backend`.
///
/// The output is cut into contiguous blocks (see `partition`) and each worker
/// gets exclusive `&mut` access to its own block, so no locking is involved.
/// If any worker fails to launch or to finish, the buffer is discarded and
/// `ConvolutionError::Incomplete` lists the ranges that were not computed.
pub fn convolve_parallel_with<B>(
    backend: &B,
    signal: &[f64],
    kernel: &[f64],
    threads: usize,
) -> Result<Vec<f64>, ConvolutionError>
where
    B: Backend + ?Sized,
{
    if threads == 0 {
        return Err(ConvolutionError::ZeroThreads);
    }

    let len = output_len(signal.len(), kernel.len())?;
    let mut output = zeroed_buffer(len)?;

    let assignments = partition(len, threads);
    debug!(
        "{} backend: {} outputs over {} workers ({} requested)",
        backend.name(),
        len,
        assignments.len(),
        threads
    );

    let tasks = worker_tasks(signal, kernel, &mut output, &assignments);
    let outcomes = backend.fork_join(tasks);

    let failures: Vec<RangeFailure> = assignments
        .iter()
        .enumerate()
        .filter_map(|(i, assignment)| {
            let fault = match outcomes.get(i) {
                Some(Ok(())) => return None,
                Some(Err(fault)) => fault.clone(),
                None => WorkerFault::Launch("backend reported no outcome".to_string()),
            };
            Some(RangeFailure {
                worker: assignment.worker,
                range: assignment.range.clone(),
                fault,
            })
        })
        .collect();

    if !failures.is_empty() {
        return Err(ConvolutionError::Incomplete { failures });
    }
    Ok(output)
}

// Hands each assignment its own disjoint slice of `output`.
// Relies on `partition` returning ordered, contiguous ranges.
fn worker_tasks<'a>(
    signal: &'a [f64],
    kernel: &'a [f64],
    output: &'a mut [f64],
    assignments: &[WorkAssignment],
) -> Vec<WorkerTask<'a>> {
    let mut rest = output;
    let mut tasks = Vec::with_capacity(assignments.len());

    for assignment in assignments {
        let (chunk, tail) = mem::take(&mut rest).split_at_mut(assignment.len());
        rest = tail;

        let offset = assignment.range.start;
        tasks.push(WorkerTask::new(
            assignment.worker,
            assignment.range.clone(),
            move || fill_range(signal, kernel, chunk, offset),
        ));
    }
    tasks
}
