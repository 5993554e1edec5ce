use std::ops::Range;

use thiserror::Error;

/// Why a single worker did not produce its share of the output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerFault {
    #[error("worker could not be launched: {0}")]
    Launch(String),
    #[error("worker could not be joined: {0}")]
    Join(String),
}

/// A worker that failed, and the output indices it owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFailure {
    pub worker: usize,
    pub range: Range<usize>,
    pub fault: WorkerFault,
}

#[derive(Debug, Error)]
pub enum ConvolutionError {
    #[error("thread count must be at least 1")]
    ZeroThreads,

    #[error("output length overflows for signal length {signal} and kernel length {kernel}")]
    LengthOverflow { signal: usize, kernel: usize },

    #[error("could not allocate an output buffer of {len} samples")]
    Allocation { len: usize },

    #[error("{} of the workers failed, output indices {:?} were not computed", .failures.len(), missing_ranges(.failures))]
    Incomplete { failures: Vec<RangeFailure> },
}

impl ConvolutionError {
    /// Output ranges left uncomputed, empty for every variant except `Incomplete`.
    pub fn missing(&self) -> Vec<Range<usize>> {
        match self {
            ConvolutionError::Incomplete { failures } => missing_ranges(failures),
            _ => Vec::new(),
        }
    }
}

fn missing_ranges(failures: &[RangeFailure]) -> Vec<Range<usize>> {
    failures.iter().map(|f| f.range.clone()).collect()
}
