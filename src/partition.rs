use std::ops::Range;

/// One worker's share of the output index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkAssignment {
    pub worker: usize,
    pub range: Range<usize>,
}

impl WorkAssignment {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Number of workers actually used for `output_len` samples.
///
/// Never more workers than output samples, so no worker is handed an empty
/// range. An empty output needs no workers at all.
pub fn worker_count(output_len: usize, threads: usize) -> usize {
    threads.min(output_len)
}

/// Splits `0..output_len` into contiguous blocks of `output_len / workers`
/// samples, the last block absorbing the remainder.
///
/// The returned ranges are in order, disjoint and cover the whole output.
/// `threads` is clamped with `worker_count`; zero threads yields no work.
pub fn partition(output_len: usize, threads: usize) -> Vec<WorkAssignment> {
    let workers = worker_count(output_len, threads);
    if workers == 0 {
        return Vec::new();
    }

    let block_size = output_len / workers;

    (0..workers)
        .map(|worker| {
            let start = worker * block_size;
            let end = if worker == workers - 1 { output_len } else { start + block_size };
            WorkAssignment { worker, range: start..end }
        })
        .collect()
}
