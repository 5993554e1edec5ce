mod kernel;
mod parallel;
mod serial;

pub use kernel::{output_len, output_sample};
pub use parallel::{convolve_parallel, convolve_parallel_with};
pub use serial::convolve_serial;
