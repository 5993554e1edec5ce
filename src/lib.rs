pub mod backend;
pub mod bench;
pub mod convolution;
pub mod error;
pub mod partition;
pub mod report;
pub mod signal;

pub use backend::{Backend, BackendKind, RayonPool, ScopedThreads, WorkerTask};
pub use convolution::{convolve_parallel, convolve_parallel_with, convolve_serial};
pub use error::{ConvolutionError, WorkerFault};
pub use signal::generate_random_vector;
