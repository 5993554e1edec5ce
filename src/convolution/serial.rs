use crate::error::ConvolutionError;

use super::kernel::{fill_range, output_len, zeroed_buffer};

/// Full linear convolution of `signal` with `kernel` on the calling thread.
pub fn convolve_serial(signal: &[f64], kernel: &[f64]) -> Result<Vec<f64>, ConvolutionError> {
    let len = output_len(signal.len(), kernel.len())?;
    let mut output = zeroed_buffer(len)?;

    fill_range(signal, kernel, &mut output, 0);
    Ok(output)
}
