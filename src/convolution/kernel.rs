use crate::error::ConvolutionError;

/// Length of the full linear convolution, `N + M - 1`.
///
/// Two empty inputs give an empty output, as does an empty signal with a
/// one-tap kernel (and vice versa).
pub fn output_len(signal_len: usize, kernel_len: usize) -> Result<usize, ConvolutionError> {
    match signal_len.checked_add(kernel_len) {
        Some(0) => Ok(0),
        Some(total) => Ok(total - 1),
        None => Err(ConvolutionError::LengthOverflow {
            signal: signal_len,
            kernel: kernel_len,
        }),
    }
}

/// `y[n] = sum x[n-k] * h[k]`, taken over the k where `n-k` is a valid signal index.
///
/// Samples outside the signal count as zero.
#[inline]
pub fn output_sample(signal: &[f64], kernel: &[f64], n: usize) -> f64 {
    let k_start = (n + 1).saturating_sub(signal.len());
    let k_end = kernel.len().min(n + 1);

    let mut sum = 0.0;
    for k in k_start..k_end {
        sum += signal[n - k] * kernel[k];
    }
    sum
}

/// Writes samples `offset..offset + out.len()` of the convolution into `out`.
pub(crate) fn fill_range(signal: &[f64], kernel: &[f64], out: &mut [f64], offset: usize) {
    for (i, y) in out.iter_mut().enumerate() {
        *y = output_sample(signal, kernel, offset + i);
    }
}

pub(crate) fn zeroed_buffer(len: usize) -> Result<Vec<f64>, ConvolutionError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| ConvolutionError::Allocation { len })?;
    buffer.resize(len, 0.0);
    Ok(buffer)
}
