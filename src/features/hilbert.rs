//! Analytic signal and amplitude envelope via the Hilbert transform
//!
//! Algorithm:
//! 1. Full-length complex FFT of the real input
//! 2. Keep DC (and Nyquist for even lengths), double positive frequencies,
//!    zero negative frequencies
//! 3. Inverse FFT gives the analytic signal `x + i * H{x}`
//! 4. Its magnitude is the instantaneous amplitude (envelope)

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use crate::error::DspError;

/// Compute the analytic signal of `samples`
///
/// # Errors
///
/// Returns `DspError::EmptyInput` for an empty signal.
pub fn analytic_signal(samples: &[f32]) -> Result<Vec<Complex<f32>>, DspError> {
    if samples.is_empty() {
        return Err(DspError::EmptyInput(
            "Hilbert transform needs at least one sample".to_string(),
        ));
    }

    let n = samples.len();
    log::debug!("Computing analytic signal: {} samples", n);

    let mut buffer: Vec<Complex<f32>> = samples.iter().map(|&x| Complex::new(x, 0.0)).collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    // One-sided spectrum multiplier
    let half = n / 2;
    for (k, value) in buffer.iter_mut().enumerate() {
        let h = if k == 0 || (n % 2 == 0 && k == half) {
            1.0
        } else if k <= (n - 1) / 2 {
            2.0
        } else {
            0.0
        };
        *value *= h;
    }

    planner.plan_fft_inverse(n).process(&mut buffer);

    let scale = 1.0 / n as f32;
    Ok(buffer.into_iter().map(|c| c * scale).collect())
}

/// Instantaneous amplitude envelope `|x + i * H{x}|`, same length as the input
///
/// A single-sample input yields `[|x0|]`.
pub fn envelope(samples: &[f32]) -> Result<Vec<f32>, DspError> {
    Ok(analytic_signal(samples)?.iter().map(|c| c.norm()).collect())
}
