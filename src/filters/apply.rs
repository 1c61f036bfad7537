//! Linear filtering with transfer-function coefficients
//!
//! Runs the direct-form II transposed difference equation sample by sample,
//! left to right, starting from a zero state. Output length always equals
//! input length.

use serde::{Deserialize, Serialize};

use super::design::FilterCoefficients;
use crate::error::DspError;

/// How coefficients are applied to a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Single causal pass (phase-shifted output)
    #[default]
    Causal,
    /// Forward then backward pass over an odd-extended signal (no phase shift,
    /// squared magnitude response)
    ZeroPhase,
}

/// Apply filter coefficients in a single causal pass
///
/// Coefficients are normalized by `a[0]`. An empty input yields an empty
/// output.
///
/// # Errors
///
/// Returns `DspError::InvalidParameter` if `b` or `a` is empty, `a[0]` is
/// zero, or any coefficient is not finite.
///
/// # Example
///
/// ```no_run
/// use auscult_dsp::filters::apply::lfilter;
/// use auscult_dsp::filters::design::FilterCoefficients;
///
/// let moving_average = FilterCoefficients { b: vec![0.5, 0.5], a: vec![1.0] };
/// let out = lfilter(&moving_average, &[1.0, 1.0, 1.0])?;
/// assert_eq!(out, vec![0.5, 1.0, 1.0]);
/// # Ok::<(), auscult_dsp::DspError>(())
/// ```
pub fn lfilter(coeffs: &FilterCoefficients, samples: &[f32]) -> Result<Vec<f32>, DspError> {
    check_coefficients(coeffs)?;

    let mut section = Section::new(coeffs);
    Ok(samples
        .iter()
        .map(|&x| section.process(x as f64) as f32)
        .collect())
}

/// Apply filter coefficients according to `mode`
///
/// # Errors
///
/// Returns `DspError::InvalidParameter` for unusable coefficients (see [`lfilter`]).
pub fn apply_coefficients(
    coeffs: &FilterCoefficients,
    samples: &[f32],
    mode: FilterMode,
) -> Result<Vec<f32>, DspError> {
    check_coefficients(coeffs)?;

    log::debug!(
        "Filtering {} samples: order={}, mode={:?}",
        samples.len(),
        coeffs.order(),
        mode
    );

    match mode {
        FilterMode::Causal => lfilter(coeffs, samples),
        FilterMode::ZeroPhase => Ok(filtfilt(coeffs, samples)),
    }
}

fn check_coefficients(coeffs: &FilterCoefficients) -> Result<(), DspError> {
    if coeffs.b.is_empty() || coeffs.a.is_empty() {
        return Err(DspError::InvalidParameter(
            "Filter coefficients must not be empty".to_string(),
        ));
    }
    if coeffs.a[0] == 0.0 {
        return Err(DspError::InvalidParameter(
            "Leading denominator coefficient a[0] must be non-zero".to_string(),
        ));
    }
    if coeffs.b.iter().chain(&coeffs.a).any(|c| !c.is_finite()) {
        return Err(DspError::InvalidParameter(
            "Filter coefficients must be finite".to_string(),
        ));
    }
    Ok(())
}

/// Forward-backward filtering over an odd extension of the input
///
/// The padding length is `3 * max(len(a), len(b))`, clipped to `len - 1`.
/// Inputs of length 0 or 1 have no room for padding and are filtered without it.
/// Both passes start from the step-response steady state scaled by their
/// first input, so a constant signal passes through unchanged.
fn filtfilt(coeffs: &FilterCoefficients, samples: &[f32]) -> Vec<f32> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let ntaps = coeffs.a.len().max(coeffs.b.len());
    let pad = (3 * ntaps).min(n - 1);

    // Odd extension: 2*x[0] - x[pad..0], x, 2*x[n-1] - x[n-2..n-1-pad]
    let first = samples[0] as f64;
    let last = samples[n - 1] as f64;
    let mut extended: Vec<f64> = Vec::with_capacity(n + 2 * pad);
    extended.extend((1..=pad).rev().map(|i| 2.0 * first - samples[i] as f64));
    extended.extend(samples.iter().map(|&x| x as f64));
    extended.extend((1..=pad).map(|i| 2.0 * last - samples[n - 1 - i] as f64));

    // Each pass starts in the steady state for its first input sample
    let zi = steady_state(coeffs);
    let forward = run_section(coeffs, &zi, extended[0], extended.iter().copied());
    let backward_start = forward.last().copied().unwrap_or(0.0);
    let backward = run_section(coeffs, &zi, backward_start, forward.iter().rev().copied());

    backward
        .iter()
        .rev()
        .skip(pad)
        .take(n)
        .map(|&y| y as f32)
        .collect()
}

fn run_section(
    coeffs: &FilterCoefficients,
    zi: &[f64],
    first: f64,
    input: impl Iterator<Item = f64>,
) -> Vec<f64> {
    let mut section = Section::new(coeffs);
    for (state, &z) in section.state.iter_mut().zip(zi) {
        *state = z * first;
    }
    input.map(|x| section.process(x)).collect()
}

/// Initial state for which a unit step input produces a constant output
///
/// Solves `zi = A * zi + B` for the transposed direct form, with the
/// companion structure unrolled into a running sum. A filter with a pole at
/// DC has no steady state; its initial state is zero.
fn steady_state(coeffs: &FilterCoefficients) -> Vec<f64> {
    let section = Section::new(coeffs);
    let order = section.state.len();
    let mut zi = vec![0.0f64; order];
    if order == 0 {
        return zi;
    }

    let (b, a) = (&section.b, &section.a);
    let a_sum: f64 = a.iter().sum();
    if a_sum.abs() < f64::EPSILON {
        log::warn!("Filter has a pole at DC, starting zero-phase passes from rest");
        return zi;
    }

    let b_sum: f64 = (1..=order).map(|k| b[k] - a[k] * b[0]).sum();
    zi[0] = b_sum / a_sum;

    let mut running_a = 1.0;
    let mut running_c = 0.0;
    for k in 1..order {
        running_a += a[k];
        running_c += b[k] - a[k] * b[0];
        zi[k] = running_a * zi[0] - running_c;
    }
    zi
}

/// Direct-form II transposed state for one pass
struct Section {
    b: Vec<f64>,
    a: Vec<f64>,
    state: Vec<f64>,
}

impl Section {
    fn new(coeffs: &FilterCoefficients) -> Self {
        // Callers check that a[0] is non-zero
        let len = coeffs.a.len().max(coeffs.b.len()).max(1);
        let a0 = coeffs.a[0];

        let mut b: Vec<f64> = coeffs.b.iter().map(|&c| c / a0).collect();
        let mut a: Vec<f64> = coeffs.a.iter().map(|&c| c / a0).collect();
        b.resize(len, 0.0);
        a.resize(len, 0.0);

        Self {
            b,
            a,
            state: vec![0.0; len - 1],
        }
    }

    fn process(&mut self, x: f64) -> f64 {
        let order = self.state.len();
        let y = self.b[0] * x + self.state.first().copied().unwrap_or(0.0);

        for i in 0..order {
            let carry = if i + 1 < order { self.state[i + 1] } else { 0.0 };
            self.state[i] = self.b[i + 1] * x + carry - self.a[i + 1] * y;
        }

        y
    }
}
