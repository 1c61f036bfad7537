//! First-order preemphasis and its inverse
//!
//! Preemphasis boosts high frequencies with the FIR filter
//! `y[n] = x[n] - k * x[n-1]`, `y[0] = x[0]`. Deemphasis undoes it with the
//! matching one-pole IIR filter `y[n] = x[n] + k * y[n-1]`.

/// Default preemphasis coefficient
pub const DEFAULT_COEFFICIENT: f32 = 0.97;

/// Apply preemphasis with coefficient `coef`
///
/// # Example
///
/// ```
/// use auscult_dsp::preprocessing::preemphasis::preemphasis;
///
/// let y = preemphasis(&[1.0, 1.0, 1.0], 0.5);
/// assert_eq!(y, vec![1.0, 0.5, 0.5]);
/// ```
pub fn preemphasis(samples: &[f32], coef: f32) -> Vec<f32> {
    log::debug!("Preemphasis: {} samples, k={}", samples.len(), coef);

    let mut output = Vec::with_capacity(samples.len());
    let mut previous = None;
    for &x in samples {
        output.push(match previous {
            Some(prev) => x - coef * prev,
            None => x,
        });
        previous = Some(x);
    }
    output
}

/// Invert [`preemphasis`] with the same coefficient
pub fn deemphasis(samples: &[f32], coef: f32) -> Vec<f32> {
    log::debug!("Deemphasis: {} samples, k={}", samples.len(), coef);

    let mut output = Vec::with_capacity(samples.len());
    let mut previous = 0.0f32;
    for &x in samples {
        let y = x + coef * previous;
        output.push(y);
        previous = y;
    }
    output
}
