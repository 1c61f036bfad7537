//! Butterworth filter design
//!
//! Derives transfer-function coefficients `(b, a)` for a digital Butterworth
//! low-pass or high-pass filter.
//!
//! Algorithm:
//! 1. Analog prototype poles on the unit circle: `p = -exp(i*pi*m / 2N)`, `m = -N+1, -N+3, ..., N-1`
//! 2. Pre-warp the normalized cutoff: `w = 4 * tan(pi * Wn / 2)`
//! 3. Frequency transform (low-pass: `p * w`, high-pass: `w / p` with N zeros at the origin)
//! 4. Bilinear transform with `fs = 2`, unmatched zeros placed at `z = -1`
//! 5. Expand zeros and poles into polynomial coefficients
//!
//! # Example
//!
//! ```no_run
//! use auscult_dsp::filters::design::{design_butterworth, FilterSpec, FilterType};
//!
//! let spec = FilterSpec::new(FilterType::LowPass, 1000.0);
//! let coeffs = design_butterworth(&spec, 8000)?;
//! assert_eq!(coeffs.b.len(), 6);
//! # Ok::<(), auscult_dsp::DspError>(())
//! ```

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use rustfft::num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::DspError;

/// Default Butterworth order
pub const DEFAULT_ORDER: usize = 5;

/// Orders above this lose precision in transfer-function form
const HIGH_ORDER_WARNING: usize = 10;

/// Bilinear transform constant (`2 * fs` with `fs = 2`)
const BILINEAR_FS2: f64 = 4.0;

/// Filter response type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterType {
    /// Pass frequencies below the cutoff
    LowPass,
    /// Pass frequencies above the cutoff
    HighPass,
}

impl fmt::Display for FilterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterType::LowPass => write!(f, "low-pass"),
            FilterType::HighPass => write!(f, "high-pass"),
        }
    }
}

impl FromStr for FilterType {
    type Err = DspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "lowpass" | "low-pass" | "low_pass" => Ok(FilterType::LowPass),
            "high" | "highpass" | "high-pass" | "high_pass" => Ok(FilterType::HighPass),
            other => Err(DspError::InvalidChoice(format!(
                "Unknown filter type '{}' (expected low-pass or high-pass)",
                other
            ))),
        }
    }
}

/// Filter specification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Response type
    pub filter_type: FilterType,

    /// Cutoff frequency in Hz, must satisfy `0 < cutoff < sample_rate / 2`
    pub cutoff_hz: f32,

    /// Filter order (default: 5)
    pub order: usize,
}

impl FilterSpec {
    /// Create a specification with the default order
    pub fn new(filter_type: FilterType, cutoff_hz: f32) -> Self {
        Self {
            filter_type,
            cutoff_hz,
            order: DEFAULT_ORDER,
        }
    }

    /// Override the order
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }
}

/// Transfer-function coefficients of a digital IIR filter
///
/// `b` is the numerator, `a` the denominator; both have `order + 1` entries
/// and `a[0] == 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCoefficients {
    /// Numerator coefficients
    pub b: Vec<f64>,
    /// Denominator coefficients
    pub a: Vec<f64>,
}

impl FilterCoefficients {
    /// Filter order (number of poles)
    pub fn order(&self) -> usize {
        self.a.len().saturating_sub(1)
    }

    /// Magnitude of the frequency response at `freq_hz`
    pub fn magnitude_response(&self, freq_hz: f32, sample_rate: u32) -> f32 {
        let omega = 2.0 * PI * freq_hz as f64 / sample_rate as f64;
        let eval = |coeffs: &[f64]| {
            coeffs
                .iter()
                .enumerate()
                .map(|(k, &c)| Complex::from_polar(c, -omega * k as f64))
                .sum::<Complex<f64>>()
        };
        let den = eval(&self.a);
        if den.norm() == 0.0 {
            return f32::INFINITY;
        }
        (eval(&self.b) / den).norm() as f32
    }
}

/// Design a digital Butterworth filter
///
/// # Arguments
///
/// * `spec` - Filter type, cutoff and order
/// * `sample_rate` - Sample rate in Hz
///
/// # Errors
///
/// Returns `DspError::InvalidParameter` if the sample rate is zero, the order
/// is zero or does not fit an `i32`, or the cutoff is not strictly between 0 and the Nyquist frequency.
pub fn design_butterworth(
    spec: &FilterSpec,
    sample_rate: u32,
) -> Result<FilterCoefficients, DspError> {
    let normalized = normalized_cutoff(spec.cutoff_hz, sample_rate)?;

    if spec.order == 0 {
        return Err(DspError::InvalidParameter(
            "Filter order must be >= 1".to_string(),
        ));
    }

    let exponent = i32::try_from(spec.order).map_err(|_| {
        DspError::InvalidParameter(format!("Filter order {} is too large", spec.order))
    })?;

    if spec.order > HIGH_ORDER_WARNING {
        log::warn!(
            "Butterworth order {} is high; transfer-function coefficients may be ill-conditioned",
            spec.order
        );
    }

    log::debug!(
        "Designing {} Butterworth filter: order={}, cutoff={:.1} Hz, sample_rate={} Hz (Wn={:.4})",
        spec.filter_type,
        spec.order,
        spec.cutoff_hz,
        sample_rate,
        normalized
    );

    let n = spec.order;
    let prototype = prototype_poles(n);
    let warped = BILINEAR_FS2 * (PI * normalized / 2.0).tan();

    // Analog zeros, poles and gain after the frequency transform
    let (zeros, poles, gain) = match spec.filter_type {
        FilterType::LowPass => {
            let poles: Vec<Complex<f64>> = prototype.iter().map(|&p| p * warped).collect();
            (Vec::new(), poles, warped.powi(exponent))
        }
        FilterType::HighPass => {
            let poles: Vec<Complex<f64>> = prototype.iter().map(|&p| warped / p).collect();
            let neg_product: Complex<f64> = prototype.iter().map(|&p| -p).product();
            let gain = (Complex::new(1.0, 0.0) / neg_product).re;
            (vec![Complex::new(0.0, 0.0); n], poles, gain)
        }
    };

    let (zeros, poles, gain) = bilinear(&zeros, &poles, gain);

    let b: Vec<f64> = poly(&zeros).iter().map(|c| c.re * gain).collect();
    let a: Vec<f64> = poly(&poles).iter().map(|c| c.re).collect();

    Ok(FilterCoefficients { b, a })
}

/// Express a cutoff relative to the Nyquist frequency, checking `0 < Wn < 1`
pub fn normalized_cutoff(cutoff_hz: f32, sample_rate: u32) -> Result<f64, DspError> {
    if sample_rate == 0 {
        return Err(DspError::InvalidParameter(
            "Sample rate must be > 0".to_string(),
        ));
    }

    let nyquist = sample_rate as f64 / 2.0;
    let cutoff = cutoff_hz as f64;

    if !cutoff.is_finite() || cutoff <= 0.0 || cutoff >= nyquist {
        return Err(DspError::InvalidParameter(format!(
            "Cutoff {} Hz must lie strictly between 0 and the Nyquist frequency ({} Hz)",
            cutoff_hz, nyquist
        )));
    }

    Ok(cutoff / nyquist)
}

/// Poles of the normalized analog Butterworth prototype
fn prototype_poles(order: usize) -> Vec<Complex<f64>> {
    let n = order as i64;
    (0..n)
        .map(|k| {
            let m = (-n + 1 + 2 * k) as f64;
            -Complex::from_polar(1.0, PI * m / (2.0 * order as f64))
        })
        .collect()
}

/// Bilinear transform of an analog zero-pole-gain description (`fs = 2`)
fn bilinear(
    zeros: &[Complex<f64>],
    poles: &[Complex<f64>],
    gain: f64,
) -> (Vec<Complex<f64>>, Vec<Complex<f64>>, f64) {
    let fs2 = Complex::new(BILINEAR_FS2, 0.0);

    let mut z_digital: Vec<Complex<f64>> = zeros.iter().map(|&z| (fs2 + z) / (fs2 - z)).collect();
    let p_digital: Vec<Complex<f64>> = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();

    // Zeros at infinity map to Nyquist
    z_digital.resize(poles.len().max(zeros.len()), Complex::new(-1.0, 0.0));

    let num: Complex<f64> = zeros.iter().map(|&z| fs2 - z).product();
    let den: Complex<f64> = poles.iter().map(|&p| fs2 - p).product();
    let k = gain * (num / den).re;

    (z_digital, p_digital, k)
}

/// Expand roots into monic polynomial coefficients, highest power first
fn poly(roots: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let mut coeffs = vec![Complex::new(1.0, 0.0)];
    for &root in roots {
        let mut next = vec![Complex::new(0.0, 0.0); coeffs.len() + 1];
        for (i, &c) in coeffs.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c * root;
        }
        coeffs = next;
    }
    coeffs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
        assert_eq!(actual.len(), expected.len());
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!(
                (a - e).abs() < tol,
                "coefficient {} differs: got {:.10}, expected {:.10}",
                i,
                a,
                e
            );
        }
    }

    #[test]
    fn test_second_order_lowpass_quarter_band() {
        // Wn = 0.5: reference values for a 2nd-order Butterworth low-pass
        let spec = FilterSpec::new(FilterType::LowPass, 2000.0).with_order(2);
        let coeffs = design_butterworth(&spec, 8000).unwrap();

        assert_close(&coeffs.b, &[0.2928932188, 0.5857864376, 0.2928932188], 1e-8);
        assert_close(&coeffs.a, &[1.0, 0.0, 0.1715728753], 1e-8);
    }

    #[test]
    fn test_second_order_highpass_quarter_band() {
        let spec = FilterSpec::new(FilterType::HighPass, 2000.0).with_order(2);
        let coeffs = design_butterworth(&spec, 8000).unwrap();

        assert_close(&coeffs.b, &[0.2928932188, -0.5857864376, 0.2928932188], 1e-8);
        assert_close(&coeffs.a, &[1.0, 0.0, 0.1715728753], 1e-8);
    }

    #[test]
    fn test_first_order_lowpass() {
        // Wn = 0.5, order 1: b = [0.5, 0.5], a = [1, 0]
        let spec = FilterSpec::new(FilterType::LowPass, 100.0).with_order(1);
        let coeffs = design_butterworth(&spec, 400).unwrap();

        assert_close(&coeffs.b, &[0.5, 0.5], 1e-10);
        assert_close(&coeffs.a, &[1.0, 0.0], 1e-10);
    }

    #[test]
    fn test_default_order_coefficient_count() {
        let spec = FilterSpec::new(FilterType::LowPass, 1000.0);
        let coeffs = design_butterworth(&spec, 8000).unwrap();

        assert_eq!(coeffs.order(), DEFAULT_ORDER);
        assert_eq!(coeffs.b.len(), DEFAULT_ORDER + 1);
        assert!((coeffs.a[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lowpass_unity_dc_gain() {
        for order in 1..=8 {
            let spec = FilterSpec::new(FilterType::LowPass, 300.0).with_order(order);
            let coeffs = design_butterworth(&spec, 4000).unwrap();
            let dc: f64 = coeffs.b.iter().sum::<f64>() / coeffs.a.iter().sum::<f64>();
            assert!((dc - 1.0).abs() < 1e-6, "order {}: DC gain {}", order, dc);
        }
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let spec = FilterSpec::new(FilterType::HighPass, 300.0);
        let coeffs = design_butterworth(&spec, 4000).unwrap();
        let dc: f64 = coeffs.b.iter().sum::<f64>();
        assert!(dc.abs() < 1e-9, "High-pass numerator should vanish at DC: {}", dc);
    }

    #[test]
    fn test_half_power_at_cutoff() {
        for filter_type in [FilterType::LowPass, FilterType::HighPass] {
            let spec = FilterSpec::new(filter_type, 1000.0);
            let coeffs = design_butterworth(&spec, 8000).unwrap();
            let gain = coeffs.magnitude_response(1000.0, 8000);
            assert!(
                (gain - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-3,
                "{}: |H(fc)| = {}",
                filter_type,
                gain
            );
        }
    }

    #[test]
    fn test_cutoff_at_nyquist_rejected() {
        let spec = FilterSpec::new(FilterType::LowPass, 4000.0);
        let result = design_butterworth(&spec, 8000);
        assert!(matches!(result, Err(DspError::InvalidParameter(_))));
    }

    #[test]
    fn test_invalid_parameters() {
        let zero_cutoff = FilterSpec::new(FilterType::LowPass, 0.0);
        assert!(design_butterworth(&zero_cutoff, 8000).is_err());

        let negative_cutoff = FilterSpec::new(FilterType::HighPass, -10.0);
        assert!(design_butterworth(&negative_cutoff, 8000).is_err());

        let valid = FilterSpec::new(FilterType::LowPass, 100.0);
        assert!(design_butterworth(&valid, 0).is_err());

        let zero_order = FilterSpec::new(FilterType::LowPass, 100.0).with_order(0);
        assert!(design_butterworth(&zero_order, 8000).is_err());

        let huge_order = FilterSpec::new(FilterType::LowPass, 100.0).with_order(usize::MAX);
        assert!(matches!(
            design_butterworth(&huge_order, 8000),
            Err(DspError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_filter_type_parsing() {
        assert_eq!("low".parse::<FilterType>().unwrap(), FilterType::LowPass);
        assert_eq!("High-Pass".parse::<FilterType>().unwrap(), FilterType::HighPass);
        assert!(matches!(
            "band".parse::<FilterType>(),
            Err(DspError::InvalidChoice(_))
        ));
    }
}
