//! Harmonic-percussive source separation (HPSS)
//!
//! Separates a recording into a harmonic part (steady, tonal energy that is
//! smooth along time) and a percussive part (transients that are smooth
//! along frequency).
//!
//! # Reference
//!
//! Fitzgerald, D. (2010). Harmonic/Percussive Separation using Median Filtering.
//! *Proceedings of the 13th International Conference on Digital Audio Effects (DAFx-10)*.
//!
//! Driedger, J., Müller, M., & Disch, S. (2014). Extending Harmonic-Percussive
//! Separation of Audio Signals. *ISMIR*.
//!
//! # Algorithm
//!
//! 1. Centered STFT of the input, magnitude `S`
//! 2. `H = median_time(S)`, `P = median_freq(S)` (reflected borders)
//! 3. Soft masks `M_h = H^p / (H^p + (margin * P)^p)` and vice versa
//! 4. Masked complex spectrograms are inverted to the input length
//!
//! # Example
//!
//! ```no_run
//! use auscult_dsp::preprocessing::hpss::{hpss, HpssConfig};
//!
//! let samples = vec![0.0f32; 8000];
//! let parts = hpss(&samples, &HpssConfig::default())?;
//! assert_eq!(parts.harmonic.len(), samples.len());
//! # Ok::<(), auscult_dsp::DspError>(())
//! ```

use serde::Serialize;

use crate::error::DspError;
use crate::features::stft::{istft, magnitude, stft};

/// HPSS parameters
#[derive(Debug, Clone)]
pub struct HpssConfig {
    /// STFT window size (default: 2048)
    pub n_fft: usize,

    /// STFT hop size (default: 512)
    pub hop_length: usize,

    /// Median filter length along time, in frames (default: 31)
    pub harmonic_kernel: usize,

    /// Median filter length along frequency, in bins (default: 31)
    pub percussive_kernel: usize,

    /// Soft mask exponent (default: 2.0)
    pub power: f32,

    /// Margin applied to the competing component (default: 1.0)
    pub margin: f32,
}

impl Default for HpssConfig {
    fn default() -> Self {
        Self {
            n_fft: 2048,
            hop_length: 512,
            harmonic_kernel: 31,
            percussive_kernel: 31,
            power: 2.0,
            margin: 1.0,
        }
    }
}

/// Time-domain harmonic and percussive components, each as long as the input
#[derive(Debug, Clone, Serialize)]
pub struct HpssComponents {
    /// Steady, tonal part
    pub harmonic: Vec<f32>,
    /// Transient, noise-like part
    pub percussive: Vec<f32>,
}

/// Separate `samples` into harmonic and percussive components
///
/// # Errors
///
/// Returns `DspError::EmptyInput` for an empty signal and
/// `DspError::InvalidParameter` for zero sizes, a non-positive power or a
/// margin below 1.
pub fn hpss(samples: &[f32], config: &HpssConfig) -> Result<HpssComponents, DspError> {
    if config.harmonic_kernel == 0 || config.percussive_kernel == 0 {
        return Err(DspError::InvalidParameter(
            "HPSS kernel sizes must be > 0".to_string(),
        ));
    }
    if !(config.power.is_finite() && config.power > 0.0) || !(config.margin >= 1.0) {
        return Err(DspError::InvalidParameter(format!(
            "HPSS needs power > 0 and margin >= 1, got power={} margin={}",
            config.power, config.margin
        )));
    }

    log::debug!(
        "HPSS: {} samples, kernels=({}, {}), power={}, margin={}",
        samples.len(),
        config.harmonic_kernel,
        config.percussive_kernel,
        config.power,
        config.margin
    );

    let spec = stft(samples, config.n_fft, config.hop_length)?;
    let mags = magnitude(&spec);

    let harmonic_mag = median_along_time(&mags, config.harmonic_kernel);
    let percussive_mag = median_along_frequency(&mags, config.percussive_kernel);

    let mut harmonic_spec = spec.clone();
    let mut percussive_spec = spec;

    for t in 0..mags.len() {
        for k in 0..mags[t].len() {
            let h = harmonic_mag[t][k];
            let p = percussive_mag[t][k];
            harmonic_spec[t][k] *= soft_mask(h, p * config.margin, config.power);
            percussive_spec[t][k] *= soft_mask(p, h * config.margin, config.power);
        }
    }

    let len = samples.len();
    Ok(HpssComponents {
        harmonic: istft(&harmonic_spec, config.n_fft, config.hop_length, len)?,
        percussive: istft(&percussive_spec, config.n_fft, config.hop_length, len)?,
    })
}

/// Harmonic component of `samples` (the percussive part is discarded)
pub fn harmonic_component(samples: &[f32], config: &HpssConfig) -> Result<Vec<f32>, DspError> {
    Ok(hpss(samples, config)?.harmonic)
}

/// Wiener-style soft mask `x^p / (x^p + reference^p)`, 0 where both vanish
fn soft_mask(x: f32, reference: f32, power: f32) -> f32 {
    let z = x.max(reference);
    if z < f32::MIN_POSITIVE {
        return 0.0;
    }
    let num = (x / z).powf(power);
    let den = num + (reference / z).powf(power);
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Median filter each bin across frames
fn median_along_time(mags: &[Vec<f32>], kernel: usize) -> Vec<Vec<f32>> {
    let n_frames = mags.len();
    let n_bins = mags.first().map_or(0, |f| f.len());
    let mut out = vec![vec![0.0f32; n_bins]; n_frames];
    let mut lane = Vec::with_capacity(n_frames);
    let mut window = Vec::with_capacity(kernel);

    for k in 0..n_bins {
        lane.clear();
        lane.extend(mags.iter().map(|frame| frame[k]));
        let filtered = median_filter(&lane, kernel, &mut window);
        for (t, value) in filtered.into_iter().enumerate() {
            out[t][k] = value;
        }
    }
    out
}

/// Median filter each frame across bins
fn median_along_frequency(mags: &[Vec<f32>], kernel: usize) -> Vec<Vec<f32>> {
    let mut window = Vec::with_capacity(kernel);
    mags.iter()
        .map(|frame| median_filter(frame, kernel, &mut window))
        .collect()
}

/// 1-D median filter with reflected borders (`d c b a | a b c d | d c b a`)
///
/// For even kernels the upper median is taken.
fn median_filter(values: &[f32], kernel: usize, window: &mut Vec<f32>) -> Vec<f32> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    let half = kernel / 2;
    (0..n)
        .map(|i| {
            window.clear();
            window.extend(
                (0..kernel).map(|j| values[reflect(i as isize + j as isize - half as isize, n)]),
            );
            let (_, median, _) = window.select_nth_unstable_by(kernel / 2, f32::total_cmp);
            *median
        })
        .collect()
}

/// Map any index onto `0..n` by half-sample symmetric reflection
fn reflect(index: isize, n: usize) -> usize {
    let period = 2 * n as isize;
    let m = index.rem_euclid(period);
    if m >= n as isize {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> HpssConfig {
        HpssConfig {
            n_fft: 512,
            hop_length: 128,
            harmonic_kernel: 17,
            percussive_kernel: 17,
            ..Default::default()
        }
    }

    fn energy(samples: &[f32]) -> f32 {
        samples.iter().map(|&x| x * x).sum()
    }

    #[test]
    fn test_reflect_indices() {
        let mapped: Vec<usize> = (-4..8).map(|i| reflect(i, 4)).collect();
        assert_eq!(mapped, vec![3, 2, 1, 0, 0, 1, 2, 3, 3, 2, 1, 0]);
        // Kernel wider than the signal keeps reflecting
        assert_eq!(reflect(-9, 4), 0);
        assert_eq!(reflect(5, 1), 0);
    }

    #[test]
    fn test_median_filter() {
        let mut window = Vec::new();
        let out = median_filter(&[1.0, 9.0, 2.0, 8.0, 3.0], 3, &mut window);
        assert_eq!(out, vec![1.0, 2.0, 8.0, 3.0, 3.0]);
    }

    #[test]
    fn test_soft_mask() {
        assert_eq!(soft_mask(0.0, 0.0, 2.0), 0.0);
        assert!((soft_mask(1.0, 1.0, 2.0) - 0.5).abs() < 1e-7);
        assert!((soft_mask(3.0, 1.0, 2.0) - 0.9).abs() < 1e-6);
        assert!((soft_mask(1.0, 0.0, 2.0) - 1.0).abs() < 1e-7);
    }

    #[test]
    fn test_silent_input_gives_silent_harmonic() {
        let samples = vec![0.0f32; 3000];
        let harmonic = harmonic_component(&samples, &HpssConfig::default()).unwrap();
        assert_eq!(harmonic.len(), samples.len());
        assert!(harmonic.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_components_preserve_length() {
        for len in [1, 100, 4097] {
            let samples: Vec<f32> = (0..len).map(|i| (i as f32 * 0.1).sin()).collect();
            let parts = hpss(&samples, &small_config()).unwrap();
            assert_eq!(parts.harmonic.len(), len);
            assert_eq!(parts.percussive.len(), len);
        }
    }

    #[test]
    fn test_tone_is_harmonic_clicks_are_percussive() {
        let sample_rate = 8000.0;
        let tone: Vec<f32> = (0..16000)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 300.0 * i as f32 / sample_rate).sin())
            .collect();
        let mut clicks = vec![0.0f32; 16000];
        for i in (1000..16000).step_by(2000) {
            clicks[i] = 1.0;
        }

        let tone_parts = hpss(&tone, &small_config()).unwrap();
        assert!(energy(&tone_parts.harmonic) > 4.0 * energy(&tone_parts.percussive));

        let click_parts = hpss(&clicks, &small_config()).unwrap();
        assert!(energy(&click_parts.percussive) > 4.0 * energy(&click_parts.harmonic));
    }

    #[test]
    fn test_invalid_config() {
        let samples = vec![0.1f32; 100];
        let bad_kernel = HpssConfig { harmonic_kernel: 0, ..small_config() };
        assert!(hpss(&samples, &bad_kernel).is_err());

        let bad_margin = HpssConfig { margin: 0.5, ..small_config() };
        assert!(hpss(&samples, &bad_margin).is_err());

        assert!(matches!(
            hpss(&[], &small_config()),
            Err(DspError::EmptyInput(_))
        ));
    }
}
