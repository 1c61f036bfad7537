//! Full-length magnitude spectrum
//!
//! One real FFT over the whole recording; bin `k` sits at `k * sample_rate / N`
//! for `k = 0..=N/2`, so the frequency resolution is `sample_rate / N`.

use realfft::RealFftPlanner;
use serde::Serialize;

use crate::error::DspError;

/// Magnitude spectrum with parallel frequency axis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spectrum {
    /// Bin center frequencies in Hz, from 0 up to the Nyquist frequency
    pub frequencies: Vec<f32>,

    /// `|X[k]|` for each bin (unnormalized)
    pub magnitudes: Vec<f32>,
}

impl Spectrum {
    /// Number of bins (`N / 2 + 1`)
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// True if the spectrum has no bins
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency of the strongest bin
    pub fn peak_frequency(&self) -> Option<f32> {
        self.magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| self.frequencies[k])
    }

    /// Sum of squared magnitudes of bins with `low_hz <= f < high_hz`
    pub fn band_energy(&self, low_hz: f32, high_hz: f32) -> f32 {
        self.frequencies
            .iter()
            .zip(&self.magnitudes)
            .filter(|&(&f, _)| f >= low_hz && f < high_hz)
            .map(|(_, &m)| m * m)
            .sum()
    }

    /// Sum of squared magnitudes over all bins
    pub fn total_energy(&self) -> f32 {
        self.magnitudes.iter().map(|&m| m * m).sum()
    }
}

/// Compute the magnitude spectrum of `samples`
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
///
/// # Errors
///
/// Returns `DspError::EmptyInput` for an empty signal and
/// `DspError::InvalidParameter` for a zero sample rate.
///
/// # Example
///
/// ```
/// use auscult_dsp::analysis::spectrum::magnitude_spectrum;
///
/// let spectrum = magnitude_spectrum(&[1.0, 0.0, 0.0, 0.0], 8000)?;
/// assert_eq!(spectrum.frequencies, vec![0.0, 2000.0, 4000.0]);
/// assert!(spectrum.magnitudes.iter().all(|&m| (m - 1.0).abs() < 1e-6));
/// # Ok::<(), auscult_dsp::DspError>(())
/// ```
pub fn magnitude_spectrum(samples: &[f32], sample_rate: u32) -> Result<Spectrum, DspError> {
    if samples.is_empty() {
        return Err(DspError::EmptyInput(
            "Spectrum needs at least one sample".to_string(),
        ));
    }
    if sample_rate == 0 {
        return Err(DspError::InvalidParameter(
            "Sample rate must be > 0".to_string(),
        ));
    }

    let n = samples.len();
    log::debug!(
        "Computing magnitude spectrum: {} samples at {} Hz (resolution {:.3} Hz)",
        n,
        sample_rate,
        sample_rate as f32 / n as f32
    );

    let mut planner = RealFftPlanner::<f32>::new();
    let r2c = planner.plan_fft_forward(n);
    let mut input = samples.to_vec();
    let mut output = r2c.make_output_vec();
    r2c.process(&mut input, &mut output)?;

    let step = sample_rate as f32 / n as f32;
    let frequencies = (0..output.len()).map(|k| k as f32 * step).collect();
    let magnitudes = output.iter().map(|c| c.norm()).collect();

    Ok(Spectrum {
        frequencies,
        magnitudes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_count_and_axis() {
        for n in [1usize, 2, 7, 8, 1001] {
            let spectrum = magnitude_spectrum(&vec![0.25f32; n], 4000).unwrap();
            assert_eq!(spectrum.len(), n / 2 + 1);
            assert_eq!(spectrum.frequencies[0], 0.0);
            assert!(spectrum.frequencies.windows(2).all(|w| w[1] >= w[0]));
            assert!(*spectrum.frequencies.last().unwrap() <= 2000.0);
        }

        let even = magnitude_spectrum(&[0.0; 8], 4000).unwrap();
        assert_eq!(*even.frequencies.last().unwrap(), 2000.0);
    }

    #[test]
    fn test_sine_peak() {
        let sample_rate = 8000;
        let samples: Vec<f32> = (0..8000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        let spectrum = magnitude_spectrum(&samples, sample_rate).unwrap();

        assert_eq!(spectrum.peak_frequency(), Some(440.0));
        // Amplitude 1 over N samples -> N/2 at the tone bin
        assert!((spectrum.magnitudes[440] - 4000.0).abs() < 1.0);
    }

    #[test]
    fn test_dc_only() {
        let spectrum = magnitude_spectrum(&[0.5f32; 16], 1600).unwrap();
        assert!((spectrum.magnitudes[0] - 8.0).abs() < 1e-5);
        assert!(spectrum.magnitudes[1..].iter().all(|&m| m < 1e-5));
    }

    #[test]
    fn test_zero_input_is_finite() {
        let spectrum = magnitude_spectrum(&[0.0f32; 64], 1000).unwrap();
        assert!(spectrum.magnitudes.iter().all(|m| m.is_finite() && *m == 0.0));
    }

    #[test]
    fn test_band_energy() {
        let spectrum = Spectrum {
            frequencies: vec![0.0, 100.0, 200.0, 300.0],
            magnitudes: vec![1.0, 2.0, 3.0, 4.0],
        };
        assert_eq!(spectrum.band_energy(100.0, 300.0), 13.0);
        assert_eq!(spectrum.total_energy(), 30.0);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(magnitude_spectrum(&[], 8000), Err(DspError::EmptyInput(_))));
        assert!(matches!(
            magnitude_spectrum(&[1.0], 0),
            Err(DspError::InvalidParameter(_))
        ));
    }
}
