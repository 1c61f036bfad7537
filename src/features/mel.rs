//! Mel filterbank and mel-scaled power spectrogram
//!
//! Uses the Slaney mel scale (linear below 1 kHz, logarithmic above) and
//! Slaney area normalization, so each triangular filter has unit area in
//! the Hz domain.
//!
//! # Example
//!
//! ```no_run
//! use auscult_dsp::features::mel::mel_spectrogram;
//!
//! let samples = vec![0.0f32; 4000];
//! let mel = mel_spectrogram(&samples, 4000, 2048, 512, 128, 0.0, None)?;
//! assert_eq!(mel.len(), 128);
//! # Ok::<(), auscult_dsp::DspError>(())
//! ```

use crate::error::DspError;
use crate::features::stft::{fft_frequencies, stft};

/// Below this frequency the Slaney scale is linear
const MIN_LOG_HZ: f32 = 1000.0;

/// Hz per mel in the linear region
const F_SP: f32 = 200.0 / 3.0;

/// Mel value at `MIN_LOG_HZ`
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / F_SP;

/// Convert Hz to mels (Slaney scale)
pub fn hz_to_mel(hz: f32) -> f32 {
    let logstep = 6.4f32.ln() / 27.0;
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / logstep
    } else {
        hz / F_SP
    }
}

/// Convert mels to Hz (Slaney scale)
pub fn mel_to_hz(mel: f32) -> f32 {
    let logstep = 6.4f32.ln() / 27.0;
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (logstep * (mel - MIN_LOG_MEL)).exp()
    } else {
        F_SP * mel
    }
}

/// `count` frequencies evenly spaced on the mel scale between `fmin` and `fmax`
pub fn mel_frequencies(count: usize, fmin: f32, fmax: f32) -> Vec<f32> {
    let mel_min = hz_to_mel(fmin);
    let mel_max = hz_to_mel(fmax);
    let denom = count.saturating_sub(1).max(1) as f32;
    (0..count)
        .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / denom))
        .collect()
}

/// Center frequency of each mel band
pub fn mel_band_centers(n_mels: usize, fmin: f32, fmax: f32) -> Vec<f32> {
    let edges = mel_frequencies(n_mels + 2, fmin, fmax);
    edges[1..=n_mels].to_vec()
}

/// Build a triangular mel filterbank, `filters[band][fft_bin]`
///
/// # Errors
///
/// Returns `DspError::InvalidParameter` if the band edges are out of order or
/// above the Nyquist frequency.
pub fn mel_filterbank(
    sample_rate: u32,
    n_fft: usize,
    n_mels: usize,
    fmin: f32,
    fmax: f32,
) -> Result<Vec<Vec<f32>>, DspError> {
    let nyquist = sample_rate as f32 / 2.0;
    if sample_rate == 0 || n_fft == 0 || n_mels == 0 {
        return Err(DspError::InvalidParameter(
            "Mel filterbank needs sample_rate, n_fft and n_mels > 0".to_string(),
        ));
    }
    if !(fmin >= 0.0 && fmin < fmax && fmax <= nyquist) {
        return Err(DspError::InvalidParameter(format!(
            "Mel band edges must satisfy 0 <= fmin < fmax <= {} Hz, got [{}, {}]",
            nyquist, fmin, fmax
        )));
    }

    let fft_freqs = fft_frequencies(sample_rate, n_fft);
    let mel_f = mel_frequencies(n_mels + 2, fmin, fmax);

    let mut filters = vec![vec![0.0f32; fft_freqs.len()]; n_mels];
    let mut empty_bands = 0;

    for (m, filter) in filters.iter_mut().enumerate() {
        let (left, center, right) = (mel_f[m], mel_f[m + 1], mel_f[m + 2]);
        let lower_width = center - left;
        let upper_width = right - center;
        // Slaney normalization: unit area per band
        let enorm = 2.0 / (right - left);

        for (weight, &f) in filter.iter_mut().zip(&fft_freqs) {
            let lower = (f - left) / lower_width;
            let upper = (right - f) / upper_width;
            *weight = lower.min(upper).max(0.0) * enorm;
        }

        if filter.iter().all(|&w| w == 0.0) {
            empty_bands += 1;
        }
    }

    if empty_bands > 0 {
        log::warn!(
            "{} of {} mel bands cover no FFT bin (n_fft={} too small for n_mels)",
            empty_bands,
            n_mels,
            n_fft
        );
    }

    Ok(filters)
}

/// Mel-weighted power spectrogram, `mel[band][frame]`
///
/// `fmax = None` uses the Nyquist frequency.
///
/// # Errors
///
/// Propagates STFT and filterbank errors (empty input, invalid parameters).
pub fn mel_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    n_fft: usize,
    hop_length: usize,
    n_mels: usize,
    fmin: f32,
    fmax: Option<f32>,
) -> Result<Vec<Vec<f32>>, DspError> {
    let fmax = fmax.unwrap_or(sample_rate as f32 / 2.0);

    log::debug!(
        "Computing mel spectrogram: {} samples at {} Hz, {} bands in [{:.1}, {:.1}] Hz",
        samples.len(),
        sample_rate,
        n_mels,
        fmin,
        fmax
    );

    let filters = mel_filterbank(sample_rate, n_fft, n_mels, fmin, fmax)?;
    let spec = stft(samples, n_fft, hop_length)?;

    let power: Vec<Vec<f32>> = spec
        .iter()
        .map(|frame| frame.iter().map(|c| c.norm_sqr()).collect())
        .collect();

    Ok(filters
        .iter()
        .map(|filter| {
            power
                .iter()
                .map(|frame| filter.iter().zip(frame).map(|(w, p)| w * p).sum())
                .collect()
        })
        .collect())
}
