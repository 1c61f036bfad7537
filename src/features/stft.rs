//! Short-time Fourier transform and its inverse
//!
//! Frames are centered: the input is zero-padded by `n_fft / 2` samples on
//! both sides, so frame `t` is centered on sample `t * hop_length`. With an
//! even `n_fft` a signal of `len` samples yields `1 + len / hop_length` frames.
//!
//! Spectrograms are stored frame-major: `spec[frame][bin]`, with
//! `n_fft / 2 + 1` bins per frame.

use realfft::RealFftPlanner;
use rustfft::num_complex::Complex;

use crate::error::DspError;

/// Complex spectrogram, `spec[frame][bin]`
pub type ComplexSpectrogram = Vec<Vec<Complex<f32>>>;

/// Periodic Hann window of length `size`
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let angle = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            0.5 - 0.5 * angle.cos()
        })
        .collect()
}

/// Number of centered frames for a signal of `len` samples
///
/// The padded signal has `len + 2 * (n_fft / 2)` samples; every frame lies
/// fully inside it. For even `n_fft` this is `1 + len / hop_length`.
pub fn frame_count(len: usize, n_fft: usize, hop_length: usize) -> usize {
    let padded = len + 2 * (n_fft / 2);
    1 + padded.saturating_sub(n_fft) / hop_length
}

/// Center frequency in Hz of each FFT bin
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    let step = sample_rate as f32 / n_fft as f32;
    (0..=n_fft / 2).map(|k| k as f32 * step).collect()
}

/// Center time in seconds of each frame
pub fn frame_times(n_frames: usize, hop_length: usize, sample_rate: u32) -> Vec<f32> {
    (0..n_frames)
        .map(|t| (t * hop_length) as f32 / sample_rate as f32)
        .collect()
}

fn check_params(n_fft: usize, hop_length: usize) -> Result<(), DspError> {
    if n_fft == 0 {
        return Err(DspError::InvalidParameter(
            "FFT size must be > 0".to_string(),
        ));
    }
    if hop_length == 0 {
        return Err(DspError::InvalidParameter(
            "Hop length must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Compute the centered STFT with a periodic Hann window
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `n_fft` - Window and FFT size (typically 2048)
/// * `hop_length` - Samples between successive frames (typically 512)
///
/// # Errors
///
/// Returns `DspError::EmptyInput` for an empty signal and
/// `DspError::InvalidParameter` for a zero window or hop.
pub fn stft(
    samples: &[f32],
    n_fft: usize,
    hop_length: usize,
) -> Result<ComplexSpectrogram, DspError> {
    check_params(n_fft, hop_length)?;

    if samples.is_empty() {
        return Err(DspError::EmptyInput(
            "STFT needs at least one sample".to_string(),
        ));
    }

    if samples.len() < n_fft {
        log::warn!(
            "Signal ({} samples) is shorter than the STFT window ({}), frames are mostly padding",
            samples.len(),
            n_fft
        );
    }

    let pad = n_fft / 2;
    let n_frames = frame_count(samples.len(), n_fft, hop_length);

    log::debug!(
        "Computing STFT: {} samples, n_fft={}, hop={}, {} frames",
        samples.len(),
        n_fft,
        hop_length,
        n_frames
    );

    let window = hann_window(n_fft);
    let mut planner = RealFftPlanner::<f32>::new();
    let r2c = planner.plan_fft_forward(n_fft);
    let mut frame = r2c.make_input_vec();
    let mut scratch = r2c.make_scratch_vec();

    let mut spec = Vec::with_capacity(n_frames);
    for t in 0..n_frames {
        // Position of frame[0] in the unpadded signal
        let start = (t * hop_length) as isize - pad as isize;
        for (i, slot) in frame.iter_mut().enumerate() {
            let idx = start + i as isize;
            let sample = if idx >= 0 && (idx as usize) < samples.len() {
                samples[idx as usize]
            } else {
                0.0
            };
            *slot = sample * window[i];
        }

        let mut bins = r2c.make_output_vec();
        r2c.process_with_scratch(&mut frame, &mut bins, &mut scratch)?;
        spec.push(bins);
    }

    Ok(spec)
}

/// Invert a centered STFT by windowed overlap-add
///
/// The result is normalized by the summed squared window and trimmed or
/// zero-padded to exactly `length` samples.
///
/// # Errors
///
/// Returns `DspError::InvalidParameter` for a zero window or hop, or if a
/// frame does not have `n_fft / 2 + 1` bins.
pub fn istft(
    spec: &[Vec<Complex<f32>>],
    n_fft: usize,
    hop_length: usize,
    length: usize,
) -> Result<Vec<f32>, DspError> {
    check_params(n_fft, hop_length)?;

    let n_bins = n_fft / 2 + 1;
    if let Some(bad) = spec.iter().find(|frame| frame.len() != n_bins) {
        return Err(DspError::InvalidParameter(format!(
            "Frame has {} bins, expected {} for n_fft={}",
            bad.len(),
            n_bins,
            n_fft
        )));
    }

    log::debug!(
        "Computing inverse STFT: {} frames, n_fft={}, hop={}, length={}",
        spec.len(),
        n_fft,
        hop_length,
        length
    );

    if spec.is_empty() {
        return Ok(vec![0.0; length]);
    }

    let window = hann_window(n_fft);
    let mut planner = RealFftPlanner::<f32>::new();
    let c2r = planner.plan_fft_inverse(n_fft);
    let mut bins = c2r.make_input_vec();
    let mut frame = c2r.make_output_vec();
    let mut scratch = c2r.make_scratch_vec();

    let total = n_fft + hop_length * (spec.len() - 1);
    let mut signal = vec![0.0f32; total];
    let mut window_sum = vec![0.0f32; total];
    let scale = 1.0 / n_fft as f32;

    for (t, column) in spec.iter().enumerate() {
        bins.copy_from_slice(column);
        // A real signal has no imaginary part at DC (or at Nyquist for even sizes)
        bins[0].im = 0.0;
        if n_fft % 2 == 0 {
            bins[n_bins - 1].im = 0.0;
        }
        c2r.process_with_scratch(&mut bins, &mut frame, &mut scratch)?;

        let offset = t * hop_length;
        for i in 0..n_fft {
            signal[offset + i] += frame[i] * scale * window[i];
            window_sum[offset + i] += window[i] * window[i];
        }
    }

    for (sample, &norm) in signal.iter_mut().zip(&window_sum) {
        if norm > f32::MIN_POSITIVE {
            *sample /= norm;
        }
    }

    let pad = n_fft / 2;
    let mut output: Vec<f32> = signal.into_iter().skip(pad).take(length).collect();
    output.resize(length, 0.0);
    Ok(output)
}

/// Element-wise magnitude of a complex spectrogram
pub fn magnitude(spec: &[Vec<Complex<f32>>]) -> Vec<Vec<f32>> {
    spec.iter()
        .map(|frame| frame.iter().map(|c| c.norm()).collect())
        .collect()
}

/// Transpose a frame-major matrix into bin-major rows
pub fn to_bin_major(frames: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n_bins = frames.first().map_or(0, |f| f.len());
    (0..n_bins)
        .map(|k| frames.iter().map(|frame| frame[k]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, length: usize) -> Vec<f32> {
        (0..length)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_hann_window_shape() {
        let w = hann_window(8);
        assert_eq!(w.len(), 8);
        assert!(w[0].abs() < 1e-7);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert!((w[2] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_frame_layout() {
        let samples = vec![0.1f32; 5000];
        let spec = stft(&samples, 1024, 256).unwrap();
        assert_eq!(spec.len(), frame_count(5000, 1024, 256));
        assert_eq!(spec.len(), 1 + 5000 / 256);
        assert!(spec.iter().all(|frame| frame.len() == 513));
    }

    #[test]
    fn test_sine_peak_bin() {
        let sample_rate = 8000;
        // 1000 Hz falls exactly on bin 128 for n_fft = 1024
        let samples = sine(1000.0, sample_rate, 8000);
        let mags = magnitude(&stft(&samples, 1024, 256).unwrap());

        let middle = &mags[mags.len() / 2];
        let peak = middle
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(k, _)| k)
            .unwrap();
        assert_eq!(peak, 128);
    }

    #[test]
    fn test_round_trip_reconstruction() {
        let samples: Vec<f32> = (0..3000)
            .map(|i| (i as f32 * 0.05).sin() * 0.5 + (i as f32 * 0.31).cos() * 0.2)
            .collect();
        let spec = stft(&samples, 512, 128).unwrap();
        let restored = istft(&spec, 512, 128, samples.len()).unwrap();

        assert_eq!(restored.len(), samples.len());
        let max_err = samples
            .iter()
            .zip(&restored)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(max_err < 1e-4, "reconstruction error {}", max_err);
    }

    #[test]
    fn test_odd_window_frame_count() {
        // 96 + 2 * 32 = 160 padded samples, frames start at 0, 16, ..., 80
        assert_eq!(frame_count(96, 65, 16), 6);
        assert_eq!(frame_count(96, 64, 16), 7);

        let spec = stft(&vec![0.2f32; 96], 65, 16).unwrap();
        assert_eq!(spec.len(), 6);
        assert!(spec.iter().all(|frame| frame.len() == 33));

        // The last frame still covers real samples
        let last = spec.last().unwrap();
        assert!(last[0].norm() > 0.0);

        let restored = istft(&spec, 65, 16, 96).unwrap();
        assert_eq!(restored.len(), 96);
    }

    #[test]
    fn test_single_sample_input() {
        let spec = stft(&[0.5], 64, 16).unwrap();
        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0].len(), 33);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(stft(&[], 64, 16), Err(DspError::EmptyInput(_))));
        assert!(matches!(stft(&[1.0], 0, 16), Err(DspError::InvalidParameter(_))));
        assert!(matches!(stft(&[1.0], 64, 0), Err(DspError::InvalidParameter(_))));

        let wrong_bins = vec![vec![Complex::new(0.0f32, 0.0); 10]];
        assert!(istft(&wrong_bins, 64, 16, 100).is_err());
    }

    #[test]
    fn test_bin_major_transpose() {
        let frames = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let rows = to_bin_major(&frames);
        assert_eq!(rows, vec![vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0]]);
    }
}
