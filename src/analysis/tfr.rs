//! Time-frequency representations
//!
//! Three representations are available, selected by [`TimeFrequencyKind`]:
//! - **Short-time spectrum**: `|STFT|` in dB relative to the loudest cell
//! - **Mel spectrogram**: mel-weighted power in dB relative to the loudest cell
//! - **Envelope**: Hilbert amplitude envelope, one value per input sample
//!
//! Grids are bin-major (`values[row][frame]`), with row 0 at the lowest
//! frequency. A single-sample input yields a one-frame grid (or a one-value
//! envelope); an all-zero input yields a grid that is 0 dB everywhere.
//!
//! # Example
//!
//! ```no_run
//! use auscult_dsp::analysis::tfr::{time_frequency, TimeFrequencyKind};
//! use auscult_dsp::PipelineConfig;
//!
//! let samples = vec![0.0f32; 4000];
//! let kind: TimeFrequencyKind = "mel".parse()?;
//! let tfr = time_frequency(&samples, 4000, kind, &PipelineConfig::default())?;
//! # Ok::<(), auscult_dsp::DspError>(())
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::error::DspError;
use crate::features::decibel::{amplitude_to_db, power_to_db};
use crate::features::hilbert::envelope;
use crate::features::mel::{mel_band_centers, mel_spectrogram};
use crate::features::stft::{fft_frequencies, frame_times, magnitude, stft, to_bin_major};

/// Which representation to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeFrequencyKind {
    /// Short-time Fourier magnitude in dB
    ShortTime,
    /// Mel-scaled power spectrogram in dB
    Mel,
    /// Analytic-signal amplitude envelope
    Envelope,
}

impl TimeFrequencyKind {
    /// All representations, in menu order
    pub const ALL: [TimeFrequencyKind; 3] = [
        TimeFrequencyKind::ShortTime,
        TimeFrequencyKind::Mel,
        TimeFrequencyKind::Envelope,
    ];
}

impl fmt::Display for TimeFrequencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeFrequencyKind::ShortTime => write!(f, "STFT"),
            TimeFrequencyKind::Mel => write!(f, "Mel"),
            TimeFrequencyKind::Envelope => write!(f, "HHT"),
        }
    }
}

impl FromStr for TimeFrequencyKind {
    type Err = DspError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stft" | "short_time" | "short-time" | "spectrogram" => Ok(TimeFrequencyKind::ShortTime),
            "mel" | "melspectrogram" | "mel_spectrogram" => Ok(TimeFrequencyKind::Mel),
            "hht" | "envelope" | "hilbert" => Ok(TimeFrequencyKind::Envelope),
            other => Err(DspError::InvalidChoice(format!(
                "Unknown time-frequency representation '{}' (expected stft, mel or envelope)",
                other
            ))),
        }
    }
}

/// Frequency axis spacing of a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrequencyScale {
    /// FFT bins, evenly spaced in Hz
    Linear,
    /// Mel bands
    Mel,
}

/// Decibel-scaled grid with its axes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeFrequencyGrid {
    /// `values[row][frame]` in dB, maximum exactly 0
    pub values: Vec<Vec<f32>>,

    /// Center frequency in Hz of each row
    pub frequencies: Vec<f32>,

    /// Center time in seconds of each frame
    pub times: Vec<f32>,

    /// Spacing of `frequencies`
    pub scale: FrequencyScale,
}

impl TimeFrequencyGrid {
    /// Number of frequency rows
    pub fn n_rows(&self) -> usize {
        self.values.len()
    }

    /// Number of time frames
    pub fn n_frames(&self) -> usize {
        self.times.len()
    }

    /// Largest value in the grid
    pub fn max_value(&self) -> f32 {
        self.values
            .iter()
            .flatten()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Output of [`time_frequency`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TimeFrequencyRepresentation {
    /// Short-time or mel spectrogram
    Grid(TimeFrequencyGrid),
    /// Instantaneous amplitude, same length as the input
    Envelope(Vec<f32>),
}

impl TimeFrequencyRepresentation {
    /// The grid, if this is a spectrogram
    pub fn as_grid(&self) -> Option<&TimeFrequencyGrid> {
        match self {
            TimeFrequencyRepresentation::Grid(grid) => Some(grid),
            TimeFrequencyRepresentation::Envelope(_) => None,
        }
    }

    /// The envelope, if this is an envelope
    pub fn as_envelope(&self) -> Option<&[f32]> {
        match self {
            TimeFrequencyRepresentation::Grid(_) => None,
            TimeFrequencyRepresentation::Envelope(env) => Some(env),
        }
    }
}

/// Compute the requested time-frequency representation
///
/// # Errors
///
/// Returns `DspError::EmptyInput` for an empty signal and
/// `DspError::InvalidParameter` for a zero sample rate or invalid config.
pub fn time_frequency(
    samples: &[f32],
    sample_rate: u32,
    kind: TimeFrequencyKind,
    config: &PipelineConfig,
) -> Result<TimeFrequencyRepresentation, DspError> {
    if samples.is_empty() {
        return Err(DspError::EmptyInput(format!(
            "{} needs at least one sample",
            kind
        )));
    }
    if sample_rate == 0 {
        return Err(DspError::InvalidParameter(
            "Sample rate must be > 0".to_string(),
        ));
    }
    config.validate()?;

    log::debug!(
        "Computing {} representation: {} samples at {} Hz",
        kind,
        samples.len(),
        sample_rate
    );

    match kind {
        TimeFrequencyKind::ShortTime => short_time_spectrum(samples, sample_rate, config),
        TimeFrequencyKind::Mel => mel_representation(samples, sample_rate, config),
        TimeFrequencyKind::Envelope => Ok(TimeFrequencyRepresentation::Envelope(envelope(samples)?)),
    }
}

fn short_time_spectrum(
    samples: &[f32],
    sample_rate: u32,
    config: &PipelineConfig,
) -> Result<TimeFrequencyRepresentation, DspError> {
    let spec = stft(samples, config.n_fft, config.hop_length)?;
    let rows = to_bin_major(&magnitude(&spec));

    Ok(TimeFrequencyRepresentation::Grid(TimeFrequencyGrid {
        values: amplitude_to_db(&rows, config.top_db),
        frequencies: fft_frequencies(sample_rate, config.n_fft),
        times: frame_times(spec.len(), config.hop_length, sample_rate),
        scale: FrequencyScale::Linear,
    }))
}

fn mel_representation(
    samples: &[f32],
    sample_rate: u32,
    config: &PipelineConfig,
) -> Result<TimeFrequencyRepresentation, DspError> {
    let nyquist = sample_rate as f32 / 2.0;
    let fmax = match config.fmax {
        Some(fmax) if fmax > nyquist => {
            log::warn!(
                "fmax {} Hz is above the Nyquist frequency, clamping to {} Hz",
                fmax,
                nyquist
            );
            nyquist
        }
        Some(fmax) => fmax,
        None => nyquist,
    };
    let mel = mel_spectrogram(
        samples,
        sample_rate,
        config.n_fft,
        config.hop_length,
        config.n_mels,
        config.fmin,
        Some(fmax),
    )?;
    let n_frames = mel.first().map_or(0, |row| row.len());

    Ok(TimeFrequencyRepresentation::Grid(TimeFrequencyGrid {
        values: power_to_db(&mel, config.top_db),
        frequencies: mel_band_centers(config.n_mels, config.fmin, fmax),
        times: frame_times(n_frames, config.hop_length, sample_rate),
        scale: FrequencyScale::Mel,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chirp(sample_rate: u32, length: usize) -> Vec<f32> {
        (0..length)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (2.0 * std::f32::consts::PI * (100.0 + 300.0 * t) * t).sin() * 0.5
            })
            .collect()
    }

    #[test]
    fn test_parse_menu_names() {
        assert_eq!("STFT".parse::<TimeFrequencyKind>().unwrap(), TimeFrequencyKind::ShortTime);
        assert_eq!("Mel".parse::<TimeFrequencyKind>().unwrap(), TimeFrequencyKind::Mel);
        assert_eq!("HHT".parse::<TimeFrequencyKind>().unwrap(), TimeFrequencyKind::Envelope);
        for kind in TimeFrequencyKind::ALL {
            assert_eq!(kind.to_string().parse::<TimeFrequencyKind>().unwrap(), kind);
        }
        assert!(matches!(
            "unknown".parse::<TimeFrequencyKind>(),
            Err(DspError::InvalidChoice(_))
        ));
    }

    #[test]
    fn test_short_time_grid_axes_and_reference() {
        let config = PipelineConfig::default();
        let samples = chirp(4000, 8000);
        let tfr = time_frequency(&samples, 4000, TimeFrequencyKind::ShortTime, &config).unwrap();
        let grid = tfr.as_grid().unwrap();

        assert_eq!(grid.n_rows(), config.n_fft / 2 + 1);
        assert_eq!(grid.frequencies.len(), grid.n_rows());
        assert_eq!(grid.n_frames(), 1 + 8000 / config.hop_length);
        assert!(grid.values.iter().all(|row| row.len() == grid.n_frames()));
        assert_eq!(grid.max_value(), 0.0);
        assert_eq!(grid.scale, FrequencyScale::Linear);
    }

    #[test]
    fn test_mel_grid_axes_and_reference() {
        let config = PipelineConfig::default();
        let samples = chirp(4000, 8000);
        let tfr = time_frequency(&samples, 4000, TimeFrequencyKind::Mel, &config).unwrap();
        let grid = tfr.as_grid().unwrap();

        assert_eq!(grid.n_rows(), config.n_mels);
        assert_eq!(grid.max_value(), 0.0);
        assert!(grid.values.iter().flatten().all(|&v| v >= -80.0 && v <= 0.0));
        assert!(grid.frequencies.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_mel_fmax_above_nyquist_is_clamped() {
        let config = PipelineConfig { fmax: Some(3000.0), n_mels: 40, ..Default::default() };
        assert!(config.validate().is_ok());

        let samples = chirp(4000, 8000);
        let tfr = time_frequency(&samples, 4000, TimeFrequencyKind::Mel, &config).unwrap();
        let grid = tfr.as_grid().unwrap();

        assert_eq!(grid.n_rows(), 40);
        assert!(grid.frequencies.iter().all(|&f| f < 2000.0));
        assert_eq!(grid.max_value(), 0.0);

        let nyquist = PipelineConfig { fmax: Some(2000.0), n_mels: 40, ..Default::default() };
        let reference = time_frequency(&samples, 4000, TimeFrequencyKind::Mel, &nyquist).unwrap();
        assert_eq!(tfr, reference);
    }

    #[test]
    fn test_envelope_length() {
        let samples = chirp(4000, 1234);
        let tfr = time_frequency(&samples, 4000, TimeFrequencyKind::Envelope, &PipelineConfig::default())
            .unwrap();
        assert_eq!(tfr.as_envelope().unwrap().len(), 1234);
    }

    #[test]
    fn test_single_sample_input() {
        let config = PipelineConfig::default();
        for kind in TimeFrequencyKind::ALL {
            let tfr = time_frequency(&[0.3], 4000, kind, &config).unwrap();
            match tfr {
                TimeFrequencyRepresentation::Grid(grid) => {
                    assert_eq!(grid.n_frames(), 1);
                    assert_eq!(grid.max_value(), 0.0);
                }
                TimeFrequencyRepresentation::Envelope(env) => {
                    assert_eq!(env.len(), 1);
                    assert!((env[0] - 0.3).abs() < 1e-7);
                }
            }
        }
    }

    #[test]
    fn test_rejects_empty_and_bad_rate() {
        let config = PipelineConfig::default();
        assert!(matches!(
            time_frequency(&[], 4000, TimeFrequencyKind::Mel, &config),
            Err(DspError::EmptyInput(_))
        ));
        assert!(matches!(
            time_frequency(&[0.1; 10], 0, TimeFrequencyKind::ShortTime, &config),
            Err(DspError::InvalidParameter(_))
        ));
    }
}
