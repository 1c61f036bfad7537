//! Configuration parameters for the processing pipeline

use serde::{Deserialize, Serialize};

use crate::error::DspError;
use crate::filters::apply::FilterMode;
use crate::preprocessing::hpss::HpssConfig;

/// Pipeline configuration parameters
///
/// Every field has a documented default; the four entry points of the crate
/// root use [`PipelineConfig::default`]. Unknown fields are rejected when
/// deserializing, missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    // Filtering
    /// Butterworth filter order (default: 5)
    pub filter_order: usize,

    /// Single causal pass or forward-backward pass (default: Causal)
    pub filter_mode: FilterMode,

    // Preemphasis
    /// Preemphasis coefficient `k` in `y[n] = x[n] - k * x[n-1]` (default: 0.97)
    pub preemphasis_coefficient: f32,

    // STFT parameters (shared by HPSS, short-time spectrum and mel)
    /// FFT window size (default: 2048)
    pub n_fft: usize,

    /// Hop size between frames (default: 512)
    pub hop_length: usize,

    // Mel spectrogram
    /// Number of mel bands (default: 128)
    pub n_mels: usize,

    /// Lowest mel band edge in Hz (default: 0.0)
    pub fmin: f32,

    /// Highest mel band edge in Hz (default: None = Nyquist)
    ///
    /// Values above the Nyquist frequency of the recording are clamped to it
    /// with a warning. `fmin` must stay below the Nyquist frequency.
    pub fmax: Option<f32>,

    // Harmonic-percussive separation
    /// Median filter length along time, in frames (default: 31)
    pub hpss_harmonic_kernel: usize,

    /// Median filter length along frequency, in bins (default: 31)
    pub hpss_percussive_kernel: usize,

    /// Exponent of the soft masks (default: 2.0)
    pub hpss_power: f32,

    /// Separation margin, >= 1.0 (default: 1.0)
    pub hpss_margin: f32,

    // Display scaling
    /// Dynamic range kept below the 0 dB reference (default: Some(80.0))
    pub top_db: Option<f32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            filter_order: 5,
            filter_mode: FilterMode::Causal,
            preemphasis_coefficient: 0.97,
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            fmin: 0.0,
            fmax: None,
            hpss_harmonic_kernel: 31,
            hpss_percussive_kernel: 31,
            hpss_power: 2.0,
            hpss_margin: 1.0,
            top_db: Some(80.0),
        }
    }
}

impl PipelineConfig {
    /// Check that every parameter lies in its valid range
    ///
    /// # Errors
    ///
    /// Returns `DspError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<(), DspError> {
        if self.filter_order == 0 {
            return Err(invalid("filter_order must be >= 1"));
        }
        if !self.preemphasis_coefficient.is_finite() {
            return Err(invalid("preemphasis_coefficient must be finite"));
        }
        if self.n_fft == 0 {
            return Err(invalid("n_fft must be > 0"));
        }
        if self.hop_length == 0 {
            return Err(invalid("hop_length must be > 0"));
        }
        if self.n_mels == 0 {
            return Err(invalid("n_mels must be > 0"));
        }
        if !(self.fmin.is_finite() && self.fmin >= 0.0) {
            return Err(invalid("fmin must be >= 0"));
        }
        if let Some(fmax) = self.fmax {
            if !fmax.is_finite() || fmax <= self.fmin {
                return Err(DspError::InvalidParameter(format!(
                    "fmax ({}) must be greater than fmin ({})",
                    fmax, self.fmin
                )));
            }
        }
        if self.hpss_harmonic_kernel == 0 || self.hpss_percussive_kernel == 0 {
            return Err(invalid("HPSS kernel sizes must be > 0"));
        }
        if !(self.hpss_power.is_finite() && self.hpss_power > 0.0) {
            return Err(invalid("hpss_power must be > 0"));
        }
        if !(self.hpss_margin >= 1.0) {
            return Err(invalid("hpss_margin must be >= 1.0"));
        }
        if let Some(top_db) = self.top_db {
            if !(top_db >= 0.0) {
                return Err(invalid("top_db must be non-negative"));
            }
        }
        Ok(())
    }

    /// Separation parameters for [`crate::preprocessing::hpss`]
    pub fn hpss_config(&self) -> HpssConfig {
        HpssConfig {
            n_fft: self.n_fft,
            hop_length: self.hop_length,
            harmonic_kernel: self.hpss_harmonic_kernel,
            percussive_kernel: self.hpss_percussive_kernel,
            power: self.hpss_power,
            margin: self.hpss_margin,
        }
    }
}

fn invalid(msg: &str) -> DspError {
    DspError::InvalidParameter(msg.to_string())
}
