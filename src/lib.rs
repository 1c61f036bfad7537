//! # Auscult DSP
//!
//! Signal processing core for single-channel auscultation recordings (heart
//! and lung sounds). It turns decoded samples into filtered waveforms,
//! frequency spectra and time-frequency representations for a clinician to
//! inspect.
//!
//! ## Features
//!
//! - **Filtering**: Butterworth low-pass / high-pass design and causal application
//! - **Harmonic separation**: median-filter HPSS, harmonic component kept
//! - **Preemphasis**: first-order high-frequency emphasis
//! - **Spectrum**: full-length magnitude spectrum
//! - **Time-frequency**: STFT (dB), mel spectrogram (dB), Hilbert envelope
//!
//! ## Quick Start
//!
//! ```no_run
//! use auscult_dsp::{apply_filter, magnitude_spectrum, time_frequency, FilterType, TimeFrequencyKind};
//!
//! // Decoded mono samples and their sample rate
//! let samples: Vec<f32> = vec![0.0; 4000];
//! let sample_rate = 4000;
//!
//! let filtered = apply_filter(&samples, sample_rate, FilterType::LowPass, 400.0, 5)?;
//! let spectrum = magnitude_spectrum(&filtered, sample_rate)?;
//! let tfr = time_frequency(&filtered, sample_rate, TimeFrequencyKind::Mel)?;
//! # Ok::<(), auscult_dsp::DspError>(())
//! ```
//!
//! ## Architecture
//!
//! Every stage is a pure function of its inputs and returns a new buffer:
//!
//! ```text
//! Samples → Filter / HPSS / Preemphasis → Processed samples → Spectrum, TFR
//! ```
//!
//! Nothing is cached between calls, so independent recordings can be
//! processed concurrently without coordination.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod filters;
pub mod preprocessing;

// Re-export main types
pub use analysis::spectrum::Spectrum;
pub use analysis::tfr::{
    FrequencyScale, TimeFrequencyGrid, TimeFrequencyKind, TimeFrequencyRepresentation,
};
pub use config::PipelineConfig;
pub use error::DspError;
pub use filters::{FilterCoefficients, FilterMode, FilterSpec, FilterType};
pub use preprocessing::Processing;

use preprocessing::hpss::HpssConfig;

/// Design a Butterworth filter and run it causally over `samples`
///
/// # Arguments
///
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `filter_type` - Low-pass or high-pass
/// * `cutoff_hz` - Cutoff frequency, strictly between 0 and `sample_rate / 2`
/// * `order` - Filter order (the menu default is [`filters::design::DEFAULT_ORDER`])
///
/// # Errors
///
/// Returns `DspError::InvalidParameter` if the cutoff, sample rate or order
/// is out of range.
pub fn apply_filter(
    samples: &[f32],
    sample_rate: u32,
    filter_type: FilterType,
    cutoff_hz: f32,
    order: usize,
) -> Result<Vec<f32>, DspError> {
    let spec = FilterSpec::new(filter_type, cutoff_hz).with_order(order);
    filters::butterworth_filter(samples, sample_rate, &spec, FilterMode::Causal)
}

/// Harmonic component of `samples` with the default separation parameters
///
/// # Errors
///
/// Returns `DspError::EmptyInput` for an empty signal.
pub fn harmonic_component(samples: &[f32]) -> Result<Vec<f32>, DspError> {
    preprocessing::hpss::harmonic_component(samples, &HpssConfig::default())
}

/// Harmonic component with the separation parameters of `config`
///
/// # Errors
///
/// Returns `DspError::EmptyInput` for an empty signal and
/// `DspError::InvalidParameter` for an invalid config.
pub fn harmonic_component_with_config(
    samples: &[f32],
    config: &PipelineConfig,
) -> Result<Vec<f32>, DspError> {
    config.validate()?;
    preprocessing::hpss::harmonic_component(samples, &config.hpss_config())
}

/// First-order preemphasis `y[n] = x[n] - k * x[n-1]`, `y[0] = x[0]`
///
/// The menu default for `k` is [`preprocessing::preemphasis::DEFAULT_COEFFICIENT`].
pub fn preemphasis(samples: &[f32], k: f32) -> Vec<f32> {
    preprocessing::preemphasis::preemphasis(samples, k)
}

/// Full-length magnitude spectrum of `samples`
///
/// # Errors
///
/// Returns `DspError::EmptyInput` for an empty signal and
/// `DspError::InvalidParameter` for a zero sample rate.
pub fn magnitude_spectrum(samples: &[f32], sample_rate: u32) -> Result<Spectrum, DspError> {
    analysis::spectrum::magnitude_spectrum(samples, sample_rate)
}

/// Time-frequency representation with the default parameters
///
/// # Errors
///
/// Returns `DspError::EmptyInput` for an empty signal and
/// `DspError::InvalidParameter` for a zero sample rate.
pub fn time_frequency(
    samples: &[f32],
    sample_rate: u32,
    kind: TimeFrequencyKind,
) -> Result<TimeFrequencyRepresentation, DspError> {
    analysis::tfr::time_frequency(samples, sample_rate, kind, &PipelineConfig::default())
}

/// Time-frequency representation with explicit parameters
///
/// # Errors
///
/// As [`time_frequency`], plus `DspError::InvalidParameter` for an invalid config.
pub fn time_frequency_with_config(
    samples: &[f32],
    sample_rate: u32,
    kind: TimeFrequencyKind,
    config: &PipelineConfig,
) -> Result<TimeFrequencyRepresentation, DspError> {
    analysis::tfr::time_frequency(samples, sample_rate, kind, config)
}

/// Apply one processing menu entry to `samples`
///
/// Filter order, filter mode, preemphasis coefficient and HPSS parameters
/// come from `config`.
///
/// # Errors
///
/// Returns `DspError::InvalidParameter` for an invalid config or filter
/// parameters, `DspError::EmptyInput` if HPSS is given an empty signal.
///
/// # Example
///
/// ```no_run
/// use auscult_dsp::{process, PipelineConfig, Processing};
///
/// let samples = vec![0.0f32; 4000];
/// let config = PipelineConfig::default();
/// let out = process(&samples, 4000, Processing::HighPass { cutoff_hz: 50.0 }, &config)?;
/// assert_eq!(out.len(), samples.len());
/// # Ok::<(), auscult_dsp::DspError>(())
/// ```
pub fn process(
    samples: &[f32],
    sample_rate: u32,
    processing: Processing,
    config: &PipelineConfig,
) -> Result<Vec<f32>, DspError> {
    use std::time::Instant;
    let start_time = Instant::now();

    config.validate()?;

    log::debug!(
        "Applying {} to {} samples at {} Hz",
        processing,
        samples.len(),
        sample_rate
    );

    let filter = |filter_type: FilterType, cutoff_hz: f32| {
        let spec = FilterSpec::new(filter_type, cutoff_hz).with_order(config.filter_order);
        filters::butterworth_filter(samples, sample_rate, &spec, config.filter_mode)
    };

    let output = match processing {
        Processing::LowPass { cutoff_hz } => filter(FilterType::LowPass, cutoff_hz)?,
        Processing::HighPass { cutoff_hz } => filter(FilterType::HighPass, cutoff_hz)?,
        Processing::HarmonicSeparation => {
            preprocessing::hpss::harmonic_component(samples, &config.hpss_config())?
        }
        Processing::Preemphasis => {
            preprocessing::preemphasis::preemphasis(samples, config.preemphasis_coefficient)
        }
    };

    log::debug!(
        "{} finished in {:.2} ms",
        processing,
        start_time.elapsed().as_secs_f32() * 1000.0
    );

    Ok(output)
}
