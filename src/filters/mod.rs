//! Digital filtering
//!
//! Filter design and filter application are separate stages so that
//! coefficients can be designed once and reused across recordings:
//! - Butterworth design (low-pass, high-pass)
//! - Causal and zero-phase application

pub mod apply;
pub mod design;

pub use apply::{apply_coefficients, lfilter, FilterMode};
pub use design::{design_butterworth, FilterCoefficients, FilterSpec, FilterType};

use crate::error::DspError;

/// Design a Butterworth filter and apply it to `samples`
///
/// # Errors
///
/// Returns `DspError::InvalidParameter` if the specification is invalid for
/// `sample_rate` (see [`design_butterworth`]).
pub fn butterworth_filter(
    samples: &[f32],
    sample_rate: u32,
    spec: &FilterSpec,
    mode: FilterMode,
) -> Result<Vec<f32>, DspError> {
    let coeffs = design_butterworth(spec, sample_rate)?;
    apply_coefficients(&coeffs, samples, mode)
}
