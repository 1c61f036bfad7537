//! Error types for the signal processing core

use std::fmt;

/// Errors that can occur while processing a recording
#[derive(Debug, Clone, PartialEq)]
pub enum DspError {
    /// A numeric parameter is out of its valid range (cutoff, sample rate, order, config)
    InvalidParameter(String),

    /// A menu choice (filter type, representation, processing) is not recognised
    InvalidChoice(String),

    /// The input sequence is empty but the transform needs at least one sample
    EmptyInput(String),

    /// The FFT backend rejected a buffer
    ProcessingError(String),
}

impl fmt::Display for DspError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DspError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            DspError::InvalidChoice(msg) => write!(f, "Invalid choice: {}", msg),
            DspError::EmptyInput(msg) => write!(f, "Empty input: {}", msg),
            DspError::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
        }
    }
}

impl std::error::Error for DspError {}

impl From<realfft::FftError> for DspError {
    fn from(err: realfft::FftError) -> Self {
        DspError::ProcessingError(err.to_string())
    }
}
