//! Representations produced for inspection
//!
//! - Full-length magnitude spectrum
//! - Time-frequency representations (STFT, mel, envelope)

pub mod spectrum;
pub mod tfr;
