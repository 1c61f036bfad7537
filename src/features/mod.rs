//! Spectral building blocks
//!
//! This module contains the transforms the pipeline stages are built from:
//! - Short-time Fourier transform and its inverse
//! - Mel filterbank
//! - Hilbert transform (analytic signal)
//! - Decibel scaling

pub mod decibel;
pub mod hilbert;
pub mod mel;
pub mod stft;
