//! Signal processing applied to a recording before inspection
//!
//! This module contains the transforms offered by the processing menu:
//! - Harmonic-percussive separation (harmonic part kept)
//! - Preemphasis (and its inverse)
//!
//! Low-pass and high-pass filtering live in [`crate::filters`];
//! [`Processing`] names all four choices.

pub mod hpss;
pub mod preemphasis;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DspError;
use crate::filters::FilterType;

/// One entry of the processing menu
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Processing {
    /// Butterworth low-pass filter
    LowPass {
        /// Cutoff frequency in Hz
        cutoff_hz: f32,
    },
    /// Butterworth high-pass filter
    HighPass {
        /// Cutoff frequency in Hz
        cutoff_hz: f32,
    },
    /// Keep the harmonic component of an HPSS decomposition
    HarmonicSeparation,
    /// First-order high-frequency emphasis
    Preemphasis,
}

impl Processing {
    /// Filter choice with the given type and cutoff
    pub fn filter(filter_type: FilterType, cutoff_hz: f32) -> Self {
        match filter_type {
            FilterType::LowPass => Processing::LowPass { cutoff_hz },
            FilterType::HighPass => Processing::HighPass { cutoff_hz },
        }
    }
}

impl fmt::Display for Processing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Processing::LowPass { cutoff_hz } => write!(f, "low-pass filter ({} Hz)", cutoff_hz),
            Processing::HighPass { cutoff_hz } => write!(f, "high-pass filter ({} Hz)", cutoff_hz),
            Processing::HarmonicSeparation => write!(f, "harmonic-percussive separation"),
            Processing::Preemphasis => write!(f, "preemphasis"),
        }
    }
}

impl FromStr for Processing {
    type Err = DspError;

    /// Parse a menu name; filters carry their cutoff after a colon (`lowpass:400`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some((name, cutoff)) = s.split_once(':') {
            let filter_type: FilterType = name.parse()?;
            let cutoff_hz: f32 = cutoff.trim().parse().map_err(|_| {
                DspError::InvalidParameter(format!("Cutoff '{}' is not a number", cutoff.trim()))
            })?;
            return Ok(Processing::filter(filter_type, cutoff_hz));
        }

        match s.to_ascii_lowercase().as_str() {
            "hpss" | "harmonic" | "h-p separation" | "harmonic_separation" => {
                Ok(Processing::HarmonicSeparation)
            }
            "preemphasis" | "pre-emphasis" | "vme" => Ok(Processing::Preemphasis),
            "low" | "lowpass" | "low-pass" | "high" | "highpass" | "high-pass" => {
                Err(DspError::InvalidParameter(format!(
                    "Filter choice '{}' needs a cutoff, e.g. '{}:400'",
                    s, s
                )))
            }
            other => Err(DspError::InvalidChoice(format!(
                "Unknown processing '{}' (expected lowpass:<hz>, highpass:<hz>, hpss or preemphasis)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_entries() {
        assert_eq!(
            "lowpass:400".parse::<Processing>().unwrap(),
            Processing::LowPass { cutoff_hz: 400.0 }
        );
        assert_eq!(
            "High-Pass: 50".parse::<Processing>().unwrap(),
            Processing::HighPass { cutoff_hz: 50.0 }
        );
        assert_eq!("HPSS".parse::<Processing>().unwrap(), Processing::HarmonicSeparation);
        assert_eq!("vme".parse::<Processing>().unwrap(), Processing::Preemphasis);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!("reverb".parse::<Processing>(), Err(DspError::InvalidChoice(_))));
        assert!(matches!("band:300".parse::<Processing>(), Err(DspError::InvalidChoice(_))));
        assert!(matches!("lowpass".parse::<Processing>(), Err(DspError::InvalidParameter(_))));
        assert!(matches!("lowpass:abc".parse::<Processing>(), Err(DspError::InvalidParameter(_))));
    }

    #[test]
    fn test_filter_constructor_and_display() {
        let p = Processing::filter(FilterType::HighPass, 120.0);
        assert_eq!(p, Processing::HighPass { cutoff_hz: 120.0 });
        assert_eq!(p.to_string(), "high-pass filter (120 Hz)");
    }
}
