//! Example: Process a single WAV recording
//!
//! Usage:
//!   cargo run --release --example process_wav -- [options] <file.wav>
//!
//! Options:
//!   --process <P>     lowpass:<hz> | highpass:<hz> | hpss | preemphasis
//!   --tfr <KIND>      stft | mel | hht (default: stft)
//!   --config <FILE>   JSON pipeline configuration (missing fields keep defaults)
//!   --json            Emit a JSON summary instead of text

use auscult_dsp::{
    magnitude_spectrum, process, time_frequency_with_config, PipelineConfig, Processing,
    TimeFrequencyKind, TimeFrequencyRepresentation,
};
use serde::Serialize;
use std::env;
use std::time::Instant;

/// Load a WAV file and return (mono samples, sample_rate)
fn load_wav(path: &str) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error>> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_value = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    // Average interleaved channels down to mono
    let channels = spec.channels.max(1) as usize;
    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    } else {
        samples
    };

    Ok((mono, spec.sample_rate))
}

#[derive(Serialize)]
struct Summary {
    file: String,
    sample_rate: u32,
    samples: usize,
    processing: Option<String>,
    spectrum_bins: usize,
    spectrum_peak_hz: Option<f32>,
    representation: String,
    grid_rows: Option<usize>,
    grid_frames: Option<usize>,
    envelope_peak: Option<f32>,
    processing_time_ms: f32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let mut json = false;
    let mut processing: Option<Processing> = None;
    let mut kind = TimeFrequencyKind::ShortTime;
    let mut config = PipelineConfig::default();
    let mut path: Option<String> = None;

    while !args.is_empty() {
        let a = args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--process" => {
                let v = args.first().ok_or("--process requires a value")?.clone();
                args.remove(0);
                processing = Some(v.parse::<Processing>()?);
            }
            "--tfr" => {
                let v = args.first().ok_or("--tfr requires a value")?.clone();
                args.remove(0);
                kind = v.parse::<TimeFrequencyKind>()?;
            }
            "--config" => {
                let v = args.first().ok_or("--config requires a value")?.clone();
                args.remove(0);
                config = serde_json::from_str(&std::fs::read_to_string(&v)?)?;
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: process_wav [--process P] [--tfr KIND] [--config FILE] [--json] <file.wav>\n\
                     \n\
                     --process P    lowpass:<hz> | highpass:<hz> | hpss | preemphasis\n\
                     --tfr KIND     stft | mel | hht (default: stft)\n\
                     --config FILE  JSON pipeline configuration\n\
                     --json         Emit a JSON summary\n"
                );
                return Ok(());
            }
            _ => path = Some(a),
        }
    }

    let Some(path) = path else {
        eprintln!("ERROR: Provide a WAV file path. Use --help for usage.");
        std::process::exit(2);
    };

    let t0 = Instant::now();
    let (samples, sample_rate) = load_wav(&path)?;

    let processed = match processing {
        Some(p) => process(&samples, sample_rate, p, &config)?,
        None => samples.clone(),
    };

    let spectrum = magnitude_spectrum(&processed, sample_rate)?;
    let tfr = time_frequency_with_config(&processed, sample_rate, kind, &config)?;

    let (grid_rows, grid_frames, envelope_peak) = match &tfr {
        TimeFrequencyRepresentation::Grid(grid) => (Some(grid.n_rows()), Some(grid.n_frames()), None),
        TimeFrequencyRepresentation::Envelope(env) => {
            (None, None, Some(env.iter().cloned().fold(0.0f32, f32::max)))
        }
    };

    let summary = Summary {
        file: path,
        sample_rate,
        samples: samples.len(),
        processing: processing.map(|p| p.to_string()),
        spectrum_bins: spectrum.len(),
        spectrum_peak_hz: spectrum.peak_frequency(),
        representation: kind.to_string(),
        grid_rows,
        grid_frames,
        envelope_peak,
        processing_time_ms: t0.elapsed().as_secs_f32() * 1000.0,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Recording: {}", summary.file);
        println!(
            "  {} samples at {} Hz ({:.2} s)",
            summary.samples,
            summary.sample_rate,
            summary.samples as f32 / summary.sample_rate as f32
        );
        if let Some(p) = &summary.processing {
            println!("  Processing: {}", p);
        }
        println!(
            "  Spectrum: {} bins, peak at {:.1} Hz",
            summary.spectrum_bins,
            summary.spectrum_peak_hz.unwrap_or(0.0)
        );
        match (summary.grid_rows, summary.grid_frames, summary.envelope_peak) {
            (Some(rows), Some(frames), _) => {
                println!("  {}: {} rows x {} frames", summary.representation, rows, frames)
            }
            (_, _, Some(peak)) => println!("  {}: envelope peak {:.4}", summary.representation, peak),
            _ => {}
        }
        println!("  Time: {:.2} ms", summary.processing_time_ms);
    }

    Ok(())
}
