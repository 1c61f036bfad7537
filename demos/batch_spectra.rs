//! Example: Compute spectra for many WAV recordings in parallel
//!
//! Usage:
//!   cargo run --release --example batch_spectra -- [--jobs N] [--json] [--lowpass HZ] <file1> <file2> ...
//!
//! Notes:
//! - Parallelism is across files. Each recording is processed single-threaded.
//! - Default workers: (available CPU threads - 1), keeping one core free for the system.

use auscult_dsp::{magnitude_spectrum, process, PipelineConfig, Processing};
use rayon::prelude::*;
use std::env;
use std::time::Instant;

/// Bands reported for each recording, in Hz
const BANDS: [(f32, f32); 4] = [(0.0, 50.0), (50.0, 200.0), (200.0, 600.0), (600.0, 2000.0)];

fn load_wav(path: &str) -> Result<(Vec<f32>, u32), Box<dyn std::error::Error + Send + Sync>> {
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

fn default_jobs() -> usize {
    let n = std::thread::available_parallelism().map(|v| v.get()).unwrap_or(1);
    std::cmp::max(1, n.saturating_sub(1))
}

struct ItemOut {
    path: String,
    peak_hz: f32,
    band_fractions: Vec<f32>,
    processing_ms: f32,
}

fn analyze(
    path: &str,
    lowpass: Option<f32>,
    config: &PipelineConfig,
) -> Result<ItemOut, Box<dyn std::error::Error + Send + Sync>> {
    let t0 = Instant::now();
    let (samples, sample_rate) = load_wav(path)?;

    let samples = match lowpass {
        Some(cutoff_hz) => process(&samples, sample_rate, Processing::LowPass { cutoff_hz }, config)?,
        None => samples,
    };

    let spectrum = magnitude_spectrum(&samples, sample_rate)?;
    let total = spectrum.total_energy().max(f32::MIN_POSITIVE);
    let band_fractions = BANDS
        .iter()
        .map(|&(lo, hi)| spectrum.band_energy(lo, hi) / total)
        .collect();

    Ok(ItemOut {
        path: path.to_string(),
        peak_hz: spectrum.peak_frequency().unwrap_or(0.0),
        band_fractions,
        processing_ms: t0.elapsed().as_secs_f32() * 1000.0,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();

    let mut json = false;
    let mut jobs: Option<usize> = None;
    let mut lowpass: Option<f32> = None;
    let mut paths: Vec<String> = Vec::new();

    while !args.is_empty() {
        let a = args.remove(0);
        match a.as_str() {
            "--json" => json = true,
            "--jobs" => {
                let v = args.first().ok_or("--jobs requires a value")?.parse::<usize>()?;
                args.remove(0);
                jobs = Some(std::cmp::max(1, v));
            }
            "--lowpass" => {
                let v = args.first().ok_or("--lowpass requires a value")?.parse::<f32>()?;
                args.remove(0);
                lowpass = Some(v);
            }
            "--help" | "-h" => {
                eprintln!(
                    "Usage: batch_spectra [--jobs N] [--json] [--lowpass HZ] <file1> <file2> ...\n\
                     \n\
                     --jobs N       Parallel workers (default: CPU-1)\n\
                     --json         Emit one JSON object per line (JSONL)\n\
                     --lowpass HZ   Low-pass each recording before the spectrum\n"
                );
                return Ok(());
            }
            _ => paths.push(a),
        }
    }

    if paths.is_empty() {
        eprintln!("ERROR: Provide at least one WAV file path. Use --help for usage.");
        std::process::exit(2);
    }

    let jobs = jobs.unwrap_or_else(default_jobs);
    eprintln!("Batch: {} files, jobs={}", paths.len(), jobs);

    let config = PipelineConfig::default();
    let t0 = Instant::now();
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let outs: Vec<(String, Result<ItemOut, String>)> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let r = analyze(path, lowpass, &config).map_err(|e| e.to_string());
                (path.clone(), r)
            })
            .collect()
    });

    let mut ok = 0usize;
    for (idx, (path, out)) in outs.iter().enumerate() {
        match out {
            Ok(o) => {
                ok += 1;
                if json {
                    println!(
                        "{{\"file\":{},\"peak_hz\":{:.2},\"band_fractions\":{},\"processing_time_ms\":{:.2}}}",
                        serde_json::to_string(&o.path)?,
                        o.peak_hz,
                        serde_json::to_string(&o.band_fractions)?,
                        o.processing_ms
                    );
                } else {
                    let bands: Vec<String> = BANDS
                        .iter()
                        .zip(&o.band_fractions)
                        .map(|(&(lo, hi), f)| format!("{:.0}-{:.0}Hz={:.1}%", lo, hi, f * 100.0))
                        .collect();
                    println!(
                        "[{}/{}] {}: peak={:.1}Hz {} time={:.2}ms",
                        idx + 1,
                        outs.len(),
                        o.path,
                        o.peak_hz,
                        bands.join(" "),
                        o.processing_ms
                    );
                }
            }
            Err(e) => {
                if json {
                    println!(
                        "{{\"file\":{},\"error\":{}}}",
                        serde_json::to_string(path)?,
                        serde_json::to_string(e)?
                    );
                } else {
                    println!("[{}/{}] {}: ERROR: {}", idx + 1, outs.len(), path, e);
                }
            }
        }
    }

    eprintln!(
        "Done: ok={}/{} wall={:.0}ms",
        ok,
        outs.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );

    Ok(())
}
