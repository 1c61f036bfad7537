//! Decibel scaling referenced to the loudest cell
//!
//! Both conversions clamp values below `amin` before taking the logarithm,
//! so silent cells stay finite, and optionally floor the result at
//! `max - top_db`. With the reference set to the grid maximum the loudest
//! cell is exactly 0 dB.

/// Floor for amplitude values before `log10`
pub const AMPLITUDE_AMIN: f32 = 1e-5;

/// Floor for power values before `log10`
pub const POWER_AMIN: f32 = 1e-10;

/// Convert an amplitude grid to dB relative to its maximum: `20 * log10(S / max)`
pub fn amplitude_to_db(grid: &[Vec<f32>], top_db: Option<f32>) -> Vec<Vec<f32>> {
    to_db(grid, 20.0, AMPLITUDE_AMIN, top_db)
}

/// Convert a power grid to dB relative to its maximum: `10 * log10(S / max)`
pub fn power_to_db(grid: &[Vec<f32>], top_db: Option<f32>) -> Vec<Vec<f32>> {
    to_db(grid, 10.0, POWER_AMIN, top_db)
}

fn to_db(grid: &[Vec<f32>], multiplier: f32, amin: f32, top_db: Option<f32>) -> Vec<Vec<f32>> {
    let reference = grid
        .iter()
        .flatten()
        .copied()
        .fold(0.0f32, f32::max);

    let level = |x: f32| multiplier * x.max(amin).log10();
    let ref_db = level(reference);

    let mut db: Vec<Vec<f32>> = grid
        .iter()
        .map(|row| row.iter().map(|&x| level(x) - ref_db).collect())
        .collect();

    if let Some(top_db) = top_db {
        let peak = db.iter().flatten().copied().fold(f32::NEG_INFINITY, f32::max);
        let floor = peak - top_db;
        for value in db.iter_mut().flatten() {
            *value = value.max(floor);
        }
    }

    db
}
