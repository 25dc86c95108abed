use std::path::PathBuf;
use std::time::Duration;

use beacon_drift::{ProcessingConfig, RenderParams};
use clap::Parser;

/// `beacon_host` - Drives the beacon drift pipeline over a stations file.
///
/// Loads daily station positions, fills interior gaps and runs the cooperative
/// processing scheduler to completion, honouring its yield delays the way an
/// interactive host would between frames.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Path to a JSON array of stations (`name`, `start`, `lon`, `lat`).
    #[arg(long, env = "BEACON_STATIONS_PATH")]
    pub stations: PathBuf,

    /// Longest uninterrupted processing slice, in milliseconds.
    #[arg(long, env = "BEACON_MAX_PROCESSING_MS", default_value_t = 100)]
    pub max_processing_ms: u64,

    /// Pause between slices, in milliseconds.
    #[arg(long, env = "BEACON_YIELD_DELAY_MS", default_value_t = 10)]
    pub yield_delay_ms: u64,

    /// Drift exaggeration exponent; offsets are scaled by `10^magnification`.
    #[arg(long, default_value_t = 4.0)]
    pub magnification: f32,

    /// Share of the fleet median removed from each station's drift, `0..=1`.
    #[arg(long, default_value_t = 1.0)]
    pub median_correction: f32,
}

impl Config {
    pub fn processing(&self) -> ProcessingConfig {
        ProcessingConfig {
            max_processing_time: Duration::from_millis(self.max_processing_ms),
            yield_delay: Duration::from_millis(self.yield_delay_ms),
        }
    }

    pub fn render(&self) -> RenderParams {
        RenderParams {
            magnification: self.magnification,
            median_correction: self.median_correction,
            ..RenderParams::default()
        }
    }
}
