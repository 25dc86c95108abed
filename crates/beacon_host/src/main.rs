mod config;

use std::path::Path;

use anyhow::Context;
use beacon_drift::{
    fill_station_gaps, projection, ProcessingEvent, ProcessingScheduler, Station, Step,
    ViewportBounds,
};
use clap::Parser;
use crossbeam_channel::Receiver;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // --- 1. Initialization ---
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();
    let config = Config::parse();
    tracing::info!(config = ?config, "Beacon host starting with configuration");

    let processing = config.processing();
    processing.validate().context("Invalid processing settings")?;
    let render = config.render();
    render.validate().context("Invalid render settings")?;

    // --- 2. Load Stations ---
    let mut stations = load_stations(&config.stations)?;
    fill_station_gaps(&mut stations);
    let viewport = data_viewport(&stations);

    // --- 3. Drive the Scheduler ---
    let (mut tx_events, rx_events) = crossbeam_channel::unbounded::<ProcessingEvent>();
    let mut scheduler = ProcessingScheduler::new(processing);
    let mut ticket = scheduler.set_data(stations);
    let mut slices = 0u64;

    loop {
        let step = scheduler.resume(ticket, &mut tx_events)?;
        slices += 1;
        drain_events(&rx_events);

        match step {
            Step::Yield { ticket: next, delay } => {
                ticket = next;
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = tokio::signal::ctrl_c() => {
                        tracing::warn!(slices, "Interrupted; abandoning processing run");
                        return Ok(());
                    }
                }
            }
            Step::Ready => break,
            Step::Stale => anyhow::bail!("processing run was superseded unexpectedly"),
        }
    }

    // --- 4. Report ---
    let buffer = scheduler
        .vertex_buffer()
        .context("Scheduler finished without a vertex buffer")?;
    let uniform = render.uniform(&viewport, buffer);
    let visible = render.visible_columns(buffer);
    tracing::info!(
        slices,
        texture_width = buffer.width(),
        texture_height = buffer.height(),
        texture_bytes = buffer.as_bytes().len(),
        vertices = scheduler.positions().map_or(0, <[_]>::len),
        reserved = scheduler.total_vertex_count().unwrap_or(0),
        visible_days = visible.len(),
        scale = uniform.scale,
        "Drift buffers ready"
    );

    if let Some((mx, my)) = scheduler.median_offsets() {
        if let (Some(x), Some(y)) = (mx.last(), my.last()) {
            tracing::info!(
                median_dx = x,
                median_dy = y,
                "Cumulative fleet drift at end of range (projected units)"
            );
        }
    }
    Ok(())
}

fn load_stations(path: &Path) -> anyhow::Result<Vec<Station>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stations file {}", path.display()))?;
    let stations: Vec<Station> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse stations file {}", path.display()))?;
    for station in &stations {
        station.validate()?;
    }
    tracing::info!(path = %path.display(), stations = stations.len(), "Loaded stations");
    Ok(stations)
}

/// Viewport framing every valid sample, or the whole world for an empty set.
fn data_viewport(stations: &[Station]) -> ViewportBounds {
    let mut west = f64::INFINITY;
    let mut east = f64::NEG_INFINITY;
    let mut south = f64::INFINITY;
    let mut north = f64::NEG_INFINITY;
    for (lon, lat) in stations
        .iter()
        .flat_map(|s| (0..s.len()).filter_map(move |i| s.sample(i)))
    {
        west = west.min(lon);
        east = east.max(lon);
        south = south.min(lat);
        north = north.max(lat);
    }
    if west > east || south >= north || west == east {
        west = -180.0;
        east = 180.0;
        south = -projection::MAX_LAT_DEG;
        north = projection::MAX_LAT_DEG;
    }

    let (min_x, min_y) = projection::project(west, south);
    let (max_x, max_y) = projection::project(east, north);
    let width = (max_x - min_x).abs();
    let height = (max_y - min_y).abs();
    ViewportBounds {
        north,
        south,
        east,
        west,
        width,
        height,
        top: 0.0,
        left: 0.0,
        bottom: height,
        right: width,
    }
}

fn drain_events(rx: &Receiver<ProcessingEvent>) {
    for event in rx.try_iter() {
        match event {
            ProcessingEvent::Progress { phase, fraction } => {
                tracing::debug!(%phase, fraction, "Processing progress");
            }
            ProcessingEvent::Extent { start, end } => {
                tracing::info!(%start, %end, "Station data spans");
            }
            ProcessingEvent::Ready => tracing::info!("Processing complete"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_frames_valid_samples() {
        let stations = vec![
            Station::new("A", 0, vec![-120.0, 0.0], vec![35.0, 0.0]),
            Station::new("B", 0, vec![-110.0], vec![40.0]),
        ];
        let vp = data_viewport(&stations);
        assert_eq!((vp.west, vp.east), (-120.0, -110.0));
        assert_eq!((vp.south, vp.north), (35.0, 40.0));
        assert!(vp.width > 0.0 && vp.height > 0.0);
    }

    #[test]
    fn empty_set_frames_the_world() {
        let vp = data_viewport(&[]);
        assert_eq!((vp.west, vp.east), (-180.0, 180.0));
        assert_eq!(vp.north, projection::MAX_LAT_DEG);
    }
}
