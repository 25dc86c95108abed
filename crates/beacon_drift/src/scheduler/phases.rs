//! Resumable work loops for the Analyze, Fill and Medians phases.
//!
//! Every loop leaves its cursor on the next unit of work before checking the
//! slice budget, so a yielded phase can be resumed without repeating or
//! skipping anything.

use std::time::{Duration, Instant};

use crate::buffer::VertexBuffer;
use crate::clock::Clock;
use crate::error::Result;
use crate::projection;
use crate::station::Station;
use crate::vertex::VertexPosition;

use super::median::{daily_delta, median};

/// Outcome of running a phase loop inside one slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    Done,
    Yield,
}

/// Time budget of one `resume` call.
pub(crate) struct Slice<'a, C: Clock + ?Sized> {
    clock: &'a C,
    started: Instant,
    budget: Duration,
}

impl<'a, C: Clock + ?Sized> Slice<'a, C> {
    pub(crate) fn start(clock: &'a C, budget: Duration) -> Self {
        Self {
            clock,
            started: clock.now(),
            budget,
        }
    }

    #[inline]
    pub(crate) fn exhausted(&self) -> bool {
        self.clock.now().saturating_duration_since(self.started) > self.budget
    }
}

/// Sizing pass over the raw stations.
#[derive(Debug, Default)]
pub(crate) struct Analysis {
    pub cursor: usize,
    /// `Σ (len + 2)`: every sample plus two sentinels per station.
    pub total_vertex_count: usize,
    pub total_samples: usize,
    /// `(earliest start, latest end)` over non-empty stations.
    pub extent: Option<(i64, i64)>,
}

impl Analysis {
    pub(crate) fn run<C: Clock + ?Sized>(
        &mut self,
        stations: &[Station],
        slice: &Slice<'_, C>,
    ) -> Control {
        while let Some(station) = stations.get(self.cursor) {
            self.total_vertex_count += station.len() + 2;
            self.total_samples += station.len();
            if let Some(end) = station.end() {
                self.extent = Some(match self.extent {
                    Some((start, last)) => (start.min(station.start), last.max(end)),
                    None => (station.start, end),
                });
            }
            self.cursor += 1;

            if slice.exhausted() {
                return Control::Yield;
            }
        }
        Control::Done
    }

    pub(crate) fn fraction(&self, station_count: usize) -> f64 {
        ratio(self.cursor, station_count)
    }
}

/// Per-station fill progress.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StationProgress {
    /// First valid projected sample; offsets are measured from it.
    pub base: Option<(f64, f64)>,
    pub next_sample: usize,
    pub visited: bool,
}

/// Buffers handed to the renderer once allocated.
#[derive(Debug)]
pub(crate) struct DriftOutput {
    pub buffer: VertexBuffer,
    pub positions: Vec<VertexPosition>,
}

impl DriftOutput {
    pub(crate) fn allocate(analysis: &Analysis, station_count: usize) -> Self {
        let (start, end) = analysis.extent.unwrap_or((0, 0));
        Self {
            buffer: VertexBuffer::new(station_count, start, end),
            positions: Vec::with_capacity(analysis.total_vertex_count),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FillCursor {
    pub station: usize,
    pub visited_samples: usize,
    pub progress: Vec<StationProgress>,
}

impl FillCursor {
    pub(crate) fn run<C: Clock + ?Sized>(
        &mut self,
        stations: &[Station],
        output: &mut DriftOutput,
        slice: &Slice<'_, C>,
    ) -> Result<Control> {
        if self.progress.len() != stations.len() {
            self.progress = vec![StationProgress::default(); stations.len()];
        }

        while let Some(station) = stations.get(self.station) {
            let index = self.station;
            let progress = &mut self.progress[index];

            if !progress.visited {
                progress.visited = true;
                progress.base = (0..station.len())
                    .find_map(|j| station.sample(j))
                    .map(|(lon, lat)| projection::project(lon, lat));
                if let Some((bx, by)) = progress.base {
                    output.buffer.set_base(index, bx as f32, by as f32)?;
                }
                output.positions.push(VertexPosition::open(index, station.start));
            }

            if progress.next_sample < station.len() {
                let j = progress.next_sample;
                if let (Some((lon, lat)), Some((bx, by))) = (station.sample(j), progress.base) {
                    let (px, py) = projection::project(lon, lat);
                    let timestamp = station.timestamp(j);
                    output
                        .buffer
                        .set_sample(index, timestamp, (px - bx) as f32, (py - by) as f32)?;
                    output
                        .positions
                        .push(VertexPosition::sample(index, station.start, timestamp));
                }
                progress.next_sample += 1;
                self.visited_samples += 1;
            }

            if progress.next_sample >= station.len() {
                output.positions.push(VertexPosition::close(index, station.start));
                self.station += 1;
            }

            if slice.exhausted() {
                return Ok(Control::Yield);
            }
        }
        Ok(Control::Done)
    }

    pub(crate) fn fraction(&self, analysis: &Analysis, station_count: usize) -> f64 {
        if analysis.total_samples == 0 {
            ratio(self.station, station_count)
        } else {
            ratio(self.visited_samples, analysis.total_samples)
        }
    }
}

/// Running cumulative common-mode drift, one entry per finished day.
#[derive(Debug, Default)]
pub(crate) struct MedianCursor {
    pub day: usize,
    pub cumulative_x: Vec<f64>,
    pub cumulative_y: Vec<f64>,
    scratch_x: Vec<f64>,
    scratch_y: Vec<f64>,
}

impl MedianCursor {
    pub(crate) fn run<C: Clock + ?Sized>(
        &mut self,
        stations: &[Station],
        output: &mut DriftOutput,
        slice: &Slice<'_, C>,
    ) -> Result<Control> {
        if stations.is_empty() {
            return Ok(Control::Done);
        }

        let days = output.buffer.timestamp_count();
        while self.day < days {
            let timestamp = output.buffer.timestamp(self.day);

            self.scratch_x.clear();
            self.scratch_y.clear();
            for (dx, dy) in stations.iter().filter_map(|s| daily_delta(s, timestamp)) {
                self.scratch_x.push(dx);
                self.scratch_y.push(dy);
            }

            let prev_x = self.cumulative_x.last().copied().unwrap_or(0.0);
            let prev_y = self.cumulative_y.last().copied().unwrap_or(0.0);
            let x = prev_x + median(&mut self.scratch_x);
            let y = prev_y + median(&mut self.scratch_y);

            output.buffer.set_median(timestamp, x as f32, y as f32)?;
            self.cumulative_x.push(x);
            self.cumulative_y.push(y);
            self.day += 1;

            if slice.exhausted() {
                return Ok(Control::Yield);
            }
        }
        Ok(Control::Done)
    }

    pub(crate) fn fraction(&self, output: Option<&DriftOutput>) -> f64 {
        let days = output.map_or(0, |o| o.buffer.timestamp_count());
        ratio(self.day, days)
    }
}

#[inline]
fn ratio(done: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        (done as f64 / total as f64).min(1.0)
    }
}
