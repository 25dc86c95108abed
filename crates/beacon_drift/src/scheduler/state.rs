use std::sync::Arc;

use chrono::DateTime;

use crate::clock::Clock;
use crate::error::Result;
use crate::events::{Phase, ProcessingEvent, ProcessingObserver};
use crate::station::Station;

use super::phases::{Analysis, Control, DriftOutput, FillCursor, MedianCursor, Slice};

/// Everything one `set_data` run owns. Dropped as a whole when superseded.
#[derive(Debug)]
pub(crate) struct ProcessingState {
    pub generation: u64,
    pub stations: Arc<[Station]>,
    pub phase: Phase,
    pub analysis: Analysis,
    pub output: Option<DriftOutput>,
    pub fill: FillCursor,
    pub medians: MedianCursor,
}

impl ProcessingState {
    pub(crate) fn new(generation: u64, stations: Arc<[Station]>) -> Self {
        Self {
            generation,
            stations,
            phase: Phase::Analyze,
            analysis: Analysis::default(),
            output: None,
            fill: FillCursor::default(),
            medians: MedianCursor::default(),
        }
    }

    /// Run phases in order until the slice is spent or the pipeline is done.
    pub(crate) fn advance<C, O>(
        &mut self,
        slice: &Slice<'_, C>,
        observer: &mut O,
    ) -> Result<Control>
    where
        C: Clock + ?Sized,
        O: ProcessingObserver + ?Sized,
    {
        loop {
            match self.phase {
                Phase::Analyze => {
                    if self.analysis.run(&self.stations, slice) == Control::Yield {
                        return Ok(Control::Yield);
                    }
                    self.announce_extent(observer);
                    self.enter(Phase::BufferSetup);
                }
                Phase::BufferSetup => {
                    self.output = Some(DriftOutput::allocate(&self.analysis, self.stations.len()));
                    self.enter(Phase::Fill);
                }
                Phase::Fill => {
                    let output = self.output.get_or_insert_with(|| {
                        DriftOutput::allocate(&self.analysis, self.stations.len())
                    });
                    if self.fill.run(&self.stations, output, slice)? == Control::Yield {
                        return Ok(Control::Yield);
                    }
                    self.enter(Phase::Medians);
                }
                Phase::Medians => {
                    let output = self.output.get_or_insert_with(|| {
                        DriftOutput::allocate(&self.analysis, self.stations.len())
                    });
                    if self.medians.run(&self.stations, output, slice)? == Control::Yield {
                        return Ok(Control::Yield);
                    }
                    self.enter(Phase::Ready);
                    observer.notify(ProcessingEvent::Progress {
                        phase: Phase::Ready,
                        fraction: 1.0,
                    });
                    observer.notify(ProcessingEvent::Ready);
                    return Ok(Control::Done);
                }
                Phase::Ready => return Ok(Control::Done),
            }
        }
    }

    /// Completion of the current phase in `[0, 1]`.
    pub(crate) fn fraction(&self) -> f64 {
        let station_count = self.stations.len();
        match self.phase {
            Phase::Analyze => self.analysis.fraction(station_count),
            Phase::BufferSetup => 1.0,
            Phase::Fill => self.fill.fraction(&self.analysis, station_count),
            Phase::Medians => self.medians.fraction(self.output.as_ref()),
            Phase::Ready => 1.0,
        }
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(
            generation = self.generation,
            from = %self.phase,
            to = %phase,
            "Processing phase transition"
        );
        self.phase = phase;
    }

    fn announce_extent<O: ProcessingObserver + ?Sized>(&self, observer: &mut O) {
        let Some((start, end)) = self.analysis.extent else {
            tracing::debug!(
                generation = self.generation,
                "No samples; skipping extent notification"
            );
            return;
        };

        match (DateTime::from_timestamp(start, 0), DateTime::from_timestamp(end, 0)) {
            (Some(start), Some(end)) => {
                tracing::info!(
                    generation = self.generation,
                    stations = self.stations.len(),
                    vertices = self.analysis.total_vertex_count,
                    %start,
                    %end,
                    "Dataset analyzed"
                );
                observer.notify(ProcessingEvent::Extent { start, end });
            }
            _ => tracing::warn!(start, end, "Dataset extent is not representable as a date"),
        }
    }
}
