//! Cooperative, resumable driver for the drift pipeline.
//!
//! The scheduler never blocks for longer than its slice budget. Each call to
//! [`ProcessingScheduler::resume`] does a bounded amount of work and returns a
//! [`Step`]; on [`Step::Yield`] the host waits `delay` (timer, animation frame,
//! async sleep, whatever its loop offers) and calls `resume` again with the
//! returned ticket.
//!
//! Phases run in order: Analyze -> BufferSetup -> Fill -> Medians -> Ready.
//! Calling [`ProcessingScheduler::set_data`] discards the current run; tickets
//! issued for it turn stale and are ignored.

mod median;
mod phases;
mod state;

use std::sync::Arc;
use std::time::Duration;

use crate::buffer::VertexBuffer;
use crate::clock::{Clock, SystemClock};
use crate::config::ProcessingConfig;
use crate::error::Result;
use crate::events::{Phase, ProcessingEvent, ProcessingObserver};
use crate::station::Station;
use crate::vertex::VertexPosition;

pub use median::{daily_delta, median};

use phases::{Control, Slice};
use state::ProcessingState;

/// Continuation handle for one `set_data` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What the host should do after a `resume` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Budget spent; call `resume(ticket)` again after `delay`.
    Yield { ticket: Ticket, delay: Duration },
    /// The run is complete; buffers are final.
    Ready,
    /// The ticket belongs to a superseded or aborted run. Drop it.
    Stale,
}

pub struct ProcessingScheduler<C: Clock = SystemClock> {
    config: ProcessingConfig,
    clock: C,
    generation: u64,
    state: Option<ProcessingState>,
}

impl ProcessingScheduler<SystemClock> {
    pub fn new(config: ProcessingConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for ProcessingScheduler<SystemClock> {
    fn default() -> Self {
        Self::new(ProcessingConfig::default())
    }
}

impl<C: Clock> ProcessingScheduler<C> {
    pub fn with_clock(config: ProcessingConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            generation: 0,
            state: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Start a fresh run over `stations`, discarding any run in flight.
    ///
    /// Stations are expected to be gap-filled already.
    pub fn set_data(&mut self, stations: impl Into<Arc<[Station]>>) -> Ticket {
        let stations = stations.into();
        self.generation = self.generation.wrapping_add(1);

        if let Some(previous) = self.state.as_ref() {
            if previous.phase != Phase::Ready {
                tracing::debug!(
                    superseded = previous.generation,
                    phase = %previous.phase,
                    "Discarding in-flight processing run"
                );
            }
        }

        tracing::info!(
            generation = self.generation,
            stations = stations.len(),
            "Starting processing run"
        );

        self.state = Some(ProcessingState::new(self.generation, stations));
        Ticket {
            generation: self.generation,
        }
    }

    /// Do one time-boxed slice of work for `ticket`'s run.
    ///
    /// A bounds error aborts the run: its state is dropped and later resumes of
    /// the same ticket return [`Step::Stale`].
    pub fn resume<O>(&mut self, ticket: Ticket, observer: &mut O) -> Result<Step>
    where
        O: ProcessingObserver + ?Sized,
    {
        if ticket.generation != self.generation {
            tracing::trace!(
                stale = ticket.generation,
                current = self.generation,
                "Dropping stale continuation"
            );
            return Ok(Step::Stale);
        }

        let Some(state) = self.state.as_mut() else {
            return Ok(Step::Stale);
        };
        if state.phase == Phase::Ready {
            return Ok(Step::Ready);
        }

        let slice = Slice::start(&self.clock, self.config.max_processing_time);
        match state.advance(&slice, observer) {
            Ok(Control::Yield) => {
                let phase = state.phase;
                let fraction = state.fraction();
                tracing::trace!(
                    generation = ticket.generation,
                    %phase,
                    fraction,
                    "Yielding to host"
                );
                observer.notify(ProcessingEvent::Progress { phase, fraction });
                Ok(Step::Yield {
                    ticket,
                    delay: self.config.yield_delay,
                })
            }
            Ok(Control::Done) => Ok(Step::Ready),
            Err(e) => {
                tracing::error!(
                    generation = ticket.generation,
                    phase = %state.phase,
                    error = %e,
                    "Processing run aborted"
                );
                self.state = None;
                Err(e)
            }
        }
    }

    /// Keep resuming `ticket` without waiting between slices.
    pub fn run_to_completion<O>(&mut self, ticket: Ticket, observer: &mut O) -> Result<Step>
    where
        O: ProcessingObserver + ?Sized,
    {
        let mut ticket = ticket;
        loop {
            match self.resume(ticket, observer)? {
                Step::Yield { ticket: next, .. } => ticket = next,
                done => return Ok(done),
            }
        }
    }

    /// Phase of the current run, if any.
    pub fn phase(&self) -> Option<Phase> {
        self.state.as_ref().map(|s| s.phase)
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.phase() == Some(Phase::Ready)
    }

    /// Available from BufferSetup on; updated in place while the run continues.
    pub fn vertex_buffer(&self) -> Option<&VertexBuffer> {
        self.state.as_ref()?.output.as_ref().map(|o| &o.buffer)
    }

    /// Vertex records emitted so far, in station order.
    pub fn positions(&self) -> Option<&[VertexPosition]> {
        self.state
            .as_ref()?
            .output
            .as_ref()
            .map(|o| o.positions.as_slice())
    }

    /// `Σ (len + 2)` over the stations, known once Analyze has finished.
    pub fn total_vertex_count(&self) -> Option<usize> {
        let state = self.state.as_ref()?;
        (state.phase > Phase::Analyze).then_some(state.analysis.total_vertex_count)
    }

    /// `(earliest, latest)` sample timestamps, known once Analyze has finished.
    pub fn extent(&self) -> Option<(i64, i64)> {
        let state = self.state.as_ref()?;
        if state.phase > Phase::Analyze {
            state.analysis.extent
        } else {
            None
        }
    }

    /// Cumulative median offsets (projected x, y) for every finished day,
    /// available once the Medians phase has started.
    pub fn median_offsets(&self) -> Option<(&[f64], &[f64])> {
        let state = self.state.as_ref()?;
        if state.phase < Phase::Medians {
            return None;
        }
        Some((&state.medians.cumulative_x, &state.medians.cumulative_y))
    }
}
