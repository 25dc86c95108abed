//! Notifications the scheduler sends to its host.

use std::fmt;

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;

/// Pipeline phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    Analyze,
    BufferSetup,
    Fill,
    Medians,
    Ready,
}

impl Phase {
    /// Label shown to the user next to the progress bar.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Analyze => "analyzing",
            Phase::BufferSetup => "allocating",
            Phase::Fill => "filling",
            Phase::Medians => "medians",
            Phase::Ready => "ready",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingEvent {
    /// Sent on every yield and once on completion. `fraction` is in `[0, 1]`.
    Progress { phase: Phase, fraction: f64 },
    /// Sent once when Analyze finishes, so a time-range control can be bounded.
    Extent {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// The buffer and position array are complete.
    Ready,
}

/// Receives scheduler notifications.
pub trait ProcessingObserver {
    fn notify(&mut self, event: ProcessingEvent);
}

impl ProcessingObserver for Vec<ProcessingEvent> {
    fn notify(&mut self, event: ProcessingEvent) {
        self.push(event);
    }
}

/// Hand events to another thread, e.g. the UI loop.
impl ProcessingObserver for Sender<ProcessingEvent> {
    fn notify(&mut self, event: ProcessingEvent) {
        if self.send(event).is_err() {
            tracing::debug!("Dropped processing event (receiver gone)");
        }
    }
}

impl<O: ProcessingObserver + ?Sized> ProcessingObserver for &mut O {
    fn notify(&mut self, event: ProcessingEvent) {
        (**self).notify(event);
    }
}
