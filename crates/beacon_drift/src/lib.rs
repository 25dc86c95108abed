//! Beacon drift: incremental processing of daily GNSS beacon positions into
//! render-ready packed buffers.
//!
//! - Fills missing daily samples by linear interpolation.
//! - Projects geodetic degrees to spherical web-mercator (256 units per world).
//! - Packs per-station, per-day offsets from a base coordinate into an RGBA f32
//!   texture, plus one reserved row of cumulative fleet medians.
//! - Drives the work through a resumable scheduler that yields to the host after
//!   a bounded time slice and reports progress through typed events.
//!
//! Texture layout (RGBA f32, row-major):
//!   width  = ceil((day_count + 1) / 2)
//!   height = station_count + 1
//!   row 0          : cumulative median offsets (no base)
//!   row 1 + s      : station `s`
//!   float offset   : (row + 1) * width * 4 + (day + 1) * 2
//!                    where row = -1 for the median row and day = -1 for the base
//!
//! So texel 0 of a station row holds the base in R,G and day 0 in B,A; texel 1
//! holds day 1 in R,G and day 2 in B,A, and so on. Odd days land in R,G and even
//! days in B,A.

pub mod buffer;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod interpolate;
pub mod projection;
pub mod render;
pub mod scheduler;
pub mod station;
pub mod vertex;

pub use buffer::{Column, Row, VertexBuffer};
pub use clock::{Clock, SystemClock};
pub use config::ProcessingConfig;
pub use error::{DriftError, Result};
pub use events::{Phase, ProcessingEvent, ProcessingObserver};
pub use interpolate::{fill_gaps, fill_station_gaps};
pub use render::{DriftUniformStd140, RenderParams, ViewportBounds};
pub use scheduler::{ProcessingScheduler, Step, Ticket};
pub use station::{Station, SECONDS_PER_DAY};
pub use vertex::VertexPosition;
