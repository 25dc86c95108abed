//! Per-vertex records for the drift line renderer.

/// One vertex of a station's drift polyline.
///
/// Intended as a storage-buffer record indexed by vertex id; each `f64` sits
/// on an 8-byte boundary. Reading the `f64` fields on the GPU needs
/// `SHADER_F64`, and binding them as vertex attributes instead needs
/// `VERTEX_ATTRIBUTE_64BIT`.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct VertexPosition {
    /// Texture row of the station (without the median row offset).
    pub station_index: u32,
    pub _pad0: u32,
    /// Epoch seconds of the station's first sample.
    pub station_start: f64,
    /// Epoch seconds of this sample; `±inf` for line-break sentinels.
    pub timestamp: f64,
}

impl VertexPosition {
    #[inline]
    pub fn sample(station_index: usize, station_start: i64, timestamp: i64) -> Self {
        Self {
            station_index: station_index as u32,
            _pad0: 0,
            station_start: station_start as f64,
            timestamp: timestamp as f64,
        }
    }

    /// Sentinel placed before a station's first vertex.
    #[inline]
    pub fn open(station_index: usize, station_start: i64) -> Self {
        Self {
            timestamp: f64::NEG_INFINITY,
            ..Self::sample(station_index, station_start, 0)
        }
    }

    /// Sentinel placed after a station's last vertex.
    #[inline]
    pub fn close(station_index: usize, station_start: i64) -> Self {
        Self {
            timestamp: f64::INFINITY,
            ..Self::sample(station_index, station_start, 0)
        }
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.timestamp.is_infinite()
    }
}
