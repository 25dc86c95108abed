//! Renderer-facing contract: viewport camera, user tunables and the uniform
//! block the drift shader reads next to the packed [`VertexBuffer`].

use std::ops::Range;

use glam::Mat4;

use crate::buffer::{Column, Row, VertexBuffer};
use crate::error::{DriftError, Result};
use crate::projection;
use crate::station::SECONDS_PER_DAY;

/// Projected width of the whole world.
const WORLD_SIZE: f64 = 256.0;

/// Map view reported by the map widget whenever it pans or zooms.
/// Edges are in degrees, sizes and offsets in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl ViewportBounds {
    /// `(min_x, min_y, max_x, max_y)` in projected units. A view crossing the
    /// antimeridian gets an east edge beyond 256.
    pub fn projected_rect(&self) -> (f64, f64, f64, f64) {
        let min_x = projection::x(self.west);
        let mut max_x = projection::x(self.east);
        if max_x < min_x {
            max_x += WORLD_SIZE;
        }
        (min_x, projection::y(self.south), max_x, projection::y(self.north))
    }

    /// Orthographic transform from projected coordinates to clip space.
    pub fn view_proj(&self) -> Mat4 {
        let (min_x, min_y, max_x, max_y) = self.projected_rect();
        Mat4::orthographic_rh(
            min_x as f32,
            max_x as f32,
            min_y as f32,
            max_y as f32,
            -1.0,
            1.0,
        )
    }
}

/// Settings the control panel may change at any time without re-running the
/// pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams {
    /// Exponent of the drift exaggeration; offsets are scaled by `10^magnification`.
    pub magnification: f32,
    /// Share of the fleet median subtracted from every offset, `0..=1`.
    pub median_correction: f32,
    /// Epoch seconds bounding the drawn time range.
    pub visible_start: i64,
    pub visible_end: i64,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            magnification: 4.0,
            median_correction: 1.0,
            visible_start: i64::MIN,
            visible_end: i64::MAX,
        }
    }
}

impl RenderParams {
    pub fn validate(&self) -> Result<()> {
        if !self.magnification.is_finite() {
            return Err(DriftError::InvalidRenderParams(
                "magnification must be finite".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.median_correction) {
            return Err(DriftError::InvalidRenderParams(format!(
                "median_correction {} outside 0..=1",
                self.median_correction
            )));
        }
        if self.visible_start > self.visible_end {
            return Err(DriftError::InvalidRenderParams(
                "visible_start is after visible_end".to_string(),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        10f32.powf(self.magnification)
    }

    /// Day indices of `buffer` that fall inside the visible time range.
    pub fn visible_columns(&self, buffer: &VertexBuffer) -> Range<usize> {
        let count = buffer.timestamp_count() as i64;
        let start = buffer.start_timestamp();

        let first = if self.visible_start <= start {
            0
        } else {
            self.visible_start
                .saturating_sub(start)
                .saturating_add(SECONDS_PER_DAY - 1)
                / SECONDS_PER_DAY
        };
        let last = if self.visible_end < start {
            0
        } else {
            (self.visible_end.saturating_sub(start) / SECONDS_PER_DAY).saturating_add(1)
        };

        let first = first.clamp(0, count) as usize;
        let last = last.clamp(0, count) as usize;
        first..last.max(first)
    }

    /// Where the shader draws `station` on `day`, in projected units.
    ///
    /// `base + (offset - median * median_correction) * scale`
    pub fn displaced(
        &self,
        buffer: &VertexBuffer,
        station: usize,
        day: usize,
    ) -> Result<(f64, f64)> {
        let (bx, by) = buffer.get(Row::Station(station), Column::Base)?;
        let (ox, oy) = buffer.get(Row::Station(station), Column::Day(day))?;
        let (mx, my) = buffer.get(Row::Median, Column::Day(day))?;

        let scale = f64::from(self.scale());
        let correction = f64::from(self.median_correction);
        Ok((
            f64::from(bx) + (f64::from(ox) - f64::from(mx) * correction) * scale,
            f64::from(by) + (f64::from(oy) - f64::from(my) * correction) * scale,
        ))
    }

    pub fn uniform(&self, viewport: &ViewportBounds, buffer: &VertexBuffer) -> DriftUniformStd140 {
        let visible = self.visible_columns(buffer);
        DriftUniformStd140 {
            view_proj: viewport.view_proj().to_cols_array_2d(),
            texture_size: [buffer.width() as f32, buffer.height() as f32],
            scale: self.scale(),
            median_correction: self.median_correction,
            visible_days: [visible.start as f32, visible.end as f32],
            first_day: buffer.start_timestamp().div_euclid(SECONDS_PER_DAY) as f32,
            _pad0: 0.0,
        }
    }
}

/// Uniform block of the drift line shader, std140 layout.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable, Debug)]
pub struct DriftUniformStd140 {
    /// Projected coordinates to clip space.
    pub view_proj: [[f32; 4]; 4],
    /// Packed texture size in texels.
    pub texture_size: [f32; 2],
    pub scale: f32,
    pub median_correction: f32,
    /// Half-open day-index range to draw.
    pub visible_days: [f32; 2],
    /// Buffer start as whole days since the epoch.
    pub first_day: f32,
    pub _pad0: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = SECONDS_PER_DAY;

    fn viewport() -> ViewportBounds {
        ViewportBounds {
            north: 50.0,
            south: 30.0,
            east: -100.0,
            west: -130.0,
            width: 800.0,
            height: 600.0,
            top: 0.0,
            left: 0.0,
            bottom: 600.0,
            right: 800.0,
        }
    }

    #[test]
    fn view_proj_maps_corners_to_clip_edges() {
        let vp = viewport();
        let m = vp.view_proj();
        let (min_x, min_y, max_x, max_y) = vp.projected_rect();
        let lo = m.project_point3(glam::Vec3::new(min_x as f32, min_y as f32, 0.0));
        let hi = m.project_point3(glam::Vec3::new(max_x as f32, max_y as f32, 0.0));
        assert!((lo.x + 1.0).abs() < 1e-4 && (lo.y + 1.0).abs() < 1e-4);
        assert!((hi.x - 1.0).abs() < 1e-4 && (hi.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn antimeridian_view_wraps_east_edge() {
        let vp = ViewportBounds {
            east: -170.0,
            west: 170.0,
            ..viewport()
        };
        let (min_x, _, max_x, _) = vp.projected_rect();
        assert!(max_x > min_x);
        assert!(max_x > 256.0);
    }

    #[test]
    fn visible_columns_clamp_to_buffer() {
        let buffer = VertexBuffer::new(1, 10 * DAY, 19 * DAY);
        let all = RenderParams::default();
        assert_eq!(all.visible_columns(&buffer), 0..10);

        let mid = RenderParams {
            visible_start: 12 * DAY,
            visible_end: 14 * DAY,
            ..all
        };
        assert_eq!(mid.visible_columns(&buffer), 2..5);

        let partial_day = RenderParams {
            visible_start: 12 * DAY + 1,
            visible_end: 14 * DAY + 1,
            ..all
        };
        assert_eq!(partial_day.visible_columns(&buffer), 3..5);

        let before = RenderParams {
            visible_start: 0,
            visible_end: 5 * DAY,
            ..all
        };
        assert!(before.visible_columns(&buffer).is_empty());
    }

    #[test]
    fn displaced_subtracts_scaled_median() {
        let mut buffer = VertexBuffer::new(1, 0, DAY);
        buffer.set_base(0, 100.0, 50.0).unwrap();
        buffer.set_sample(0, DAY, 0.5, 0.25).unwrap();
        buffer.set_median(DAY, 0.25, 0.25).unwrap();

        let params = RenderParams {
            magnification: 1.0,
            median_correction: 0.5,
            ..RenderParams::default()
        };
        let (x, y) = params.displaced(&buffer, 0, 1).unwrap();
        assert!((x - (100.0 + (0.5 - 0.125) * 10.0)).abs() < 1e-4);
        assert!((y - (50.0 + (0.25 - 0.125) * 10.0)).abs() < 1e-4);
        assert!(params.displaced(&buffer, 1, 0).is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_settings() {
        assert!(RenderParams::default().validate().is_ok());
        let bad = RenderParams {
            median_correction: 1.5,
            ..RenderParams::default()
        };
        assert!(bad.validate().is_err());
        let reversed = RenderParams {
            visible_start: 10,
            visible_end: 0,
            ..RenderParams::default()
        };
        assert!(reversed.validate().is_err());
    }

    #[test]
    fn uniform_is_std140_sized() {
        assert_eq!(std::mem::size_of::<DriftUniformStd140>(), 96);
        let buffer = VertexBuffer::new(3, 2 * DAY, 6 * DAY);
        let u = RenderParams::default().uniform(&viewport(), &buffer);
        assert_eq!(u.texture_size, [3.0, 4.0]);
        assert_eq!(u.visible_days, [0.0, 5.0]);
        assert_eq!(u.first_day, 2.0);
        assert_eq!(bytemuck::bytes_of(&u).len(), 96);
    }
}
