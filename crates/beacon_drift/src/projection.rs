//! Spherical web-mercator forward/inverse projection.
//!
//! The projected plane spans `[0, 256)` in both axes for the whole world, which
//! matches the tile coordinate space a slippy-map renderer uses at zoom 0.
//! `y` grows northwards.

use std::f64::consts::PI;

/// Scale factor: `256 / (2 * PI)`.
pub const K: f64 = 128.0 / PI;

/// Largest latitude the projection maps to a finite value in practice.
pub const MAX_LAT_DEG: f64 = 85.051_128_779_806_59;

#[inline]
pub fn x(lon_deg: f64) -> f64 {
    K * (lon_deg.to_radians() + PI)
}

#[inline]
pub fn y(lat_deg: f64) -> f64 {
    K * (PI - (PI / 4.0 - lat_deg.to_radians() / 2.0).tan().ln())
}

#[inline]
pub fn project(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    (x(lon_deg), y(lat_deg))
}

/// Inverse of [`x`].
#[inline]
pub fn lon(x: f64) -> f64 {
    (x / K - PI).to_degrees()
}

/// Inverse of [`y`].
#[inline]
pub fn lat(y: f64) -> f64 {
    (PI / 2.0 - 2.0 * (PI - y / K).exp().atan()).to_degrees()
}
