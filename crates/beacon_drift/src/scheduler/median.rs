//! Common-mode drift helpers.

use crate::projection;
use crate::station::Station;

/// Statistical median; the mean of the two middle values for even counts and
/// `0.0` for an empty set. Reorders `values`.
pub fn median(values: &mut [f64]) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sort_unstable_by(f64::total_cmp);
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Projected movement of `station` on the day at `timestamp`, measured from
/// its nearest earlier valid sample.
///
/// `None` when the day is outside the station's range, the day's sample is
/// missing, or no earlier valid sample exists.
pub fn daily_delta(station: &Station, timestamp: i64) -> Option<(f64, f64)> {
    let today = station.index_at(timestamp)?;
    let (lon, lat) = station.sample(today)?;
    let (prev_lon, prev_lat) = (0..today).rev().find_map(|k| station.sample(k))?;

    Some((
        projection::x(lon) - projection::x(prev_lon),
        projection::y(lat) - projection::y(prev_lat),
    ))
}
