//! Linear gap filling for daily coordinate series.

use crate::station::{is_missing, Station};

/// Replace every missing run that has a valid value on both sides with the
/// straight line between those two values.
///
/// Leading and trailing missing runs are left as they are, and a series without
/// any valid value is not touched.
pub fn fill_gaps(values: &mut [f64]) {
    let n = values.len();
    let Some(mut x1) = values.iter().position(|&v| !is_missing(v)) else {
        return;
    };

    loop {
        let mut gap = x1 + 1;
        while gap < n && !is_missing(values[gap]) {
            gap += 1;
        }
        if gap >= n {
            return;
        }
        x1 = gap - 1;

        let mut x2 = gap;
        while x2 < n && is_missing(values[x2]) {
            x2 += 1;
        }
        if x2 >= n {
            return;
        }

        let (y1, y2) = (values[x1], values[x2]);
        let slope = (y2 - y1) / (x2 - x1) as f64;
        for (j, v) in values.iter_mut().enumerate().take(x2).skip(gap) {
            *v = y1 + slope * (j - x1) as f64;
        }

        x1 = x2;
    }
}

impl Station {
    /// Fill longitude and latitude gaps independently.
    pub fn fill_gaps(&mut self) {
        fill_gaps(&mut self.lon);
        fill_gaps(&mut self.lat);
    }
}

/// Fill gaps in every station of a dataset.
pub fn fill_station_gaps(stations: &mut [Station]) {
    for station in stations.iter_mut() {
        station.fill_gaps();
    }
    tracing::debug!(stations = stations.len(), "Filled coordinate gaps");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_gap_is_linear() {
        let mut v = vec![1.0, 0.0, 3.0];
        fill_gaps(&mut v);
        assert_eq!(v, vec![1.0, 2.0, 3.0]);

        let mut v = vec![10.0, 0.0, 0.0, 0.0, 2.0];
        fill_gaps(&mut v);
        assert_eq!(v, vec![10.0, 8.0, 6.0, 4.0, 2.0]);
    }

    #[test]
    fn several_gaps_each_use_their_own_endpoints() {
        let mut v = vec![1.0, 0.0, 3.0, 4.0, 0.0, 0.0, 7.0];
        fill_gaps(&mut v);
        assert_eq!(v, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn leading_and_trailing_gaps_are_kept() {
        let mut v = vec![0.0, 0.0, 5.0, 0.0, 9.0, 0.0];
        fill_gaps(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 5.0, 7.0, 9.0, 0.0]);
    }

    #[test]
    fn all_missing_and_empty_are_untouched() {
        let mut v = vec![0.0; 4];
        fill_gaps(&mut v);
        assert_eq!(v, vec![0.0; 4]);

        let mut e: Vec<f64> = Vec::new();
        fill_gaps(&mut e);
        assert!(e.is_empty());
    }

    #[test]
    fn nan_counts_as_missing() {
        let mut v = vec![2.0, f64::NAN, 4.0];
        fill_gaps(&mut v);
        assert_eq!(v, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn refilling_is_a_no_op() {
        let mut v = vec![0.0, -118.25, 0.0, 0.0, -118.31, 0.0, -118.4, 0.0];
        fill_gaps(&mut v);
        let once = v.clone();
        fill_gaps(&mut v);
        assert_eq!(v, once);
    }

    #[test]
    fn station_fills_both_axes_independently() {
        let mut s = Station::new("X", 0, vec![1.0, 0.0, 3.0], vec![0.0, 5.0, 0.0]);
        s.fill_gaps();
        assert_eq!(s.lon, vec![1.0, 2.0, 3.0]);
        assert_eq!(s.lat, vec![0.0, 5.0, 0.0]);
    }
}
