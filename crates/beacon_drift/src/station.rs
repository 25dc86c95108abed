use serde::Deserialize;

use crate::error::{DriftError, Result};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Missing readings are stored as `0.0`; NaN is treated the same way.
#[inline]
pub fn is_missing(value: f64) -> bool {
    value == 0.0 || value.is_nan()
}

/// One beacon's daily position history.
///
/// `lon[i]`/`lat[i]` is the sample for `start + i * SECONDS_PER_DAY`. A
/// coordinate of exactly `0.0` marks the sample as missing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Station {
    pub name: String,
    /// Epoch seconds of the first sample, aligned to a day boundary.
    pub start: i64,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
}

impl Station {
    pub fn new(name: impl Into<String>, start: i64, lon: Vec<f64>, lat: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            start,
            lon,
            lat,
        }
    }

    /// Number of daily samples, missing ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.lon.len().min(self.lat.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamp of the last sample, or `None` for a station without samples.
    pub fn end(&self) -> Option<i64> {
        let last = self.len().checked_sub(1)?;
        Some(self.start + SECONDS_PER_DAY * last as i64)
    }

    /// Timestamp of sample `index`.
    #[inline]
    pub fn timestamp(&self, index: usize) -> i64 {
        self.start + SECONDS_PER_DAY * index as i64
    }

    /// `(lon, lat)` in degrees, or `None` when either coordinate is missing.
    #[inline]
    pub fn sample(&self, index: usize) -> Option<(f64, f64)> {
        let lon = *self.lon.get(index)?;
        let lat = *self.lat.get(index)?;
        if is_missing(lon) || is_missing(lat) {
            None
        } else {
            Some((lon, lat))
        }
    }

    /// Sample index covering `timestamp`, if the station's range includes it.
    pub fn index_at(&self, timestamp: i64) -> Option<usize> {
        let end = self.end()?;
        if timestamp < self.start || timestamp > end {
            return None;
        }
        Some(((timestamp - self.start) / SECONDS_PER_DAY) as usize)
    }

    /// Shape checks the loading collaborator runs before handing data over.
    pub fn validate(&self) -> Result<()> {
        if self.lon.len() != self.lat.len() {
            return Err(self.invalid(format!(
                "lon has {} samples but lat has {}",
                self.lon.len(),
                self.lat.len()
            )));
        }
        if self.start.rem_euclid(SECONDS_PER_DAY) != 0 {
            return Err(self.invalid(format!(
                "start {} is not aligned to a day boundary",
                self.start
            )));
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> DriftError {
        DriftError::InvalidStation {
            name: self.name.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_and_index_lookup() {
        let s = Station::new("AAAA", 86_400 * 10, vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]);
        assert_eq!(s.end(), Some(86_400 * 12));
        assert_eq!(s.index_at(86_400 * 11), Some(1));
        assert_eq!(s.index_at(86_400 * 9), None);
        assert_eq!(s.index_at(86_400 * 13), None);
        assert_eq!(Station::new("E", 0, vec![], vec![]).end(), None);
    }

    #[test]
    fn zero_in_either_coordinate_is_missing() {
        let s = Station::new("BBBB", 0, vec![1.0, 0.0, 3.0], vec![4.0, 5.0, 0.0]);
        assert_eq!(s.sample(0), Some((1.0, 4.0)));
        assert_eq!(s.sample(1), None);
        assert_eq!(s.sample(2), None);
        assert_eq!(s.sample(3), None);
    }

    #[test]
    fn validate_rejects_mismatched_and_unaligned() {
        let ok = Station::new("OK", 86_400, vec![1.0], vec![1.0]);
        assert!(ok.validate().is_ok());

        let short = Station::new("SHORT", 0, vec![1.0, 2.0], vec![1.0]);
        assert!(matches!(
            short.validate(),
            Err(DriftError::InvalidStation { ref name, .. }) if name == "SHORT"
        ));

        let unaligned = Station::new("NOON", 43_200, vec![1.0], vec![1.0]);
        assert!(unaligned.validate().is_err());
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"[{"name":"P123","start":1262304000,"lon":[-120.5,0],"lat":[38.1,0]}]"#;
        let stations: Vec<Station> = serde_json::from_str(json).unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].name, "P123");
        assert_eq!(stations[0].sample(1), None);
    }
}
