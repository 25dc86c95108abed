//! Packed RGBA f32 texture holding per-station, per-day drift offsets.
//!
//! The layout is shared bit-for-bit with the shader that decodes it; see the
//! crate docs for the address formula. Do not change [`texel_offset`] without
//! changing the consumer.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{DriftError, Result};
use crate::station::SECONDS_PER_DAY;

/// Floats per texel (RGBA).
pub const CHANNELS: usize = 4;

/// Texture row selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Row {
    /// Reserved row `-1`: cumulative fleet median.
    Median,
    Station(usize),
}

impl Row {
    /// Physical texture row (`row + 1`).
    #[inline]
    pub fn texel_row(self) -> usize {
        match self {
            Row::Median => 0,
            Row::Station(index) => index + 1,
        }
    }
}

/// Time selector inside a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Reserved column `-1`: the station's base coordinate.
    Base,
    /// Day index relative to the buffer start.
    Day(usize),
}

impl Column {
    /// Index of the coordinate pair along the row (`time_index + 1`).
    #[inline]
    pub fn pair_index(self) -> usize {
        match self {
            Column::Base => 0,
            Column::Day(day) => day + 1,
        }
    }
}

/// Where a coordinate pair lives in texture space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexelSlot {
    pub texel_x: usize,
    pub texel_y: usize,
    /// 0 for the R,G pair, 2 for the B,A pair.
    pub channel: usize,
}

/// Float offset of `(row, column)` in a buffer `width` texels wide.
#[inline]
pub fn texel_offset(width: usize, row: Row, column: Column) -> usize {
    row.texel_row() * width * CHANNELS + column.pair_index() * 2
}

#[derive(Debug)]
pub struct VertexBuffer {
    station_count: usize,
    start_timestamp: i64,
    end_timestamp: i64,
    timestamp_count: usize,
    width: usize,
    height: usize,
    data: Vec<f32>,
    dirty: AtomicBool,
}

impl VertexBuffer {
    /// Allocate a zeroed buffer covering `[start_timestamp, end_timestamp]`.
    pub fn new(station_count: usize, start_timestamp: i64, end_timestamp: i64) -> Self {
        let span = (end_timestamp - start_timestamp).max(0);
        let timestamp_count = (span / SECONDS_PER_DAY) as usize + 1;
        let width = (timestamp_count + 1).div_ceil(2);
        let height = station_count + 1;

        tracing::debug!(
            station_count,
            timestamp_count,
            width,
            height,
            "Allocating vertex buffer"
        );

        Self {
            station_count,
            start_timestamp,
            end_timestamp,
            timestamp_count,
            width,
            height,
            data: vec![0.0; width * height * CHANNELS],
            dirty: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn station_count(&self) -> usize {
        self.station_count
    }

    /// Number of whole days covered, both ends included.
    #[inline]
    pub fn timestamp_count(&self) -> usize {
        self.timestamp_count
    }

    #[inline]
    pub fn start_timestamp(&self) -> i64 {
        self.start_timestamp
    }

    #[inline]
    pub fn end_timestamp(&self) -> i64 {
        self.end_timestamp
    }

    #[inline]
    pub fn offset(&self, row: Row, column: Column) -> usize {
        texel_offset(self.width, row, column)
    }

    pub fn slot(&self, row: Row, column: Column) -> TexelSlot {
        let pair = column.pair_index();
        TexelSlot {
            texel_x: pair / 2,
            texel_y: row.texel_row(),
            channel: (pair % 2) * 2,
        }
    }

    /// Day index of `timestamp`, checked against the buffer's range.
    pub fn time_index(&self, timestamp: i64) -> Result<usize> {
        if timestamp < self.start_timestamp || timestamp > self.end_timestamp {
            return Err(DriftError::TimestampOutOfRange {
                timestamp,
                start: self.start_timestamp,
                end: self.end_timestamp,
            });
        }
        Ok(((timestamp - self.start_timestamp) / SECONDS_PER_DAY) as usize)
    }

    #[inline]
    pub fn timestamp(&self, time_index: usize) -> i64 {
        self.start_timestamp + SECONDS_PER_DAY * time_index as i64
    }

    pub fn set_base(&mut self, station_index: usize, x: f32, y: f32) -> Result<()> {
        let row = self.station_row(station_index)?;
        self.write(row, Column::Base, x, y);
        Ok(())
    }

    pub fn set_sample(
        &mut self,
        station_index: usize,
        timestamp: i64,
        x: f32,
        y: f32,
    ) -> Result<()> {
        let row = self.station_row(station_index)?;
        let day = self.time_index(timestamp)?;
        self.write(row, Column::Day(day), x, y);
        Ok(())
    }

    pub fn set_median(&mut self, timestamp: i64, x: f32, y: f32) -> Result<()> {
        let day = self.time_index(timestamp)?;
        self.write(Row::Median, Column::Day(day), x, y);
        Ok(())
    }

    /// Read a pair back with the same addressing the writers use.
    pub fn get(&self, row: Row, column: Column) -> Result<(f32, f32)> {
        if let Row::Station(index) = row {
            self.station_row(index)?;
        }
        if let Column::Day(day) = column {
            if day >= self.timestamp_count {
                return Err(DriftError::TimestampOutOfRange {
                    timestamp: self.timestamp(day),
                    start: self.start_timestamp,
                    end: self.end_timestamp,
                });
            }
        }
        let at = self.offset(row, column);
        Ok((self.data[at], self.data[at + 1]))
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Raw texel bytes for a `Rgba32Float` texture upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Relaxed)
    }

    /// Clear the dirty flag, returning whether a re-upload is due.
    #[inline]
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::Relaxed)
    }

    fn station_row(&self, station_index: usize) -> Result<Row> {
        if station_index >= self.station_count {
            return Err(DriftError::StationOutOfRange {
                index: station_index,
                count: self.station_count,
            });
        }
        Ok(Row::Station(station_index))
    }

    #[inline]
    fn write(&mut self, row: Row, column: Column, x: f32, y: f32) {
        let at = self.offset(row, column);
        self.data[at] = x;
        self.data[at + 1] = y;
        self.dirty.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const DAY: i64 = SECONDS_PER_DAY;

    #[test]
    fn dimensions_follow_day_and_station_counts() {
        let b = VertexBuffer::new(2, 0, 2 * DAY);
        assert_eq!(b.timestamp_count(), 3);
        assert_eq!(b.width(), 2);
        assert_eq!(b.height(), 3);
        assert_eq!(b.as_slice().len(), 2 * 3 * 4);

        let b = VertexBuffer::new(5, 10 * DAY, 13 * DAY);
        assert_eq!(b.timestamp_count(), 4);
        assert_eq!(b.width(), 3);
        assert_eq!(b.as_bytes().len(), 3 * 6 * 4 * 4);
    }

    #[test]
    fn offsets_are_injective_and_in_bounds() {
        for (stations, days) in [(1usize, 1i64), (3, 4), (4, 7), (2, 10)] {
            let b = VertexBuffer::new(stations, 0, (days - 1) * DAY);
            let rows = std::iter::once(Row::Median).chain((0..stations).map(Row::Station));
            let mut seen = HashSet::new();
            for row in rows {
                let columns =
                    std::iter::once(Column::Base).chain((0..days as usize).map(Column::Day));
                for column in columns {
                    let at = b.offset(row, column);
                    assert!(at + 1 < b.as_slice().len());
                    assert!(seen.insert(at), "collision at {row:?} {column:?}");
                }
            }
        }
    }

    #[test]
    fn parity_selects_channel_pair() {
        let b = VertexBuffer::new(2, 0, 9 * DAY);
        assert_eq!(b.slot(Row::Station(0), Column::Base).channel, 0);
        for day in 0..10 {
            let slot = b.slot(Row::Station(1), Column::Day(day));
            let expected = if day % 2 == 1 { 0 } else { 2 };
            assert_eq!(slot.channel, expected, "day {day}");
            assert_eq!(slot.texel_x, (day + 1) / 2);
            assert_eq!(slot.texel_y, 2);
            let at = b.offset(Row::Station(1), Column::Day(day));
            assert_eq!(at, (slot.texel_y * b.width() + slot.texel_x) * 4 + slot.channel);
        }
    }

    #[test]
    fn writes_land_in_their_slot() {
        let mut b = VertexBuffer::new(2, 100 * DAY, 103 * DAY);
        b.set_base(1, 64.0, 96.0).unwrap();
        b.set_sample(1, 102 * DAY, 0.5, -0.25).unwrap();
        b.set_median(101 * DAY, 0.125, 0.0625).unwrap();

        assert_eq!(b.get(Row::Station(1), Column::Base).unwrap(), (64.0, 96.0));
        assert_eq!(b.get(Row::Station(1), Column::Day(2)).unwrap(), (0.5, -0.25));
        assert_eq!(b.get(Row::Median, Column::Day(1)).unwrap(), (0.125, 0.0625));
        assert_eq!(b.get(Row::Station(0), Column::Day(2)).unwrap(), (0.0, 0.0));

        let raw = b.as_slice();
        let at = (2 * b.width()) * 4;
        assert_eq!(&raw[at..at + 2], &[64.0, 96.0]);
    }

    #[test]
    fn out_of_range_writes_fail() {
        let mut b = VertexBuffer::new(2, 0, 3 * DAY);
        assert_eq!(
            b.set_base(2, 1.0, 1.0),
            Err(DriftError::StationOutOfRange { index: 2, count: 2 })
        );
        assert!(matches!(
            b.set_sample(0, 4 * DAY, 1.0, 1.0),
            Err(DriftError::TimestampOutOfRange { .. })
        ));
        assert!(b.set_sample(0, -DAY, 1.0, 1.0).is_err());
        assert!(b.set_median(5 * DAY, 1.0, 1.0).is_err());
        assert!(b.get(Row::Median, Column::Day(4)).is_err());
    }

    #[test]
    fn dirty_flag_coalesces() {
        let mut b = VertexBuffer::new(1, 0, DAY);
        assert!(b.take_dirty());
        assert!(!b.take_dirty());
        b.set_base(0, 1.0, 2.0).unwrap();
        b.set_sample(0, DAY, 1.0, 2.0).unwrap();
        assert!(b.is_dirty());
        assert!(b.take_dirty());
        assert!(!b.is_dirty());
    }
}
