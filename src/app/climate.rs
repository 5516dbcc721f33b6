//! Storage-room climate: the latest temperature / humidity sample.
//!
//! The climate loop writes, the index view reads.  Only the newest sample
//! is kept; it is cleared when the sensor is given up on so a stale value
//! is never shown as current.

use parking_lot::Mutex;
use serde::Serialize;

/// One temperature / humidity sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

#[derive(Debug, Default)]
pub struct ClimateCell {
    latest: Mutex<Option<ClimateReading>>,
}

impl ClimateCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, reading: ClimateReading) {
        *self.latest.lock() = Some(reading);
    }

    pub fn clear(&self) {
        *self.latest.lock() = None;
    }

    pub fn latest(&self) -> Option<ClimateReading> {
        *self.latest.lock()
    }
}
