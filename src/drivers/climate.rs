//! Climate monitor loop.
//!
//! Samples the [`SensorPort`] every `period` and publishes the result to
//! a [`ClimateCell`].  A transient failure is logged and retried after
//! `retry`; a fatal one clears the cell, releases the sensor and ends the
//! loop without taking the rest of the controller down.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

use crate::app::climate::ClimateCell;
use crate::app::ports::{SensorError, SensorPort};
use crate::drivers::task::ShutdownSignal;

pub struct ClimateMonitor<S> {
    sensor: S,
    cell: Arc<ClimateCell>,
    period: Duration,
    retry: Duration,
}

impl<S: SensorPort> ClimateMonitor<S> {
    pub fn new(sensor: S, cell: Arc<ClimateCell>, period: Duration, retry: Duration) -> Self {
        Self {
            sensor,
            cell,
            period,
            retry,
        }
    }

    /// Take one sample.  Returns how long to wait before the next one, or
    /// `None` once the sensor has been given up on.
    pub fn poll_once(&mut self) -> Option<Duration> {
        match self.sensor.read() {
            Ok(reading) => {
                info!(
                    "Temperature: {:.1}°C, Humidity: {:.0}%",
                    reading.temperature_c, reading.humidity_pct
                );
                self.cell.record(reading);
                Some(self.period)
            }
            Err(SensorError::Transient(msg)) => {
                warn!("climate: {}, retrying in {:?}", msg, self.retry);
                Some(self.retry)
            }
            Err(e @ SensorError::Fatal(_)) => {
                error!("climate: {}; monitor stopping", e);
                self.cell.clear();
                None
            }
        }
    }

    /// Loop until `shutdown` is raised or the sensor fails for good.
    pub fn run(mut self, shutdown: ShutdownSignal) {
        info!("climate: monitor started (period={:?})", self.period);
        while !shutdown.is_raised() {
            let Some(wait) = self.poll_once() else {
                break;
            };
            shutdown.sleep(wait);
        }
        // `self` drops here, releasing the sensor.
        info!("climate: monitor stopped");
    }
}
