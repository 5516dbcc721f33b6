//! DHT11 temperature / humidity sensor through the kernel IIO driver.
//!
//! The one-wire timing is done by the `dht11` kernel driver (enabled with
//! `dtoverlay=dht11,gpiopin=23`, physical pin 16), which exposes the
//! sensor as an IIO device:
//!
//! ```text
//! /sys/bus/iio/devices/iio:deviceN/in_temp_input              milli-°C
//! /sys/bus/iio/devices/iio:deviceN/in_humidityrelative_input  milli-%RH
//! ```
//!
//! A missed response or bad checksum surfaces as an I/O error on read
//! (usually `EIO` or `ETIMEDOUT`) and is reported as transient.  A missing
//! or unreadable device is fatal.

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::app::climate::ClimateReading;
use crate::app::ports::{SensorError, SensorPort};

const TEMP_FILE: &str = "in_temp_input";
const HUMIDITY_FILE: &str = "in_humidityrelative_input";

pub struct IioDht11 {
    dir: PathBuf,
}

impl IioDht11 {
    /// `dir` is the IIO device directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_milli(&self, file: &str) -> Result<i32, SensorError> {
        let path = self.dir.join(file);
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            let msg = format!("{}: {}", path.display(), e);
            match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => SensorError::Fatal(msg),
                _ => SensorError::Transient(msg),
            }
        })?;
        raw.trim()
            .parse()
            .map_err(|_| SensorError::Transient(format!("{}: unexpected value {:?}", file, raw.trim())))
    }
}

impl SensorPort for IioDht11 {
    fn read(&mut self) -> Result<ClimateReading, SensorError> {
        let temp = self.read_milli(TEMP_FILE)?;
        let humidity = self.read_milli(HUMIDITY_FILE)?;
        Ok(ClimateReading {
            temperature_c: temp as f32 / 1000.0,
            humidity_pct: humidity as f32 / 1000.0,
        })
    }
}
