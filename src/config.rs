//! System configuration parameters
//!
//! All tunable parameters for the RoomStock controller.  The hardware
//! variants (display polarity, single or double digit, number of rooms,
//! remote mirroring on or off, pin wiring) are all expressed here rather
//! than as separate builds.  Values come from an optional JSON file; any
//! field left out falls back to [`SystemConfig::default`].

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::store::MAX_ROOMS;
use crate::error::{Error, Result};
use crate::pins;

/// Seven-segment wiring polarity.
///
/// Determines the electrical level that lights a segment.  The digit
/// pattern table is polarity-independent; this is applied as the final
/// inversion when segments are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Segment lit when its line is driven LOW.
    CommonAnode,
    /// Segment lit when its line is driven HIGH.
    CommonCathode,
}

/// Which GPIO implementation drives the pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Linux GPIO character device (`/dev/gpiochipN`).
    Cdev,
    /// In-memory pins; runs anywhere, nothing is driven.
    Sim,
}

/// Pin wiring.  Lengths must agree with `room_count` and `digits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinMap {
    pub segments: Vec<u32>,
    pub digit_enables: Vec<u32>,
    pub room_leds: Vec<u32>,
    pub warning_leds: Vec<u32>,
    pub button_add: u32,
    pub button_remove: u32,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            segments: pins::SEGMENT_GPIOS.to_vec(),
            digit_enables: pins::DIGIT_ENABLE_GPIOS.to_vec(),
            room_leds: pins::ROOM_LED_GPIOS.to_vec(),
            warning_leds: pins::WARNING_LED_GPIOS.to_vec(),
            button_add: pins::BUTTON_ADD_GPIO,
            button_remove: pins::BUTTON_REMOVE_GPIO,
        }
    }
}

/// Remote mirror endpoint (Firebase-style realtime JSON store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Base URL; `inventory.json` and `low_stock.json` are written under it.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_mirror_timeout_ms")]
    pub timeout_ms: u64,
    /// Retries after a failed push before the snapshot is dropped.
    #[serde(default = "default_mirror_retries")]
    pub max_retries: u32,
}

/// Storage-room climate sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClimateConfig {
    /// IIO device directory of the DHT11, e.g. `/sys/bus/iio/devices/iio:device0`.
    pub device: PathBuf,
    /// Interval between successful samples (milliseconds).
    #[serde(default = "default_climate_period_ms")]
    pub period_ms: u64,
    /// Wait after a failed read before trying again (milliseconds).
    #[serde(default = "default_climate_retry_ms")]
    pub retry_ms: u64,
}

fn default_climate_period_ms() -> u64 {
    5_000
}

fn default_climate_retry_ms() -> u64 {
    2_000
}

fn default_mirror_timeout_ms() -> u64 {
    3_000
}

fn default_mirror_retries() -> u32 {
    4
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Inventory ---
    /// Number of rooms (fixed for the process lifetime).
    pub room_count: usize,
    /// Count every room starts with.
    pub initial_count: u8,
    /// A room is flagged low-stock when its count is at or below this.
    pub warning_threshold: u8,

    // --- Display ---
    /// Number of seven-segment digits (1 or 2).  Sets the count ceiling.
    pub digits: u8,
    /// Segment wiring polarity.
    pub polarity: Polarity,

    // --- Timing ---
    /// Button sampling interval (milliseconds).
    pub button_poll_ms: u64,
    /// Cooldown after an accepted press (milliseconds).
    pub debounce_ms: u64,
    /// Display multiplex cycle period (milliseconds).
    pub display_tick_ms: u64,
    /// On-time per digit within one multiplex cycle (milliseconds).
    pub digit_hold_ms: u64,

    // --- Hardware ---
    pub backend: Backend,
    /// GPIO chip the lines are requested from (only used by [`Backend::Cdev`]).
    /// Line offsets in [`PinMap`] are relative to this chip.
    pub gpio_chip: PathBuf,
    pub pins: PinMap,
    /// Line-oriented credential reader device; one tag id per line.
    pub tag_reader: Option<PathBuf>,
    /// Temperature / humidity sensor; `None` disables the climate monitor.
    pub climate: Option<ClimateConfig>,

    // --- Access ---
    /// Credential tag ids allowed to log in.
    pub allowed_tags: Vec<String>,

    // --- Services ---
    /// Request surface listen address.
    pub bind: SocketAddr,
    /// Remote mirror; `None` disables mirroring.
    pub mirror: Option<MirrorConfig>,
    /// Upper bound for joining the hardware loops on exit (milliseconds).
    pub shutdown_timeout_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            room_count: 3,
            initial_count: 10,
            warning_threshold: 5,

            digits: 2,
            polarity: Polarity::CommonAnode,

            button_poll_ms: 10,   // 100 Hz
            debounce_ms: 300,
            display_tick_ms: 10,  // 100 Hz full refresh
            digit_hold_ms: 5,

            backend: Backend::Cdev,
            gpio_chip: PathBuf::from("/dev/gpiochip0"),
            pins: PinMap::default(),
            tag_reader: None,
            climate: None,

            allowed_tags: vec!["85615652294".into(), "0987654321".into()],

            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
            mirror: None,
            shutdown_timeout_ms: 2_000,
        }
    }
}

/// A multiplex cycle at or above this is visible as flicker.
pub const MAX_CYCLE_MS: u64 = 100;

impl SystemConfig {
    /// Load from a JSON file, or defaults when `path` is `None`.
    /// The result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                Self::from_json(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON document (missing fields take their defaults).
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Config(format!("invalid JSON: {e}")))
    }

    /// Highest count the display can show: 9 for one digit, 99 for two.
    pub fn max_count(&self) -> u8 {
        if self.digits == 1 { 9 } else { 99 }
    }

    /// Time for the display to visit every digit once.
    pub fn cycle_ms(&self) -> u64 {
        self.display_tick_ms.max(self.digit_hold_ms * u64::from(self.digits))
    }

    /// Reject values that would break the store or display invariants.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::Config(msg));

        if self.room_count == 0 || self.room_count > MAX_ROOMS {
            return fail(format!("room_count must be 1..={MAX_ROOMS}"));
        }
        if !(1..=2).contains(&self.digits) {
            return fail("digits must be 1 or 2".into());
        }
        if self.initial_count > self.max_count() {
            return fail(format!(
                "initial_count {} exceeds display maximum {}",
                self.initial_count,
                self.max_count()
            ));
        }
        if self.button_poll_ms == 0 || self.display_tick_ms == 0 || self.digit_hold_ms == 0 {
            return fail("loop intervals must be greater than zero".into());
        }
        if self.debounce_ms < self.button_poll_ms {
            return fail("debounce_ms must be at least button_poll_ms".into());
        }
        if self.cycle_ms() >= MAX_CYCLE_MS {
            return fail(format!(
                "display cycle of {}ms would flicker (must be under {MAX_CYCLE_MS}ms)",
                self.cycle_ms()
            ));
        }

        let p = &self.pins;
        if p.segments.len() != 7 {
            return fail("pins.segments needs exactly 7 lines (a..g)".into());
        }
        if p.digit_enables.len() != self.digits as usize {
            return fail("pins.digit_enables must have one line per digit".into());
        }
        if p.room_leds.len() != self.room_count || p.warning_leds.len() != self.room_count {
            return fail("pins.room_leds and pins.warning_leds need one line per room".into());
        }

        let mut all: Vec<u32> = p
            .segments
            .iter()
            .chain(&p.digit_enables)
            .chain(&p.room_leds)
            .chain(&p.warning_leds)
            .copied()
            .chain([p.button_add, p.button_remove])
            .collect();
        all.sort_unstable();
        if let Some(w) = all.windows(2).find(|w| w[0] == w[1]) {
            return fail(format!("gpio {} assigned twice", w[0]));
        }

        if let Some(c) = &self.climate {
            // The DHT11 cannot be sampled more than about once a second.
            if c.period_ms < 1_000 || c.retry_ms < 1_000 {
                return fail("climate.period_ms and climate.retry_ms must be at least 1000".into());
            }
        }

        if let Some(m) = &self.mirror {
            if !(m.base_url.starts_with("http://") || m.base_url.starts_with("https://")) {
                return fail("mirror.base_url must be an http(s) URL".into());
            }
            if m.timeout_ms == 0 {
                return fail("mirror.timeout_ms must be greater than zero".into());
            }
        }
        Ok(())
    }
}
