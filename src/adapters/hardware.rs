//! Hardware adapter — claims the configured lines and wraps them in ports.
//!
//! This is the only module that decides which pin backend is used.  With
//! [`Backend::Cdev`] every line in the [`PinMap`] is requested from the
//! GPIO character device as a `linux-embedded-hal` [`CdevPin`]; a line
//! that cannot be claimed aborts startup.  Requested lines are released
//! when their handles drop.  With [`Backend::Sim`] the same adapters are
//! built over in-memory pins and the handles are returned so a caller can
//! drive the buttons and inspect the outputs.

use std::path::Path;

use embedded_hal::digital::PinState;
use linux_embedded_hal::CdevPin;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use log::{debug, info};

use crate::app::ports::{ButtonPort, IndicatorPort};
use crate::config::{Backend, PinMap, SystemConfig};
use crate::drivers::gpio::SimPin;
use crate::drivers::indicators::{PinButtons, PinIndicators, segment_off_level};
use crate::error::{Error, Result};

/// In-memory pins behind a simulated port set.
#[derive(Debug, Clone)]
pub struct SimHandles {
    pub segments: Vec<SimPin>,
    pub digit_enables: Vec<SimPin>,
    pub room_leds: Vec<SimPin>,
    pub warning_leds: Vec<SimPin>,
    pub button_add: SimPin,
    pub button_remove: SimPin,
}

/// Ports built from the configuration.
pub struct HardwarePorts {
    pub indicators: Box<dyn IndicatorPort>,
    pub buttons: Box<dyn ButtonPort>,
    /// Present only for [`Backend::Sim`].
    pub sim: Option<SimHandles>,
}

/// Claim every configured line.
pub fn build(config: &SystemConfig) -> Result<HardwarePorts> {
    match config.backend {
        Backend::Cdev => build_cdev(config),
        Backend::Sim => Ok(build_sim(config)),
    }
}

// ── GPIO character device ─────────────────────────────────────

/// Consumer label shown by `gpioinfo` for every claimed line.
const CONSUMER: &str = "roomstock";

/// Requests lines from one open chip.
struct LineClaimer {
    chip: Chip,
}

impl LineClaimer {
    fn open(path: &Path) -> Result<Self> {
        let chip = Chip::new(path).map_err(|source| Error::GpioChip {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { chip })
    }

    fn request(&mut self, gpio: u32, flags: LineRequestFlags, initial: PinState) -> Result<CdevPin> {
        let default = u8::from(initial == PinState::High);
        let pin = self
            .chip
            .get_line(gpio)
            .and_then(|line| line.request(flags.clone(), default, CONSUMER))
            .and_then(CdevPin::new)
            .map_err(|source| Error::Gpio { pin: gpio, source })?;
        debug!("gpio{}: claimed ({:?})", gpio, flags);
        Ok(pin)
    }

    fn outputs(&mut self, lines: &[u32], initial: PinState) -> Result<Vec<CdevPin>> {
        lines
            .iter()
            .map(|&gpio| self.request(gpio, LineRequestFlags::OUTPUT, initial))
            .collect()
    }

    fn input(&mut self, gpio: u32) -> Result<CdevPin> {
        self.request(gpio, LineRequestFlags::INPUT, PinState::Low)
    }
}

fn build_cdev(config: &SystemConfig) -> Result<HardwarePorts> {
    let pins = &config.pins;
    let seg_off = segment_off_level(config.polarity);
    let mut claimer = LineClaimer::open(&config.gpio_chip)?;

    let indicators = PinIndicators::new(
        claimer.outputs(&pins.segments, seg_off)?,
        claimer.outputs(&pins.digit_enables, PinState::Low)?,
        claimer.outputs(&pins.room_leds, PinState::Low)?,
        claimer.outputs(&pins.warning_leds, PinState::Low)?,
        config.polarity,
    );
    let buttons = PinButtons::new(
        claimer.input(pins.button_add)?,
        claimer.input(pins.button_remove)?,
    );

    info!(
        "hardware: {} lines claimed on {}",
        line_count(pins),
        config.gpio_chip.display()
    );
    Ok(HardwarePorts {
        indicators: Box::new(indicators),
        buttons: Box::new(buttons),
        sim: None,
    })
}

fn line_count(pins: &PinMap) -> usize {
    pins.segments.len() + pins.digit_enables.len() + pins.room_leds.len() + pins.warning_leds.len() + 2
}

// ── simulated ─────────────────────────────────────────────────

/// Build simulated ports.  Buttons idle high (released).
pub fn build_sim(config: &SystemConfig) -> HardwarePorts {
    let pins = &config.pins;
    let seg_off = segment_off_level(config.polarity);
    let make = |n: usize, initial: PinState| -> Vec<SimPin> {
        (0..n).map(|_| SimPin::new(initial)).collect()
    };

    let handles = SimHandles {
        segments: make(pins.segments.len(), seg_off),
        digit_enables: make(pins.digit_enables.len(), PinState::Low),
        room_leds: make(pins.room_leds.len(), PinState::Low),
        warning_leds: make(pins.warning_leds.len(), PinState::Low),
        button_add: SimPin::new(PinState::High),
        button_remove: SimPin::new(PinState::High),
    };

    let indicators = PinIndicators::new(
        handles.segments.clone(),
        handles.digit_enables.clone(),
        handles.room_leds.clone(),
        handles.warning_leds.clone(),
        config.polarity,
    );
    let buttons = PinButtons::new(handles.button_add.clone(), handles.button_remove.clone());

    info!("hardware(sim): {} simulated lines", line_count(pins));
    HardwarePorts {
        indicators: Box::new(indicators),
        buttons: Box::new(buttons),
        sim: Some(handles),
    }
}
