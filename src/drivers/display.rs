//! Multiplexed seven-segment display driver.
//!
//! ## Hardware
//!
//! One or two digits share seven segment lines (a..g).  Each digit has its
//! own enable line.  Only one digit is enabled at a time; cycling through
//! them faster than the eye can follow makes both appear lit.
//!
//! ## Cycle
//!
//! ```text
//!   write tens pattern → enable tens → hold → disable
//!   write ones pattern → enable ones → hold → disable
//!   sleep to next tick
//! ```
//!
//! With no active room the segments are parked at the polarity's "off"
//! level and every enable line is low.

use std::sync::Arc;
use std::time::Duration;

use embedded_hal::digital::PinState;
use log::info;

use crate::app::ports::SharedIndicators;
use crate::app::store::InventoryStore;
use crate::config::{Polarity, SystemConfig};
use crate::drivers::indicators::segment_off_level;
use crate::drivers::task::{ShutdownSignal, Ticker};

/// Segment patterns for 0..=9, bit 0 = a … bit 6 = g, 1 = lit.
pub const DIGIT_PATTERNS: [u8; 10] = [
    0x3F, // 0
    0x06, // 1
    0x5B, // 2
    0x4F, // 3
    0x66, // 4
    0x6D, // 5
    0x7D, // 6
    0x07, // 7
    0x7F, // 8
    0x6F, // 9
];

pub const SEGMENT_COUNT: usize = 7;

/// Split a count into `(tens, ones)`.
pub fn decompose(count: u8) -> (u8, u8) {
    (count / 10 % 10, count % 10)
}

/// Electrical level of each segment line for `digit` under `polarity`.
pub fn segment_levels(digit: u8, polarity: Polarity) -> [PinState; SEGMENT_COUNT] {
    let pattern = DIGIT_PATTERNS[usize::from(digit % 10)];
    let off = segment_off_level(polarity);
    core::array::from_fn(|seg| {
        if pattern & (1 << seg) != 0 { !off } else { off }
    })
}

/// Background loop rendering the active room's count.
pub struct DisplayDriver {
    store: Arc<InventoryStore>,
    indicators: SharedIndicators,
    polarity: Polarity,
    digits: usize,
    hold: Duration,
    tick: Duration,
    blanked: bool,
}

impl DisplayDriver {
    pub fn new(store: Arc<InventoryStore>, indicators: SharedIndicators, config: &SystemConfig) -> Self {
        Self {
            store,
            indicators,
            polarity: config.polarity,
            digits: usize::from(config.digits),
            hold: Duration::from_millis(config.digit_hold_ms),
            tick: Duration::from_millis(config.display_tick_ms),
            blanked: false,
        }
    }

    /// Digit values to show, most significant first.
    fn digit_values(&self, count: u8) -> heapless::Vec<u8, 2> {
        let (tens, ones) = decompose(count);
        let mut out = heapless::Vec::new();
        if self.digits == 2 {
            let _ = out.push(tens);
        }
        let _ = out.push(ones);
        out
    }

    /// One full multiplex cycle (or a blank, if no room is active).
    pub fn render_once(&mut self) {
        let Some(count) = self.store.active_count() else {
            if !self.blanked {
                self.blank();
            }
            return;
        };
        self.blanked = false;

        for (digit, value) in self.digit_values(count).into_iter().enumerate() {
            {
                let mut ind = self.indicators.lock();
                for (seg, level) in segment_levels(value, self.polarity).into_iter().enumerate() {
                    ind.set_segment(seg, level);
                }
                ind.set_enable_line(digit, true);
            }
            std::thread::sleep(self.hold);
            self.indicators.lock().set_enable_line(digit, false);
        }
    }

    fn blank(&mut self) {
        let off = segment_off_level(self.polarity);
        let mut ind = self.indicators.lock();
        for seg in 0..SEGMENT_COUNT {
            ind.set_segment(seg, off);
        }
        for digit in 0..self.digits {
            ind.set_enable_line(digit, false);
        }
        self.blanked = true;
    }

    /// Run until `shutdown` is raised, then blank.
    pub fn run(mut self, shutdown: ShutdownSignal) {
        info!(
            "display: started ({} digit(s), {:?}, tick={:?}, hold={:?})",
            self.digits, self.polarity, self.tick, self.hold
        );
        let mut ticker = Ticker::new(self.tick);
        while !shutdown.is_raised() {
            self.render_once();
            ticker.wait();
        }
        self.blank();
        info!("display: stopped");
    }
}
