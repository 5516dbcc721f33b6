//! Indicator and button port adapters over `embedded-hal` digital pins.
//!
//! [`PinIndicators`] implements [`IndicatorPort`] for any set of output
//! pins; [`PinButtons`] implements [`ButtonPort`] for two input pins.  The
//! concrete pin type (GPIO character device or simulated) is chosen in
//! [`adapters::hardware`](crate::adapters::hardware).

use embedded_hal::digital::{InputPin, OutputPin, PinState};
use log::warn;

use crate::app::ports::{Button, ButtonPort, IndicatorPort, Led};
use crate::config::Polarity;

/// Electrical level that turns a segment off for `polarity`.
pub fn segment_off_level(polarity: Polarity) -> PinState {
    match polarity {
        Polarity::CommonAnode => PinState::High,
        Polarity::CommonCathode => PinState::Low,
    }
}

/// Every visual output, one pin per line.
pub struct PinIndicators<P> {
    segments: Vec<P>,
    enables: Vec<P>,
    room_leds: Vec<P>,
    warning_leds: Vec<P>,
    segment_off: PinState,
}

impl<P: OutputPin + Send> PinIndicators<P> {
    pub fn new(
        segments: Vec<P>,
        enables: Vec<P>,
        room_leds: Vec<P>,
        warning_leds: Vec<P>,
        polarity: Polarity,
    ) -> Self {
        Self {
            segments,
            enables,
            room_leds,
            warning_leds,
            segment_off: segment_off_level(polarity),
        }
    }

    fn drive(pin: Option<&mut P>, what: &str, index: usize, state: PinState) {
        match pin {
            Some(p) => {
                if let Err(e) = p.set_state(state) {
                    warn!("indicators: {} {} write failed: {:?}", what, index, e);
                }
            }
            None => warn!("indicators: no {} line {}", what, index),
        }
    }
}

impl<P: OutputPin + Send> IndicatorPort for PinIndicators<P> {
    fn set_segment(&mut self, segment: usize, level: PinState) {
        Self::drive(self.segments.get_mut(segment), "segment", segment, level);
    }

    fn set_enable_line(&mut self, digit: usize, on: bool) {
        Self::drive(self.enables.get_mut(digit), "digit enable", digit, PinState::from(on));
    }

    fn set_led(&mut self, led: Led, on: bool) {
        let state = PinState::from(on);
        match led {
            Led::Room(id) => Self::drive(self.room_leds.get_mut(id), "room led", id, state),
            Led::Warning(id) => {
                Self::drive(self.warning_leds.get_mut(id), "warning led", id, state)
            }
        }
    }

    fn all_off(&mut self) {
        let off = self.segment_off;
        for i in 0..self.segments.len() {
            Self::drive(self.segments.get_mut(i), "segment", i, off);
        }
        for (what, lines) in [
            ("digit enable", &mut self.enables),
            ("room led", &mut self.room_leds),
            ("warning led", &mut self.warning_leds),
        ] {
            for (i, pin) in lines.iter_mut().enumerate() {
                Self::drive(Some(pin), what, i, PinState::Low);
            }
        }
    }
}

/// Add / remove push-buttons.
pub struct PinButtons<I> {
    add: I,
    remove: I,
}

impl<I: InputPin + Send> PinButtons<I> {
    pub fn new(add: I, remove: I) -> Self {
        Self { add, remove }
    }
}

impl<I: InputPin + Send> ButtonPort for PinButtons<I> {
    fn sample(&mut self, button: Button) -> PinState {
        let pin = match button {
            Button::Add => &mut self.add,
            Button::Remove => &mut self.remove,
        };
        // A failed read counts as released; the pull-up idles high.
        match pin.is_high() {
            Ok(high) => PinState::from(high),
            Err(e) => {
                warn!("buttons: {:?} read failed: {:?}", button, e);
                PinState::High
            }
        }
    }
}
