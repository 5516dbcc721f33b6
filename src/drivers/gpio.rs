//! In-memory digital pin behind the `embedded-hal` 1.0 traits.
//!
//! Real lines come from `linux-embedded-hal` (see
//! [`adapters::hardware`](crate::adapters::hardware)).  [`SimPin`] stands
//! in for them in the `sim` backend and in tests that need to drive an
//! input or read back an output.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

/// In-memory pin.  Clones share the same level.
#[derive(Debug, Clone, Default)]
pub struct SimPin {
    level: Arc<AtomicBool>,
}

impl SimPin {
    pub fn new(initial: PinState) -> Self {
        Self {
            level: Arc::new(AtomicBool::new(initial == PinState::High)),
        }
    }

    /// Force the level (an input being driven from outside).
    pub fn drive(&self, state: PinState) {
        self.level.store(state == PinState::High, Ordering::Release);
    }

    pub fn level(&self) -> PinState {
        PinState::from(self.level.load(Ordering::Acquire))
    }
}

impl ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(PinState::High);
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level() == PinState::High)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level() == PinState::Low)
    }
}
