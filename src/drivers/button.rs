//! Polled, debounced push-button monitor.
//!
//! ## Hardware
//!
//! Two active-low momentary switches (add, remove) with pull-ups.  The
//! monitor samples both lines every `button_poll_ms` and runs each sample
//! through a per-button [`Debouncer`].
//!
//! ## Debounce rule
//!
//! | Condition                                   | Result            |
//! |---------------------------------------------|-------------------|
//! | HIGH → LOW edge, outside cooldown           | press accepted    |
//! | HIGH → LOW edge, inside cooldown            | ignored           |
//! | any other sample                            | level recorded    |
//!
//! The cooldown starts at each accepted press and lasts `debounce_ms`.
//! It is a cooldown, not a hold time: a press is acted on at its first
//! falling edge, and contact bounce after it is swallowed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use embedded_hal::digital::PinState;
use log::{debug, info};

use crate::app::ports::{Button, ButtonPort};
use crate::app::service::InventoryService;
use crate::drivers::task::{ShutdownSignal, Ticker};

/// Edge state for one button.  Owned by the monitor alone.
#[derive(Debug, Clone, Copy)]
pub struct Debouncer {
    last_level: PinState,
    cooldown_until: Option<Instant>,
    window: Duration,
}

impl Debouncer {
    pub fn new(initial: PinState, window: Duration) -> Self {
        Self {
            last_level: initial,
            cooldown_until: None,
            window,
        }
    }

    /// Feed one sample.  Returns `true` when it is an accepted press.
    pub fn sample(&mut self, level: PinState, now: Instant) -> bool {
        let falling = self.last_level == PinState::High && level == PinState::Low;
        self.last_level = level;
        if !falling {
            return false;
        }
        if self.cooldown_until.is_some_and(|until| now < until) {
            return false;
        }
        self.cooldown_until = Some(now + self.window);
        true
    }
}

/// Background loop that turns button presses into count changes.
pub struct ButtonMonitor<B> {
    port: B,
    service: Arc<InventoryService>,
    debouncers: [(Button, Debouncer); 2],
    poll: Duration,
}

impl<B: ButtonPort> ButtonMonitor<B> {
    pub fn new(mut port: B, service: Arc<InventoryService>, poll: Duration, debounce: Duration) -> Self {
        // Seed from the current level so a button held at startup is not
        // read as a fresh press.
        let debouncers = Button::ALL.map(|b| (b, Debouncer::new(port.sample(b), debounce)));
        Self {
            port,
            service,
            debouncers,
            poll,
        }
    }

    /// Sample both buttons once.  Returns the number of accepted presses.
    pub fn poll_once(&mut self, now: Instant) -> usize {
        let mut accepted = 0;
        for (button, debouncer) in &mut self.debouncers {
            let level = self.port.sample(*button);
            if debouncer.sample(level, now) {
                accepted += 1;
                match self.service.press(*button) {
                    Some(change) => debug!(
                        "button: {:?} room {} {} -> {}",
                        button, change.room, change.before, change.after
                    ),
                    None => debug!("button: {:?} with no active room, discarded", button),
                }
            }
        }
        accepted
    }

    /// Run until `shutdown` is raised.
    pub fn run(mut self, shutdown: ShutdownSignal) {
        info!("button: monitor started (poll={:?})", self.poll);
        let mut ticker = Ticker::new(self.poll);
        while !shutdown.is_raised() {
            self.poll_once(Instant::now());
            ticker.wait();
        }
        info!("button: monitor stopped");
    }
}
