//! Background task plumbing for the hardware loops.
//!
//! The button and display loops are plain OS threads with a fixed cadence.
//! This module gives them three things:
//!
//! - [`spawn_named`] — named thread spawning with an explicit stack size.
//! - [`ShutdownSignal`] — a shared flag every loop checks once per tick,
//!   with an interruptible sleep for loops with long periods.
//! - [`Ticker`] — a monotonic-clock cadence that does not drift when an
//!   iteration runs long.
//!
//! [`join_bounded`] joins a set of loops with an upper time bound so the
//! process can still quiesce its outputs if a loop is stuck.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::error::{Error, Result};

/// Stack size for the hardware loop threads.
pub const LOOP_STACK_KB: usize = 64;

/// Longest a [`ShutdownSignal::sleep`] goes without re-checking the flag.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Spawn a named thread.  Spawn failure is reported, not panicked on.
pub fn spawn_named(
    name: &'static str,
    stack_kb: usize,
    f: impl FnOnce() + Send + 'static,
) -> Result<JoinHandle<()>> {
    info!("Spawning '{}' (stack={}KB)", name, stack_kb);
    std::thread::Builder::new()
        .name(name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
        .map_err(Error::Spawn)
}

/// Cooperative stop flag shared by every background loop.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every loop holding a clone to exit after its current tick.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Sleep for `d`, waking early once the signal is raised.  Returns
    /// `true` if it was.
    pub fn sleep(&self, d: Duration) -> bool {
        let deadline = Instant::now() + d;
        loop {
            if self.is_raised() {
                return true;
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            std::thread::sleep(left.min(SLEEP_SLICE));
        }
    }
}

/// Fixed-period cadence on the monotonic clock.
///
/// Deadlines advance by exactly one period per tick, so a slow iteration
/// is absorbed by a shorter sleep rather than shifting every later tick.
/// If the loop falls more than a period behind, the schedule restarts
/// from now instead of firing a burst of catch-up ticks.
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// Sleep until the next deadline.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
            self.next += self.period;
        } else {
            self.next = now + self.period;
        }
    }
}

/// Join `handles`, giving up after `timeout`.  Returns `true` when every
/// thread finished in time.  Threads still running are left detached.
pub fn join_bounded(handles: Vec<JoinHandle<()>>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    let mut pending = handles;

    while !pending.is_empty() {
        let (done, rest): (Vec<_>, Vec<_>) = pending.into_iter().partition(JoinHandle::is_finished);
        for handle in done {
            let name = handle.thread().name().unwrap_or("?").to_owned();
            if handle.join().is_err() {
                warn!("task '{}' panicked", name);
            }
        }
        pending = rest;
        if pending.is_empty() {
            break;
        }
        if Instant::now() >= deadline {
            for handle in &pending {
                warn!(
                    "task '{}' did not stop within {:?}",
                    handle.thread().name().unwrap_or("?"),
                    timeout
                );
            }
            return false;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    true
}
