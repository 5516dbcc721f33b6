//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ InventoryService / loops (domain)
//! ```
//!
//! Driven adapters (indicator pins, button pins, remote mirror, tag reader,
//! climate sensor, event sinks) implement these traits.  The domain only ever sees the
//! traits, so every path through it is testable with recording mocks.
//!
//! All ports are `Send`: the button loop, the display loop and the request
//! handlers each run on their own thread.

use std::sync::Arc;

use embedded_hal::digital::PinState;
use parking_lot::Mutex;

use super::climate::ClimateReading;
use super::events::AppEvent;
use super::store::{RoomId, Snapshot};

// ───────────────────────────────────────────────────────────────
// Indicator port (domain → LEDs and seven-segment lines)
// ───────────────────────────────────────────────────────────────

/// A single-bit LED output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Led {
    /// Lit while the room is the active room.
    Room(RoomId),
    /// Lit while the room is low on stock.
    Warning(RoomId),
}

/// Write-side port for every visual output.
///
/// Segment levels are electrical: polarity has already been applied by
/// the caller.  Digit enables and LEDs are logical (`true` = on).
pub trait IndicatorPort: Send {
    /// Drive segment line `segment` (0 = a … 6 = g).
    fn set_segment(&mut self, segment: usize, level: PinState);

    /// Enable or disable digit `digit` (0 = most significant).
    fn set_enable_line(&mut self, digit: usize, on: bool);

    /// Switch one LED.
    fn set_led(&mut self, led: Led, on: bool);

    /// Blank the display and switch every LED off.
    fn all_off(&mut self);
}

/// Indicator port shared between the display loop and the service.
pub type SharedIndicators = Arc<Mutex<Box<dyn IndicatorPort>>>;

/// Wrap a concrete port for sharing.
pub fn share_indicators(port: impl IndicatorPort + 'static) -> SharedIndicators {
    Arc::new(Mutex::new(Box::new(port)))
}

// ───────────────────────────────────────────────────────────────
// Button port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// The two physical push-buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Add,
    Remove,
}

impl Button {
    pub const ALL: [Button; 2] = [Button::Add, Button::Remove];

    /// Count change an accepted press requests.
    pub fn delta(self) -> i16 {
        match self {
            Self::Add => 1,
            Self::Remove => -1,
        }
    }
}

/// Read-side port: raw line level of each button.
/// Buttons are active-low, so `Low` means pressed.
pub trait ButtonPort: Send {
    fn sample(&mut self, button: Button) -> PinState;
}

impl<T: ButtonPort + ?Sized> ButtonPort for Box<T> {
    fn sample(&mut self, button: Button) -> PinState {
        (**self).sample(button)
    }
}

// ───────────────────────────────────────────────────────────────
// Remote mirror port (domain → remote key-value store)
// ───────────────────────────────────────────────────────────────

/// Receives best-effort copies of the store after mutations.
///
/// Each push overwrites the whole remote representation, so only the
/// most recent snapshot matters.
pub trait MirrorPort: Send {
    fn push(&mut self, snapshot: &Snapshot) -> Result<(), MirrorError>;
}

// ───────────────────────────────────────────────────────────────
// Credential tag reader (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Reads a credential tag id from an attached reader.  May block until a
/// tag is presented.
pub trait TagReader: Send {
    fn read_tag(&mut self) -> Result<String, TagError>;
}

// ───────────────────────────────────────────────────────────────
// Climate sensor port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Temperature / humidity sensor in the storage room.
pub trait SensorPort: Send {
    /// Take one sample.  DHT-class sensors miss reads regularly; a
    /// [`SensorError::Transient`] means the next read may well succeed.
    fn read(&mut self) -> Result<ClimateReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink: Send {
    fn emit(&mut self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`MirrorPort`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    /// Connection, DNS or timeout failure.
    Transport(String),
    /// The remote answered with a non-success status.
    Status(u16),
    /// The snapshot could not be encoded.
    Encode(String),
}

/// Errors from tag reading and credential checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// The reader failed or returned garbage.
    ReadFailed(String),
    /// No reader attached and no tag id supplied.
    NoReader,
    /// The tag id is not on the allow-list.
    NotAllowed,
}

/// Errors from [`SensorPort::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    /// Checksum or timing failure; retry later.
    Transient(String),
    /// The sensor is gone or inaccessible; stop reading it.
    Fatal(String),
}

impl core::fmt::Display for SensorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transient(msg) => write!(f, "sensor read failed: {}", msg),
            Self::Fatal(msg) => write!(f, "sensor unavailable: {}", msg),
        }
    }
}

impl core::fmt::Display for MirrorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::Status(code) => write!(f, "remote returned HTTP {}", code),
            Self::Encode(msg) => write!(f, "encode error: {}", msg),
        }
    }
}

impl core::fmt::Display for TagError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ReadFailed(msg) => write!(f, "error reading tag: {}", msg),
            Self::NoReader => write!(f, "error reading tag: no reader attached"),
            Self::NotAllowed => write!(f, "invalid credential"),
        }
    }
}
