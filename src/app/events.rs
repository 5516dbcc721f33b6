//! Outbound application events.
//!
//! The [`InventoryService`](super::service::InventoryService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them (log line, telemetry, test
//! recorder).

use super::ports::Button;
use super::store::RoomId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service is up; carries the room count and starting value.
    Started { rooms: usize, initial: u8 },

    /// The active-room selection moved.
    ActiveChanged {
        from: Option<RoomId>,
        to: Option<RoomId>,
    },

    /// A room's count changed.
    CountChanged {
        room: RoomId,
        count: u8,
        low_stock: bool,
    },

    /// A room crossed the low-stock threshold in either direction.
    LowStockChanged { room: RoomId, low_stock: bool },

    /// A control-plane update was accepted but had no effect.
    UpdateIgnored { room: RoomId, reason: &'static str },

    /// A debounced button press was accepted.  `room` is `None` when no
    /// room was active and the press was discarded.
    ButtonPressed {
        button: Button,
        room: Option<RoomId>,
    },

    /// An operator logged in or out.
    Session { operator: Option<String> },
}
