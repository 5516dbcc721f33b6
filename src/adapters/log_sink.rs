//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each application event as one log
//! line.  The binary's subscriber decides where those lines go.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { rooms, initial } => {
                info!("START | rooms={} initial={}", rooms, initial);
            }
            AppEvent::ActiveChanged { from, to } => {
                info!("ACTIVE | {:?} -> {:?}", from, to);
            }
            AppEvent::CountChanged {
                room,
                count,
                low_stock,
            } => {
                info!(
                    "COUNT | room={} count={} stock={}",
                    room + 1,
                    count,
                    if *low_stock { "LOW" } else { "OK" }
                );
            }
            AppEvent::LowStockChanged { room, low_stock } => {
                if *low_stock {
                    warn!("STOCK | room={} below threshold", room + 1);
                } else {
                    info!("STOCK | room={} restocked", room + 1);
                }
            }
            AppEvent::UpdateIgnored { room, reason } => {
                info!("IGNORED | room={} reason={}", room + 1, reason);
            }
            AppEvent::ButtonPressed { button, room } => match room {
                Some(r) => debug!("BUTTON | {:?} room={}", button, r + 1),
                None => debug!("BUTTON | {:?} no active room", button),
            },
            AppEvent::Session { operator } => match operator {
                Some(tag) => info!("SESSION | operator={}", tag),
                None => info!("SESSION | logged out"),
            },
        }
    }
}
