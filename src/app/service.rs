//! Application service — the hexagonal core.
//!
//! [`InventoryService`] owns the store handle and the output ports and
//! exposes the control-plane operations (enter, leave, update, index) and
//! the button-press path.  After every honoured mutation it refreshes
//! the affected LEDs synchronously and queues a snapshot for the remote
//! mirror.
//!
//! ```text
//!  ButtonMonitor ──▶ ┌──────────────────────┐ ──▶ IndicatorPort (LEDs)
//!                    │   InventoryService    │ ──▶ EventSink
//!  web handlers  ──▶ │   InventoryStore      │ ──▶ MirrorHandle (async)
//!                    └──────────────────────┘
//!                               ▲
//!                         DisplayDriver (reads)
//! ```
//!
//! ## Lock order
//!
//! Mutations hold the event-sink lock for their whole duration, so the
//! store change, the LED writes and the emitted events of one mutation are
//! never interleaved with another's.  Inside it the store lock is taken
//! and released, then the indicator lock.  The display loop takes the
//! store lock and the indicator lock one after the other, never nested.

use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;

use crate::adapters::mirror::MirrorHandle;
use crate::error::{Error, Result};

use super::commands::{UpdateAction, UpdateRequest};
use super::events::AppEvent;
use super::ports::{Button, EventSink, Led, SharedIndicators};
use super::store::{ActiveChange, CountChange, InventoryStore, Room, RoomId, Snapshot};

// ───────────────────────────────────────────────────────────────
// InventoryService
// ───────────────────────────────────────────────────────────────

/// Shared by the button loop and every request handler.
pub struct InventoryService {
    store: Arc<InventoryStore>,
    indicators: SharedIndicators,
    /// Also serialises mutations (see module docs).
    sink: Mutex<Box<dyn EventSink>>,
    mirror: Option<MirrorHandle>,
}

impl InventoryService {
    pub fn new(
        store: Arc<InventoryStore>,
        indicators: SharedIndicators,
        sink: impl EventSink + 'static,
        mirror: Option<MirrorHandle>,
    ) -> Self {
        Self {
            store,
            indicators,
            sink: Mutex::new(Box::new(sink)),
            mirror,
        }
    }

    pub fn store(&self) -> &Arc<InventoryStore> {
        &self.store
    }

    pub fn indicators(&self) -> &SharedIndicators {
        &self.indicators
    }

    pub fn mirror_enabled(&self) -> bool {
        self.mirror.is_some()
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Quiesce outputs, then light the warning LEDs the initial counts call for.
    pub fn start(&self) {
        let mut sink = self.sink.lock();
        self.indicators.lock().all_off();
        let snapshot = self.store.snapshot();
        self.paint_leds(&snapshot);
        sink.emit(&AppEvent::Started {
            rooms: snapshot.rooms.len(),
            initial: snapshot.rooms.first().map_or(0, |r| r.count),
        });
        info!(
            "InventoryService started ({} rooms, max {}, mirror {})",
            snapshot.rooms.len(),
            snapshot.max_count,
            if self.mirror.is_some() { "on" } else { "off" }
        );
    }

    /// Drive every output to its off state.
    pub fn shutdown(&self) {
        let _sink = self.sink.lock();
        self.indicators.lock().all_off();
        info!("InventoryService: outputs off");
    }

    // ── Control plane ─────────────────────────────────────────

    /// Make `room` the active room.
    pub fn enter(&self, room: RoomId) -> Result<Room> {
        let mut sink = self.sink.lock();
        let change = self.store.set_active(Some(room))?;
        let snapshot = self.store.snapshot();
        if let Some(change) = change {
            self.apply_active(&mut **sink, change, &snapshot);
        }
        snapshot.room(room).copied().ok_or(Error::UnknownRoom(room))
    }

    /// Clear the selection if `room` is the active room; otherwise a no-op.
    pub fn leave(&self, room: RoomId) -> Result<Snapshot> {
        let mut sink = self.sink.lock();
        let change = self.store.clear_active_if(room)?;
        let snapshot = self.store.snapshot();
        if let Some(change) = change {
            self.apply_active(&mut **sink, change, &snapshot);
        }
        Ok(snapshot)
    }

    /// Clear the selection whatever it is (landing page).
    pub fn reset(&self) -> Snapshot {
        let mut sink = self.sink.lock();
        // `None` is always a valid selection.
        let change = self.store.set_active(None).ok().flatten();
        let snapshot = self.store.snapshot();
        if let Some(change) = change {
            self.apply_active(&mut **sink, change, &snapshot);
        }
        snapshot
    }

    /// Apply an add / remove / set request to `req.room`.
    ///
    /// Unknown actions and out-of-range `set` values leave the count
    /// unchanged and are reported as [`AppEvent::UpdateIgnored`].
    pub fn update(&self, req: UpdateRequest) -> Result<Room> {
        let mut sink = self.sink.lock();
        if req.room >= self.store.room_count() {
            return Err(Error::UnknownRoom(req.room));
        }

        let change = match req.action {
            Some(UpdateAction::Add) => Some(self.store.adjust(req.room, 1)?),
            Some(UpdateAction::Remove) => Some(self.store.adjust(req.room, -1)?),
            Some(UpdateAction::Set(value)) => {
                let change = self.store.set_exact(req.room, value)?;
                if change.is_none() {
                    warn!("update: room {} set {} outside 0..={}", req.room, value, self.store.max_count());
                    sink.emit(&AppEvent::UpdateIgnored {
                        room: req.room,
                        reason: "quantity out of range",
                    });
                }
                change
            }
            None => {
                warn!("update: room {} unknown action ignored", req.room);
                sink.emit(&AppEvent::UpdateIgnored {
                    room: req.room,
                    reason: "unknown action",
                });
                None
            }
        };

        if let Some(change) = change {
            self.apply_count(&mut **sink, change);
        }
        self.store
            .snapshot()
            .room(req.room)
            .copied()
            .ok_or(Error::UnknownRoom(req.room))
    }

    /// Current state of every room.
    pub fn index(&self) -> Snapshot {
        self.store.snapshot()
    }

    /// Queue the current snapshot for the mirror.  `None` when mirroring
    /// is disabled.
    pub fn sync(&self) -> Option<Snapshot> {
        let mirror = self.mirror.as_ref()?;
        let snapshot = self.store.snapshot();
        mirror.submit(snapshot.clone());
        info!("sync: snapshot queued for mirror");
        Some(snapshot)
    }

    /// Record an operator login or logout.
    pub fn note_session(&self, operator: Option<String>) {
        self.sink.lock().emit(&AppEvent::Session { operator });
    }

    // ── Button path ───────────────────────────────────────────

    /// Apply an accepted press to the active room.  Returns `None` when no
    /// room is active (the press is discarded).
    pub fn press(&self, button: Button) -> Option<CountChange> {
        let mut sink = self.sink.lock();
        // Clamping at zero makes a remove on an empty room a no-op.
        let change = self.store.adjust_active(button.delta());
        sink.emit(&AppEvent::ButtonPressed {
            button,
            room: change.map(|c| c.room),
        });
        if let Some(change) = change {
            self.apply_count(&mut **sink, change);
        }
        change
    }

    // ── Indicator recompute ───────────────────────────────────

    fn paint_leds(&self, snapshot: &Snapshot) {
        let mut ind = self.indicators.lock();
        for room in &snapshot.rooms {
            ind.set_led(Led::Room(room.id), snapshot.active_room == Some(room.id));
            ind.set_led(Led::Warning(room.id), room.warning_active);
        }
    }

    fn apply_active(&self, sink: &mut dyn EventSink, change: ActiveChange, snapshot: &Snapshot) {
        {
            let mut ind = self.indicators.lock();
            // Every room LED goes low before the new one goes high.
            for room in &snapshot.rooms {
                ind.set_led(Led::Room(room.id), false);
            }
            if let Some(room) = change.current.and_then(|id| snapshot.room(id)) {
                ind.set_led(Led::Room(room.id), true);
                ind.set_led(Led::Warning(room.id), room.warning_active);
            }
        }
        sink.emit(&AppEvent::ActiveChanged {
            from: change.previous,
            to: change.current,
        });
    }

    /// Runs for every honoured add / remove / set, including one that a
    /// clamp turned into a no-op: the warning LED is rewritten and the
    /// mirror gets a snapshot either way.  Events only record real changes.
    fn apply_count(&self, sink: &mut dyn EventSink, change: CountChange) {
        self.indicators
            .lock()
            .set_led(Led::Warning(change.room), change.warning_after);
        if change.changed() {
            info!("Room {}: {}", change.room + 1, change.after);
            if change.warning_changed() {
                sink.emit(&AppEvent::LowStockChanged {
                    room: change.room,
                    low_stock: change.warning_after,
                });
            }
            sink.emit(&AppEvent::CountChanged {
                room: change.room,
                count: change.after,
                low_stock: change.warning_after,
            });
        }
        if let Some(mirror) = &self.mirror {
            mirror.submit(self.store.snapshot());
        }
    }
}
