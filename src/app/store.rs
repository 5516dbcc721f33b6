//! Inventory store — the single source of truth for room counts.
//!
//! Holds the per-room counts, the derived low-stock flags and the
//! active-room selector behind one lock.  Every operation takes the lock
//! for its whole duration, so the button loop, the display loop and the
//! request handlers never observe a half-updated room, and writes are
//! totally ordered.
//!
//! The store never touches hardware.  Each mutation returns a record of
//! what changed ([`CountChange`], [`ActiveChange`]) and the caller decides
//! which indicators to refresh.

use heapless::Vec;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{Error, Result};

/// Upper bound on the room table (stack-allocated).
pub const MAX_ROOMS: usize = 8;

/// Physical room identifier (index into the room table).
pub type RoomId = usize;

/// Display name used by views and the remote mirror ("Room 1" for id 0).
pub fn room_name(id: RoomId) -> String {
    format!("Room {}", id + 1)
}

/// One room's state as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub count: u8,
    /// `count <= warning_threshold`; recomputed on every count change.
    pub warning_active: bool,
}

/// Immutable copy of the whole store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub rooms: Vec<Room, MAX_ROOMS>,
    pub active_room: Option<RoomId>,
    pub max_count: u8,
}

impl Snapshot {
    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }
}

/// Result of a count mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountChange {
    pub room: RoomId,
    pub before: u8,
    pub after: u8,
    pub warning_before: bool,
    pub warning_after: bool,
}

impl CountChange {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }

    pub fn warning_changed(&self) -> bool {
        self.warning_before != self.warning_after
    }
}

/// Result of an active-room switch.  Only produced when the selection
/// actually moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveChange {
    pub previous: Option<RoomId>,
    pub current: Option<RoomId>,
}

struct StoreState {
    rooms: Vec<Room, MAX_ROOMS>,
    active: Option<RoomId>,
}

/// Thread-safe inventory store.
pub struct InventoryStore {
    state: Mutex<StoreState>,
    max_count: u8,
    warning_threshold: u8,
}

impl InventoryStore {
    /// Create `room_count` rooms at `initial` with no room active.
    pub fn new(room_count: usize, initial: u8, max_count: u8, warning_threshold: u8) -> Result<Self> {
        if room_count == 0 || room_count > MAX_ROOMS {
            return Err(Error::Config(format!("room_count must be 1..={MAX_ROOMS}")));
        }
        if initial > max_count {
            return Err(Error::Config(format!(
                "initial count {initial} exceeds maximum {max_count}"
            )));
        }

        let mut rooms = Vec::new();
        for id in 0..room_count {
            // Capacity checked above.
            let _ = rooms.push(Room {
                id,
                count: initial,
                warning_active: initial <= warning_threshold,
            });
        }

        Ok(Self {
            state: Mutex::new(StoreState { rooms, active: None }),
            max_count,
            warning_threshold,
        })
    }

    pub fn from_config(config: &crate::config::SystemConfig) -> Result<Self> {
        Self::new(
            config.room_count,
            config.initial_count,
            config.max_count(),
            config.warning_threshold,
        )
    }

    pub fn max_count(&self) -> u8 {
        self.max_count
    }

    pub fn room_count(&self) -> usize {
        self.state.lock().rooms.len()
    }

    /// Select `room` (or none).  Returns `None` when it was already active.
    pub fn set_active(&self, room: Option<RoomId>) -> Result<Option<ActiveChange>> {
        let mut st = self.state.lock();
        if let Some(id) = room {
            if id >= st.rooms.len() {
                return Err(Error::UnknownRoom(id));
            }
        }
        if st.active == room {
            return Ok(None);
        }
        let previous = core::mem::replace(&mut st.active, room);
        Ok(Some(ActiveChange {
            previous,
            current: room,
        }))
    }

    /// Clear the selection only if `room` is the active room.
    pub fn clear_active_if(&self, room: RoomId) -> Result<Option<ActiveChange>> {
        let mut st = self.state.lock();
        if room >= st.rooms.len() {
            return Err(Error::UnknownRoom(room));
        }
        if st.active != Some(room) {
            return Ok(None);
        }
        st.active = None;
        Ok(Some(ActiveChange {
            previous: Some(room),
            current: None,
        }))
    }

    /// `count := clamp(count + delta, 0, max)`.  Clamping is silent.
    pub fn adjust(&self, room: RoomId, delta: i16) -> Result<CountChange> {
        let mut st = self.state.lock();
        let r = st.rooms.get_mut(room).ok_or(Error::UnknownRoom(room))?;
        let target = i32::from(r.count) + i32::from(delta);
        Ok(self.apply(r, target))
    }

    /// Adjust whichever room is active, under one lock acquisition.
    /// Returns `None` when no room is active.
    pub fn adjust_active(&self, delta: i16) -> Option<CountChange> {
        let mut st = self.state.lock();
        let id = st.active?;
        let r = st.rooms.get_mut(id)?;
        let target = i32::from(r.count) + i32::from(delta);
        Some(self.apply(r, target))
    }

    /// Set an exact count.  Values outside `[0, max]` are ignored and
    /// `Ok(None)` is returned.
    pub fn set_exact(&self, room: RoomId, value: i64) -> Result<Option<CountChange>> {
        let mut st = self.state.lock();
        let r = st.rooms.get_mut(room).ok_or(Error::UnknownRoom(room))?;
        if !(0..=i64::from(self.max_count)).contains(&value) {
            return Ok(None);
        }
        Ok(Some(self.apply(r, value as i32)))
    }

    pub fn snapshot(&self) -> Snapshot {
        let st = self.state.lock();
        Snapshot {
            rooms: st.rooms.clone(),
            active_room: st.active,
            max_count: self.max_count,
        }
    }

    /// Count of the active room, for the display hot path.
    pub fn active_count(&self) -> Option<u8> {
        let st = self.state.lock();
        st.active.and_then(|id| st.rooms.get(id)).map(|r| r.count)
    }

    fn apply(&self, room: &mut Room, target: i32) -> CountChange {
        let before = room.count;
        let warning_before = room.warning_active;
        room.count = target.clamp(0, i32::from(self.max_count)) as u8;
        room.warning_active = room.count <= self.warning_threshold;
        CountChange {
            room: room.id,
            before,
            after: room.count,
            warning_before,
            warning_after: room.warning_active,
        }
    }
}
