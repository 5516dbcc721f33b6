//! JSON views returned by the request surface.

use serde::Serialize;

use crate::app::climate::ClimateReading;
use crate::app::store::{Room, Snapshot, room_name};

/// One room as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomView {
    pub id: usize,
    pub name: String,
    pub count: u8,
    pub low_stock: bool,
    pub active: bool,
}

impl RoomView {
    pub fn new(room: &Room, active: bool) -> Self {
        Self {
            id: room.id,
            name: room_name(room.id),
            count: room.count,
            low_stock: room.warning_active,
            active,
        }
    }
}

/// Overview of every room.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexView {
    pub rooms: Vec<RoomView>,
    pub active_room: Option<usize>,
    pub operator: Option<String>,
    /// Latest storage-room sample; `null` without a sensor or reading.
    pub climate: Option<ClimateReading>,
}

impl IndexView {
    pub fn new(snapshot: &Snapshot, operator: Option<String>) -> Self {
        Self {
            rooms: snapshot
                .rooms
                .iter()
                .map(|r| RoomView::new(r, snapshot.active_room == Some(r.id)))
                .collect(),
            active_room: snapshot.active_room,
            operator,
            climate: None,
        }
    }

    pub fn with_climate(mut self, climate: Option<ClimateReading>) -> Self {
        self.climate = climate;
        self
    }
}

/// A single room page (after enter or update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomPage {
    pub room: RoomView,
    pub max: u8,
}

/// Result of a `/sync`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncView {
    pub queued: bool,
    pub rooms: Vec<RoomView>,
}
