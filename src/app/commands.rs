//! Inbound commands to the application service.
//!
//! These represent count changes requested by the control surface.  Raw
//! form fields are parsed here; anything unrecognised becomes `None` and
//! the service treats the request as a no-op.

use log::debug;

use super::store::RoomId;

/// What an update request does to the room's count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    /// Increment by one (clamped at the ceiling).
    Add,
    /// Decrement by one (never below zero).
    Remove,
    /// Replace the count; ignored unless within `[0, max]`.
    Set(i64),
}

impl UpdateAction {
    /// Parse the `action` / `quantity` form pair.
    ///
    /// Returns `None` for an unknown action, or for `set` without a
    /// parseable quantity.
    pub fn parse(action: &str, quantity: Option<&str>) -> Option<Self> {
        match action.trim() {
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "set" => {
                let raw = quantity?.trim();
                match raw.parse::<i64>() {
                    Ok(q) => Some(Self::Set(q)),
                    Err(_) => {
                        debug!("update: unparseable quantity {:?}", raw);
                        None
                    }
                }
            }
            _ => None,
        }
    }
}

/// A control-plane update.  `action` is `None` when the request named an
/// action the service does not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateRequest {
    pub room: RoomId,
    pub action: Option<UpdateAction>,
}

impl UpdateRequest {
    pub fn new(room: RoomId, action: UpdateAction) -> Self {
        Self {
            room,
            action: Some(action),
        }
    }

    pub fn from_form(room: RoomId, action: &str, quantity: Option<&str>) -> Self {
        Self {
            room,
            action: UpdateAction::parse(action, quantity),
        }
    }
}
