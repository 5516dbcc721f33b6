//! Unified error types for the RoomStock controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level startup path and the request handlers' error mapping uniform.
//! Port-specific errors (`MirrorError`, `TagError`) stay next to the traits
//! that produce them; the mirror worker and the request surface handle
//! those directly.

use core::fmt;
use std::path::PathBuf;

use linux_embedded_hal::gpio_cdev::errors::Error as GpioError;

use crate::app::store::RoomId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// Configuration is invalid or could not be loaded.
    Config(String),
    /// The GPIO chip could not be opened.
    GpioChip { path: PathBuf, source: GpioError },
    /// A GPIO line could not be claimed or configured.
    Gpio { pin: u32, source: GpioError },
    /// A control-plane call named a room outside the configured table.
    UnknownRoom(RoomId),
    /// A background task could not be spawned.
    Spawn(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::GpioChip { path, source } => write!(f, "gpio chip {}: {source}", path.display()),
            Self::Gpio { pin, source } => write!(f, "gpio {pin}: {source}"),
            Self::UnknownRoom(id) => write!(f, "unknown room {id}"),
            Self::Spawn(e) => write!(f, "task spawn failed: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::GpioChip { source, .. } | Self::Gpio { source, .. } => Some(source),
            Self::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
