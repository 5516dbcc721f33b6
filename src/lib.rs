//! RoomStock controller library.
//!
//! Exposes the store, the service, the hardware loops and the request
//! surface for the binary and for integration testing.  Nothing here
//! touches real pins unless the `cdev` backend is selected in the
//! configuration.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod web;

pub use error::{Error, Result};
