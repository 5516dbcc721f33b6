//! Application core — inventory rules, zero direct I/O.
//!
//! The store, the service that mutates it and the session check live here,
//! along with the latest climate sample.  All interaction with pins, the
//! network, the tag reader and the climate sensor happens
//! through the **port traits** in [`ports`], keeping this layer testable
//! without real peripherals.

pub mod climate;
pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod session;
pub mod store;
