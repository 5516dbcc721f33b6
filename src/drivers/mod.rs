//! Simulated pins, indicator adapters, the two hardware loops and the
//! climate monitor.

pub mod button;
pub mod climate;
pub mod display;
pub mod gpio;
pub mod indicators;
pub mod task;
