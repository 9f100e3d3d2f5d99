//! Trait definitions for hardware and network abstraction.
//!
//! This module defines the abstractions that allow rs-trackside to:
//! - Run on different hardware (microcontroller GPIO, desktop mock)
//! - Keep the WiFi driver out of the core control plane
//!
//! # Submodules
//!
//! - `hardware`: Output lines and the exclusive-ownership line bank
//! - `network`: Station WiFi interface
//!
//! The key hardware traits are:
//!
//! - [`OutputLine`]: a single digital output (lamp, solenoid pin, LED)
//! - [`LineBank`]: hands out lines with exclusive per-pin ownership

pub mod hardware;
pub mod network;

pub use hardware::*;
pub use network::*;
