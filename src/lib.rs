//! # rs-trackside
//!
//! A remote control plane for model-railway trackside hardware: lamp
//! signals and solenoid turnouts, registered and driven over a small REST
//! API.
//!
//! ## Features
//!
//! - **Hardware abstraction**: Traits for output lines and WiFi so the
//!   whole control plane runs on desktop against mocks
//! - **Polymorphic devices**: Two- and three-aspect signals, twin-coil
//!   solenoid turnouts with pulse timing and calibration
//! - **Safe lifecycle**: Devices start in their safe state, are swept to
//!   `off` on delete and shutdown, and never expose half-built entries
//! - **Deferred shutdown**: Accept-then-sweep with a configurable grace
//!   period, covering devices created during the grace window
//! - **Headless diagnostics**: Request-activity LED and morse blink
//!   patterns for startup failures
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Output line and network abstractions
//! - `devices` - Signal and turnout state machines plus the type catalog
//! - `registry` - Identifier-keyed device collections
//! - `services` - Axum REST surface, shared state, shutdown coordination
//! - `hal` - Mock implementations for desktop testing
//!
//! ## Example
//!
//! ```rust
//! use rs_trackside::{
//!     devices::{catalog::Collection, DeviceConfig, TurnoutTiming},
//!     hal::MockLineBank,
//!     registry::Registry,
//! };
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), rs_trackside::RegistryError> {
//! let mut bank = MockLineBank::new();
//! let mut signals = Registry::new(Collection::Signals)
//!     .with_timing(TurnoutTiming::fast());
//!
//! let config = DeviceConfig {
//!     id: "1".into(),
//!     kind: "GermanHauptsignal".into(),
//!     params: json!({"red_pin": 0, "green_pin": 1})
//!         .as_object().cloned().unwrap_or_default(),
//! };
//!
//! let repr = signals.create(config, &mut bank).await?;
//! assert_eq!(repr.state, "danger");
//!
//! let repr = signals.update("1", &json!({"state": "clear"})).await?;
//! assert_eq!(repr.state, "clear");
//! # Ok(()) }
//! ```

#![warn(missing_docs)]

/// Configuration structs, builders, and the `.env` loader.
pub mod config;
/// Device state machines and the type catalog.
pub mod devices;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Morse LED blink patterns for headless diagnostics.
pub mod morse;
/// Identifier-keyed device registries.
pub mod registry;
/// Core traits for hardware and network abstraction.
pub mod traits;
/// Network join orchestration with LED failure reporting.
pub mod wifi;

/// Network services for the HTTP API (feature-gated).
#[cfg(feature = "web")]
pub mod services;

// Re-exports for convenience
pub use config::Config;
pub use devices::{
    Collection, Device, DeviceConfig, DeviceKind, DeviceRepr, LightSignal, SignalState,
    SolenoidTurnout, TurnoutState, TurnoutTiming,
};
pub use registry::{Registry, RegistryError};
pub use traits::{ClaimError, JoinStatus, LineBank, OutputLine, WifiInterface};
pub use wifi::JoinError;
