//! Trackside device types and their shared capability surface.
//!
//! Every controllable piece of hardware is a [`Device`]: a closed tagged
//! variant over the supported device types. Adding a device type means
//! adding a variant here plus a catalog entry in [`catalog`]; dispatch is
//! a `match`, not a trait object.
//!
//! The capability set every variant provides:
//!
//! - `validate_update`: pure predicate over a raw JSON update body
//! - `apply_update` / `switch_off`: drive the outputs (async, because
//!   solenoid pulses take time)
//! - `representation`: detached `{id, type, params, state}` value record
//!
//! # Submodules
//!
//! - `signal`: combinational lamp signals
//! - `turnout`: pulse-driven solenoid turnouts
//! - `catalog`: the type-tag catalog (create validation + construction)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::traits::OutputLine;

pub mod catalog;
pub mod signal;
pub mod turnout;

pub use catalog::{Collection, DeviceKind};
pub use signal::{LightSignal, SignalState};
pub use turnout::{SolenoidTurnout, TurnoutState, TurnoutTiming};

// ============================================================================
// Wire Records
// ============================================================================

/// Immutable creation record for a device.
///
/// This is the POST body of the collection endpoints: a caller-supplied
/// `id` (unique within its collection), a `type` tag selecting the device
/// type, and type-specific `params` (pin numbers, polarity flag). The
/// record is retained verbatim by the constructed device so that
/// representations round-trip the caller's input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Caller-supplied identifier, unique per collection.
    pub id: String,
    /// Type tag, resolved through [`catalog::DeviceKind`].
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific parameters (pin numbers, polarity flag).
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Detached JSON representation of a live device.
///
/// A value record, not a live reference: mutating it never affects the
/// device it was taken from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceRepr {
    /// The device identifier.
    pub id: String,
    /// The device type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// The creation parameters, echoed verbatim.
    pub params: Map<String, Value>,
    /// The current state as its wire string.
    pub state: String,
}

// ============================================================================
// Device
// ============================================================================

/// A live, stateful trackside device.
///
/// Owned exclusively by the registry entry for its id. The variant's state
/// always reflects the actual output-line configuration: state fields are
/// updated only after the corresponding output sequence has completed.
#[derive(Debug)]
pub enum Device<L: OutputLine> {
    /// A lamp signal (two- or three-aspect).
    Signal(LightSignal<L>),
    /// A twin-coil solenoid turnout.
    Turnout(SolenoidTurnout<L>),
}

impl<L: OutputLine> Device<L> {
    /// The device identifier.
    pub fn id(&self) -> &str {
        &self.config().id
    }

    /// The creation record this device was built from.
    pub fn config(&self) -> &DeviceConfig {
        match self {
            Device::Signal(signal) => signal.config(),
            Device::Turnout(turnout) => turnout.config(),
        }
    }

    /// The current state as its wire string.
    pub fn state_str(&self) -> &'static str {
        match self {
            Device::Signal(signal) => signal.state().as_str(),
            Device::Turnout(turnout) => turnout.state().as_str(),
        }
    }

    /// Check whether a raw JSON body is a valid update for this device.
    ///
    /// True only for an object carrying a string `state` drawn from this
    /// device's closed state set. Pure predicate, no side effects.
    pub fn validate_update(&self, body: &Value) -> bool {
        let Some(state) = update_state(body) else {
            return false;
        };
        match self {
            Device::Signal(signal) => SignalState::parse(state)
                .is_some_and(|state| signal.accepts(state)),
            Device::Turnout(_) => TurnoutState::parse(state).is_some(),
        }
    }

    /// Apply a previously validated update body.
    ///
    /// Returns false (touching nothing) if the body does not validate, so
    /// callers that skipped [`validate_update`](Self::validate_update) still
    /// cannot drive a device into an undefined state.
    pub async fn apply_update(&mut self, body: &Value) -> bool {
        if !self.validate_update(body) {
            return false;
        }
        // validate_update guarantees the state string parses
        let state = update_state(body).unwrap_or_default();
        match self {
            Device::Signal(signal) => {
                if let Some(state) = SignalState::parse(state) {
                    signal.apply(state);
                }
            }
            Device::Turnout(turnout) => {
                if let Some(state) = TurnoutState::parse(state) {
                    turnout.apply(state).await;
                }
            }
        }
        true
    }

    /// Drive the device to its safe electrical state (`off`).
    pub async fn switch_off(&mut self) {
        match self {
            Device::Signal(signal) => signal.apply(SignalState::Off),
            Device::Turnout(turnout) => turnout.apply(TurnoutState::Off).await,
        }
    }

    /// Detached `{id, type, params, state}` record for this device.
    pub fn representation(&self) -> DeviceRepr {
        let config = self.config();
        DeviceRepr {
            id: config.id.clone(),
            kind: config.kind.clone(),
            params: config.params.clone(),
            state: self.state_str().to_owned(),
        }
    }
}

/// Extract the `state` string from an update body, if it has the right shape.
fn update_state(body: &Value) -> Option<&str> {
    body.as_object()?.get("state")?.as_str()
}
