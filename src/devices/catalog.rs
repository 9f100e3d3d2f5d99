//! Device type catalog: tag resolution, create validation, construction.
//!
//! The catalog is the single place that knows which type tags exist, which
//! collection each tag belongs to, and what its `params` must look like.
//! It is pure data plus free functions, read-only after compile time.
//!
//! Validation is strict: `params` must carry exactly the keys the type
//! requires (plus documented optionals), with pin numbers that fit `u16`.
//! Nothing claims or drives an output line before validation passes.

use serde_json::{Map, Value};

use crate::traits::LineBank;

use super::turnout::TurnoutTiming;
use super::{Device, DeviceConfig, LightSignal, SolenoidTurnout};

/// The two device collections served by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
    /// Lamp signals (`/api/signals`).
    Signals,
    /// Solenoid turnouts (`/api/turnouts`).
    Turnouts,
}

impl Collection {
    /// The collection name as it appears in URL paths.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Collection::Signals => "signals",
            Collection::Turnouts => "turnouts",
        }
    }

    /// Resolve a URL path segment into a collection.
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "signals" => Some(Collection::Signals),
            "turnouts" => Some(Collection::Turnouts),
            _ => None,
        }
    }
}

/// A known device type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    /// Lamp signal, two- or three-aspect depending on `yellow_pin`.
    GermanHauptsignal,
    /// Twin-coil solenoid turnout.
    TwoPinSolenoidTurnout,
}

impl DeviceKind {
    /// Resolve a wire type tag, if known.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "GermanHauptsignal" => Some(DeviceKind::GermanHauptsignal),
            "TwoPinSolenoidTurnout" => Some(DeviceKind::TwoPinSolenoidTurnout),
            _ => None,
        }
    }

    /// The wire type tag.
    pub const fn tag(&self) -> &'static str {
        match self {
            DeviceKind::GermanHauptsignal => "GermanHauptsignal",
            DeviceKind::TwoPinSolenoidTurnout => "TwoPinSolenoidTurnout",
        }
    }

    /// The collection this type belongs to.
    pub const fn collection(&self) -> Collection {
        match self {
            DeviceKind::GermanHauptsignal => Collection::Signals,
            DeviceKind::TwoPinSolenoidTurnout => Collection::Turnouts,
        }
    }

    /// Check the `params` shape for this type.
    ///
    /// Exact-key validation: required keys must be present and well typed,
    /// optional keys may appear, anything else is rejected.
    fn validate_params(&self, params: &Map<String, Value>) -> bool {
        match self {
            DeviceKind::GermanHauptsignal => {
                let known = params.keys().all(|key| {
                    matches!(key.as_str(), "red_pin" | "green_pin" | "yellow_pin")
                });
                known
                    && pin_param(params, "red_pin").is_some()
                    && pin_param(params, "green_pin").is_some()
                    && (!params.contains_key("yellow_pin")
                        || pin_param(params, "yellow_pin").is_some())
            }
            DeviceKind::TwoPinSolenoidTurnout => {
                let known = params.keys().all(|key| {
                    matches!(key.as_str(), "enable_pin" | "direction_pin" | "turnout_high")
                });
                known
                    && pin_param(params, "enable_pin").is_some()
                    && pin_param(params, "direction_pin").is_some()
                    && params.get("turnout_high").is_some_and(Value::is_boolean)
            }
        }
    }

    /// Build the device this tag names, claiming its lines from `bank`.
    ///
    /// Callers must have run [`validate_create`] first; the line claims are
    /// the only remaining failure mode. Turnout construction awaits the
    /// full calibration sweep, so the device is in its initial safe state
    /// before this returns.
    pub async fn construct<B: LineBank>(
        self,
        config: DeviceConfig,
        bank: &mut B,
        timing: TurnoutTiming,
    ) -> Result<Device<B::Line>, crate::traits::ClaimError> {
        match self {
            DeviceKind::GermanHauptsignal => {
                let params = &config.params;
                let red = bank.claim(pin_param(params, "red_pin").unwrap_or_default())?;
                let green = bank.claim(pin_param(params, "green_pin").unwrap_or_default())?;
                let yellow = match pin_param(params, "yellow_pin") {
                    Some(pin) => Some(bank.claim(pin)?),
                    None => None,
                };
                Ok(Device::Signal(LightSignal::new(config, red, green, yellow)))
            }
            DeviceKind::TwoPinSolenoidTurnout => {
                let params = &config.params;
                let enable = bank.claim(pin_param(params, "enable_pin").unwrap_or_default())?;
                let direction =
                    bank.claim(pin_param(params, "direction_pin").unwrap_or_default())?;
                let turn_high = params
                    .get("turnout_high")
                    .and_then(Value::as_bool)
                    .unwrap_or_default();
                Ok(Device::Turnout(
                    SolenoidTurnout::new(config, enable, direction, turn_high, timing).await,
                ))
            }
        }
    }
}

/// Validate a creation record against a target collection.
///
/// Returns the resolved kind only if the tag is known, belongs to
/// `collection`, the id is non-empty, and `params` has the exact shape the
/// type requires. No side effects.
pub fn validate_create(config: &DeviceConfig, collection: Collection) -> Option<DeviceKind> {
    let kind = DeviceKind::from_tag(&config.kind)?;
    if kind.collection() != collection || config.id.is_empty() {
        return None;
    }
    kind.validate_params(&config.params).then_some(kind)
}

/// Read a pin-number param, rejecting values that do not fit `u16`.
fn pin_param(params: &Map<String, Value>, key: &str) -> Option<u16> {
    params.get(key)?.as_u64()?.try_into().ok()
}
