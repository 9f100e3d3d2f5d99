//! Light signal device (German main signal lamp layout).
//!
//! A signal is a set of lamps driven combinationally: every state change is
//! an immediate rewrite of all lamp lines with no timing requirement. Two
//! lamp layouts exist:
//!
//! - Two-aspect: red + green, states `off | danger | clear`
//! - Three-aspect: red + green + yellow, adds `slow` (green and yellow lit)
//!
//! A freshly constructed signal always shows `danger`.

use serde::{Deserialize, Serialize};

use crate::traits::OutputLine;

use super::DeviceConfig;

/// The closed set of signal aspects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    /// All lamps dark (safe state).
    Off,
    /// Red lamp only.
    Danger,
    /// Green lamp only.
    Clear,
    /// Green and yellow lamps (proceed slowly). Three-aspect signals only.
    Slow,
}

impl SignalState {
    /// The state as the lowercase wire string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SignalState::Off => "off",
            SignalState::Danger => "danger",
            SignalState::Clear => "clear",
            SignalState::Slow => "slow",
        }
    }

    /// Parse a wire string into a state. Case-sensitive, like the API.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(SignalState::Off),
            "danger" => Some(SignalState::Danger),
            "clear" => Some(SignalState::Clear),
            "slow" => Some(SignalState::Slow),
            _ => None,
        }
    }
}

/// A lamp signal with exclusive ownership of its output lines.
#[derive(Debug)]
pub struct LightSignal<L: OutputLine> {
    config: DeviceConfig,
    red: L,
    green: L,
    yellow: Option<L>,
    state: SignalState,
}

impl<L: OutputLine> LightSignal<L> {
    /// Construct a signal and set it to `danger`.
    ///
    /// `yellow` selects the lamp layout: `Some` makes this a three-aspect
    /// signal that additionally accepts the `slow` state.
    pub fn new(config: DeviceConfig, red: L, green: L, yellow: Option<L>) -> Self {
        let mut signal = Self {
            config,
            red,
            green,
            yellow,
            state: SignalState::Danger,
        };
        signal.apply(SignalState::Danger);
        signal
    }

    /// The creation record this signal was built from.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Current aspect.
    pub fn state(&self) -> SignalState {
        self.state
    }

    /// Returns true if this layout supports the given state.
    ///
    /// `slow` requires the yellow lamp; everything else is always valid.
    pub fn accepts(&self, state: SignalState) -> bool {
        state != SignalState::Slow || self.yellow.is_some()
    }

    /// Drive the lamps to the requested aspect.
    ///
    /// Idempotent: re-applying the current state rewrites the same levels.
    /// Callers must check [`accepts`](Self::accepts) first; an unsupported
    /// `slow` on a two-aspect layout degrades to green-only.
    pub fn apply(&mut self, state: SignalState) {
        match state {
            SignalState::Off => {
                self.red.set_low();
                self.green.set_low();
                if let Some(yellow) = self.yellow.as_mut() {
                    yellow.set_low();
                }
            }
            SignalState::Danger => {
                self.red.set_high();
                self.green.set_low();
                if let Some(yellow) = self.yellow.as_mut() {
                    yellow.set_low();
                }
            }
            SignalState::Clear => {
                self.red.set_low();
                self.green.set_high();
                if let Some(yellow) = self.yellow.as_mut() {
                    yellow.set_low();
                }
            }
            SignalState::Slow => {
                self.red.set_low();
                self.green.set_high();
                if let Some(yellow) = self.yellow.as_mut() {
                    yellow.set_high();
                }
            }
        }
        self.state = state;
    }
}
