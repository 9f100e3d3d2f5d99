//! Two-pin solenoid turnout device.
//!
//! The turnout is thrown by a twin-coil solenoid behind an H-bridge style
//! driver: an `enable` line powers the coil and a `direction` line selects
//! which way current flows. The coil tolerates only short pulses (holding
//! it energized burns it out), so every throw is a fixed-length pulse and
//! the enable line is always left low.
//!
//! Construction performs a calibration sweep (straight, turn, straight) so
//! the mechanical position matches the reported state, then leaves the
//! turnout set to `straight`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::traits::OutputLine;

use super::DeviceConfig;

/// The closed set of turnout positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnoutState {
    /// Both lines de-energized; mechanical position undetermined.
    Off,
    /// Set for the straight-ahead route.
    Straight,
    /// Set for the diverging route.
    Turn,
}

impl TurnoutState {
    /// The state as the lowercase wire string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TurnoutState::Off => "off",
            TurnoutState::Straight => "straight",
            TurnoutState::Turn => "turn",
        }
    }

    /// Parse a wire string into a state. Case-sensitive, like the API.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(TurnoutState::Off),
            "straight" => Some(TurnoutState::Straight),
            "turn" => Some(TurnoutState::Turn),
            _ => None,
        }
    }
}

/// Solenoid drive timing.
///
/// The defaults match the hardware (10 ms direction settle, 100 ms coil
/// pulse, 500 ms pause between calibration throws); tests shrink them to
/// keep the calibration sweep fast.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TurnoutTiming {
    /// Delay between asserting enable and driving the direction line.
    pub settle_ms: u64,
    /// How long the coil stays energized per throw.
    pub pulse_ms: u64,
    /// Pause between throws of the calibration sweep.
    pub sweep_pause_ms: u64,
}

impl Default for TurnoutTiming {
    fn default() -> Self {
        Self {
            settle_ms: 10,
            pulse_ms: 100,
            sweep_pause_ms: 500,
        }
    }
}

impl TurnoutTiming {
    /// Minimal delays for unit tests.
    pub const fn fast() -> Self {
        Self {
            settle_ms: 1,
            pulse_ms: 1,
            sweep_pause_ms: 1,
        }
    }
}

/// A twin-coil solenoid turnout with exclusive ownership of its lines.
#[derive(Debug)]
pub struct SolenoidTurnout<L: OutputLine> {
    config: DeviceConfig,
    enable: L,
    direction: L,
    turn_high: bool,
    timing: TurnoutTiming,
    state: TurnoutState,
}

impl<L: OutputLine> SolenoidTurnout<L> {
    /// Construct a turnout, run the calibration sweep, and leave it at
    /// `straight`.
    ///
    /// `turn_high` selects the wiring polarity: whether the `turn` position
    /// is reached by driving the direction line high or low.
    pub async fn new(
        config: DeviceConfig,
        enable: L,
        direction: L,
        turn_high: bool,
        timing: TurnoutTiming,
    ) -> Self {
        let mut turnout = Self {
            config,
            enable,
            direction,
            turn_high,
            timing,
            state: TurnoutState::Off,
        };
        turnout.calibrate().await;
        turnout
    }

    /// The creation record this turnout was built from.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Current position.
    pub fn state(&self) -> TurnoutState {
        self.state
    }

    /// Throw the sweep: straight, turn, straight, with a pause after each,
    /// so the mechanism ends in a known position.
    async fn calibrate(&mut self) {
        for position in [
            TurnoutState::Straight,
            TurnoutState::Turn,
            TurnoutState::Straight,
        ] {
            self.apply(position).await;
            sleep(Duration::from_millis(self.timing.sweep_pause_ms)).await;
        }
    }

    /// Drive the turnout to the requested position.
    ///
    /// `straight` and `turn` are pulses: enable high, settle, direction set
    /// per polarity, pulse, enable low. `off` de-energizes both lines.
    /// The reported state changes only after the full sequence completes,
    /// so a concurrent read never observes a half-thrown position.
    ///
    /// Idempotent: re-throwing the current position is a harmless re-pulse.
    pub async fn apply(&mut self, state: TurnoutState) {
        match state {
            TurnoutState::Off => {
                self.direction.set_low();
                self.enable.set_low();
            }
            TurnoutState::Straight | TurnoutState::Turn => {
                self.enable.set_high();
                sleep(Duration::from_millis(self.timing.settle_ms)).await;
                if (state == TurnoutState::Turn) == self.turn_high {
                    self.direction.set_high();
                } else {
                    self.direction.set_low();
                }
                sleep(Duration::from_millis(self.timing.pulse_ms)).await;
                self.enable.set_low();
            }
        }
        self.state = state;
    }
}
