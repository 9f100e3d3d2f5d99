//! Hardware abstraction traits for digital output lines.
//!
//! This module defines the core hardware interface that allows rs-trackside
//! to drive real GPIO on a microcontroller while testing everything on
//! desktop with mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`OutputLine`] | A single digital output (signal lamp, solenoid pin, LED) |
//! | [`LineBank`] | Exclusive-ownership source of output lines, keyed by pin number |
//!
//! # Ownership Model
//!
//! Every physical output is represented by exactly one live [`OutputLine`]
//! value. Lines are obtained from a [`LineBank`], which refuses to hand out
//! the same pin twice; dropping a line returns the pin to the bank. A device
//! that owns its lines therefore has exclusive control of its outputs by
//! construction, with no runtime locking.
//!
//! # Example
//!
//! ```rust
//! use rs_trackside::traits::{LineBank, OutputLine};
//! use rs_trackside::hal::MockLineBank;
//!
//! let mut bank = MockLineBank::new();
//! let mut lamp = bank.claim(4).unwrap();
//!
//! lamp.set_high();
//! assert!(lamp.is_high());
//! assert_eq!(bank.level(4), Some(true));
//!
//! // The pin is now taken
//! assert!(bank.claim(4).is_err());
//! ```

use core::fmt;

/// A single digital output line.
///
/// Models the output half of a GPIO pin: it can be driven high or low and
/// its current level can be read back. Writes are infallible; on the class
/// of hardware this crate targets, setting an output register cannot fail.
///
/// Implementations must be [`Send`] so devices owning lines can live behind
/// the shared application state.
pub trait OutputLine: Send {
    /// Drive the line high (energize the connected load).
    fn set_high(&mut self);

    /// Drive the line low (de-energize the connected load).
    fn set_low(&mut self);

    /// Invert the current level.
    ///
    /// Default implementation reads the level and writes the opposite.
    fn toggle(&mut self) {
        if self.is_high() {
            self.set_low();
        } else {
            self.set_high();
        }
    }

    /// Returns true if the line is currently driven high.
    fn is_high(&self) -> bool;
}

/// Error claiming an output line from a [`LineBank`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimError {
    /// The pin number does not exist on this hardware.
    UnknownLine(u16),
    /// The pin is already owned by another live [`OutputLine`].
    AlreadyClaimed(u16),
}

impl fmt::Display for ClaimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimError::UnknownLine(pin) => write!(f, "no output line for pin {pin}"),
            ClaimError::AlreadyClaimed(pin) => write!(f, "pin {pin} is already claimed"),
        }
    }
}

impl std::error::Error for ClaimError {}

/// Exclusive-ownership source of output lines.
///
/// A bank hands out at most one live [`OutputLine`] per pin number. The
/// returned line value is the ownership token: while it exists no other
/// caller can claim the same pin, and dropping it releases the pin.
///
/// # Implementation Notes
///
/// - `claim` must not touch the electrical state of the pin; devices set
///   their outputs to a defined state themselves during construction.
/// - Implementations decide which pin numbers exist. The mock bank accepts
///   any pin and materializes it on first claim.
pub trait LineBank: Send {
    /// The line type this bank produces.
    type Line: OutputLine + 'static;

    /// Claim exclusive ownership of the given pin.
    fn claim(&mut self, pin: u16) -> Result<Self::Line, ClaimError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestLine {
        high: bool,
    }

    impl OutputLine for TestLine {
        fn set_high(&mut self) {
            self.high = true;
        }

        fn set_low(&mut self) {
            self.high = false;
        }

        fn is_high(&self) -> bool {
            self.high
        }
    }

    #[test]
    fn toggle_default_impl() {
        let mut line = TestLine { high: false };
        line.toggle();
        assert!(line.is_high());
        line.toggle();
        assert!(!line.is_high());
    }

    #[test]
    fn claim_error_display() {
        assert_eq!(
            ClaimError::UnknownLine(7).to_string(),
            "no output line for pin 7"
        );
        assert_eq!(
            ClaimError::AlreadyClaimed(3).to_string(),
            "pin 3 is already claimed"
        );
    }
}
