//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for the hardware and network traits,
//! enabling development and testing on desktop without physical trackside
//! hardware.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockLineBank`] | [`LineBank`] | Tracks pin claims and line levels |
//! | [`MockLine`] | [`OutputLine`] | Records every level transition |
//! | [`MockWifi`] | [`WifiInterface`] | Scripted join status sequence |
//!
//! The bank is [`Clone`]: all clones share the same cells, so a test can
//! keep a clone for inspection while the application owns the other.
//!
//! # Example
//!
//! ```rust
//! use rs_trackside::hal::MockLineBank;
//! use rs_trackside::traits::{LineBank, OutputLine};
//!
//! let mut bank = MockLineBank::new();
//! let inspector = bank.clone();
//!
//! let mut lamp = bank.claim(2).unwrap();
//! lamp.set_high();
//!
//! assert_eq!(inspector.level(2), Some(true));
//! assert_eq!(inspector.history(2), vec![true]);
//!
//! drop(lamp);
//! assert!(!inspector.is_claimed(2));
//! ```
//!
//! [`LineBank`]: crate::traits::LineBank
//! [`OutputLine`]: crate::traits::OutputLine
//! [`WifiInterface`]: crate::traits::WifiInterface

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::traits::{ClaimError, JoinStatus, LineBank, OutputLine, WifiInterface};

// ============================================================================
// Line Bank Mock
// ============================================================================

/// Backing state for one mock pin, shared between bank and line.
#[derive(Debug, Default)]
struct LineCell {
    level: AtomicBool,
    history: Mutex<Vec<bool>>,
}

impl LineCell {
    fn write(&self, level: bool) {
        self.level.store(level, Ordering::SeqCst);
        self.history
            .lock()
            .expect("line history lock poisoned")
            .push(level);
    }
}

/// Mock line bank for testing.
///
/// Accepts any pin number, materializing a cell on first claim. Cells
/// survive the release of a line, so a test can still inspect the final
/// level of a pin after the owning device was deleted.
#[derive(Clone, Debug, Default)]
pub struct MockLineBank {
    cells: Arc<Mutex<HashMap<u16, Arc<LineCell>>>>,
    claimed: Arc<Mutex<HashSet<u16>>>,
}

impl MockLineBank {
    /// Creates a new, empty mock bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level of a pin, or `None` if it was never claimed.
    pub fn level(&self, pin: u16) -> Option<bool> {
        self.cells
            .lock()
            .expect("bank lock poisoned")
            .get(&pin)
            .map(|cell| cell.level.load(Ordering::SeqCst))
    }

    /// Every level ever written to a pin, oldest first.
    pub fn history(&self, pin: u16) -> Vec<bool> {
        self.cells
            .lock()
            .expect("bank lock poisoned")
            .get(&pin)
            .map(|cell| cell.history.lock().expect("history lock poisoned").clone())
            .unwrap_or_default()
    }

    /// Returns true if a live [`MockLine`] currently owns the pin.
    pub fn is_claimed(&self, pin: u16) -> bool {
        self.claimed
            .lock()
            .expect("claimed lock poisoned")
            .contains(&pin)
    }
}

impl LineBank for MockLineBank {
    type Line = MockLine;

    fn claim(&mut self, pin: u16) -> Result<MockLine, ClaimError> {
        let mut claimed = self.claimed.lock().expect("claimed lock poisoned");
        if !claimed.insert(pin) {
            return Err(ClaimError::AlreadyClaimed(pin));
        }
        let cell = Arc::clone(
            self.cells
                .lock()
                .expect("bank lock poisoned")
                .entry(pin)
                .or_default(),
        );
        Ok(MockLine {
            pin,
            cell,
            claimed: Arc::clone(&self.claimed),
        })
    }
}

/// Mock output line handed out by [`MockLineBank`].
///
/// Releases its pin back to the bank when dropped.
#[derive(Debug)]
pub struct MockLine {
    pin: u16,
    cell: Arc<LineCell>,
    claimed: Arc<Mutex<HashSet<u16>>>,
}

impl MockLine {
    /// The pin number this line controls.
    pub fn pin(&self) -> u16 {
        self.pin
    }
}

impl OutputLine for MockLine {
    fn set_high(&mut self) {
        self.cell.write(true);
    }

    fn set_low(&mut self) {
        self.cell.write(false);
    }

    fn is_high(&self) -> bool {
        self.cell.level.load(Ordering::SeqCst)
    }
}

impl Drop for MockLine {
    fn drop(&mut self) {
        self.claimed
            .lock()
            .expect("claimed lock poisoned")
            .remove(&self.pin);
    }
}

// ============================================================================
// WiFi Mock
// ============================================================================

/// Mock WiFi interface with a scripted status sequence.
///
/// Each call to `status()` pops the next scripted entry; once the script is
/// exhausted the last status repeats. Useful for driving
/// [`wifi::connect`](crate::wifi::connect) through its retry and failure
/// paths.
#[derive(Debug, Default)]
pub struct MockWifi {
    script: Vec<JoinStatus>,
    position: usize,
    /// Credentials from the most recent `start_join` call.
    pub last_join: Option<(String, String)>,
    /// Number of times `start_join` was called.
    pub join_attempts: usize,
    /// Whether `disconnect` was called.
    pub disconnected: bool,
}

impl MockWifi {
    /// Creates a mock that reports [`JoinStatus::Idle`] forever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that walks through the given statuses in order.
    pub fn with_script(script: &[JoinStatus]) -> Self {
        Self {
            script: script.to_vec(),
            ..Self::default()
        }
    }

    /// Append a status to the script.
    pub fn push_status(&mut self, status: JoinStatus) {
        self.script.push(status);
    }
}

impl WifiInterface for MockWifi {
    fn start_join(&mut self, ssid: &str, password: &str) {
        self.last_join = Some((ssid.to_owned(), password.to_owned()));
        self.join_attempts += 1;
    }

    fn status(&mut self) -> JoinStatus {
        let status = match self.script.get(self.position) {
            Some(status) => *status,
            None => *self.script.last().unwrap_or(&JoinStatus::Idle),
        };
        if self.position < self.script.len() {
            self.position += 1;
        }
        status
    }

    fn disconnect(&mut self) {
        self.disconnected = true;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // MockLineBank Tests
    // =========================================================================

    #[test]
    fn bank_claim_and_drive() {
        let mut bank = MockLineBank::new();
        let mut line = bank.claim(5).unwrap();

        assert!(!line.is_high());
        line.set_high();
        assert!(line.is_high());
        assert_eq!(bank.level(5), Some(true));
        assert_eq!(line.pin(), 5);
    }

    #[test]
    fn bank_rejects_double_claim() {
        let mut bank = MockLineBank::new();
        let _line = bank.claim(1).unwrap();
        assert!(matches!(bank.claim(1), Err(ClaimError::AlreadyClaimed(1))));
    }

    #[test]
    fn bank_releases_on_drop() {
        let mut bank = MockLineBank::new();
        {
            let mut line = bank.claim(9).unwrap();
            line.set_high();
            assert!(bank.is_claimed(9));
        }
        assert!(!bank.is_claimed(9));
        // Level survives release for post-mortem inspection
        assert_eq!(bank.level(9), Some(true));

        // Pin can be claimed again
        assert!(bank.claim(9).is_ok());
    }

    #[test]
    fn bank_records_history() {
        let mut bank = MockLineBank::new();
        let mut line = bank.claim(2).unwrap();
        line.set_high();
        line.set_low();
        line.toggle();
        assert_eq!(bank.history(2), vec![true, false, true]);
    }

    #[test]
    fn bank_clones_share_state() {
        let mut bank = MockLineBank::new();
        let inspector = bank.clone();

        let mut line = bank.claim(3).unwrap();
        line.set_high();

        assert_eq!(inspector.level(3), Some(true));
        assert!(inspector.is_claimed(3));
    }

    #[test]
    fn bank_unclaimed_pin_has_no_level() {
        let bank = MockLineBank::new();
        assert_eq!(bank.level(42), None);
        assert!(bank.history(42).is_empty());
    }

    // =========================================================================
    // MockWifi Tests
    // =========================================================================

    #[test]
    fn wifi_idle_without_script() {
        let mut wifi = MockWifi::new();
        assert_eq!(wifi.status(), JoinStatus::Idle);
        assert_eq!(wifi.status(), JoinStatus::Idle);
    }

    #[test]
    fn wifi_walks_script_and_repeats_last() {
        let mut wifi =
            MockWifi::with_script(&[JoinStatus::Connecting, JoinStatus::Connected]);
        assert_eq!(wifi.status(), JoinStatus::Connecting);
        assert_eq!(wifi.status(), JoinStatus::Connected);
        assert_eq!(wifi.status(), JoinStatus::Connected);
    }

    #[test]
    fn wifi_records_join_parameters() {
        let mut wifi = MockWifi::new();
        wifi.start_join("depot", "secret");
        wifi.start_join("depot", "secret");

        assert_eq!(wifi.join_attempts, 2);
        let (ssid, password) = wifi.last_join.as_ref().unwrap();
        assert_eq!(ssid, "depot");
        assert_eq!(password, "secret");
    }
}
