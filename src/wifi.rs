//! Network join orchestration with LED failure reporting.
//!
//! [`connect`] drives a [`WifiInterface`] through up to `attempts` join
//! cycles, toggling the activity LED while polling so the hardware shows
//! visible progress. A failed attempt blinks a morse pattern identifying
//! the failure class before the next retry; the final failure is returned
//! to the caller after its pattern was blinked.

use std::time::Duration;

use thiserror::Error;

use crate::config::WifiConfig;
use crate::morse;
use crate::traits::{JoinStatus, OutputLine, WifiInterface};

/// Blink pattern for missing credentials.
pub const PATTERN_NOT_CONFIGURED: &str = "--- --- ---";
/// Blink pattern for an SSID that was not found.
pub const PATTERN_NO_AP: &str = "... ... ...";
/// Blink pattern for rejected credentials.
pub const PATTERN_WRONG_PASSWORD: &str = ".-. .-. .-.";
/// Blink pattern for every other failure, including timeouts.
pub const PATTERN_OTHER: &str = "-.- -.- -.-";

/// Why a join did not complete.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    /// No SSID configured; joining was never attempted.
    #[error("no wifi credentials configured")]
    NotConfigured,
    /// The configured SSID was not seen on air.
    #[error("access point not found")]
    NoApFound,
    /// The access point rejected the credentials.
    #[error("wrong wifi password")]
    WrongPassword,
    /// The interface reported an unspecified failure.
    #[error("wifi join failed")]
    Failed,
    /// No terminal status within the per-attempt timeout.
    #[error("wifi join timed out")]
    Timeout,
}

impl JoinError {
    /// The morse pattern identifying this failure on the status LED.
    pub const fn pattern(&self) -> &'static str {
        match self {
            JoinError::NotConfigured => PATTERN_NOT_CONFIGURED,
            JoinError::NoApFound => PATTERN_NO_AP,
            JoinError::WrongPassword => PATTERN_WRONG_PASSWORD,
            JoinError::Failed | JoinError::Timeout => PATTERN_OTHER,
        }
    }
}

/// Join the configured network, blinking failures on `activity`.
///
/// Polls `wifi.status()` every `poll_interval_ms` until a terminal status
/// or the `connect_timeout_ms` deadline, toggling the LED on each poll.
/// On success the LED is left low. Retries up to `attempts` times; every
/// failed attempt blinks its pattern with `blink_unit` as the morse time
/// unit.
pub async fn connect<W, L>(
    wifi: &mut W,
    activity: &mut L,
    config: &WifiConfig,
    blink_unit: Duration,
) -> Result<(), JoinError>
where
    W: WifiInterface,
    L: OutputLine,
{
    if !config.is_configured() {
        tracing::warn!("wifi credentials missing, staying offline");
        morse::blink(activity, PATTERN_NOT_CONFIGURED, blink_unit).await;
        return Err(JoinError::NotConfigured);
    }

    let poll_interval = Duration::from_millis(u64::from(config.poll_interval_ms));
    let polls_per_attempt =
        (u64::from(config.connect_timeout_ms) / u64::from(config.poll_interval_ms).max(1)).max(1);

    let mut last_error = JoinError::Timeout;
    for attempt in 1..=config.attempts.max(1) {
        tracing::info!(ssid = config.ssid.as_str(), attempt, "joining wifi");
        wifi.start_join(config.ssid.as_str(), config.password.as_str());

        let outcome = poll_until_terminal(wifi, activity, poll_interval, polls_per_attempt).await;
        match outcome {
            Ok(()) => {
                activity.set_low();
                tracing::info!(ssid = config.ssid.as_str(), "wifi connected");
                return Ok(());
            }
            Err(err) => {
                tracing::warn!(attempt, error = %err, "wifi join attempt failed");
                morse::blink(activity, err.pattern(), blink_unit).await;
                last_error = err;
            }
        }
    }
    Err(last_error)
}

async fn poll_until_terminal<W, L>(
    wifi: &mut W,
    activity: &mut L,
    poll_interval: Duration,
    max_polls: u64,
) -> Result<(), JoinError>
where
    W: WifiInterface,
    L: OutputLine,
{
    for _ in 0..max_polls {
        activity.toggle();
        match wifi.status() {
            JoinStatus::Connected => return Ok(()),
            JoinStatus::NoApFound => return Err(JoinError::NoApFound),
            JoinStatus::WrongPassword => return Err(JoinError::WrongPassword),
            JoinStatus::Failed => return Err(JoinError::Failed),
            JoinStatus::Idle | JoinStatus::Connecting => {
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
    Err(JoinError::Timeout)
}
