//! Network abstraction trait for the station WiFi interface.
//!
//! The control plane itself is transport-agnostic; the only network concern
//! the core carries is joining the configured WiFi network at boot and
//! reporting why a join failed, so the failure can be blinked out on the
//! status LED (see [`crate::wifi`]).

/// Result of polling an in-progress WiFi join.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinStatus {
    /// No join has been started.
    Idle,
    /// Still negotiating with the access point.
    Connecting,
    /// Joined and got an address.
    Connected,
    /// No access point with the configured SSID was found.
    NoApFound,
    /// The access point rejected the configured password.
    WrongPassword,
    /// Any other failure (DHCP, association timeout, driver error).
    Failed,
}

/// Station-mode WiFi interface.
///
/// Join is split into a non-blocking `start_join` plus `status` polling so
/// the caller can blink an activity LED while waiting, matching how the
/// hardware network stacks behave.
pub trait WifiInterface: Send {
    /// Begin joining the given network. Non-blocking.
    fn start_join(&mut self, ssid: &str, password: &str);

    /// Poll the current join status.
    fn status(&mut self) -> JoinStatus;

    /// Drop the current association, if any.
    fn disconnect(&mut self);
}
