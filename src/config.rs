//! Application configuration: builders plus a dotted-key `.env` loader.
//!
//! Uses `heapless::String` for credential fields so the same config types
//! work on heap-constrained targets.
//!
//! # Example
//!
//! ```rust
//! use rs_trackside::config::{Config, WebConfig, WifiConfig};
//!
//! // Use defaults
//! let config = Config::default();
//!
//! // Or customize
//! let config = Config::default()
//!     .with_wifi(WifiConfig::default().with_ssid("depot"))
//!     .with_web(WebConfig::default().with_port(3000));
//! ```
//!
//! # `.env` format
//!
//! One `SECTION.KEY=value` pair per line, `#` comments and blank lines
//! skipped, everything after the first `=` taken verbatim:
//!
//! ```text
//! WIFI.SSID=depot
//! WIFI.PASSWORD=secret
//! WEB.PORT=8080
//! SYSTEM.BUSY_PIN=25
//! ```

use heapless::String as HString;

use crate::devices::{DeviceConfig, TurnoutTiming};

/// Maximum length for short config strings (SSIDs, passwords)
pub const MAX_SHORT_STRING: usize = 64;

/// Type alias for short config strings
pub type ShortString = HString<MAX_SHORT_STRING>;

/// Create a ShortString from a &str, truncating if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    // Take only what fits
    let take = s.len().min(MAX_SHORT_STRING);
    // Find valid UTF-8 boundary
    let valid_end = s
        .char_indices()
        .take_while(|(i, _)| *i < take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// WiFi connection configuration
    pub wifi: WifiConfig,
    /// Web server configuration
    pub web: WebConfig,
    /// Shutdown, busy LED, and diagnostics configuration
    pub system: SystemConfig,
    /// Solenoid drive timing
    pub turnout: TurnoutTiming,
    /// Devices to register at startup
    pub seed: Vec<DeviceConfig>,
}

impl Config {
    /// Set WiFi configuration
    pub fn with_wifi(mut self, wifi: WifiConfig) -> Self {
        self.wifi = wifi;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }

    /// Set system configuration
    pub fn with_system(mut self, system: SystemConfig) -> Self {
        self.system = system;
        self
    }

    /// Set solenoid timing
    pub fn with_turnout(mut self, turnout: TurnoutTiming) -> Self {
        self.turnout = turnout;
        self
    }

    /// Set the startup device seed
    pub fn with_seed(mut self, seed: Vec<DeviceConfig>) -> Self {
        self.seed = seed;
        self
    }

    /// Load configuration from a `.env` file, applied over the defaults.
    pub fn from_env_file(path: &str) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::from_env_str(&contents))
    }

    /// Parse `.env` contents, applied over the defaults.
    ///
    /// Unknown keys and unparseable values are logged and skipped; a bad
    /// line never aborts the load.
    pub fn from_env_str(contents: &str) -> Self {
        let mut config = Self::default();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                tracing::warn!(line, "skipping malformed env line");
                continue;
            };
            config.apply_env(key.trim(), value.trim());
        }
        config
    }

    fn apply_env(&mut self, key: &str, value: &str) {
        match key {
            "WIFI.SSID" => self.wifi.ssid = short_string(value),
            "WIFI.PASSWORD" => self.wifi.password = short_string(value),
            "WIFI.TIMEOUT_MS" => set_number(&mut self.wifi.connect_timeout_ms, key, value),
            "WIFI.POLL_MS" => set_number(&mut self.wifi.poll_interval_ms, key, value),
            "WIFI.ATTEMPTS" => set_number(&mut self.wifi.attempts, key, value),
            "WIFI.ENABLED" => set_bool(&mut self.wifi.enabled, key, value),
            "WEB.PORT" => set_number(&mut self.web.port, key, value),
            "WEB.CORS" => set_bool(&mut self.web.cors_permissive, key, value),
            "WEB.ENABLED" => set_bool(&mut self.web.enabled, key, value),
            "SYSTEM.GRACE_MS" => set_number(&mut self.system.shutdown_grace_ms, key, value),
            "SYSTEM.BUSY_PIN" => match value.parse() {
                Ok(pin) => self.system.busy_pin = Some(pin),
                Err(_) => tracing::warn!(key, value, "ignoring unparseable env value"),
            },
            "SYSTEM.BLINK_UNIT_MS" => set_number(&mut self.system.blink_unit_ms, key, value),
            "TURNOUT.SETTLE_MS" => set_number(&mut self.turnout.settle_ms, key, value),
            "TURNOUT.PULSE_MS" => set_number(&mut self.turnout.pulse_ms, key, value),
            "TURNOUT.SWEEP_PAUSE_MS" => set_number(&mut self.turnout.sweep_pause_ms, key, value),
            _ => tracing::warn!(key, "ignoring unknown env key"),
        }
    }
}

fn set_number<T: std::str::FromStr>(slot: &mut T, key: &str, value: &str) {
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => tracing::warn!(key, value, "ignoring unparseable env value"),
    }
}

fn set_bool(slot: &mut bool, key: &str, value: &str) {
    match value {
        "true" | "1" => *slot = true,
        "false" | "0" => *slot = false,
        _ => tracing::warn!(key, value, "ignoring unparseable env value"),
    }
}

// ============================================================================
// WiFi Config
// ============================================================================

/// WiFi connection configuration
#[derive(Clone, Debug)]
pub struct WifiConfig {
    /// WiFi network SSID
    pub ssid: ShortString,
    /// WiFi password
    pub password: ShortString,
    /// Per-attempt connection timeout in milliseconds
    pub connect_timeout_ms: u32,
    /// Status poll interval while joining, in milliseconds
    pub poll_interval_ms: u32,
    /// Maximum join attempts before giving up
    pub attempts: u8,
    /// Whether WiFi is enabled
    pub enabled: bool,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            ssid: ShortString::new(),
            password: ShortString::new(),
            connect_timeout_ms: 30_000,
            poll_interval_ms: 500,
            attempts: 3,
            enabled: true,
        }
    }
}

impl WifiConfig {
    /// Set the SSID
    pub fn with_ssid(mut self, ssid: &str) -> Self {
        self.ssid = short_string(ssid);
        self
    }

    /// Set the password
    pub fn with_password(mut self, password: &str) -> Self {
        self.password = short_string(password);
        self
    }

    /// Set the per-attempt connection timeout
    pub fn with_connect_timeout_ms(mut self, ms: u32) -> Self {
        self.connect_timeout_ms = ms;
        self
    }

    /// Set the status poll interval
    pub fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the maximum join attempts
    pub fn with_attempts(mut self, attempts: u8) -> Self {
        self.attempts = attempts;
        self
    }

    /// Enable or disable WiFi
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Check if WiFi credentials are configured
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web server configuration
#[derive(Clone, Debug)]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
    /// Whether web server is enabled
    pub enabled: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_permissive: true,
            enabled: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Enable or disable web server
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

// ============================================================================
// System Config
// ============================================================================

/// Shutdown, busy LED, and diagnostics configuration
#[derive(Clone, Debug)]
pub struct SystemConfig {
    /// Grace period between a shutdown request and the off-sweep, in
    /// milliseconds
    pub shutdown_grace_ms: u64,
    /// Pin driving the request-activity LED, if wired
    pub busy_pin: Option<u16>,
    /// Morse time unit for diagnostic blink patterns, in milliseconds
    pub blink_unit_ms: u64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_ms: 1000,
            busy_pin: None,
            blink_unit_ms: 200,
        }
    }
}

impl SystemConfig {
    /// Set the shutdown grace period
    pub fn with_shutdown_grace_ms(mut self, ms: u64) -> Self {
        self.shutdown_grace_ms = ms;
        self
    }

    /// Set the busy LED pin
    pub fn with_busy_pin(mut self, pin: u16) -> Self {
        self.busy_pin = Some(pin);
        self
    }

    /// Set the morse time unit
    pub fn with_blink_unit_ms(mut self, ms: u64) -> Self {
        self.blink_unit_ms = ms;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.system.shutdown_grace_ms, 1000);
        assert_eq!(config.turnout.pulse_ms, 100);
        assert!(config.seed.is_empty());
    }

    #[test]
    fn builder_pattern() {
        let config = Config::default()
            .with_wifi(WifiConfig::default().with_ssid("depot").with_attempts(1))
            .with_web(WebConfig::default().with_port(3000).with_cors(false))
            .with_system(SystemConfig::default().with_busy_pin(25));

        assert_eq!(config.wifi.ssid.as_str(), "depot");
        assert_eq!(config.wifi.attempts, 1);
        assert_eq!(config.web.port, 3000);
        assert!(!config.web.cors_permissive);
        assert_eq!(config.system.busy_pin, Some(25));
    }

    #[test]
    fn wifi_config_is_configured() {
        assert!(!WifiConfig::default().is_configured());
        assert!(WifiConfig::default().with_ssid("depot").is_configured());
    }

    #[test]
    fn short_string_truncation() {
        let long_input = "a".repeat(100);
        let s = short_string(&long_input);
        assert!(s.len() <= MAX_SHORT_STRING);
    }

    #[test]
    fn env_parsing_applies_known_keys() {
        let config = Config::from_env_str(
            "# trackside settings\n\
             WIFI.SSID=depot\n\
             WIFI.PASSWORD=secret\n\
             \n\
             WEB.PORT=9090\n\
             WEB.CORS=false\n\
             SYSTEM.GRACE_MS=250\n\
             SYSTEM.BUSY_PIN=25\n\
             TURNOUT.PULSE_MS=50\n",
        );

        assert_eq!(config.wifi.ssid.as_str(), "depot");
        assert_eq!(config.wifi.password.as_str(), "secret");
        assert_eq!(config.web.port, 9090);
        assert!(!config.web.cors_permissive);
        assert_eq!(config.system.shutdown_grace_ms, 250);
        assert_eq!(config.system.busy_pin, Some(25));
        assert_eq!(config.turnout.pulse_ms, 50);
    }

    #[test]
    fn env_parsing_skips_bad_lines() {
        let config = Config::from_env_str(
            "WEB.PORT=not-a-port\n\
             MYSTERY.KEY=1\n\
             no equals sign here\n\
             WEB.CORS=maybe\n\
             SYSTEM.GRACE_MS=50\n",
        );

        // Bad values leave defaults in place; good lines still apply
        assert_eq!(config.web.port, 8080);
        assert!(config.web.cors_permissive);
        assert_eq!(config.system.shutdown_grace_ms, 50);
    }

    #[test]
    fn env_value_keeps_everything_after_first_equals() {
        let config = Config::from_env_str("WIFI.PASSWORD=a=b=c\n");
        assert_eq!(config.wifi.password.as_str(), "a=b=c");
    }

    #[test]
    fn env_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "WEB.PORT=8099").unwrap();
        writeln!(file, "WIFI.SSID=yard").unwrap();

        let config = Config::from_env_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.web.port, 8099);
        assert_eq!(config.wifi.ssid.as_str(), "yard");
    }

    #[test]
    fn env_file_missing_is_an_error() {
        assert!(Config::from_env_file("/definitely/not/here.env").is_err());
    }
}
