//! Unified shared state for the trackside services.
//!
//! `TracksideState` wraps the whole device world (line bank plus both
//! registries) in a single async mutex and adds the cross-cutting pieces
//! every service needs: the request activity tracker and the shutdown
//! coordinator.
//!
//! # Locking
//!
//! One `tokio::sync::Mutex` over [`TracksideCore`] rather than per-registry
//! locks: device actuation awaits timed solenoid pulses while holding the
//! lock, which both serializes conflicting mutations and guarantees a
//! turnout calibration finishes before any other request observes the new
//! device. The lock is async so holding it across those sleeps is legal.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rs_trackside::services::{TracksideCore, TracksideState};
//!
//! let core = TracksideCore::new(bank, timing);
//! let state = Arc::new(TracksideState::new(core, None, grace));
//!
//! let mut core = state.lock().await;
//! let repr = core.signals.create(config, &mut core.bank).await?;
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{watch, MutexGuard};

use crate::devices::catalog::Collection;
use crate::devices::{DeviceConfig, DeviceKind, TurnoutTiming};
use crate::registry::Registry;
use crate::traits::{LineBank, OutputLine};

// ============================================================================
// Shutdown Kind
// ============================================================================

/// What should happen after the shutdown sweep completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownKind {
    /// Stop serving and exit.
    Halt,
    /// Stop serving, then bring the whole stack back up.
    Restart,
}

// ============================================================================
// Trackside Core
// ============================================================================

/// The device world: the line bank and both registries.
///
/// Lives behind the [`TracksideState`] mutex; handlers borrow the bank and
/// a registry simultaneously through one guard.
pub struct TracksideCore<B: LineBank> {
    /// The output line bank devices claim from.
    pub bank: B,
    /// The signal collection.
    pub signals: Registry<B::Line>,
    /// The turnout collection.
    pub turnouts: Registry<B::Line>,
}

impl<B: LineBank> TracksideCore<B>
where
    B::Line: 'static,
{
    /// Creates a core with empty registries sharing one solenoid timing.
    pub fn new(bank: B, timing: TurnoutTiming) -> Self {
        Self {
            bank,
            signals: Registry::new(Collection::Signals).with_timing(timing),
            turnouts: Registry::new(Collection::Turnouts).with_timing(timing),
        }
    }

    /// The registry serving a collection.
    pub fn registry(&self, collection: Collection) -> &Registry<B::Line> {
        match collection {
            Collection::Signals => &self.signals,
            Collection::Turnouts => &self.turnouts,
        }
    }

    /// Register a list of devices at bootstrap.
    ///
    /// Each config is routed to its tag's collection; failures are logged
    /// and skipped so one bad seed entry cannot block startup.
    pub async fn seed(&mut self, configs: &[DeviceConfig]) {
        for config in configs {
            let Some(kind) = DeviceKind::from_tag(&config.kind) else {
                tracing::warn!(id = %config.id, kind = %config.kind, "skipping seed with unknown type");
                continue;
            };
            let registry = match kind.collection() {
                Collection::Signals => &mut self.signals,
                Collection::Turnouts => &mut self.turnouts,
            };
            if let Err(err) = registry.create(config.clone(), &mut self.bank).await {
                tracing::warn!(id = %config.id, error = %err, "seed device rejected");
            }
        }
    }

    /// Drive every registered device to `off`.
    pub async fn shutdown_all(&mut self) {
        self.signals.shutdown_all().await;
        self.turnouts.shutdown_all().await;
    }
}

// ============================================================================
// Request Activity Tracker
// ============================================================================

/// Counts in-flight requests and mirrors busyness on an LED.
///
/// The counter moves on guard creation and drop, so a handler that panics
/// or returns early still balances the count. The LED is asserted while at
/// least one request is in flight.
#[derive(Debug, Default)]
pub struct ActivityTracker<L: OutputLine> {
    in_flight: AtomicUsize,
    led: Mutex<Option<L>>,
}

impl<L: OutputLine> ActivityTracker<L> {
    /// Creates a tracker, optionally wired to a busy LED.
    pub fn new(led: Option<L>) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            led: Mutex::new(led),
        }
    }

    /// Current number of in-flight requests.
    pub fn count(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Mark a request as started; the returned guard ends it on drop.
    pub fn begin(&self) -> ActivityGuard<'_, L> {
        let previous = self.in_flight.fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            self.drive_led(true);
        }
        ActivityGuard { tracker: self }
    }

    fn drive_led(&self, level: bool) {
        if let Ok(mut led) = self.led.lock() {
            if let Some(led) = led.as_mut() {
                if level {
                    led.set_high();
                } else {
                    led.set_low();
                }
            }
        }
    }
}

/// RAII handle for one in-flight request.
#[derive(Debug)]
pub struct ActivityGuard<'a, L: OutputLine> {
    tracker: &'a ActivityTracker<L>,
}

impl<L: OutputLine> Drop for ActivityGuard<'_, L> {
    fn drop(&mut self) {
        let previous = self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst);
        if previous == 1 {
            self.tracker.drive_led(false);
        }
    }
}

// ============================================================================
// Trackside State
// ============================================================================

/// Shared state handed to every service: the locked core, the activity
/// tracker, and the shutdown coordinator.
pub struct TracksideState<B: LineBank> {
    core: tokio::sync::Mutex<TracksideCore<B>>,
    activity: ActivityTracker<B::Line>,
    grace: Duration,
    shutdown_tx: watch::Sender<Option<ShutdownKind>>,
}

impl<B: LineBank + 'static> TracksideState<B>
where
    B::Line: 'static,
{
    /// Creates shared state around a core.
    ///
    /// `busy_led` is the optional request-activity LED; `grace` is the
    /// delay between accepting a shutdown and running the off-sweep.
    pub fn new(core: TracksideCore<B>, busy_led: Option<B::Line>, grace: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(None);
        Self {
            core: tokio::sync::Mutex::new(core),
            activity: ActivityTracker::new(busy_led),
            grace,
            shutdown_tx,
        }
    }

    /// Lock the device world.
    pub async fn lock(&self) -> MutexGuard<'_, TracksideCore<B>> {
        self.core.lock().await
    }

    /// The request activity tracker.
    pub fn activity(&self) -> &ActivityTracker<B::Line> {
        &self.activity
    }

    /// Subscribe to shutdown notifications.
    ///
    /// The channel yields `Some(kind)` once the off-sweep has completed.
    pub fn subscribe_shutdown(&self) -> watch::Receiver<Option<ShutdownKind>> {
        self.shutdown_tx.subscribe()
    }

    /// Accept a shutdown request and schedule the deferred off-sweep.
    ///
    /// Returns immediately; after the grace period a background task locks
    /// the core, switches every device then registered off (including ones
    /// created during the grace period), and broadcasts `kind`. A second
    /// call while a sweep is pending schedules another sweep, which is
    /// harmless: switching off is idempotent and the watch channel keeps
    /// only the latest kind.
    pub fn schedule_shutdown(self: &Arc<Self>, kind: ShutdownKind) {
        let state = Arc::clone(self);
        tracing::info!(?kind, grace_ms = self.grace.as_millis() as u64, "shutdown accepted");
        tokio::spawn(async move {
            tokio::time::sleep(state.grace).await;
            state.core.lock().await.shutdown_all().await;
            tracing::info!(?kind, "shutdown sweep complete");
            let _ = state.shutdown_tx.send(Some(kind));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MockLineBank;
    use serde_json::json;

    fn signal_config(id: &str, red: u16, green: u16) -> DeviceConfig {
        DeviceConfig {
            id: id.into(),
            kind: "GermanHauptsignal".into(),
            params: json!({"red_pin": red, "green_pin": green})
                .as_object()
                .cloned()
                .unwrap_or_default(),
        }
    }

    fn core(bank: &MockLineBank) -> TracksideCore<MockLineBank> {
        TracksideCore::new(bank.clone(), TurnoutTiming::fast())
    }

    // =========================================================================
    // TracksideCore Tests
    // =========================================================================

    #[tokio::test]
    async fn seed_routes_by_collection_and_skips_bad_entries() {
        let bank = MockLineBank::new();
        let mut core = core(&bank);

        core.seed(&[
            signal_config("1", 0, 1),
            DeviceConfig {
                id: "t1".into(),
                kind: "TwoPinSolenoidTurnout".into(),
                params: json!({"enable_pin": 4, "direction_pin": 5, "turnout_high": true})
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            },
            DeviceConfig {
                id: "x".into(),
                kind: "Unknown".into(),
                params: Default::default(),
            },
            // Duplicate id, rejected without aborting the rest
            signal_config("1", 6, 7),
            signal_config("2", 8, 9),
        ])
        .await;

        assert_eq!(core.signals.len(), 2);
        assert_eq!(core.turnouts.len(), 1);
        assert_eq!(core.registry(Collection::Signals).len(), 2);
    }

    #[tokio::test]
    async fn shutdown_all_covers_both_registries() {
        let bank = MockLineBank::new();
        let mut core = core(&bank);
        core.seed(&[signal_config("1", 0, 1)]).await;

        core.shutdown_all().await;
        assert_eq!(core.signals.representations()[0].state, "off");
    }

    // =========================================================================
    // ActivityTracker Tests
    // =========================================================================

    #[test]
    fn activity_guard_balances_count() {
        let tracker: ActivityTracker<crate::hal::MockLine> = ActivityTracker::new(None);
        assert_eq!(tracker.count(), 0);

        let outer = tracker.begin();
        let inner = tracker.begin();
        assert_eq!(tracker.count(), 2);

        drop(inner);
        assert_eq!(tracker.count(), 1);
        drop(outer);
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn activity_led_tracks_busyness_edges() {
        let mut bank = MockLineBank::new();
        let led = crate::traits::LineBank::claim(&mut bank, 25).unwrap();
        let tracker = ActivityTracker::new(Some(led));

        let outer = tracker.begin();
        assert_eq!(bank.level(25), Some(true));

        // Nested request does not re-drive the LED
        let inner = tracker.begin();
        drop(inner);
        assert_eq!(bank.level(25), Some(true));

        drop(outer);
        assert_eq!(bank.level(25), Some(false));
        // Exactly one high and one low
        assert_eq!(bank.history(25), vec![true, false]);
    }

    // =========================================================================
    // Shutdown Coordinator Tests
    // =========================================================================

    #[tokio::test]
    async fn shutdown_sweeps_devices_created_during_grace() {
        let bank = MockLineBank::new();
        let mut core = core(&bank);
        core.seed(&[signal_config("1", 0, 1)]).await;
        let state = Arc::new(TracksideState::new(
            core,
            None,
            Duration::from_millis(20),
        ));

        let mut shutdown = state.subscribe_shutdown();
        state.schedule_shutdown(ShutdownKind::Halt);

        // Create a device while the sweep is pending
        {
            let mut core = state.lock().await;
            let core = &mut *core;
            core.signals
                .create(signal_config("2", 2, 3), &mut core.bank)
                .await
                .unwrap();
        }

        shutdown.wait_for(Option::is_some).await.unwrap();
        assert_eq!(*shutdown.borrow(), Some(ShutdownKind::Halt));

        let core = state.lock().await;
        for repr in core.signals.representations() {
            assert_eq!(repr.state, "off");
        }
    }

    #[tokio::test]
    async fn restart_kind_is_broadcast() {
        let bank = MockLineBank::new();
        let state = Arc::new(TracksideState::new(
            core(&bank),
            None,
            Duration::from_millis(1),
        ));

        let mut shutdown = state.subscribe_shutdown();
        state.schedule_shutdown(ShutdownKind::Restart);
        shutdown.wait_for(Option::is_some).await.unwrap();
        assert_eq!(*shutdown.borrow(), Some(ShutdownKind::Restart));
    }
}
