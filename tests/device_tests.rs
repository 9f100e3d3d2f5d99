//! Integration tests for the device lifecycle below the HTTP layer.
//!
//! Exercises catalog validation, registry lifecycle, and cross-collection
//! line exclusivity through the public library API.

use rs_trackside::devices::catalog::{self, Collection};
use rs_trackside::devices::{DeviceConfig, DeviceKind, TurnoutTiming};
use rs_trackside::hal::MockLineBank;
use rs_trackside::registry::{Registry, RegistryError};
use serde_json::{json, Value};

fn config(id: &str, kind: &str, params: Value) -> DeviceConfig {
    DeviceConfig {
        id: id.into(),
        kind: kind.into(),
        params: params.as_object().cloned().unwrap_or_default(),
    }
}

fn three_aspect(id: &str) -> DeviceConfig {
    config(
        id,
        "GermanHauptsignal",
        json!({"red_pin": 0, "green_pin": 1, "yellow_pin": 2}),
    )
}

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn validate_create_covers_both_kinds() {
    let signal = config("1", "GermanHauptsignal", json!({"red_pin": 0, "green_pin": 1}));
    assert_eq!(
        catalog::validate_create(&signal, Collection::Signals),
        Some(DeviceKind::GermanHauptsignal)
    );

    let turnout = config(
        "t",
        "TwoPinSolenoidTurnout",
        json!({"enable_pin": 4, "direction_pin": 5, "turnout_high": false}),
    );
    assert_eq!(
        catalog::validate_create(&turnout, Collection::Turnouts),
        Some(DeviceKind::TwoPinSolenoidTurnout)
    );
}

#[test]
fn validate_create_rejects_malformed_params() {
    let cases = [
        // Missing required key
        config("1", "GermanHauptsignal", json!({"red_pin": 0})),
        // Extraneous key
        config(
            "1",
            "GermanHauptsignal",
            json!({"red_pin": 0, "green_pin": 1, "blink_pin": 2}),
        ),
        // Wrong value type
        config(
            "1",
            "GermanHauptsignal",
            json!({"red_pin": "zero", "green_pin": 1}),
        ),
        // Unknown tag
        config("1", "Semaphore", json!({})),
    ];
    for case in cases {
        assert!(
            catalog::validate_create(&case, Collection::Signals).is_none(),
            "accepted {case:?}"
        );
    }
}

// ============================================================================
// Registry Lifecycle
// ============================================================================

#[tokio::test]
async fn three_aspect_signal_supports_slow() {
    let mut bank = MockLineBank::new();
    let mut registry =
        Registry::new(Collection::Signals).with_timing(TurnoutTiming::fast());

    registry.create(three_aspect("1"), &mut bank).await.unwrap();
    let repr = registry.update("1", &json!({"state": "slow"})).await.unwrap();

    assert_eq!(repr.state, "slow");
    assert_eq!(bank.level(1), Some(true));
    assert_eq!(bank.level(2), Some(true));
    assert_eq!(bank.level(0), Some(false));
}

#[tokio::test]
async fn two_aspect_signal_rejects_slow() {
    let mut bank = MockLineBank::new();
    let mut registry =
        Registry::new(Collection::Signals).with_timing(TurnoutTiming::fast());

    registry
        .create(
            config("1", "GermanHauptsignal", json!({"red_pin": 0, "green_pin": 1})),
            &mut bank,
        )
        .await
        .unwrap();

    let err = registry.update("1", &json!({"state": "slow"})).await.unwrap_err();
    assert_eq!(err, RegistryError::InvalidTransition("1".into()));
    assert_eq!(registry.get("1").unwrap().state_str(), "danger");
}

#[tokio::test]
async fn turnout_polarity_drives_direction() {
    let mut bank = MockLineBank::new();
    let mut registry =
        Registry::new(Collection::Turnouts).with_timing(TurnoutTiming::fast());

    registry
        .create(
            config(
                "t",
                "TwoPinSolenoidTurnout",
                json!({"enable_pin": 4, "direction_pin": 5, "turnout_high": false}),
            ),
            &mut bank,
        )
        .await
        .unwrap();

    registry.update("t", &json!({"state": "turn"})).await.unwrap();
    // Inverted polarity: turn drives the direction line low
    assert_eq!(bank.level(5), Some(false));
    registry.update("t", &json!({"state": "straight"})).await.unwrap();
    assert_eq!(bank.level(5), Some(true));
}

#[tokio::test]
async fn update_shape_grid() {
    let mut bank = MockLineBank::new();
    let mut registry =
        Registry::new(Collection::Signals).with_timing(TurnoutTiming::fast());
    registry.create(three_aspect("1"), &mut bank).await.unwrap();

    for body in [
        json!({}),
        json!({"aspect": "clear"}),
        json!({"state": 3}),
        json!({"state": null}),
        json!(["clear"]),
        Value::Null,
    ] {
        let err = registry.update("1", &body).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidTransition("1".into()),
            "accepted {body}"
        );
    }
    assert_eq!(registry.get("1").unwrap().state_str(), "danger");
}

#[tokio::test]
async fn delete_frees_lines_for_new_devices() {
    let mut bank = MockLineBank::new();
    let mut registry =
        Registry::new(Collection::Signals).with_timing(TurnoutTiming::fast());

    registry.create(three_aspect("1"), &mut bank).await.unwrap();
    registry.delete("1").await.unwrap();

    // A different device can now claim the same pins
    registry
        .create(
            config("2", "GermanHauptsignal", json!({"red_pin": 0, "green_pin": 1})),
            &mut bank,
        )
        .await
        .unwrap();
    assert_eq!(registry.get("2").unwrap().state_str(), "danger");
}

#[tokio::test]
async fn lines_are_exclusive_across_collections() {
    let mut bank = MockLineBank::new();
    let mut signals =
        Registry::new(Collection::Signals).with_timing(TurnoutTiming::fast());
    let mut turnouts =
        Registry::new(Collection::Turnouts).with_timing(TurnoutTiming::fast());

    signals
        .create(
            config("1", "GermanHauptsignal", json!({"red_pin": 0, "green_pin": 1})),
            &mut bank,
        )
        .await
        .unwrap();

    // Same physical pin in the other collection is rejected
    let err = turnouts
        .create(
            config(
                "t",
                "TwoPinSolenoidTurnout",
                json!({"enable_pin": 1, "direction_pin": 5, "turnout_high": true}),
            ),
            &mut bank,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidConfig(_)));
    assert!(turnouts.is_empty());
}

#[tokio::test]
async fn representations_are_detached_values() {
    let mut bank = MockLineBank::new();
    let mut registry =
        Registry::new(Collection::Signals).with_timing(TurnoutTiming::fast());
    registry.create(three_aspect("1"), &mut bank).await.unwrap();

    let mut reprs = registry.representations();
    reprs[0].state = "clear".into();

    assert_eq!(registry.get("1").unwrap().state_str(), "danger");
    assert_eq!(registry.representations()[0].state, "danger");
}
