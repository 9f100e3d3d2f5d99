//! Per-collection device registry.
//!
//! Each collection (`signals`, `turnouts`) has its own [`Registry`] holding
//! live devices keyed by caller-supplied id, in insertion order. The
//! registry owns the full device lifecycle:
//!
//! - `create`: validate, construct (claiming lines), then insert. A device
//!   becomes visible only after construction fully completed, so a list
//!   during a turnout calibration sweep never shows the half-built entry.
//! - `update`: resolve by id first, then validate the body, then drive the
//!   device. Existence is checked before body shape, so an unparseable
//!   update for a missing id is a not-found, not a bad-request.
//! - `delete`: drive the device to `off` before removing it, so its lines
//!   are released in a de-energized configuration.

use serde_json::Value;
use thiserror::Error;

use crate::devices::catalog::{self, Collection};
use crate::devices::{Device, DeviceConfig, DeviceRepr, TurnoutTiming};
use crate::traits::{ClaimError, LineBank, OutputLine};

/// Failure modes of registry operations.
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    /// The creation record failed catalog validation or line claiming.
    #[error("invalid device config: {0}")]
    InvalidConfig(String),
    /// A device with this id already exists in the collection.
    #[error("device id already in use: {0}")]
    Conflict(String),
    /// No device with this id exists in the collection.
    #[error("no such device: {0}")]
    NotFound(String),
    /// The update body failed the device's validation.
    #[error("invalid state transition for device {0}")]
    InvalidTransition(String),
}

impl From<ClaimError> for RegistryError {
    fn from(err: ClaimError) -> Self {
        RegistryError::InvalidConfig(err.to_string())
    }
}

/// Ordered collection of live devices for one API collection.
#[derive(Debug)]
pub struct Registry<L: OutputLine> {
    collection: Collection,
    timing: TurnoutTiming,
    devices: Vec<Device<L>>,
}

impl<L: OutputLine + 'static> Registry<L> {
    /// Creates an empty registry for the given collection.
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            timing: TurnoutTiming::default(),
            devices: Vec::new(),
        }
    }

    /// Overrides the solenoid timing used for devices created here.
    pub fn with_timing(mut self, timing: TurnoutTiming) -> Self {
        self.timing = timing;
        self
    }

    /// The collection this registry serves.
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Number of live devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns true if no devices are registered.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Representations of every device, in insertion order.
    pub fn representations(&self) -> Vec<DeviceRepr> {
        self.devices.iter().map(Device::representation).collect()
    }

    /// Look up a device by id.
    pub fn get(&self, id: &str) -> Option<&Device<L>> {
        self.devices.iter().find(|device| device.id() == id)
    }

    /// Validate, construct, and insert a new device.
    ///
    /// The duplicate-id check runs first and never mutates the existing
    /// entry. Construction (including a turnout's calibration sweep)
    /// completes before the device is inserted.
    pub async fn create<B>(
        &mut self,
        config: DeviceConfig,
        bank: &mut B,
    ) -> Result<DeviceRepr, RegistryError>
    where
        B: LineBank<Line = L>,
    {
        if self.get(&config.id).is_some() {
            return Err(RegistryError::Conflict(config.id));
        }
        let kind = catalog::validate_create(&config, self.collection).ok_or_else(|| {
            RegistryError::InvalidConfig(format!(
                "rejected {} config for id {:?}",
                self.collection.as_str(),
                config.id
            ))
        })?;
        let device = kind.construct(config, bank, self.timing).await?;
        let repr = device.representation();
        tracing::info!(
            collection = self.collection.as_str(),
            id = %repr.id,
            kind = %repr.kind,
            "device created"
        );
        self.devices.push(device);
        Ok(repr)
    }

    /// Apply an update body to the device with the given id.
    ///
    /// Resolution happens before validation: an unknown id is `NotFound`
    /// even if the body is garbage.
    pub async fn update(&mut self, id: &str, body: &Value) -> Result<DeviceRepr, RegistryError> {
        let device = self
            .devices
            .iter_mut()
            .find(|device| device.id() == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_owned()))?;
        if !device.validate_update(body) {
            return Err(RegistryError::InvalidTransition(id.to_owned()));
        }
        device.apply_update(body).await;
        let repr = device.representation();
        tracing::info!(
            collection = self.collection.as_str(),
            id,
            state = %repr.state,
            "device updated"
        );
        Ok(repr)
    }

    /// Switch a device off and remove it from the registry.
    ///
    /// The outputs are in the `off` configuration before the id stops
    /// resolving; the lines are released when the device is dropped.
    pub async fn delete(&mut self, id: &str) -> Result<(), RegistryError> {
        let index = self
            .devices
            .iter()
            .position(|device| device.id() == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_owned()))?;
        self.devices[index].switch_off().await;
        self.devices.remove(index);
        tracing::info!(collection = self.collection.as_str(), id, "device deleted");
        Ok(())
    }

    /// Switch every registered device off, keeping them registered.
    pub async fn shutdown_all(&mut self) {
        for device in &mut self.devices {
            device.switch_off().await;
        }
    }
}
