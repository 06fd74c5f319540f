//! The discovered service tree of a peripheral.

use std::collections::BTreeSet;

use btleplug::api::{CharPropFlags, Characteristic};
use uuid::Uuid;

use crate::{Error, Result};

/// A service and its characteristics, in discovery order.
#[derive(Clone, Debug, PartialEq)]
pub struct Service {
    /// The service UUID.
    pub uuid: Uuid,
    /// Whether this is a primary service.
    pub primary: bool,
    /// The characteristics of the service.
    pub characteristics: Vec<Characteristic>,
}

/// Snapshot of the services a peripheral exposed at discovery time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Profile {
    services: Vec<Service>,
}

impl Profile {
    /// Create a profile from services in discovery order.
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    /// The services in discovery order.
    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Whether no service was discovered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// The first characteristic, services first then characteristics, that has any of the bits
    /// of `property` set.
    pub fn select_characteristic(&self, property: CharPropFlags) -> Result<&Characteristic> {
        self.services
            .iter()
            .flat_map(|service| &service.characteristics)
            .find(|characteristic| characteristic.properties.intersects(property))
            .ok_or(Error::CharacteristicNotFound(property))
    }
}

impl From<BTreeSet<btleplug::api::Service>> for Profile {
    fn from(services: BTreeSet<btleplug::api::Service>) -> Self {
        Self::new(
            services
                .into_iter()
                .map(|service| Service {
                    uuid: service.uuid,
                    primary: service.primary,
                    characteristics: service.characteristics.into_iter().collect(),
                })
                .collect(),
        )
    }
}
