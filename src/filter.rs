//! Selecting the target peripheral from what it advertises.

use std::collections::HashMap;

use btleplug::api::BDAddr;

/// What a peripheral advertised, as seen while scanning.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Advertisement {
    /// The advertised local name, if any.
    pub local_name: Option<String>,
    /// The peripheral address.
    pub address: BDAddr,
    /// Received signal strength.
    pub rssi: Option<i16>,
    /// Manufacturer specific payload, keyed by company identifier.
    pub manufacturer_data: HashMap<u16, Vec<u8>>,
}

/// Matches advertisements whose local name equals a target name, ignoring case.
#[derive(Clone, Debug)]
pub struct NameFilter {
    name: String,
}

impl NameFilter {
    /// Create a filter for `name`.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
        }
    }

    /// Whether `advertisement` comes from the target peripheral.
    ///
    /// An absent or empty local name never matches.
    pub fn matches(&self, advertisement: &Advertisement) -> bool {
        advertisement
            .local_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .is_some_and(|name| name.to_uppercase() == self.name)
    }
}
