//! Device directory: logical shutter names to bus addresses.

use std::collections::BTreeMap;

use super::ScheduleError;

/// Read-only name → address lookup built from the `[devices]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDirectory {
    devices: BTreeMap<String, String>,
}

/// Addresses found for a group of names, and the names that were not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupResolution {
    pub addresses: Vec<String>,
    pub missing: Vec<ScheduleError>,
}

impl DeviceDirectory {
    pub fn new(devices: BTreeMap<String, String>) -> Self {
        Self { devices }
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.devices.get(name).map(String::as_str)
    }

    /// Resolve every name of a group, keeping rule order.
    ///
    /// Unknown names are reported and skipped; the rest of the group still
    /// resolves.
    pub fn resolve_group(&self, names: &[String]) -> GroupResolution {
        names
            .iter()
            .fold(GroupResolution::default(), |mut group, name| {
                match self.resolve(name) {
                    Some(address) => group.addresses.push(address.to_string()),
                    None => group
                        .missing
                        .push(ScheduleError::DeviceNotFound(name.clone())),
                }
                group
            })
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl FromIterator<(String, String)> for DeviceDirectory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
