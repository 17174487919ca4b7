use std::collections::HashMap;

use crate::config::Device;

/// Read-only `uid -> display name` lookup, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    names: HashMap<String, String>,
}

impl DeviceRegistry {
    pub fn new(devices: &[Device]) -> Self {
        let names = devices
            .iter()
            .map(|d| (d.id.clone(), d.name.clone()))
            .collect();
        Self { names }
    }

    pub fn resolve(&self, uid: &str) -> Option<&str> {
        self.names.get(uid).map(String::as_str)
    }
}
