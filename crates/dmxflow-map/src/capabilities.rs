//! Device capability model
//!
//! Capabilities are owned by an external device registry and are a read-only
//! input to mapping validation. A mapping that was valid when created is not
//! continuously re-validated against capability drift; that surfaces
//! downstream at the device sender.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::fields::Capability;

/// Kelvin range assumed when a device supports color temperature but does
/// not report its range
pub const DEFAULT_COLOR_TEMP_RANGE: (u16, u16) = (2000, 9000);

/// What a device can do, as reported by its registry entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Device supports dimming
    #[serde(default)]
    pub supports_brightness: bool,
    /// Device supports RGB color
    #[serde(default)]
    pub supports_color: bool,
    /// Device supports color temperature control
    #[serde(default)]
    pub supports_color_temperature: bool,
    /// Supported Kelvin range, low to high
    #[serde(default)]
    pub color_temp_range: Option<(u16, u16)>,
}

impl DeviceCapabilities {
    /// Capabilities of a plain on/off device
    pub fn switch() -> Self {
        Self::default()
    }

    /// Capabilities of a dimmable RGB device
    pub fn rgb() -> Self {
        Self {
            supports_brightness: true,
            supports_color: true,
            ..Self::default()
        }
    }

    /// Capabilities of a dimmable RGB + tunable-white device
    pub fn rgbct(range: Option<(u16, u16)>) -> Self {
        Self {
            supports_brightness: true,
            supports_color: true,
            supports_color_temperature: true,
            color_temp_range: range,
        }
    }

    /// Whether a capability is supported
    pub fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Brightness => self.supports_brightness,
            Capability::Color => self.supports_color,
            Capability::ColorTemperature => self.supports_color_temperature,
        }
    }

    /// Kelvin range used for `ct` scaling, falling back to the default
    pub fn kelvin_range(&self) -> (u16, u16) {
        match self.color_temp_range {
            Some((low, high)) if low <= high => (low, high),
            Some((low, high)) => (high, low),
            None => DEFAULT_COLOR_TEMP_RANGE,
        }
    }

    /// Human-readable support summary for error messages
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.supports_brightness {
            parts.push("brightness".to_string());
        }
        if self.supports_color {
            parts.push("color".to_string());
        }
        if self.supports_color_temperature {
            let (low, high) = self.kelvin_range();
            parts.push(format!("color temp {low}-{high}K"));
        }
        if parts.is_empty() {
            "power only".to_string()
        } else {
            parts.join(", ")
        }
    }
}

/// Read-only capability lookup, implemented by the device registry
pub trait CapabilityLookup: Send + Sync {
    /// Capabilities for a device id, or `None` for unknown devices
    fn capabilities(&self, device_id: &str) -> Option<DeviceCapabilities>;
}

/// In-memory device registry.
///
/// Populated from the persisted device file at startup; the bridge core only
/// ever reads from it during validation.
#[derive(Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<String, DeviceCapabilities>>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a device
    pub fn insert(&self, device_id: impl Into<String>, capabilities: DeviceCapabilities) {
        self.devices.write().insert(device_id.into(), capabilities);
    }

    /// Remove a device, returning whether it existed
    pub fn remove(&self, device_id: &str) -> bool {
        self.devices.write().remove(device_id).is_some()
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.devices.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.devices.read().is_empty()
    }

    /// Registered device ids, sorted
    pub fn device_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.devices.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl CapabilityLookup for DeviceRegistry {
    fn capabilities(&self, device_id: &str) -> Option<DeviceCapabilities> {
        self.devices.read().get(device_id).copied()
    }
}

impl<T: CapabilityLookup + ?Sized> CapabilityLookup for Arc<T> {
    fn capabilities(&self, device_id: &str) -> Option<DeviceCapabilities> {
        (**self).capabilities(device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kelvin_range_defaults_and_normalizes() {
        assert_eq!(
            DeviceCapabilities::rgbct(None).kelvin_range(),
            DEFAULT_COLOR_TEMP_RANGE
        );
        assert_eq!(
            DeviceCapabilities::rgbct(Some((2700, 6500))).kelvin_range(),
            (2700, 6500)
        );
        // Reversed bounds are tolerated
        assert_eq!(
            DeviceCapabilities::rgbct(Some((6500, 2700))).kelvin_range(),
            (2700, 6500)
        );
    }

    #[test]
    fn describe_summarizes_support() {
        assert_eq!(DeviceCapabilities::switch().describe(), "power only");
        let summary = DeviceCapabilities::rgbct(Some((2700, 6500))).describe();
        assert!(summary.contains("brightness"));
        assert!(summary.contains("color temp 2700-6500K"));
    }

    #[test]
    fn registry_lookup() {
        let registry = DeviceRegistry::new();
        registry.insert("lamp-1", DeviceCapabilities::rgb());
        assert!(registry.capabilities("lamp-1").unwrap().supports_color);
        assert!(registry.capabilities("lamp-2").is_none());
        assert!(registry.remove("lamp-1"));
        assert!(registry.is_empty());
    }
}
