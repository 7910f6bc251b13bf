//! Device fields and capability requirements
//!
//! A [`DeviceField`] is one controllable aspect of a smart-light device that
//! a single DMX channel can drive. User-facing aliases (`red`, `color_temp`,
//! `brightness`, ...) are normalized to canonical names before validation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MappingError;

/// A device capability a field may require
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// Dimming / brightness control
    Brightness,
    /// RGB color control
    Color,
    /// Color temperature (Kelvin) control
    ColorTemperature,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Brightness => write!(f, "brightness"),
            Capability::Color => write!(f, "color"),
            Capability::ColorTemperature => write!(f, "color temperature"),
        }
    }
}

/// A named device field one DMX channel maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceField {
    /// On/off switch, no capability required
    #[serde(rename = "power")]
    Power,
    /// Brightness; 0 doubles as power-off
    #[serde(rename = "dimmer")]
    Dimmer,
    /// Red color component
    #[serde(rename = "r")]
    Red,
    /// Green color component
    #[serde(rename = "g")]
    Green,
    /// Blue color component
    #[serde(rename = "b")]
    Blue,
    /// Color temperature, scaled into the device's Kelvin range
    #[serde(rename = "ct")]
    ColorTemp,
}

impl DeviceField {
    /// All supported fields, in canonical order
    pub const ALL: [DeviceField; 6] = [
        DeviceField::Power,
        DeviceField::Dimmer,
        DeviceField::Red,
        DeviceField::Green,
        DeviceField::Blue,
        DeviceField::ColorTemp,
    ];

    /// Canonical field name
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceField::Power => "power",
            DeviceField::Dimmer => "dimmer",
            DeviceField::Red => "r",
            DeviceField::Green => "g",
            DeviceField::Blue => "b",
            DeviceField::ColorTemp => "ct",
        }
    }

    /// Capability this field requires, if any
    pub fn requirement(&self) -> Option<Capability> {
        match self {
            DeviceField::Power => None,
            DeviceField::Dimmer => Some(Capability::Brightness),
            DeviceField::Red | DeviceField::Green | DeviceField::Blue => Some(Capability::Color),
            DeviceField::ColorTemp => Some(Capability::ColorTemperature),
        }
    }

    /// Parse a field name, normalizing aliases (`red` -> `r`,
    /// `color_temp` -> `ct`, `brightness` -> `dimmer`).
    pub fn parse(name: &str) -> Result<Self, MappingError> {
        let normalized = name.trim().to_ascii_lowercase();
        let canonical = match normalized.as_str() {
            "red" => "r",
            "green" => "g",
            "blue" => "b",
            "color_temp" => "ct",
            "brightness" => "dimmer",
            other => other,
        };
        match canonical {
            "power" => Ok(DeviceField::Power),
            "dimmer" => Ok(DeviceField::Dimmer),
            "r" => Ok(DeviceField::Red),
            "g" => Ok(DeviceField::Green),
            "b" => Ok(DeviceField::Blue),
            "ct" => Ok(DeviceField::ColorTemp),
            _ => Err(MappingError::UnsupportedField {
                name: name.to_string(),
                supported: supported_field_names(),
            }),
        }
    }
}

impl fmt::Display for DeviceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comma-separated canonical field names, for error messages
pub(crate) fn supported_field_names() -> String {
    DeviceField::ALL
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_normalize_to_canonical_fields() {
        assert_eq!(DeviceField::parse("red").unwrap(), DeviceField::Red);
        assert_eq!(DeviceField::parse("GREEN").unwrap(), DeviceField::Green);
        assert_eq!(DeviceField::parse("blue").unwrap(), DeviceField::Blue);
        assert_eq!(
            DeviceField::parse("color_temp").unwrap(),
            DeviceField::ColorTemp
        );
        assert_eq!(
            DeviceField::parse("brightness").unwrap(),
            DeviceField::Dimmer
        );
        assert_eq!(DeviceField::parse(" power ").unwrap(), DeviceField::Power);
    }

    #[test]
    fn unknown_field_lists_supported_names() {
        let err = DeviceField::parse("strobe").unwrap_err();
        match err {
            MappingError::UnsupportedField { name, supported } => {
                assert_eq!(name, "strobe");
                assert!(supported.contains("dimmer"));
                assert!(supported.contains("ct"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn requirements_match_field_semantics() {
        assert_eq!(DeviceField::Power.requirement(), None);
        assert_eq!(
            DeviceField::Dimmer.requirement(),
            Some(Capability::Brightness)
        );
        assert_eq!(DeviceField::Red.requirement(), Some(Capability::Color));
        assert_eq!(
            DeviceField::ColorTemp.requirement(),
            Some(Capability::ColorTemperature)
        );
    }

    #[test]
    fn fields_serialize_as_canonical_names() {
        assert_eq!(
            serde_json::to_string(&DeviceField::ColorTemp).unwrap(),
            "\"ct\""
        );
        assert_eq!(
            serde_json::from_str::<DeviceField>("\"dimmer\"").unwrap(),
            DeviceField::Dimmer
        );
    }
}
