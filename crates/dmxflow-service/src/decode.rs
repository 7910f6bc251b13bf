//! Channel byte to device field decoding
//!
//! One DMX channel byte decodes into one or two named output values
//! depending on the mapped field:
//!
//! - `power`: >= 128 is on, below is off
//! - `dimmer`: 0 turns the device off; 1-255 turns it on and carries the
//!   raw brightness
//! - `r` / `g` / `b`: raw passthrough
//! - `ct`: 0-255 scaled linearly into the device's Kelvin range

use dmxflow_map::DeviceField;

use crate::sink::FieldValue;

/// Decoded values for one channel byte, in emission order
pub(crate) fn decode_field(
    field: DeviceField,
    raw: u8,
    kelvin_range: (u16, u16),
) -> Vec<(&'static str, FieldValue)> {
    match field {
        DeviceField::Power => vec![("power", FieldValue::Bool(raw >= 128))],
        DeviceField::Dimmer => {
            if raw == 0 {
                vec![("power", FieldValue::Bool(false))]
            } else {
                vec![
                    ("power", FieldValue::Bool(true)),
                    ("brightness", FieldValue::Int(raw as u16)),
                ]
            }
        }
        DeviceField::Red => vec![("r", FieldValue::Int(raw as u16))],
        DeviceField::Green => vec![("g", FieldValue::Int(raw as u16))],
        DeviceField::Blue => vec![("b", FieldValue::Int(raw as u16))],
        DeviceField::ColorTemp => vec![("kelvin", FieldValue::Int(scale_kelvin(raw, kelvin_range)))],
    }
}

/// Wire names a field can write, for pruning emitted state on reload
pub(crate) fn output_names(field: DeviceField) -> &'static [&'static str] {
    match field {
        DeviceField::Power => &["power"],
        DeviceField::Dimmer => &["power", "brightness"],
        DeviceField::Red => &["r"],
        DeviceField::Green => &["g"],
        DeviceField::Blue => &["b"],
        DeviceField::ColorTemp => &["kelvin"],
    }
}

/// Round-to-nearest linear scale of a DMX byte into a Kelvin range
fn scale_kelvin(raw: u8, (low, high): (u16, u16)) -> u16 {
    low + (((high - low) as u32 * raw as u32 + 127) / 255) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_threshold_is_128() {
        assert_eq!(
            decode_field(DeviceField::Power, 127, (2000, 9000)),
            vec![("power", FieldValue::Bool(false))]
        );
        assert_eq!(
            decode_field(DeviceField::Power, 128, (2000, 9000)),
            vec![("power", FieldValue::Bool(true))]
        );
    }

    #[test]
    fn dimmer_zero_is_power_off_without_brightness() {
        assert_eq!(
            decode_field(DeviceField::Dimmer, 0, (2000, 9000)),
            vec![("power", FieldValue::Bool(false))]
        );
        assert_eq!(
            decode_field(DeviceField::Dimmer, 200, (2000, 9000)),
            vec![
                ("power", FieldValue::Bool(true)),
                ("brightness", FieldValue::Int(200)),
            ]
        );
    }

    #[test]
    fn color_components_pass_through() {
        assert_eq!(
            decode_field(DeviceField::Red, 255, (2000, 9000)),
            vec![("r", FieldValue::Int(255))]
        );
        assert_eq!(
            decode_field(DeviceField::Blue, 128, (2000, 9000)),
            vec![("b", FieldValue::Int(128))]
        );
    }

    #[test]
    fn kelvin_scaling_covers_the_device_range() {
        assert_eq!(scale_kelvin(0, (2000, 9000)), 2000);
        assert_eq!(scale_kelvin(255, (2000, 9000)), 9000);
        assert_eq!(scale_kelvin(128, (2000, 9000)), 5514);
        // Degenerate range maps everything to the single point.
        assert_eq!(scale_kelvin(200, (4000, 4000)), 4000);
        assert_eq!(scale_kelvin(255, (2700, 6500)), 6500);
    }
}
