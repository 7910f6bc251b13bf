//! Field templates
//!
//! A template is a named, fixed ordered list of device fields mapped onto
//! consecutive DMX channels starting at a requested address. Template names
//! are case-insensitive; `DIMMER_RGB` is accepted as an alias of `DIMRGB`.

use std::fmt;

use crate::error::MappingError;
use crate::fields::DeviceField;

/// A fixture-style channel layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// `[r, g, b]` (3 channels)
    Rgb,
    /// `[r, g, b, ct]` (4 channels)
    Rgbct,
    /// `[dimmer, r, g, b]` (4 channels)
    DimRgb,
    /// `[dimmer, r, g, b, ct]` (5 channels)
    DimRgbct,
    /// `[dimmer, ct]` (2 channels)
    DimCt,
}

impl Template {
    const ALL: [Template; 5] = [
        Template::Rgb,
        Template::Rgbct,
        Template::DimRgb,
        Template::DimRgbct,
        Template::DimCt,
    ];

    /// Canonical template name
    pub fn name(&self) -> &'static str {
        match self {
            Template::Rgb => "RGB",
            Template::Rgbct => "RGBCT",
            Template::DimRgb => "DIMRGB",
            Template::DimRgbct => "DIMRGBCT",
            Template::DimCt => "DIMCT",
        }
    }

    /// Ordered fields this template assigns to consecutive channels
    pub fn fields(&self) -> &'static [DeviceField] {
        match self {
            Template::Rgb => &[DeviceField::Red, DeviceField::Green, DeviceField::Blue],
            Template::Rgbct => &[
                DeviceField::Red,
                DeviceField::Green,
                DeviceField::Blue,
                DeviceField::ColorTemp,
            ],
            Template::DimRgb => &[
                DeviceField::Dimmer,
                DeviceField::Red,
                DeviceField::Green,
                DeviceField::Blue,
            ],
            Template::DimRgbct => &[
                DeviceField::Dimmer,
                DeviceField::Red,
                DeviceField::Green,
                DeviceField::Blue,
                DeviceField::ColorTemp,
            ],
            Template::DimCt => &[DeviceField::Dimmer, DeviceField::ColorTemp],
        }
    }

    /// Number of consecutive channels the template occupies
    pub fn channel_count(&self) -> u16 {
        self.fields().len() as u16
    }

    /// Parse a template name (case-insensitive)
    pub fn parse(name: &str) -> Result<Self, MappingError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "RGB" => Ok(Template::Rgb),
            "RGBCT" => Ok(Template::Rgbct),
            "DIMRGB" | "DIMMER_RGB" => Ok(Template::DimRgb),
            "DIMRGBCT" => Ok(Template::DimRgbct),
            "DIMCT" => Ok(Template::DimCt),
            _ => Err(MappingError::UnknownTemplate {
                name: name.to_string(),
                supported: supported_template_names(),
            }),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Comma-separated template names, for error messages
pub(crate) fn supported_template_names() -> String {
    Template::ALL
        .iter()
        .map(|template| template.name())
        .collect::<Vec<_>>()
        .join(", ")
}
