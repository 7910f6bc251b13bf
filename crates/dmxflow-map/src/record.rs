//! Persisted mapping records and creation requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::DeviceField;

/// Whether a mapping covers a consecutive channel range or one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingKind {
    /// Ordered field list on consecutive channels
    Range,
    /// Single channel bound to one named field
    Discrete,
}

/// A validated, persisted channel-to-field mapping.
///
/// Created, updated, and deleted through the
/// [`MappingResolver`](crate::resolver::MappingResolver); read-only to the
/// processing engine via the compiled table snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Record id
    pub id: Uuid,
    /// Target device
    pub device_id: String,
    /// DMX universe
    pub universe: u16,
    /// Start channel (1-512)
    pub channel: u16,
    /// Number of consecutive channels; always equals `fields.len()`
    pub length: u16,
    /// Range or discrete
    pub kind: MappingKind,
    /// The single field of a discrete mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<DeviceField>,
    /// Ordered fields assigned to consecutive channels from `channel`
    pub fields: Vec<DeviceField>,
    /// Whether this mapping opted out of channel-overlap rejection
    #[serde(default)]
    pub allow_overlap: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl FieldMapping {
    /// Last channel this mapping occupies
    pub fn end_channel(&self) -> u16 {
        self.channel + self.length - 1
    }

    /// Whether this mapping's channel range numerically overlaps another
    pub fn overlaps(&self, channel: u16, length: u16) -> bool {
        let end = channel + length - 1;
        self.channel <= end && channel <= self.end_channel()
    }
}

/// Requested channel layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingLayout {
    /// A named template (`RGB`, `DIMRGBCT`, ...)
    Template(String),
    /// An explicit ordered field list
    Fields(Vec<String>),
    /// A single discrete field on one channel
    Discrete(String),
}

/// A mapping creation or update request from the management layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRequest {
    /// Target device
    pub device_id: String,
    /// DMX universe
    pub universe: u16,
    /// Start channel (1-512)
    pub channel: u16,
    /// Requested layout
    pub layout: MappingLayout,
    /// Skip channel-overlap rejection
    #[serde(default)]
    pub allow_overlap: bool,
}

impl MappingRequest {
    /// Convenience constructor for a template request
    pub fn template(
        device_id: impl Into<String>,
        universe: u16,
        channel: u16,
        template: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            universe,
            channel,
            layout: MappingLayout::Template(template.into()),
            allow_overlap: false,
        }
    }

    /// Convenience constructor for a discrete field request
    pub fn discrete(
        device_id: impl Into<String>,
        universe: u16,
        channel: u16,
        field: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            universe,
            channel,
            layout: MappingLayout::Discrete(field.into()),
            allow_overlap: false,
        }
    }

    /// Opt into overlapping channel ranges
    pub fn with_overlap(mut self) -> Self {
        self.allow_overlap = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(channel: u16, length: u16) -> FieldMapping {
        FieldMapping {
            id: Uuid::new_v4(),
            device_id: "lamp".into(),
            universe: 1,
            channel,
            length,
            kind: MappingKind::Range,
            field: None,
            fields: vec![DeviceField::Red; length as usize],
            allow_overlap: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn overlap_is_numeric_range_intersection() {
        let mapping = record(10, 3); // channels 10-12
        assert!(mapping.overlaps(12, 1));
        assert!(mapping.overlaps(8, 3));
        assert!(mapping.overlaps(10, 3));
        assert!(!mapping.overlaps(13, 4));
        assert!(!mapping.overlaps(1, 9));
    }

    #[test]
    fn record_round_trips_through_json() {
        let mapping = record(1, 3);
        let json = serde_json::to_string(&mapping).unwrap();
        let parsed: FieldMapping = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, mapping);
    }
}
