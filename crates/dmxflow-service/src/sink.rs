//! Outbound device update types
//!
//! A [`DeviceUpdate`] is the bridge's only output: a bag of named field
//! values for one device, already debounced and change-filtered. The
//! embedding application provides the [`UpdateSink`] that carries updates
//! to its device senders.

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

/// A decoded device field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// On/off state
    Bool(bool),
    /// Numeric value; `u16` because Kelvin exceeds the DMX byte range
    Int(u16),
}

/// One coalesced update for one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceUpdate {
    /// Target device
    pub device_id: String,
    /// Field values keyed by wire name (`power`, `brightness`, `r`, ...)
    pub fields: BTreeMap<&'static str, FieldValue>,
}

/// Receives emitted device updates.
///
/// `emit` runs on the frame-processing path and must not block; sinks that
/// talk to the network should hand off through a channel.
pub trait UpdateSink: Send + Sync + 'static {
    /// Deliver one device update
    fn emit(&self, update: DeviceUpdate);
}

impl UpdateSink for mpsc::UnboundedSender<DeviceUpdate> {
    fn emit(&self, update: DeviceUpdate) {
        if self.send(update).is_err() {
            warn!("device update dropped: sink receiver is gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_values_serialize_untagged() {
        let mut fields = BTreeMap::new();
        fields.insert("power", FieldValue::Bool(true));
        fields.insert("brightness", FieldValue::Int(200));
        let update = DeviceUpdate {
            device_id: "lamp".into(),
            fields,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(
            json,
            r#"{"device_id":"lamp","fields":{"brightness":200,"power":true}}"#
        );
    }
}
