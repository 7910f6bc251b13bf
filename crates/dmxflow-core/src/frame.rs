//! DMX frame and source identity types
//!
//! A [`DmxFrame`] is the canonical, protocol-agnostic representation of one
//! universe's DMX data. Input decoders build frames; the
//! [`PriorityMerger`](crate::merger::PriorityMerger) is their only consumer.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DmxError, Result};

/// Number of channels in one DMX universe
pub const DMX_CHANNELS: usize = 512;

/// Highest merge priority (sACN model, higher wins)
pub const MAX_PRIORITY: u8 = 200;

/// Highest valid universe number (sACN E1.31 limit)
pub const MAX_UNIVERSE: u16 = 63999;

/// DMX input protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Art-Net 4 (UDP broadcast)
    ArtNet,
    /// sACN / E1.31 (IP multicast)
    Sacn,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::ArtNet => write!(f, "artnet"),
            Protocol::Sacn => write!(f, "sacn"),
        }
    }
}

/// Identity of one DMX producer within a universe.
///
/// sACN carries a per-component CID, so every sACN sender is its own source.
/// Art-Net has no per-source identity on the wire; all Art-Net traffic on a
/// universe is treated as one logical source unless operators configure a
/// named split. This is a documented protocol limitation, not a defect.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceOrigin {
    /// All traffic of the protocol on this universe as one logical source
    Unified,
    /// sACN component identifier
    Cid(Uuid),
    /// Operator-configured source name
    Named(String),
}

/// Uniquely identifies one DMX producer for a universe
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    /// Input protocol this source speaks
    pub protocol: Protocol,
    /// Origin identifier within the protocol
    pub origin: SourceOrigin,
}

impl SourceKey {
    /// The single logical Art-Net source
    pub fn artnet() -> Self {
        Self {
            protocol: Protocol::ArtNet,
            origin: SourceOrigin::Unified,
        }
    }

    /// An sACN source identified by its component CID
    pub fn sacn(cid: Uuid) -> Self {
        Self {
            protocol: Protocol::Sacn,
            origin: SourceOrigin::Cid(cid),
        }
    }

    /// An operator-named source
    pub fn named(protocol: Protocol, name: impl Into<String>) -> Self {
        Self {
            protocol,
            origin: SourceOrigin::Named(name.into()),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            SourceOrigin::Unified => write!(f, "{}", self.protocol),
            SourceOrigin::Cid(cid) => write!(f, "{}:{}", self.protocol, cid),
            SourceOrigin::Named(name) => write!(f, "{}:{}", self.protocol, name),
        }
    }
}

/// Protocol-agnostic DMX frame from any input source.
///
/// Immutable once built: exactly 512 channel values, a merge priority in the
/// sACN 0-200 range, and the identity of the producing source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmxFrame {
    universe: u16,
    channels: [u8; DMX_CHANNELS],
    priority: u8,
    sequence: u8,
    source: SourceKey,
    received_at: Instant,
}

impl DmxFrame {
    /// Create a frame from a full 512-channel buffer.
    pub fn new(
        universe: u16,
        channels: [u8; DMX_CHANNELS],
        priority: u8,
        sequence: u8,
        source: SourceKey,
        received_at: Instant,
    ) -> Result<Self> {
        if universe > MAX_UNIVERSE {
            return Err(DmxError::InvalidUniverse(universe as u32));
        }
        if priority > MAX_PRIORITY {
            return Err(DmxError::InvalidPriority(priority));
        }
        Ok(Self {
            universe,
            channels,
            priority,
            sequence,
            source,
            received_at,
        })
    }

    /// Create a frame from a wire payload of up to 512 bytes.
    ///
    /// Shorter payloads are zero-padded (Art-Net senders commonly transmit
    /// truncated universes); longer payloads are rejected.
    pub fn from_slice(
        universe: u16,
        data: &[u8],
        priority: u8,
        sequence: u8,
        source: SourceKey,
        received_at: Instant,
    ) -> Result<Self> {
        if data.len() > DMX_CHANNELS {
            return Err(DmxError::MalformedFrame { got: data.len() });
        }
        let mut channels = [0u8; DMX_CHANNELS];
        channels[..data.len()].copy_from_slice(data);
        Self::new(universe, channels, priority, sequence, source, received_at)
    }

    /// Universe number (0-63999)
    pub fn universe(&self) -> u16 {
        self.universe
    }

    /// All 512 channel values
    pub fn channels(&self) -> &[u8; DMX_CHANNELS] {
        &self.channels
    }

    /// Value of a 1-indexed DMX channel (1-512)
    pub fn channel(&self, channel: u16) -> u8 {
        debug_assert!((1..=DMX_CHANNELS as u16).contains(&channel));
        self.channels[(channel as usize).saturating_sub(1).min(DMX_CHANNELS - 1)]
    }

    /// Merge priority (0-200, higher wins)
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Protocol sequence number (wraps at 255)
    pub fn sequence(&self) -> u8 {
        self.sequence
    }

    /// Identity of the producing source
    pub fn source(&self) -> &SourceKey {
        &self.source
    }

    /// When the frame was received
    pub fn received_at(&self) -> Instant {
        self.received_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_pads_short_payload() {
        let frame = DmxFrame::from_slice(
            1,
            &[10, 20, 30],
            100,
            0,
            SourceKey::artnet(),
            Instant::now(),
        )
        .unwrap();
        assert_eq!(frame.channel(1), 10);
        assert_eq!(frame.channel(3), 30);
        assert_eq!(frame.channel(4), 0);
        assert_eq!(frame.channel(512), 0);
    }

    #[test]
    fn frame_rejects_oversized_payload() {
        let data = vec![0u8; 600];
        let err = DmxFrame::from_slice(1, &data, 100, 0, SourceKey::artnet(), Instant::now())
            .unwrap_err();
        assert!(matches!(err, DmxError::MalformedFrame { got: 600 }));
    }

    #[test]
    fn frame_rejects_invalid_priority() {
        let err = DmxFrame::new(
            1,
            [0u8; DMX_CHANNELS],
            201,
            0,
            SourceKey::artnet(),
            Instant::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DmxError::InvalidPriority(201)));
    }

    #[test]
    fn frame_rejects_invalid_universe() {
        let err = DmxFrame::new(
            64000,
            [0u8; DMX_CHANNELS],
            100,
            0,
            SourceKey::artnet(),
            Instant::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DmxError::InvalidUniverse(64000)));
    }

    #[test]
    fn source_keys_distinguish_sacn_components() {
        let a = SourceKey::sacn(Uuid::new_v4());
        let b = SourceKey::sacn(Uuid::new_v4());
        assert_ne!(a, b);
        assert_eq!(SourceKey::artnet(), SourceKey::artnet());
    }
}
