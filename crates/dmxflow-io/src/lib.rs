//! DmxFlow IO - Art-Net and sACN Input Listeners
//!
//! UDP receivers for the two DMX-over-LAN protocols the bridge accepts:
//!
//! - [`artnet`] - Art-Net 4 ArtDMX on broadcast UDP port 6454
//! - [`sacn`] - sACN (E1.31) data packets on multicast UDP port 5568
//!
//! Both listeners decode wire packets into [`dmxflow_core::DmxFrame`]s and
//! hand them to the processing engine through a channel. Malformed or
//! foreign packets are logged and dropped; a bad sender cannot take the
//! listener down.

#![warn(missing_docs)]

/// Art-Net 4 receiver
pub mod artnet;
/// Error types
pub mod error;
/// sACN (E1.31) receiver
pub mod sacn;

pub use artnet::{parse_artdmx, ArtDmxPacket, ArtNetListener, ARTNET_PORT};
pub use error::{IoError, Result};
pub use sacn::{parse_e131, E131Packet, SacnListener, SACN_PORT};
