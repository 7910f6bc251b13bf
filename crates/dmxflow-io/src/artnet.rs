//! Art-Net 4 receiver (ArtDMX)
//!
//! Art-Net is a UDP-based protocol for transmitting DMX512 over Ethernet.
//! The listener accepts ArtDMX (OpDmx) packets on port 6454 and ignores
//! every other opcode (ArtPoll and friends are a non-concern for a pure
//! receiver).
//!
//! Art-Net carries neither a priority nor a per-source identity, so every
//! decoded frame gets the configured fixed priority and the single unified
//! Art-Net source key.

use std::net::SocketAddr;
use std::time::Instant;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use dmxflow_core::{DmxFrame, SourceKey, DMX_CHANNELS};

use crate::error::Result;

/// Well-known Art-Net UDP port
pub const ARTNET_PORT: u16 = 6454;

/// Packet header: "Art-Net\0"
const ARTNET_ID: &[u8; 8] = b"Art-Net\0";

/// OpDmx opcode (little-endian on the wire)
const OP_DMX: u16 = 0x5000;

/// Fixed header size before the DMX payload
const HEADER_LEN: usize = 18;

/// A decoded ArtDMX packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtDmxPacket {
    /// Port-Address (universe)
    pub universe: u16,
    /// Sequence number (0 disables sequencing)
    pub sequence: u8,
    /// Physical input port, informational only
    pub physical: u8,
    /// DMX payload, at most 512 bytes
    pub data: Vec<u8>,
}

/// Parse an ArtDMX packet, returning `None` for anything else.
///
/// Non-ArtDMX Art-Net opcodes and foreign UDP traffic are expected on the
/// port and are not errors. The declared data length is clamped to what the
/// datagram actually carries and to the 512-channel maximum.
pub fn parse_artdmx(packet: &[u8]) -> Option<ArtDmxPacket> {
    if packet.len() < HEADER_LEN || &packet[0..8] != ARTNET_ID {
        return None;
    }
    let opcode = u16::from_le_bytes([packet[8], packet[9]]);
    if opcode != OP_DMX {
        return None;
    }
    let universe = u16::from_le_bytes([packet[14], packet[15]]);
    let declared = u16::from_be_bytes([packet[16], packet[17]]) as usize;
    let available = packet.len() - HEADER_LEN;
    let length = declared.min(available).min(DMX_CHANNELS);
    Some(ArtDmxPacket {
        universe,
        sequence: packet[12],
        physical: packet[13],
        data: packet[HEADER_LEN..HEADER_LEN + length].to_vec(),
    })
}

/// Build a frame from a decoded packet with the configured Art-Net priority
pub fn frame_from_artdmx(
    packet: &ArtDmxPacket,
    priority: u8,
    received_at: Instant,
) -> dmxflow_core::Result<DmxFrame> {
    DmxFrame::from_slice(
        packet.universe,
        &packet.data,
        priority,
        packet.sequence,
        SourceKey::artnet(),
        received_at,
    )
}

/// Art-Net input listener
pub struct ArtNetListener {
    socket: UdpSocket,
    priority: u8,
}

impl ArtNetListener {
    /// Bind the listener socket.
    ///
    /// `priority` is the merge priority assigned to all Art-Net traffic,
    /// since the protocol carries none of its own.
    pub async fn bind(addr: SocketAddr, priority: u8) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        info!(%addr, priority, "Art-Net listener bound");
        Ok(Self { socket, priority })
    }

    /// Receive packets and forward decoded frames until the receiver side
    /// of `frames` is dropped.
    pub async fn run(self, frames: mpsc::UnboundedSender<DmxFrame>) -> Result<()> {
        let mut buf = [0u8; 1024];
        loop {
            let (len, peer) = self.socket.recv_from(&mut buf).await?;
            let Some(packet) = parse_artdmx(&buf[..len]) else {
                trace!(%peer, len, "ignoring non-ArtDMX packet");
                continue;
            };
            match frame_from_artdmx(&packet, self.priority, Instant::now()) {
                Ok(frame) => {
                    debug!(
                        %peer,
                        universe = packet.universe,
                        sequence = packet.sequence,
                        "ArtDMX frame received"
                    );
                    if frames.send(frame).is_err() {
                        info!("frame channel closed, Art-Net listener stopping");
                        return Ok(());
                    }
                }
                Err(err) => {
                    warn!(%peer, universe = packet.universe, error = %err, "dropping ArtDMX frame");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_artdmx(universe: u16, sequence: u8, data: &[u8]) -> Vec<u8> {
        let mut packet = vec![0u8; HEADER_LEN + data.len()];
        packet[0..8].copy_from_slice(ARTNET_ID);
        packet[8..10].copy_from_slice(&OP_DMX.to_le_bytes());
        packet[10..12].copy_from_slice(&14u16.to_be_bytes());
        packet[12] = sequence;
        packet[13] = 0;
        packet[14..16].copy_from_slice(&universe.to_le_bytes());
        packet[16..18].copy_from_slice(&(data.len() as u16).to_be_bytes());
        packet[18..].copy_from_slice(data);
        packet
    }

    #[test]
    fn parses_a_full_artdmx_packet() {
        let mut data = vec![0u8; 512];
        data[0] = 255;
        data[511] = 7;
        let packet = parse_artdmx(&build_artdmx(3, 42, &data)).unwrap();

        assert_eq!(packet.universe, 3);
        assert_eq!(packet.sequence, 42);
        assert_eq!(packet.data.len(), 512);
        assert_eq!(packet.data[0], 255);
        assert_eq!(packet.data[511], 7);
    }

    #[test]
    fn parses_a_truncated_universe() {
        let packet = parse_artdmx(&build_artdmx(0, 1, &[10, 20, 30])).unwrap();
        assert_eq!(packet.data, vec![10, 20, 30]);

        // Frames zero-pad the remaining channels.
        let frame = frame_from_artdmx(&packet, 50, Instant::now()).unwrap();
        assert_eq!(frame.channel(3), 30);
        assert_eq!(frame.channel(4), 0);
    }

    #[test]
    fn universe_is_little_endian() {
        let packet = parse_artdmx(&build_artdmx(0x1234, 0, &[0])).unwrap();
        assert_eq!(packet.universe, 0x1234);
    }

    #[test]
    fn rejects_foreign_packets() {
        assert!(parse_artdmx(b"Art-Net").is_none()); // too short
        assert!(parse_artdmx(&[0u8; 30]).is_none()); // wrong header

        // Right header, wrong opcode (ArtPoll = 0x2000).
        let mut poll = build_artdmx(0, 0, &[0]);
        poll[8..10].copy_from_slice(&0x2000u16.to_le_bytes());
        assert!(parse_artdmx(&poll).is_none());
    }

    #[test]
    fn declared_length_is_clamped_to_the_datagram() {
        // Header claims 512 channels but only 4 bytes follow.
        let mut packet = build_artdmx(0, 0, &[1, 2, 3, 4]);
        packet[16..18].copy_from_slice(&512u16.to_be_bytes());
        let parsed = parse_artdmx(&packet).unwrap();
        assert_eq!(parsed.data, vec![1, 2, 3, 4]);
    }

    #[test]
    fn all_artnet_frames_share_one_source() {
        let a = frame_from_artdmx(
            &parse_artdmx(&build_artdmx(1, 0, &[1])).unwrap(),
            50,
            Instant::now(),
        )
        .unwrap();
        let b = frame_from_artdmx(
            &parse_artdmx(&build_artdmx(1, 1, &[2])).unwrap(),
            50,
            Instant::now(),
        )
        .unwrap();
        assert_eq!(a.source(), b.source());
        assert_eq!(a.priority(), 50);
    }
}
