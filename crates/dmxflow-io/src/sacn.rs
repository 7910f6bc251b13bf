//! sACN (E1.31) receiver
//!
//! sACN (Streaming ACN) transmits DMX512 over IP multicast. Each universe
//! has its own multicast group (239.255.hi.lo); the listener joins the
//! groups for the universes it should hear and decodes E1.31 data packets.
//!
//! Unlike Art-Net, sACN carries a per-packet priority (0-200, default 100)
//! and a sender CID, so every console is its own source in the merger.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Instant;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use dmxflow_core::{DmxFrame, SourceKey, DMX_CHANNELS};
use uuid::Uuid;

use crate::error::Result;

/// Well-known sACN UDP port
pub const SACN_PORT: u16 = 5568;

/// ACN packet identifier, fixed for every root layer
const ACN_PACKET_IDENTIFIER: [u8; 12] = [
    0x41, 0x53, 0x43, 0x2d, 0x45, 0x31, 0x2e, 0x31, 0x37, 0x00, 0x00, 0x00,
];

/// VECTOR_ROOT_E131_DATA
const VECTOR_ROOT_DATA: u32 = 0x0000_0004;
/// VECTOR_E131_DATA_PACKET
const VECTOR_FRAMING_DATA: u32 = 0x0000_0002;
/// VECTOR_DMP_SET_PROPERTY
const VECTOR_DMP_SET_PROPERTY: u8 = 0x02;
/// DMP address type & data type
const DMP_ADDRESS_TYPE: u8 = 0xa1;

/// Offset of the DMX payload (after the start code at 125)
const DATA_OFFSET: usize = 126;

/// A decoded E1.31 data packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct E131Packet {
    /// Sender component identifier
    pub cid: Uuid,
    /// Sender-provided source name
    pub source_name: String,
    /// Merge priority (0-200)
    pub priority: u8,
    /// Per-universe sequence number
    pub sequence: u8,
    /// Universe (1-63999)
    pub universe: u16,
    /// DMX payload, at most 512 bytes
    pub data: Vec<u8>,
}

/// Parse an E1.31 data packet, returning `None` for anything else.
///
/// Discovery and synchronization packets, alternate start codes, and
/// malformed datagrams all parse to `None`; none of them carry channel
/// data the bridge should act on.
pub fn parse_e131(packet: &[u8]) -> Option<E131Packet> {
    if packet.len() < DATA_OFFSET {
        return None;
    }
    // Root layer
    if u16::from_be_bytes([packet[0], packet[1]]) != 0x0010
        || packet[4..16] != ACN_PACKET_IDENTIFIER
    {
        return None;
    }
    let root_vector = u32::from_be_bytes([packet[18], packet[19], packet[20], packet[21]]);
    if root_vector != VECTOR_ROOT_DATA {
        return None;
    }
    let cid = Uuid::from_bytes(packet[22..38].try_into().ok()?);

    // Framing layer
    let framing_vector = u32::from_be_bytes([packet[40], packet[41], packet[42], packet[43]]);
    if framing_vector != VECTOR_FRAMING_DATA {
        return None;
    }
    let name_bytes = &packet[44..108];
    let name_len = name_bytes.iter().position(|&b| b == 0).unwrap_or(64);
    let source_name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();
    let priority = packet[108];
    let sequence = packet[111];
    let universe = u16::from_be_bytes([packet[113], packet[114]]);

    // DMP layer
    if packet[117] != VECTOR_DMP_SET_PROPERTY || packet[118] != DMP_ADDRESS_TYPE {
        return None;
    }
    // Property count includes the start code byte.
    let count = u16::from_be_bytes([packet[123], packet[124]]) as usize;
    if count == 0 || packet[125] != 0x00 {
        return None;
    }
    let length = (count - 1)
        .min(packet.len() - DATA_OFFSET)
        .min(DMX_CHANNELS);

    Some(E131Packet {
        cid,
        source_name,
        priority,
        sequence,
        universe,
        data: packet[DATA_OFFSET..DATA_OFFSET + length].to_vec(),
    })
}

/// Build a frame from a decoded packet, keyed by the sender's CID
pub fn frame_from_e131(packet: &E131Packet, received_at: Instant) -> dmxflow_core::Result<DmxFrame> {
    DmxFrame::from_slice(
        packet.universe,
        &packet.data,
        packet.priority,
        packet.sequence,
        SourceKey::sacn(packet.cid),
        received_at,
    )
}

/// Multicast group for a universe: 239.255.hi.lo
pub fn multicast_addr(universe: u16) -> Ipv4Addr {
    Ipv4Addr::new(239, 255, (universe >> 8) as u8, (universe & 0xff) as u8)
}

/// sACN input listener
pub struct SacnListener {
    socket: UdpSocket,
}

impl SacnListener {
    /// Bind the listener socket and join the multicast group of every
    /// universe in `universes`.
    pub async fn bind(addr: SocketAddr, universes: &[u16]) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        for &universe in universes {
            let group = multicast_addr(universe);
            socket.join_multicast_v4(group, Ipv4Addr::UNSPECIFIED)?;
            info!(universe, %group, "joined sACN multicast group");
        }
        info!(%addr, universes = universes.len(), "sACN listener bound");
        Ok(Self { socket })
    }

    /// Receive packets and forward decoded frames until the receiver side
    /// of `frames` is dropped.
    pub async fn run(self, frames: mpsc::UnboundedSender<DmxFrame>) -> Result<()> {
        let mut buf = [0u8; 1024];
        loop {
            let (len, peer) = self.socket.recv_from(&mut buf).await?;
            let Some(packet) = parse_e131(&buf[..len]) else {
                trace!(%peer, len, "ignoring non-E1.31 data packet");
                continue;
            };
            match frame_from_e131(&packet, Instant::now()) {
                Ok(frame) => {
                    debug!(
                        %peer,
                        universe = packet.universe,
                        cid = %packet.cid,
                        priority = packet.priority,
                        "sACN frame received"
                    );
                    if frames.send(frame).is_err() {
                        info!("frame channel closed, sACN listener stopping");
                        return Ok(());
                    }
                }
                Err(err) => {
                    warn!(%peer, universe = packet.universe, error = %err, "dropping sACN frame");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_e131(cid: Uuid, universe: u16, priority: u8, sequence: u8, data: &[u8]) -> Vec<u8> {
        let mut packet = vec![0u8; DATA_OFFSET + data.len()];
        packet[0..2].copy_from_slice(&0x0010u16.to_be_bytes());
        packet[4..16].copy_from_slice(&ACN_PACKET_IDENTIFIER);
        packet[18..22].copy_from_slice(&VECTOR_ROOT_DATA.to_be_bytes());
        packet[22..38].copy_from_slice(cid.as_bytes());
        packet[40..44].copy_from_slice(&VECTOR_FRAMING_DATA.to_be_bytes());
        packet[44..51].copy_from_slice(b"console");
        packet[108] = priority;
        packet[111] = sequence;
        packet[113..115].copy_from_slice(&universe.to_be_bytes());
        packet[117] = VECTOR_DMP_SET_PROPERTY;
        packet[118] = DMP_ADDRESS_TYPE;
        packet[121..123].copy_from_slice(&0x0001u16.to_be_bytes());
        packet[123..125].copy_from_slice(&(data.len() as u16 + 1).to_be_bytes());
        packet[125] = 0x00;
        packet[126..].copy_from_slice(data);
        packet
    }

    #[test]
    fn parses_a_data_packet() {
        let cid = Uuid::new_v4();
        let packet = parse_e131(&build_e131(cid, 7, 150, 9, &[1, 2, 3])).unwrap();

        assert_eq!(packet.cid, cid);
        assert_eq!(packet.source_name, "console");
        assert_eq!(packet.priority, 150);
        assert_eq!(packet.sequence, 9);
        assert_eq!(packet.universe, 7);
        assert_eq!(packet.data, vec![1, 2, 3]);
    }

    #[test]
    fn universe_is_big_endian() {
        let packet = parse_e131(&build_e131(Uuid::new_v4(), 0x1234, 100, 0, &[0])).unwrap();
        assert_eq!(packet.universe, 0x1234);
    }

    #[test]
    fn rejects_alternate_start_codes() {
        // RDM and other alternate start codes carry no dimmer data.
        let mut packet = build_e131(Uuid::new_v4(), 1, 100, 0, &[1, 2, 3]);
        packet[125] = 0xcc;
        assert!(parse_e131(&packet).is_none());
    }

    #[test]
    fn rejects_non_data_vectors() {
        // Universe discovery uses root vector 0x8.
        let mut discovery = build_e131(Uuid::new_v4(), 1, 100, 0, &[0]);
        discovery[18..22].copy_from_slice(&0x0000_0008u32.to_be_bytes());
        assert!(parse_e131(&discovery).is_none());

        // Synchronization uses framing vector 0x1.
        let mut sync = build_e131(Uuid::new_v4(), 1, 100, 0, &[0]);
        sync[40..44].copy_from_slice(&0x0000_0001u32.to_be_bytes());
        assert!(parse_e131(&sync).is_none());

        assert!(parse_e131(&[0u8; 50]).is_none());
    }

    #[test]
    fn frames_carry_the_wire_priority_and_cid() {
        let cid = Uuid::new_v4();
        let packet = parse_e131(&build_e131(cid, 1, 120, 0, &[9])).unwrap();
        let frame = frame_from_e131(&packet, Instant::now()).unwrap();

        assert_eq!(frame.priority(), 120);
        assert_eq!(frame.source(), &SourceKey::sacn(cid));
        assert_eq!(frame.channel(1), 9);
    }

    #[test]
    fn out_of_range_priority_is_rejected_at_frame_creation() {
        let packet = parse_e131(&build_e131(Uuid::new_v4(), 1, 201, 0, &[9])).unwrap();
        assert!(frame_from_e131(&packet, Instant::now()).is_err());
    }

    #[test]
    fn multicast_groups_follow_the_universe_number() {
        assert_eq!(multicast_addr(1), Ipv4Addr::new(239, 255, 0, 1));
        assert_eq!(multicast_addr(256), Ipv4Addr::new(239, 255, 1, 0));
        assert_eq!(multicast_addr(63999), Ipv4Addr::new(239, 255, 249, 255));
    }
}
