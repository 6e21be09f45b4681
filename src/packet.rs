//! Emitted packets and the append-only log they land in.
//!
//! Flows push one `Packet` per message into a `PacketLog`; the log forwards
//! each packet to its subscribed sinks in emission order. Sinks are how a
//! presentation layer follows a session without the flows knowing about it.

use crate::host::HostId;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::mpsc;

/// Closed set of message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PacketKind {
    #[serde(rename = "DHCP Discover")]
    DhcpDiscover,
    #[serde(rename = "DHCP Offer")]
    DhcpOffer,
    #[serde(rename = "DHCP Request")]
    DhcpRequest,
    #[serde(rename = "DHCP Acknowledge")]
    DhcpAcknowledge,
    #[serde(rename = "ICMP Request")]
    IcmpRequest,
    #[serde(rename = "ICMP Reply")]
    IcmpReply,
    #[serde(rename = "ARP Request")]
    ArpRequest,
    #[serde(rename = "ARP Reply")]
    ArpReply,
}

impl PacketKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PacketKind::DhcpDiscover => "DHCP Discover",
            PacketKind::DhcpOffer => "DHCP Offer",
            PacketKind::DhcpRequest => "DHCP Request",
            PacketKind::DhcpAcknowledge => "DHCP Acknowledge",
            PacketKind::IcmpRequest => "ICMP Request",
            PacketKind::IcmpReply => "ICMP Reply",
            PacketKind::ArpRequest => "ARP Request",
            PacketKind::ArpReply => "ARP Reply",
        }
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a packet is headed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Every host on the segment; not a host id
    Broadcast,
    Host(HostId),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Broadcast => write!(f, "BROADCAST"),
            Destination::Host(id) => write!(f, "{}", id),
        }
    }
}

/// Serialized as the host id, or the string `"BROADCAST"`
impl Serialize for Destination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Destination::Broadcast => serializer.serialize_str("BROADCAST"),
            Destination::Host(id) => serializer.serialize_u32(*id),
        }
    }
}

/// One message as it was sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Packet {
    /// Emission order within the session, starting at 1
    pub id: u64,
    /// Logical time of emission in milliseconds
    pub timestamp: u64,
    pub from: HostId,
    pub to: Destination,
    pub kind: PacketKind,
    pub frame: String,
}

/// Receiver of emitted packets
pub trait PacketSink {
    fn deliver(&mut self, packet: &Packet);
}

impl<F: FnMut(&Packet)> PacketSink for F {
    fn deliver(&mut self, packet: &Packet) {
        self(packet)
    }
}

impl PacketSink for mpsc::Sender<Packet> {
    fn deliver(&mut self, packet: &Packet) {
        if self.send(packet.clone()).is_err() {
            log::debug!("Packet {} dropped: receiver has hung up", packet.id);
        }
    }
}

/// Append-only, ordered record of every packet in a session
#[derive(Default)]
pub struct PacketLog {
    packets: Vec<Packet>,
    sinks: Vec<Box<dyn PacketSink + Send>>,
}

impl PacketLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, sink: Box<dyn PacketSink + Send>) {
        self.sinks.push(sink);
    }

    /// Append a packet and hand it to every sink
    pub fn emit(
        &mut self,
        from: HostId,
        to: Destination,
        kind: PacketKind,
        frame: String,
        timestamp: u64,
    ) -> &Packet {
        let packet = Packet {
            id: self.packets.len() as u64 + 1,
            timestamp,
            from,
            to,
            kind,
            frame,
        };
        log::info!("{}: {} -> {}", packet.kind, packet.from, packet.to);

        for sink in self.sinks.iter_mut() {
            sink.deliver(&packet);
        }
        self.packets.push(packet);
        &self.packets[self.packets.len() - 1]
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    /// Packets emitted at or after position `start`
    pub fn since(&self, start: usize) -> &[Packet] {
        self.packets.get(start..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

impl fmt::Debug for PacketLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketLog")
            .field("packets", &self.packets.len())
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
