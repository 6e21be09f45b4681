//! ICMP echo frames.

use super::checksum::internet_checksum;
use super::ethernet::{EtherType, EthernetHeader};
use super::Frame;
use crate::net::MacAddr;
use rand::Rng;
use std::fmt;
use std::net::Ipv4Addr;

/// Payload carried by every echo, 32 bytes
pub const ECHO_PAYLOAD: &str = "abcdefghijklmnopqrstuvwabcdefghi";

const PROTOCOL_ICMP: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoKind {
    Request,
    Reply,
}

impl EchoKind {
    /// ICMP (type, code)
    pub fn type_code(self) -> (u8, u8) {
        match self {
            EchoKind::Request => (8, 0),
            EchoKind::Reply => (0, 0),
        }
    }
}

/// Semantic inputs for one echo message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpFields {
    pub kind: EchoKind,
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpBody {
    pub fields: IcmpFields,
    pub identifier: u16,
    pub sequence: u16,
}

pub fn icmp_frame<R: Rng + ?Sized>(fields: IcmpFields, rng: &mut R) -> Frame {
    Frame::Icmp {
        ethernet: EthernetHeader::new(fields.dst_mac, fields.src_mac, EtherType::Ipv4),
        body: IcmpBody {
            identifier: rng.gen(),
            sequence: rng.gen(),
            fields,
        },
    }
}

impl IcmpBody {
    /// Wire bytes of the ICMP message with the checksum field zeroed
    fn unchecked_bytes(&self) -> Vec<u8> {
        let (ty, code) = self.fields.kind.type_code();
        let mut bytes = Vec::with_capacity(8 + ECHO_PAYLOAD.len());
        bytes.extend_from_slice(&[ty, code, 0, 0]);
        bytes.extend_from_slice(&self.identifier.to_be_bytes());
        bytes.extend_from_slice(&self.sequence.to_be_bytes());
        bytes.extend_from_slice(ECHO_PAYLOAD.as_bytes());
        bytes
    }

    pub fn checksum(&self) -> u16 {
        internet_checksum(&self.unchecked_bytes())
    }
}

impl fmt::Display for IcmpBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (ty, code) = self.fields.kind.type_code();
        let label = match self.fields.kind {
            EchoKind::Request => "Echo Request",
            EchoKind::Reply => "Echo Reply",
        };

        writeln!(f, "IPv4")?;
        writeln!(f, "  Source:      {}", self.fields.src_ip)?;
        writeln!(f, "  Destination: {}", self.fields.dst_ip)?;
        writeln!(f, "  Protocol:    {:02X} (ICMP)", PROTOCOL_ICMP)?;
        writeln!(f, "ICMP")?;
        writeln!(f, "  Type/Code:  {:02X} {:02X} ({})", ty, code, label)?;
        writeln!(f, "  Checksum:   {:04X}", self.checksum())?;
        writeln!(f, "  Identifier: {:04X}", self.identifier)?;
        writeln!(f, "  Sequence:   {:04X}", self.sequence)?;
        writeln!(f, "  Payload:    \"{}\"", ECHO_PAYLOAD)
    }
}
