//! ARP request/reply frames.

use super::ethernet::{EtherType, EthernetHeader};
use super::Frame;
use crate::net::MacAddr;
use std::fmt;
use std::net::Ipv4Addr;

const HTYPE_ETHERNET: u16 = 0x0001;
const PTYPE_IPV4: u16 = 0x0800;
const HLEN_ETHERNET: u8 = 6;
const PLEN_IPV4: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ArpOp {
    Request = 1,
    Reply = 2,
}

/// Semantic inputs for one ARP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpFields {
    pub op: ArpOp,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    /// Unknown on a request
    pub target_mac: Option<MacAddr>,
    pub target_ip: Ipv4Addr,
}

pub type ArpBody = ArpFields;

/// Build an ARP frame. Requests are broadcast; replies go straight back to
/// the requester.
pub fn arp_frame(fields: ArpFields) -> Frame {
    let destination = match fields.op {
        ArpOp::Request => MacAddr::BROADCAST,
        ArpOp::Reply => fields.target_mac.unwrap_or(MacAddr::BROADCAST),
    };

    Frame::Arp {
        ethernet: EthernetHeader::new(destination, fields.sender_mac, EtherType::Arp),
        body: fields,
    }
}

impl fmt::Display for ArpFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_label = match self.op {
            ArpOp::Request => "Request",
            ArpOp::Reply => "Reply",
        };

        writeln!(f, "ARP")?;
        writeln!(f, "  HType:  {:04X} (Ethernet)", HTYPE_ETHERNET)?;
        writeln!(f, "  PType:  {:04X} (IPv4)", PTYPE_IPV4)?;
        writeln!(f, "  HLen:   {:02X}  PLen: {:02X}", HLEN_ETHERNET, PLEN_IPV4)?;
        writeln!(f, "  Opcode: {:04X} ({})", self.op as u16, op_label)?;
        writeln!(f, "  Sender: {} / {}", self.sender_mac, self.sender_ip)?;
        writeln!(
            f,
            "  Target: {} / {}",
            self.target_mac.unwrap_or(MacAddr::UNSPECIFIED),
            self.target_ip
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x0A]);
    const B: MacAddr = MacAddr([0x02, 0, 0, 0, 0, 0x0B]);
    const IP_A: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 11);
    const IP_B: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 12);

    #[test]
    fn test_request_is_broadcast() {
        let text = arp_frame(ArpFields {
            op: ArpOp::Request,
            sender_mac: A,
            sender_ip: IP_A,
            target_mac: None,
            target_ip: IP_B,
        })
        .to_string();

        assert!(text.contains("Destination: FF:FF:FF:FF:FF:FF"));
        assert!(text.contains("Type:        0x0806 (ARP)"));
        assert!(text.contains("HType:  0001"));
        assert!(text.contains("PType:  0800"));
        assert!(text.contains("HLen:   06  PLen: 04"));
        assert!(text.contains("Opcode: 0001 (Request)"));
        assert!(text.contains("Sender: 02:00:00:00:00:0A / 192.168.1.11"));
        assert!(text.contains("Target: 00:00:00:00:00:00 / 192.168.1.12"));
    }

    #[test]
    fn test_reply_is_unicast() {
        let text = arp_frame(ArpFields {
            op: ArpOp::Reply,
            sender_mac: B,
            sender_ip: IP_B,
            target_mac: Some(A),
            target_ip: IP_A,
        })
        .to_string();

        assert!(text.contains("Destination: 02:00:00:00:00:0A"));
        assert!(text.contains("Source:      02:00:00:00:00:0B"));
        assert!(text.contains("Opcode: 0002 (Reply)"));
        assert!(text.contains("Target: 02:00:00:00:00:0A / 192.168.1.11"));
    }
}
