//! Frame codec.
//!
//! Turns the semantic fields of a DHCP, ARP or ICMP message into a textual
//! frame: an Ethernet header section followed by the protocol body. Random
//! fields (DHCP transaction id, ICMP identifier and sequence number) are
//! drawn when the frame is built, so rendering a built frame is pure.

pub mod arp;
pub mod checksum;
pub mod dhcp;
pub mod ethernet;
pub mod icmp;

use std::fmt;

pub use arp::{arp_frame, ArpFields, ArpOp};
pub use dhcp::{dhcp_frame, DhcpFields, DhcpMessageType};
pub use ethernet::{EtherType, EthernetHeader};
pub use icmp::{icmp_frame, EchoKind, IcmpFields};

/// A fully built frame, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Dhcp {
        ethernet: EthernetHeader,
        body: dhcp::DhcpBody,
    },
    Arp {
        ethernet: EthernetHeader,
        body: arp::ArpBody,
    },
    Icmp {
        ethernet: EthernetHeader,
        body: icmp::IcmpBody,
    },
}

impl Frame {
    pub fn ethernet(&self) -> &EthernetHeader {
        match self {
            Frame::Dhcp { ethernet, .. }
            | Frame::Arp { ethernet, .. }
            | Frame::Icmp { ethernet, .. } => ethernet,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ethernet())?;
        match self {
            Frame::Dhcp { body, .. } => write!(f, "{}", body),
            Frame::Arp { body, .. } => write!(f, "{}", body),
            Frame::Icmp { body, .. } => write!(f, "{}", body),
        }
    }
}
