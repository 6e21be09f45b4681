//! Ethernet II header section.

use crate::net::MacAddr;
use std::fmt;

/// EtherType codes carried by simulated frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum EtherType {
    Ipv4 = 0x0800,
    Arp = 0x0806,
}

impl EtherType {
    pub fn code(self) -> u16 {
        self as u16
    }

    fn label(self) -> &'static str {
        match self {
            EtherType::Ipv4 => "IPv4",
            EtherType::Arp => "ARP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetHeader {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub ethertype: EtherType,
}

impl EthernetHeader {
    pub fn new(destination: MacAddr, source: MacAddr, ethertype: EtherType) -> Self {
        EthernetHeader {
            destination,
            source,
            ethertype,
        }
    }
}

impl fmt::Display for EthernetHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ethernet II")?;
        writeln!(f, "  Destination: {}", self.destination)?;
        writeln!(f, "  Source:      {}", self.source)?;
        writeln!(
            f,
            "  Type:        0x{:04X} ({})",
            self.ethertype.code(),
            self.ethertype.label()
        )
    }
}
