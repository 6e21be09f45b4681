//! Host data model.

use crate::net::{ArpCache, MacAddr};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Host identifier. 0 is reserved for the DHCP server.
pub type HostId = u32;

/// Id of the DHCP server created with every registry
pub const SERVER_ID: HostId = 0;

/// Operating system installed on a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OsVariant {
    /// Fresh host with nothing installed
    #[default]
    Unassigned,
    VariantA,
    VariantB,
    DhcpServer,
}

impl OsVariant {
    /// Whether hosts with this OS take part in DHCP and ping
    pub fn is_client(self) -> bool {
        matches!(self, OsVariant::VariantA | OsVariant::VariantB)
    }
}

impl fmt::Display for OsVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsVariant::Unassigned => write!(f, "-"),
            OsVariant::VariantA => write!(f, "OS1"),
            OsVariant::VariantB => write!(f, "OS2"),
            OsVariant::DhcpServer => write!(f, "DHCP"),
        }
    }
}

/// A simulated host and its mutable network state
#[derive(Debug, Clone)]
pub struct Host {
    pub id: HostId,
    pub name: String,
    pub os: OsVariant,
    /// Fixed at creation
    mac: MacAddr,
    pub ip: Option<Ipv4Addr>,
    pub arp_cache: ArpCache,
}

impl Host {
    pub fn new(id: HostId, name: impl Into<String>, mac: MacAddr, arp_ttl_ms: u64) -> Self {
        Host {
            id,
            name: name.into(),
            os: OsVariant::Unassigned,
            mac,
            ip: None,
            arp_cache: ArpCache::new(arp_ttl_ms),
        }
    }

    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    pub fn is_dhcp_server(&self) -> bool {
        self.os == OsVariant::DhcpServer
    }

    pub fn is_client(&self) -> bool {
        self.os.is_client()
    }

    /// Both its IP and hardware address, once it has an IP
    pub fn binding(&self) -> Option<(Ipv4Addr, MacAddr)> {
        self.ip.map(|ip| (ip, self.mac))
    }

    pub fn snapshot(&self) -> HostSnapshot {
        HostSnapshot {
            id: self.id,
            name: self.name.clone(),
            os: self.os,
            hardware_address: self.mac,
            ip_address: self.ip,
        }
    }
}

/// Read-only view of a host for presentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostSnapshot {
    pub id: HostId,
    pub name: String,
    pub os: OsVariant,
    pub hardware_address: MacAddr,
    pub ip_address: Option<Ipv4Addr>,
}
