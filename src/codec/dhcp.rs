//! DHCP frames: Ethernet, an IPv4/UDP summary line and the BOOTP body.

use super::ethernet::{EtherType, EthernetHeader};
use super::Frame;
use crate::net::MacAddr;
use rand::Rng;
use std::fmt;
use std::net::Ipv4Addr;

const CLIENT_PORT: u16 = 68;
const SERVER_PORT: u16 = 67;
const HTYPE_ETHERNET: u8 = 0x01;
const HLEN_ETHERNET: u8 = 0x06;

const OPTION_REQUESTED_IP: u8 = 50;
const OPTION_MESSAGE_TYPE: u8 = 53;
const OPTION_SERVER_ID: u8 = 54;
const OPTION_END: u8 = 0xFF;

/// DHCP message subtypes used by the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DhcpMessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Ack = 5,
}

impl DhcpMessageType {
    /// BOOTP operation code: 1 for client messages, 2 for server replies
    pub fn op(self) -> u8 {
        match self {
            DhcpMessageType::Discover | DhcpMessageType::Request => 1,
            DhcpMessageType::Offer | DhcpMessageType::Ack => 2,
        }
    }

    /// Option 53 encoded as hex, e.g. `350101` for Discover
    pub fn option_hex(self) -> String {
        format!("{:02X}01{:02X}", OPTION_MESSAGE_TYPE, self as u8)
    }
}

/// Semantic inputs for one DHCP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpFields {
    pub message: DhcpMessageType,
    pub client_mac: MacAddr,
    /// `None` until the client has heard from the server
    pub server_mac: Option<MacAddr>,
    pub server_ip: Option<Ipv4Addr>,
    /// Offered, requested or assigned address, depending on the message
    pub your_ip: Option<Ipv4Addr>,
}

/// Rendered DHCP body with its randomly drawn transaction id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpBody {
    pub fields: DhcpFields,
    pub xid: u32,
}

/// Build a DHCP frame. Discover goes to the all-ones address; every other
/// message is addressed to the peer's hardware address.
pub fn dhcp_frame<R: Rng + ?Sized>(fields: DhcpFields, rng: &mut R) -> Frame {
    let server_mac = fields.server_mac.unwrap_or(MacAddr::BROADCAST);
    let (destination, source) = match fields.message {
        DhcpMessageType::Discover => (MacAddr::BROADCAST, fields.client_mac),
        DhcpMessageType::Request => (server_mac, fields.client_mac),
        DhcpMessageType::Offer | DhcpMessageType::Ack => (fields.client_mac, server_mac),
    };

    Frame::Dhcp {
        ethernet: EthernetHeader::new(destination, source, EtherType::Ipv4),
        body: DhcpBody {
            xid: rng.gen(),
            fields,
        },
    }
}

/// Big-endian hex of the address octets, all zeros when absent
pub fn ip_hex(ip: Option<Ipv4Addr>) -> String {
    format!("{:08X}", ip.map(u32::from).unwrap_or(0))
}

impl DhcpBody {
    fn udp_endpoints(&self) -> ((Ipv4Addr, u16), (Ipv4Addr, u16)) {
        let f = &self.fields;
        let server = f.server_ip.unwrap_or(Ipv4Addr::BROADCAST);
        let client = f.your_ip.unwrap_or(Ipv4Addr::BROADCAST);
        match f.message {
            DhcpMessageType::Discover => (
                (Ipv4Addr::UNSPECIFIED, CLIENT_PORT),
                (Ipv4Addr::BROADCAST, SERVER_PORT),
            ),
            DhcpMessageType::Request => (
                (Ipv4Addr::UNSPECIFIED, CLIENT_PORT),
                (server, SERVER_PORT),
            ),
            DhcpMessageType::Offer | DhcpMessageType::Ack => {
                ((server, SERVER_PORT), (client, CLIENT_PORT))
            }
        }
    }

    fn options(&self) -> Vec<String> {
        let f = &self.fields;
        let mut options = vec![f.message.option_hex()];
        match f.message {
            DhcpMessageType::Request if f.your_ip.is_some() => {
                options.push(format!("{:02X}04{}", OPTION_REQUESTED_IP, ip_hex(f.your_ip)));
            }
            DhcpMessageType::Offer | DhcpMessageType::Ack if f.server_ip.is_some() => {
                options.push(format!("{:02X}04{}", OPTION_SERVER_ID, ip_hex(f.server_ip)));
            }
            _ => {}
        }
        options.push(format!("{:02X}", OPTION_END));
        options
    }
}

impl fmt::Display for DhcpBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = &self.fields;
        let ((src_ip, src_port), (dst_ip, dst_port)) = self.udp_endpoints();
        let op = fields.message.op();

        writeln!(f, "IPv4/UDP")?;
        writeln!(f, "  Source:      {}:{}", src_ip, src_port)?;
        writeln!(f, "  Destination: {}:{}", dst_ip, dst_port)?;
        writeln!(f, "DHCP")?;
        writeln!(
            f,
            "  Op:      {:02X} ({})",
            op,
            if op == 1 { "BOOTREQUEST" } else { "BOOTREPLY" }
        )?;
        writeln!(
            f,
            "  HType:   {:02X}  HLen: {:02X}  Hops: 00",
            HTYPE_ETHERNET, HLEN_ETHERNET
        )?;
        writeln!(f, "  XID:     {:08X}", self.xid)?;
        writeln!(f, "  CHAddr:  {}", fields.client_mac)?;
        writeln!(f, "  YIAddr:  {}", ip_hex(fields.your_ip))?;
        writeln!(f, "  SIAddr:  {}", ip_hex(fields.server_ip))?;
        writeln!(
            f,
            "  SHAddr:  {}",
            fields.server_mac.unwrap_or(MacAddr::UNSPECIFIED)
        )?;
        writeln!(f, "  Options: {}", self.options().join(" "))
    }
}
