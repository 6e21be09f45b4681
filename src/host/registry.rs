//! Host registry.
//!
//! Owns every simulated host, including the DHCP server, together with the
//! address pool the server leases from. Both flows mutate hosts through here.

use super::types::{Host, HostId, HostSnapshot, OsVariant, SERVER_ID};
use crate::net::{AddressPool, MacAddr};
use rand::Rng;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Address of the DHCP server unless configured otherwise
pub const DEFAULT_SERVER_ADDRESS: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);

/// Errors raised by host commands
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HostError {
    #[error("Unknown host id {0}")]
    UnknownHost(HostId),
    #[error("The DHCP server cannot be modified")]
    ServerImmutable,
    #[error("OS variant {0:?} cannot be assigned to a host")]
    InvalidVariant(OsVariant),
    #[error("Host {0} is not a ping endpoint (no client OS installed)")]
    NotAnEndpoint(HostId),
}

#[derive(Debug)]
pub struct HostRegistry {
    hosts: BTreeMap<HostId, Host>,
    next_id: HostId,
    pool: AddressPool,
    arp_ttl_ms: u64,
}

impl HostRegistry {
    /// Create a registry holding only the DHCP server
    pub fn new<R: Rng + ?Sized>(
        server_ip: Ipv4Addr,
        pool: AddressPool,
        arp_ttl_ms: u64,
        rng: &mut R,
    ) -> Self {
        let mut server = Host::new(SERVER_ID, "DHCP Server", MacAddr::random(rng), arp_ttl_ms);
        server.os = OsVariant::DhcpServer;
        server.ip = Some(server_ip);

        let (first, last) = pool.range();
        log::debug!(
            "DHCP server {} at {} ({}), leasing {} - {}",
            server.name,
            server_ip,
            server.mac(),
            first,
            last
        );

        let mut hosts = BTreeMap::new();
        hosts.insert(SERVER_ID, server);

        HostRegistry {
            hosts,
            next_id: SERVER_ID + 1,
            pool,
            arp_ttl_ms,
        }
    }

    /// Add a host with no OS and no address. Unnamed hosts are called `VM<id>`.
    pub fn add_host<R: Rng + ?Sized>(&mut self, name: Option<String>, rng: &mut R) -> &Host {
        let id = self.next_id;
        self.next_id += 1;

        let name = name.unwrap_or_else(|| format!("VM{}", id));
        let host = Host::new(id, name, MacAddr::random(rng), self.arp_ttl_ms);
        log::info!("Added host {} (id {}, {})", host.name, id, host.mac());

        self.hosts.entry(id).or_insert(host)
    }

    /// Remove a host. Returns false when nothing was removed: the id is
    /// unknown or names the DHCP server.
    pub fn remove_host(&mut self, id: HostId) -> bool {
        if self.hosts.get(&id).is_some_and(Host::is_dhcp_server) {
            log::warn!("Ignoring request to remove the DHCP server");
            return false;
        }

        match self.hosts.remove(&id) {
            Some(host) => {
                log::info!("Removed host {} (id {})", host.name, id);
                true
            }
            None => {
                log::debug!("Remove requested for unknown host {}", id);
                false
            }
        }
    }

    /// Install an OS on a host, returning the previous one. Only client
    /// variants and `Unassigned` are accepted, and never on the server.
    pub fn set_os(&mut self, id: HostId, os: OsVariant) -> Result<OsVariant, HostError> {
        if os == OsVariant::DhcpServer {
            return Err(HostError::InvalidVariant(os));
        }
        let host = self.get_mut(id)?;
        if host.is_dhcp_server() {
            return Err(HostError::ServerImmutable);
        }

        let previous = std::mem::replace(&mut host.os, os);
        log::info!("Host {} OS {} -> {}", host.name, previous, os);
        Ok(previous)
    }

    pub fn get(&self, id: HostId) -> Result<&Host, HostError> {
        self.hosts.get(&id).ok_or(HostError::UnknownHost(id))
    }

    pub fn get_mut(&mut self, id: HostId) -> Result<&mut Host, HostError> {
        self.hosts.get_mut(&id).ok_or(HostError::UnknownHost(id))
    }

    pub fn contains(&self, id: HostId) -> bool {
        self.hosts.contains_key(&id)
    }

    /// The designated DHCP server, if present
    pub fn server(&self) -> Option<&Host> {
        self.hosts.values().find(|host| host.is_dhcp_server())
    }

    /// Hosts ordered by id
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn snapshots(&self) -> Vec<HostSnapshot> {
        self.hosts.values().map(Host::snapshot).collect()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn pool(&self) -> &AddressPool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut AddressPool {
        &mut self.pool
    }

    /// Store `ip -> mac` in one host's ARP cache
    pub fn learn(&mut self, host_id: HostId, ip: Ipv4Addr, mac: MacAddr, now: u64) -> Result<(), HostError> {
        let host = self.get_mut(host_id)?;
        host.arp_cache.insert(ip, mac, now);
        log::debug!("{} learned {} is at {}", host.name, ip, mac);
        Ok(())
    }

    /// Store `ip -> mac` in every client host except `sender`, as receivers
    /// of a broadcast do. The server does not learn. Returns how many hosts
    /// learned the binding.
    pub fn learn_from_broadcast(&mut self, sender: HostId, ip: Ipv4Addr, mac: MacAddr, now: u64) -> usize {
        let mut learned = 0;
        for host in self.hosts.values_mut() {
            if host.id == sender || !host.is_client() {
                continue;
            }
            host.arp_cache.insert(ip, mac, now);
            learned += 1;
        }
        log::debug!("{} hosts learned {} is at {} from broadcast", learned, ip, mac);
        learned
    }
}
