//! Per-host ARP cache with lazy expiry.

use super::mac::MacAddr;
use serde::Serialize;
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

/// Default lifetime of a binding: five minutes in milliseconds
pub const DEFAULT_ARP_TTL_MS: u64 = 300_000;

/// A single cached IP to hardware address binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArpEntry {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    /// Logical time (ms) at which the binding stops being usable
    pub expires_at: u64,
}

/// IP to hardware address bindings owned by one host.
///
/// Entries are never evicted; `lookup` simply ignores anything whose expiry
/// has passed.
#[derive(Debug, Clone)]
pub struct ArpCache {
    entries: BTreeMap<Ipv4Addr, ArpEntry>,
    ttl_ms: u64,
}

impl ArpCache {
    pub fn new(ttl_ms: u64) -> Self {
        ArpCache {
            entries: BTreeMap::new(),
            ttl_ms,
        }
    }

    /// Cached hardware address for `ip`, if the binding is still live at `now`
    pub fn lookup(&self, ip: Ipv4Addr, now: u64) -> Option<MacAddr> {
        self.entries
            .get(&ip)
            .filter(|entry| now < entry.expires_at)
            .map(|entry| entry.mac)
    }

    /// Set or overwrite the binding for `ip`, expiring `ttl` after `now`
    pub fn insert(&mut self, ip: Ipv4Addr, mac: MacAddr, now: u64) {
        let expires_at = now.saturating_add(self.ttl_ms);
        self.entries.insert(ip, ArpEntry { ip, mac, expires_at });
    }

    /// Bindings still live at `now`, ordered by address
    pub fn live_entries(&self, now: u64) -> Vec<ArpEntry> {
        self.entries
            .values()
            .filter(|entry| now < entry.expires_at)
            .copied()
            .collect()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ttl_ms(&self) -> u64 {
        self.ttl_ms
    }
}

impl Default for ArpCache {
    fn default() -> Self {
        ArpCache::new(DEFAULT_ARP_TTL_MS)
    }
}
