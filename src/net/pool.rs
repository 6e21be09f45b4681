//! DHCP address pool.
//!
//! Hands out host addresses from a fixed range inside one /24. The counter
//! only moves on `commit`, so an offer that is never acknowledged does not
//! burn an address.

use std::net::Ipv4Addr;

/// First host octet handed out by default
pub const DEFAULT_POOL_START: u8 = 11;
/// Last host octet handed out by default
pub const DEFAULT_POOL_END: u8 = 254;

/// Sequential IPv4 allocator over `prefix.start ..= prefix.end`
#[derive(Debug, Clone)]
pub struct AddressPool {
    prefix: [u8; 3],
    start: u8,
    end: u8,
    /// Wider than the octet so "past the end" is representable when wrapping is off
    next: u16,
    wrap: bool,
}

impl AddressPool {
    /// Build a pool over the /24 containing `network`.
    ///
    /// `start` must not exceed `end`; configuration validation enforces this
    /// before a pool is ever built from user input.
    pub fn new(network: Ipv4Addr, start: u8, end: u8, wrap: bool) -> Self {
        let o = network.octets();
        AddressPool {
            prefix: [o[0], o[1], o[2]],
            start,
            end,
            next: start as u16,
            wrap,
        }
    }

    /// The address `commit` would return next, without consuming it
    pub fn preview(&self) -> Option<Ipv4Addr> {
        self.candidate()
    }

    /// Return the next address and advance the counter
    pub fn commit(&mut self) -> Option<Ipv4Addr> {
        let ip = self.candidate()?;

        self.next += 1;
        if self.next > self.end as u16 && self.wrap {
            log::debug!("Address pool wrapped back to .{}", self.start);
            self.next = self.start as u16;
        }
        Some(ip)
    }

    /// Whether the given address falls inside the pool's range
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let o = ip.octets();
        o[..3] == self.prefix && (self.start..=self.end).contains(&o[3])
    }

    pub fn range(&self) -> (Ipv4Addr, Ipv4Addr) {
        (self.address(self.start), self.address(self.end))
    }

    fn candidate(&self) -> Option<Ipv4Addr> {
        if self.next > self.end as u16 {
            return None;
        }
        Some(self.address(self.next as u8))
    }

    fn address(&self, host: u8) -> Ipv4Addr {
        Ipv4Addr::new(self.prefix[0], self.prefix[1], self.prefix[2], host)
    }
}

impl Default for AddressPool {
    fn default() -> Self {
        AddressPool::new(
            Ipv4Addr::new(192, 168, 1, 0),
            DEFAULT_POOL_START,
            DEFAULT_POOL_END,
            true,
        )
    }
}
