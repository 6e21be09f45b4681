//! Addressing primitives shared by the flows: hardware addresses, the DHCP
//! address pool, per-host ARP caches and the clock their expiry runs on.

pub mod arp_cache;
pub mod clock;
pub mod mac;
pub mod pool;

// Re-export commonly used types
pub use arp_cache::{ArpCache, ArpEntry, DEFAULT_ARP_TTL_MS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use mac::MacAddr;
pub use pool::AddressPool;
