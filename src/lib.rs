//! # LanSim - DHCP, ARP and ICMP on a simulated local network
//!
//! This library models a small LAN of hosts and walks through the messages
//! exchanged when a host obtains an address (DHCP), resolves a neighbour's
//! hardware address (ARP) and pings it (ICMP echo). Every message is rendered
//! as a readable frame, Ethernet header first, so the exchange can be studied
//! field by field.
//!
//! ## Overview
//!
//! Nothing is transmitted. A [`session::Session`] holds the hosts, the DHCP
//! server's address pool and an append-only packet log. Commands (add a host,
//! install an OS, select endpoints, ping) run the matching protocol flow to
//! completion and append one packet per message. A presentation layer follows
//! along by subscribing a [`packet::PacketSink`] and reading host snapshots.
//!
//! ## Architecture
//!
//! - `net`: hardware addresses, the address pool, ARP caches and clocks
//! - `codec`: textual DHCP, ARP and ICMP frames
//! - `host`: the host model and registry
//! - `packet`: emitted packets, the packet log and sinks
//! - `flow`: the DHCP handshake and ping state machines
//! - `session`: the command surface
//! - `config` / `config_loader`: YAML configuration
//! - `scenario`: scripted command sequences
//! - `report`: text and JSON output
//!
//! ## Example Usage
//!
//! ```rust
//! use lansim::config::Config;
//! use lansim::host::OsVariant;
//! use lansim::net::ManualClock;
//! use lansim::session::Session;
//!
//! let mut session = Session::with_clock(&Config::default(), Box::new(ManualClock::default()));
//!
//! let a = session.add_host(None).id;
//! let b = session.add_host(None).id;
//! session.set_os_variant(a, OsVariant::VariantA)?;
//! session.set_os_variant(b, OsVariant::VariantB)?;
//!
//! session.select_source(a)?;
//! session.select_target(b)?;
//! session.ping()?;
//!
//! // 4 DHCP packets per host, then ARP request/reply and the echo pair
//! assert_eq!(session.packets().len(), 12);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Error Handling
//!
//! Protocol dead ends (no address left in the pool, a ping between hosts
//! without addresses) are outcomes, not errors. Commands naming a host that
//! does not exist return [`host::HostError`]; configuration problems return
//! [`config::ValidationError`]. The binary reports everything through
//! `color_eyre`.

pub mod codec;
pub mod config;
pub mod config_loader;
pub mod flow;
pub mod host;
pub mod net;
pub mod packet;
pub mod report;
pub mod scenario;
pub mod session;
