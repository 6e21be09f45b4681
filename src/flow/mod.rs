//! Protocol flows.
//!
//! Each flow is an explicit state machine advanced with `step`. A step emits
//! at most one packet, so a driver can pause between steps (or stop early)
//! without the flow caring how its packets are displayed.

pub mod dhcp;
pub mod ping;

use crate::codec::Frame;
use crate::host::{HostId, HostRegistry};
use crate::net::Clock;
use crate::packet::{Destination, PacketKind, PacketLog};
use rand::rngs::StdRng;

pub use dhcp::{DhcpAbort, DhcpHandshake, DhcpOutcome, DhcpState};
pub use ping::{PingFlow, PingOutcome, PingSkip, PingState};

/// Shared state a flow step reads and mutates
pub struct FlowContext<'a> {
    pub registry: &'a mut HostRegistry,
    pub log: &'a mut PacketLog,
    pub rng: &'a mut StdRng,
    pub clock: &'a dyn Clock,
}

impl FlowContext<'_> {
    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Render `frame` and append it to the packet log
    pub fn emit(&mut self, from: HostId, to: Destination, kind: PacketKind, frame: Frame) {
        let now = self.now();
        self.log.emit(from, to, kind, frame.to_string(), now);
    }
}
