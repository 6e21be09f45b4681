//! Ping: ARP resolution when needed, then an ICMP echo exchange.

use super::FlowContext;
use crate::codec::{arp_frame, icmp_frame, ArpFields, ArpOp, EchoKind, IcmpFields};
use crate::host::{HostError, HostId, HostRegistry};
use crate::net::MacAddr;
use crate::packet::{Destination, PacketKind};
use std::fmt;
use std::net::Ipv4Addr;

/// Why a ping did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingSkip {
    /// Source or target not selected
    NoSelection,
    /// The host has no IPv4 address yet
    NoAddress(HostId),
    SameHost,
}

impl fmt::Display for PingSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PingSkip::NoSelection => write!(f, "source and target must both be selected"),
            PingSkip::NoAddress(id) => write!(f, "host {} has no IPv4 address", id),
            PingSkip::SameHost => write!(f, "source and target are the same host"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingState {
    Start,
    ArpRequested,
    Resolved,
    EchoRequested,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingOutcome {
    /// `resolved` is true when an ARP exchange was needed first
    Completed { resolved: bool },
    Skipped(PingSkip),
}

/// Snapshot of one endpoint's addressing
#[derive(Debug, Clone, Copy)]
struct Endpoint {
    id: HostId,
    ip: Ipv4Addr,
    mac: MacAddr,
}

impl Endpoint {
    fn of(registry: &HostRegistry, id: HostId) -> Result<Result<Self, PingSkip>, HostError> {
        let host = registry.get(id)?;
        if !host.is_client() {
            return Err(HostError::NotAnEndpoint(id));
        }
        Ok(host
            .binding()
            .map(|(ip, mac)| Endpoint { id, ip, mac })
            .ok_or(PingSkip::NoAddress(id)))
    }
}

/// One ping from `source` to `target`
#[derive(Debug, Clone)]
pub struct PingFlow {
    source: Endpoint,
    target: Endpoint,
    state: PingState,
    resolved: bool,
}

impl PingFlow {
    /// Check preconditions. Unknown hosts and hosts without a client OS
    /// (the DHCP server, unassigned machines) are errors; clients without an
    /// address only make the ping a no-op.
    pub fn prepare(
        registry: &HostRegistry,
        source: HostId,
        target: HostId,
    ) -> Result<Result<Self, PingSkip>, HostError> {
        let src = Endpoint::of(registry, source)?;
        let dst = Endpoint::of(registry, target)?;
        let (src, dst) = match (src, dst) {
            (Ok(src), Ok(dst)) => (src, dst),
            (Err(skip), _) | (_, Err(skip)) => return Ok(Err(skip)),
        };
        if source == target {
            return Ok(Err(PingSkip::SameHost));
        }

        Ok(Ok(PingFlow {
            source: src,
            target: dst,
            state: PingState::Start,
            resolved: false,
        }))
    }

    pub fn state(&self) -> PingState {
        self.state
    }

    pub fn step(&mut self, ctx: &mut FlowContext<'_>) -> Result<PingState, HostError> {
        let next = match self.state {
            PingState::Start => self.resolve_or_skip(ctx)?,
            PingState::ArpRequested => self.send_arp_reply(ctx)?,
            PingState::Resolved => self.send_echo_request(ctx)?,
            PingState::EchoRequested => self.send_echo_reply(ctx),
            PingState::Done => PingState::Done,
        };

        if next != self.state {
            log::debug!(
                "Ping {} -> {}: {:?} -> {:?}",
                self.source.id,
                self.target.id,
                self.state,
                next
            );
        }
        self.state = next;
        Ok(next)
    }

    pub fn run(mut self, ctx: &mut FlowContext<'_>) -> Result<PingOutcome, HostError> {
        while self.state != PingState::Done {
            self.step(ctx)?;
        }
        Ok(PingOutcome::Completed {
            resolved: self.resolved,
        })
    }

    /// Skip ARP entirely when the source still holds a live binding
    fn resolve_or_skip(&mut self, ctx: &mut FlowContext<'_>) -> Result<PingState, HostError> {
        let now = ctx.now();
        let cached = ctx
            .registry
            .get(self.source.id)?
            .arp_cache
            .lookup(self.target.ip, now);
        if let Some(mac) = cached {
            log::debug!("ARP cache hit: {} is at {}", self.target.ip, mac);
            return Ok(PingState::Resolved);
        }

        let frame = arp_frame(ArpFields {
            op: ArpOp::Request,
            sender_mac: self.source.mac,
            sender_ip: self.source.ip,
            target_mac: None,
            target_ip: self.target.ip,
        });
        ctx.emit(self.source.id, Destination::Broadcast, PacketKind::ArpRequest, frame);

        ctx.registry
            .learn_from_broadcast(self.source.id, self.source.ip, self.source.mac, now);
        self.resolved = true;
        Ok(PingState::ArpRequested)
    }

    fn send_arp_reply(&mut self, ctx: &mut FlowContext<'_>) -> Result<PingState, HostError> {
        let frame = arp_frame(ArpFields {
            op: ArpOp::Reply,
            sender_mac: self.target.mac,
            sender_ip: self.target.ip,
            target_mac: Some(self.source.mac),
            target_ip: self.source.ip,
        });
        ctx.emit(self.target.id, Destination::Host(self.source.id), PacketKind::ArpReply, frame);

        let now = ctx.now();
        ctx.registry
            .learn(self.source.id, self.target.ip, self.target.mac, now)?;
        Ok(PingState::Resolved)
    }

    fn send_echo_request(&mut self, ctx: &mut FlowContext<'_>) -> Result<PingState, HostError> {
        let now = ctx.now();
        let dst_mac = ctx
            .registry
            .get(self.source.id)?
            .arp_cache
            .lookup(self.target.ip, now)
            .unwrap_or(self.target.mac);

        let frame = icmp_frame(
            IcmpFields {
                kind: EchoKind::Request,
                src_mac: self.source.mac,
                dst_mac,
                src_ip: self.source.ip,
                dst_ip: self.target.ip,
            },
            &mut *ctx.rng,
        );
        ctx.emit(self.source.id, Destination::Host(self.target.id), PacketKind::IcmpRequest, frame);

        ctx.registry
            .learn(self.target.id, self.source.ip, self.source.mac, now)?;
        Ok(PingState::EchoRequested)
    }

    fn send_echo_reply(&mut self, ctx: &mut FlowContext<'_>) -> PingState {
        let frame = icmp_frame(
            IcmpFields {
                kind: EchoKind::Reply,
                src_mac: self.target.mac,
                dst_mac: self.source.mac,
                src_ip: self.target.ip,
                dst_ip: self.source.ip,
            },
            &mut *ctx.rng,
        );
        ctx.emit(self.target.id, Destination::Host(self.source.id), PacketKind::IcmpReply, frame);
        PingState::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{OsVariant, DEFAULT_SERVER_ADDRESS, SERVER_ID};
    use crate::net::{AddressPool, ManualClock};
    use crate::packet::PacketLog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;

    struct Fixture {
        registry: HostRegistry,
        log: PacketLog,
        rng: StdRng,
        clock: ManualClock,
    }

    impl Fixture {
        /// Server plus `n` clients numbered 1..=n with addresses .11, .12, ...
        fn with_clients(n: u8) -> Self {
            let mut rng = StdRng::seed_from_u64(21);
            let mut registry =
                HostRegistry::new(DEFAULT_SERVER_ADDRESS, AddressPool::default(), 300_000, &mut rng);
            for i in 0..n {
                let id = registry.add_host(None, &mut rng).id;
                registry.set_os(id, OsVariant::VariantA).unwrap();
                registry.get_mut(id).unwrap().ip = Some(Ipv4Addr::new(192, 168, 1, 11 + i));
            }
            Fixture {
                registry,
                log: PacketLog::new(),
                rng,
                clock: ManualClock::new(0),
            }
        }

        fn ping(&mut self, source: HostId, target: HostId) -> PingOutcome {
            let flow = match PingFlow::prepare(&self.registry, source, target).unwrap() {
                Ok(flow) => flow,
                Err(skip) => return PingOutcome::Skipped(skip),
            };
            let mut ctx = FlowContext {
                registry: &mut self.registry,
                log: &mut self.log,
                rng: &mut self.rng,
                clock: &self.clock,
            };
            flow.run(&mut ctx).unwrap()
        }

        fn kinds(&self) -> Vec<PacketKind> {
            self.log.packets().iter().map(|p| p.kind).collect()
        }
    }

    #[test]
    fn test_cold_cache_resolves_first() {
        let mut fx = Fixture::with_clients(2);

        assert_eq!(fx.ping(1, 2), PingOutcome::Completed { resolved: true });
        assert_eq!(
            fx.kinds(),
            vec![
                PacketKind::ArpRequest,
                PacketKind::ArpReply,
                PacketKind::IcmpRequest,
                PacketKind::IcmpReply,
            ]
        );

        let last = fx.log.packets().last().unwrap();
        assert_eq!((last.from, last.to), (2, Destination::Host(1)));
        assert_eq!(fx.log.packets()[0].to, Destination::Broadcast);
    }

    #[test]
    fn test_warm_cache_short_circuits() {
        let mut fx = Fixture::with_clients(2);
        fx.ping(1, 2);
        fx.clock.advance(Duration::from_secs(60));

        assert_eq!(fx.ping(1, 2), PingOutcome::Completed { resolved: false });
        assert_eq!(fx.log.since(4).len(), 2);
        assert_eq!(fx.log.since(4)[0].kind, PacketKind::IcmpRequest);
    }

    #[test]
    fn test_expired_binding_triggers_arp_again() {
        let mut fx = Fixture::with_clients(2);
        fx.ping(1, 2);
        fx.clock.advance(Duration::from_millis(300_000));

        assert_eq!(fx.ping(1, 2), PingOutcome::Completed { resolved: true });
        assert_eq!(fx.log.since(4)[0].kind, PacketKind::ArpRequest);
    }

    #[test]
    fn test_passive_learning() {
        let mut fx = Fixture::with_clients(3);
        let unassigned = fx.registry.add_host(None, &mut fx.rng).id;
        fx.ping(1, 2);

        let src_ip = Ipv4Addr::new(192, 168, 1, 11);
        let src_mac = fx.registry.get(1).unwrap().mac();
        let dst_ip = Ipv4Addr::new(192, 168, 1, 12);
        let dst_mac = fx.registry.get(2).unwrap().mac();

        // Broadcast receivers learn the source
        assert_eq!(fx.registry.get(2).unwrap().arp_cache.lookup(src_ip, 0), Some(src_mac));
        assert_eq!(fx.registry.get(3).unwrap().arp_cache.lookup(src_ip, 0), Some(src_mac));
        assert!(fx.registry.get(unassigned).unwrap().arp_cache.is_empty());
        assert!(fx.registry.server().unwrap().arp_cache.is_empty());
        // The source learns the target from the reply
        assert_eq!(fx.registry.get(1).unwrap().arp_cache.lookup(dst_ip, 0), Some(dst_mac));
    }

    #[test]
    fn test_target_learns_source_on_echo_even_without_arp() {
        let mut fx = Fixture::with_clients(2);
        let now = 0;
        let dst_mac = fx.registry.get(2).unwrap().mac();
        fx.registry
            .learn(1, Ipv4Addr::new(192, 168, 1, 12), dst_mac, now)
            .unwrap();

        assert_eq!(fx.ping(1, 2), PingOutcome::Completed { resolved: false });
        let src_mac = fx.registry.get(1).unwrap().mac();
        assert_eq!(
            fx.registry.get(2).unwrap().arp_cache.lookup(Ipv4Addr::new(192, 168, 1, 11), 0),
            Some(src_mac)
        );
    }

    #[test]
    fn test_preconditions() {
        let mut fx = Fixture::with_clients(2);
        let bare = fx.registry.add_host(None, &mut fx.rng).id;
        fx.registry.set_os(bare, OsVariant::VariantB).unwrap();

        assert_eq!(fx.ping(1, bare), PingOutcome::Skipped(PingSkip::NoAddress(bare)));
        assert_eq!(fx.ping(bare, 1), PingOutcome::Skipped(PingSkip::NoAddress(bare)));
        assert_eq!(fx.ping(1, 1), PingOutcome::Skipped(PingSkip::SameHost));
        assert!(fx.log.is_empty());

        assert!(matches!(
            PingFlow::prepare(&fx.registry, 1, 99),
            Err(HostError::UnknownHost(99))
        ));
    }

    #[test]
    fn test_only_clients_are_endpoints() {
        let mut fx = Fixture::with_clients(2);

        assert!(matches!(
            PingFlow::prepare(&fx.registry, 1, SERVER_ID),
            Err(HostError::NotAnEndpoint(SERVER_ID))
        ));
        assert!(matches!(
            PingFlow::prepare(&fx.registry, SERVER_ID, 1),
            Err(HostError::NotAnEndpoint(SERVER_ID))
        ));

        // Unassigned hosts keep their address but are no longer endpoints
        fx.registry.set_os(2, OsVariant::Unassigned).unwrap();
        assert!(fx.registry.get(2).unwrap().ip.is_some());
        assert!(matches!(
            PingFlow::prepare(&fx.registry, 1, 2),
            Err(HostError::NotAnEndpoint(2))
        ));
        assert!(fx.log.is_empty());
        assert!(fx.registry.server().unwrap().arp_cache.is_empty());
    }

    #[test]
    fn test_echo_frames_carry_addresses() {
        let mut fx = Fixture::with_clients(2);
        fx.ping(1, 2);

        let request = &fx.log.packets()[2].frame;
        assert!(request.contains("Type/Code:  08 00"));
        assert!(request.contains("Source:      192.168.1.11"));
        assert!(request.contains("Destination: 192.168.1.12"));
        let target_mac = fx.registry.get(2).unwrap().mac().to_string();
        assert!(request.contains(&format!("Destination: {}", target_mac)));
    }
}
