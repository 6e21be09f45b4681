//! Simulation session.
//!
//! A `Session` is the command surface a presentation layer drives: it owns
//! the host registry (and with it the address pool), the packet log, the
//! current source/target selection and the randomness used for hardware
//! addresses and frame fields. Every command runs its flow to completion
//! before returning, so flows never interleave. Callers that need to trigger
//! commands from several threads wrap the session in a `Mutex`.

use crate::config::Config;
use crate::flow::{DhcpHandshake, DhcpOutcome, FlowContext, PingFlow, PingOutcome, PingSkip};
use crate::host::{HostError, HostId, HostRegistry, HostSnapshot, OsVariant};
use crate::net::{ArpEntry, Clock, SystemClock};
use crate::packet::{Packet, PacketLog, PacketSink};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Current ping endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub source: Option<HostId>,
    pub target: Option<HostId>,
}

pub struct Session {
    registry: HostRegistry,
    log: PacketLog,
    rng: StdRng,
    clock: Box<dyn Clock>,
    selection: Selection,
    release_on_unassign: bool,
}

impl Session {
    /// Session on the wall clock
    pub fn new(config: &Config) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    pub fn with_clock(config: &Config, clock: Box<dyn Clock>) -> Self {
        let mut rng = match config.general.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let network = &config.network;
        let registry = HostRegistry::new(
            network.server_address,
            network.pool(),
            network.arp_ttl_ms(),
            &mut rng,
        );

        Session {
            registry,
            log: PacketLog::new(),
            rng,
            clock,
            selection: Selection::default(),
            release_on_unassign: config.general.release_on_unassign,
        }
    }

    /// Receive every packet emitted from now on
    pub fn subscribe(&mut self, sink: Box<dyn PacketSink + Send>) {
        self.log.subscribe(sink);
    }

    pub fn add_host(&mut self, name: Option<String>) -> HostSnapshot {
        self.registry.add_host(name, &mut self.rng).snapshot()
    }

    /// Remove a host and drop it from the selection. The DHCP server is
    /// never removed; false is returned instead.
    pub fn remove_host(&mut self, id: HostId) -> bool {
        let removed = self.registry.remove_host(id);
        if removed {
            self.deselect(id);
        }
        removed
    }

    /// Install an OS. Client variants run a DHCP handshake for the host and
    /// return its outcome.
    ///
    /// Setting `Unassigned` keeps any address the host already holds unless
    /// the session was configured with `release_on_unassign`; either way the
    /// host leaves the selection, since it is no longer a ping endpoint.
    pub fn set_os_variant(&mut self, id: HostId, os: OsVariant) -> Result<Option<DhcpOutcome>, HostError> {
        self.registry.set_os(id, os)?;

        if os.is_client() {
            return self.run_dhcp(id).map(Some);
        }

        if self.release_on_unassign {
            let host = self.registry.get_mut(id)?;
            if let Some(ip) = host.ip.take() {
                log::info!("Host {} released {}", host.name, ip);
            }
        }
        self.deselect(id);
        Ok(None)
    }

    /// Run a DHCP handshake for `client`
    pub fn run_dhcp(&mut self, client: HostId) -> Result<DhcpOutcome, HostError> {
        let mut ctx = self.flow_context();
        DhcpHandshake::new(client).run(&mut ctx)
    }

    pub fn select_source(&mut self, id: HostId) -> Result<(), HostError> {
        self.check_endpoint(id)?;
        self.selection.source = Some(id);
        Ok(())
    }

    pub fn select_target(&mut self, id: HostId) -> Result<(), HostError> {
        self.check_endpoint(id)?;
        self.selection.target = Some(id);
        Ok(())
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Ping from the selected source to the selected target. Missing
    /// selection or addresses make this a no-op, reported as `Skipped`.
    pub fn ping(&mut self) -> Result<PingOutcome, HostError> {
        let (Some(source), Some(target)) = (self.selection.source, self.selection.target) else {
            log::warn!("Ping skipped: {}", PingSkip::NoSelection);
            return Ok(PingOutcome::Skipped(PingSkip::NoSelection));
        };
        self.ping_between(source, target)
    }

    pub fn ping_between(&mut self, source: HostId, target: HostId) -> Result<PingOutcome, HostError> {
        match PingFlow::prepare(&self.registry, source, target)? {
            Ok(flow) => {
                let mut ctx = self.flow_context();
                flow.run(&mut ctx)
            }
            Err(skip) => {
                log::warn!("Ping {} -> {} skipped: {}", source, target, skip);
                Ok(PingOutcome::Skipped(skip))
            }
        }
    }

    pub fn hosts(&self) -> Vec<HostSnapshot> {
        self.registry.snapshots()
    }

    pub fn host(&self, id: HostId) -> Result<HostSnapshot, HostError> {
        self.registry.get(id).map(|host| host.snapshot())
    }

    /// Live ARP bindings held by a host
    pub fn arp_table(&self, id: HostId) -> Result<Vec<ArpEntry>, HostError> {
        let now = self.clock.now_millis();
        Ok(self.registry.get(id)?.arp_cache.live_entries(now))
    }

    pub fn packets(&self) -> &[Packet] {
        self.log.packets()
    }

    pub fn now(&self) -> u64 {
        self.clock.now_millis()
    }

    fn flow_context(&mut self) -> FlowContext<'_> {
        FlowContext {
            registry: &mut self.registry,
            log: &mut self.log,
            rng: &mut self.rng,
            clock: self.clock.as_ref(),
        }
    }

    fn check_endpoint(&self, id: HostId) -> Result<(), HostError> {
        if self.registry.get(id)?.is_client() {
            Ok(())
        } else {
            Err(HostError::NotAnEndpoint(id))
        }
    }

    fn deselect(&mut self, id: HostId) {
        if self.selection.source == Some(id) {
            self.selection.source = None;
        }
        if self.selection.target == Some(id) {
            self.selection.target = None;
        }
    }
}
