//! DHCP handshake: Discover, Offer, Request, Acknowledge.
//!
//! The offer only previews the pool; the address is committed when the
//! server acknowledges. A handshake that stops after the offer therefore
//! leaves the pool untouched.

use super::FlowContext;
use crate::codec::{dhcp_frame, DhcpFields, DhcpMessageType};
use crate::host::{HostError, HostId};
use crate::packet::{Destination, PacketKind};
use std::fmt;
use std::net::Ipv4Addr;

/// Why a handshake stopped before assigning an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpAbort {
    NoServer,
    PoolExhausted,
}

impl fmt::Display for DhcpAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhcpAbort::NoServer => write!(f, "no DHCP server present"),
            DhcpAbort::PoolExhausted => write!(f, "address pool exhausted"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpState {
    Idle,
    DiscoverSent,
    OfferReceived,
    RequestSent,
    Acknowledged,
    Done,
    Aborted(DhcpAbort),
}

impl DhcpState {
    pub fn is_terminal(self) -> bool {
        matches!(self, DhcpState::Done | DhcpState::Aborted(_))
    }
}

/// How a completed handshake ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpOutcome {
    Assigned(Ipv4Addr),
    Aborted(DhcpAbort),
}

/// One handshake for one client
#[derive(Debug, Clone)]
pub struct DhcpHandshake {
    client: HostId,
    state: DhcpState,
    offered: Option<Ipv4Addr>,
    committed: Option<Ipv4Addr>,
}

impl DhcpHandshake {
    pub fn new(client: HostId) -> Self {
        DhcpHandshake {
            client,
            state: DhcpState::Idle,
            offered: None,
            committed: None,
        }
    }

    pub fn client(&self) -> HostId {
        self.client
    }

    pub fn state(&self) -> DhcpState {
        self.state
    }

    /// Address previewed for the offer, once one was made
    pub fn offered(&self) -> Option<Ipv4Addr> {
        self.offered
    }

    /// Advance by one step. Terminal states are left unchanged.
    pub fn step(&mut self, ctx: &mut FlowContext<'_>) -> Result<DhcpState, HostError> {
        let next = match self.state {
            DhcpState::Idle => self.send_discover(ctx)?,
            DhcpState::DiscoverSent => self.send_offer(ctx)?,
            DhcpState::OfferReceived => self.send_request(ctx)?,
            DhcpState::RequestSent => self.send_ack(ctx)?,
            DhcpState::Acknowledged => self.assign(ctx)?,
            terminal => terminal,
        };

        if next != self.state {
            log::debug!("DHCP client {}: {:?} -> {:?}", self.client, self.state, next);
        }
        if let DhcpState::Aborted(reason) = next {
            if !self.state.is_terminal() {
                log::warn!("DHCP handshake for host {} aborted: {}", self.client, reason);
            }
        }
        self.state = next;
        Ok(next)
    }

    /// Step until the handshake finishes
    pub fn run(mut self, ctx: &mut FlowContext<'_>) -> Result<DhcpOutcome, HostError> {
        while !self.state.is_terminal() {
            self.step(ctx)?;
        }
        Ok(self.outcome())
    }

    /// Only meaningful once the state is terminal
    fn outcome(&self) -> DhcpOutcome {
        match (self.state, self.committed) {
            (DhcpState::Done, Some(ip)) => DhcpOutcome::Assigned(ip),
            (DhcpState::Aborted(reason), _) => DhcpOutcome::Aborted(reason),
            _ => DhcpOutcome::Aborted(DhcpAbort::PoolExhausted),
        }
    }

    fn send_discover(&mut self, ctx: &mut FlowContext<'_>) -> Result<DhcpState, HostError> {
        if ctx.registry.server().is_none() {
            return Ok(DhcpState::Aborted(DhcpAbort::NoServer));
        }
        let client_mac = ctx.registry.get(self.client)?.mac();

        let frame = dhcp_frame(
            DhcpFields {
                message: DhcpMessageType::Discover,
                client_mac,
                server_mac: None,
                server_ip: None,
                your_ip: None,
            },
            &mut *ctx.rng,
        );
        ctx.emit(self.client, Destination::Broadcast, PacketKind::DhcpDiscover, frame);
        Ok(DhcpState::DiscoverSent)
    }

    fn send_offer(&mut self, ctx: &mut FlowContext<'_>) -> Result<DhcpState, HostError> {
        let Some(candidate) = ctx.registry.pool().preview() else {
            return Ok(DhcpState::Aborted(DhcpAbort::PoolExhausted));
        };
        let Some((server_id, server_ip, server_mac)) = server_binding(ctx) else {
            return Ok(DhcpState::Aborted(DhcpAbort::NoServer));
        };
        let client_mac = ctx.registry.get(self.client)?.mac();

        let frame = dhcp_frame(
            DhcpFields {
                message: DhcpMessageType::Offer,
                client_mac,
                server_mac: Some(server_mac),
                server_ip: Some(server_ip),
                your_ip: Some(candidate),
            },
            &mut *ctx.rng,
        );
        ctx.emit(server_id, Destination::Host(self.client), PacketKind::DhcpOffer, frame);

        let now = ctx.now();
        ctx.registry.learn(self.client, server_ip, server_mac, now)?;
        self.offered = Some(candidate);
        Ok(DhcpState::OfferReceived)
    }

    fn send_request(&mut self, ctx: &mut FlowContext<'_>) -> Result<DhcpState, HostError> {
        let Some((server_id, server_ip, server_mac)) = server_binding(ctx) else {
            return Ok(DhcpState::Aborted(DhcpAbort::NoServer));
        };
        let client_mac = ctx.registry.get(self.client)?.mac();

        let frame = dhcp_frame(
            DhcpFields {
                message: DhcpMessageType::Request,
                client_mac,
                server_mac: Some(server_mac),
                server_ip: Some(server_ip),
                your_ip: self.offered,
            },
            &mut *ctx.rng,
        );
        ctx.emit(self.client, Destination::Host(server_id), PacketKind::DhcpRequest, frame);
        Ok(DhcpState::RequestSent)
    }

    fn send_ack(&mut self, ctx: &mut FlowContext<'_>) -> Result<DhcpState, HostError> {
        let Some((server_id, server_ip, server_mac)) = server_binding(ctx) else {
            return Ok(DhcpState::Aborted(DhcpAbort::NoServer));
        };
        let client_mac = ctx.registry.get(self.client)?.mac();
        let Some(committed) = ctx.registry.pool_mut().commit() else {
            return Ok(DhcpState::Aborted(DhcpAbort::PoolExhausted));
        };

        let frame = dhcp_frame(
            DhcpFields {
                message: DhcpMessageType::Ack,
                client_mac,
                server_mac: Some(server_mac),
                server_ip: Some(server_ip),
                your_ip: Some(committed),
            },
            &mut *ctx.rng,
        );
        ctx.emit(server_id, Destination::Host(self.client), PacketKind::DhcpAcknowledge, frame);

        self.committed = Some(committed);
        Ok(DhcpState::Acknowledged)
    }

    fn assign(&mut self, ctx: &mut FlowContext<'_>) -> Result<DhcpState, HostError> {
        let client = ctx.registry.get_mut(self.client)?;
        client.ip = self.committed;
        log::info!(
            "Host {} configured with {}",
            client.name,
            self.committed.map(|ip| ip.to_string()).unwrap_or_default()
        );
        Ok(DhcpState::Done)
    }
}

/// Server id, address and hardware address. A server without an address
/// cannot answer.
fn server_binding(ctx: &FlowContext<'_>) -> Option<(HostId, Ipv4Addr, crate::net::MacAddr)> {
    let server = ctx.registry.server()?;
    let (ip, mac) = server.binding()?;
    Some((server.id, ip, mac))
}
