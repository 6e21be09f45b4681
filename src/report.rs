//! Text and JSON views of a session for the command-line driver.

use crate::host::{HostId, HostSnapshot};
use crate::packet::{Destination, Packet};
use crate::scenario::ScenarioSummary;
use crate::session::Session;
use serde::Serialize;
use std::fmt::Write;

/// Everything a finished run produced
#[derive(Debug, Serialize)]
pub struct SessionReport<'a> {
    pub hosts: Vec<HostSnapshot>,
    pub packets: &'a [Packet],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ScenarioSummary>,
}

impl<'a> SessionReport<'a> {
    pub fn new(session: &'a Session, summary: Option<ScenarioSummary>) -> Self {
        SessionReport {
            hosts: session.hosts(),
            packets: session.packets(),
            summary,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Packet lines followed by the host table
    pub fn to_text(&self, with_frames: bool) -> String {
        let mut out = String::new();
        for packet in self.packets {
            out.push_str(&packet_line(packet, &self.hosts));
            out.push('\n');
            if with_frames {
                out.push_str(&packet.frame);
            }
        }
        out.push('\n');
        out.push_str(&host_table(&self.hosts));
        if let Some(summary) = &self.summary {
            let _ = writeln!(
                out,
                "\n{} steps, {} addresses assigned, {} handshakes aborted, {} pings ({} needed ARP, {} skipped)",
                summary.steps,
                summary.addresses_assigned,
                summary.handshakes_aborted,
                summary.pings_completed,
                summary.pings_resolved,
                summary.pings_skipped
            );
        }
        out
    }
}

fn host_name(id: HostId, hosts: &[HostSnapshot]) -> String {
    hosts
        .iter()
        .find(|host| host.id == id)
        .map(|host| host.name.clone())
        .unwrap_or_else(|| format!("host {}", id))
}

/// `#id KIND: FROM -> TO`, with host names where the host still exists
pub fn packet_line(packet: &Packet, hosts: &[HostSnapshot]) -> String {
    let to = match packet.to {
        Destination::Broadcast => "Broadcast".to_string(),
        Destination::Host(id) => host_name(id, hosts),
    };
    format!(
        "#{:<3} {}: {} -> {}",
        packet.id,
        packet.kind,
        host_name(packet.from, hosts),
        to
    )
}

pub fn host_table(hosts: &[HostSnapshot]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<4} {:<12} {:<5} {:<17} {}", "ID", "NAME", "OS", "HARDWARE", "IPV4");
    for host in hosts {
        let ip = host
            .ip_address
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            out,
            "{:<4} {:<12} {:<5} {:<17} {}",
            host.id,
            host.name,
            host.os.to_string(),
            host.hardware_address.to_string(),
            ip
        );
    }
    out
}
