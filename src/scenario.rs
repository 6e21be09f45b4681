//! Scripted command sequences.
//!
//! A scenario is a list of `ScenarioStep`s from the configuration file (or
//! the built-in demo) replayed against a `Session` on a logical clock, so the
//! same file and seed always produce the same packet log.

use crate::config::{Config, ScenarioStep};
use crate::flow::{DhcpOutcome, PingOutcome};
use crate::net::ManualClock;
use crate::session::Session;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use serde::Serialize;
use std::time::Duration;

/// Counts of what a scenario did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioSummary {
    pub steps: usize,
    pub addresses_assigned: usize,
    pub handshakes_aborted: usize,
    pub pings_completed: usize,
    pub pings_resolved: usize,
    pub pings_skipped: usize,
}

pub struct ScenarioRunner {
    session: Session,
    clock: ManualClock,
    summary: ScenarioSummary,
}

impl ScenarioRunner {
    pub fn new(config: &Config) -> Self {
        let clock = ManualClock::default();
        let session = Session::with_clock(config, Box::new(clock.clone()));
        ScenarioRunner {
            session,
            clock,
            summary: ScenarioSummary::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn summary(&self) -> ScenarioSummary {
        self.summary
    }

    /// Apply every step in order, stopping at the first command error
    pub fn run(&mut self, steps: &[ScenarioStep]) -> Result<ScenarioSummary> {
        info!("Running scenario of {} steps", steps.len());
        for (index, step) in steps.iter().enumerate() {
            self.apply(step)
                .wrap_err_with(|| format!("Scenario step {} ({:?}) failed", index + 1, step))?;
        }
        info!("Scenario finished: {:?}", self.summary);
        Ok(self.summary)
    }

    pub fn apply(&mut self, step: &ScenarioStep) -> Result<()> {
        self.summary.steps += 1;
        match step {
            ScenarioStep::AddHost { name } => {
                self.session.add_host(name.clone());
            }
            ScenarioStep::RemoveHost(id) => {
                self.session.remove_host(*id);
            }
            ScenarioStep::SetOs { host, os } => {
                match self.session.set_os_variant(*host, *os)? {
                    Some(DhcpOutcome::Assigned(_)) => self.summary.addresses_assigned += 1,
                    Some(DhcpOutcome::Aborted(_)) => self.summary.handshakes_aborted += 1,
                    None => {}
                }
            }
            ScenarioStep::Select { source, target } => {
                if let Some(source) = source {
                    self.session.select_source(*source)?;
                }
                if let Some(target) = target {
                    self.session.select_target(*target)?;
                }
            }
            ScenarioStep::Ping => match self.session.ping()? {
                PingOutcome::Completed { resolved } => {
                    self.summary.pings_completed += 1;
                    if resolved {
                        self.summary.pings_resolved += 1;
                    }
                }
                PingOutcome::Skipped(_) => self.summary.pings_skipped += 1,
            },
            ScenarioStep::Wait(duration) => {
                self.clock.advance(*duration);
                log::debug!("Clock advanced by {:?} to {} ms", duration, self.session.now());
            }
        }
        Ok(())
    }
}

/// Two hosts get addresses, then ping each other: cold cache, warm cache,
/// and again once the cached binding has expired.
pub fn demo_scenario() -> Vec<ScenarioStep> {
    vec![
        ScenarioStep::AddHost { name: None },
        ScenarioStep::SetOs { host: 1, os: crate::host::OsVariant::VariantA },
        ScenarioStep::AddHost { name: None },
        ScenarioStep::SetOs { host: 2, os: crate::host::OsVariant::VariantB },
        ScenarioStep::Select { source: Some(1), target: Some(2) },
        ScenarioStep::Ping,
        ScenarioStep::Ping,
        ScenarioStep::Wait(Duration::from_secs(5 * 60)),
        ScenarioStep::Ping,
    ]
}
