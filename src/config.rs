use crate::host::{HostId, OsVariant, DEFAULT_SERVER_ADDRESS, SERVER_ID};
use crate::net::pool::{DEFAULT_POOL_END, DEFAULT_POOL_START};
use crate::net::{AddressPool, DEFAULT_ARP_TTL_MS};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::time::Duration;

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Top-level simulation configuration
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    /// Steps are written as single-key maps (`- add_host: { name: x }`) or,
    /// for steps without arguments, a bare name (`- ping`)
    #[serde(
        default,
        with = "serde_yaml::with::singleton_map_recursive",
        skip_serializing_if = "Option::is_none"
    )]
    pub scenario: Option<Vec<ScenarioStep>>,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(level) = &self.general.log_level {
            if !LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                return Err(ValidationError::InvalidGeneral(format!(
                    "unknown log_level '{}', expected one of {:?}",
                    level, LOG_LEVELS
                )));
            }
        }

        self.network.validate()?;

        if let Some(steps) = &self.scenario {
            for (index, step) in steps.iter().enumerate() {
                step.validate().map_err(|msg| {
                    ValidationError::InvalidScenario(format!("step {}: {}", index + 1, msg))
                })?;
            }
        }

        Ok(())
    }

    pub fn scenario(&self) -> &[ScenarioStep] {
        self.scenario.as_deref().unwrap_or(&[])
    }
}

/// Settings that do not concern the simulated network itself
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Seed for hardware addresses and random frame fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Pause after each displayed packet
    #[serde(default, with = "humantime_serde")]
    pub settle_delay: Duration,
    /// Clear a host's address when its OS is set back to unassigned
    #[serde(default)]
    pub release_on_unassign: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            seed: None,
            settle_delay: Duration::ZERO,
            release_on_unassign: false,
        }
    }
}

/// Addressing of the simulated segment
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NetworkConfig {
    pub server_address: Ipv4Addr,
    pub pool_start: u8,
    pub pool_end: u8,
    pub pool_wrap: bool,
    #[serde(with = "humantime_serde")]
    pub arp_ttl: Duration,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            server_address: DEFAULT_SERVER_ADDRESS,
            pool_start: DEFAULT_POOL_START,
            pool_end: DEFAULT_POOL_END,
            pool_wrap: true,
            arp_ttl: Duration::from_millis(DEFAULT_ARP_TTL_MS),
        }
    }
}

impl NetworkConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.pool_start == 0 {
            return Err(ValidationError::InvalidNetwork(
                "pool_start must be at least 1".to_string(),
            ));
        }
        if self.pool_end == u8::MAX {
            return Err(ValidationError::InvalidNetwork(
                "pool_end cannot be the broadcast host 255".to_string(),
            ));
        }
        if self.pool_start > self.pool_end {
            return Err(ValidationError::InvalidNetwork(format!(
                "pool_start ({}) is greater than pool_end ({})",
                self.pool_start, self.pool_end
            )));
        }
        if self.pool().contains(self.server_address) {
            return Err(ValidationError::InvalidNetwork(format!(
                "server_address {} lies inside the pool range",
                self.server_address
            )));
        }
        if self.arp_ttl_ms() == 0 {
            return Err(ValidationError::InvalidNetwork(
                "arp_ttl must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Pool over the server's /24
    pub fn pool(&self) -> AddressPool {
        AddressPool::new(self.server_address, self.pool_start, self.pool_end, self.pool_wrap)
    }

    pub fn arp_ttl_ms(&self) -> u64 {
        u64::try_from(self.arp_ttl.as_millis()).unwrap_or(u64::MAX)
    }
}

/// One scripted command
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStep {
    AddHost {
        #[serde(default)]
        name: Option<String>,
    },
    RemoveHost(HostId),
    SetOs {
        host: HostId,
        os: OsVariant,
    },
    Select {
        #[serde(default)]
        source: Option<HostId>,
        #[serde(default)]
        target: Option<HostId>,
    },
    Ping,
    /// Advance the logical clock
    Wait(#[serde(with = "humantime_serde")] Duration),
}

impl ScenarioStep {
    fn validate(&self) -> Result<(), String> {
        match self {
            ScenarioStep::SetOs { host, .. } if *host == SERVER_ID => {
                Err("the DHCP server's OS cannot be changed".to_string())
            }
            ScenarioStep::SetOs {
                os: OsVariant::DhcpServer,
                ..
            } => Err("dhcp_server cannot be installed on a host".to_string()),
            ScenarioStep::Select {
                source: None,
                target: None,
            } => Err("select needs a source, a target or both".to_string()),
            _ => Ok(()),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),
}
