//! Hardware (link-layer) addresses.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 6-octet hardware address, printed as colon-separated uppercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// All-ones destination used by broadcast frames.
    pub const BROADCAST: MacAddr = MacAddr([0xFF; 6]);

    /// All-zero value written on the wire when a peer's address is not yet known.
    pub const UNSPECIFIED: MacAddr = MacAddr([0x00; 6]);

    /// Draw a uniformly random address.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut octets = [0u8; 6];
        rng.fill(&mut octets);
        MacAddr(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let o = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            o[0], o[1], o[2], o[3], o[4], o[5]
        )
    }
}

/// Errors produced when parsing a textual hardware address
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MacParseError {
    #[error("Expected 6 colon-separated octets, found {0}")]
    WrongLength(usize),
    #[error("Invalid hex octet: {0}")]
    InvalidOctet(String),
}

impl FromStr for MacAddr {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() != 6 {
            return Err(MacParseError::WrongLength(parts.len()));
        }

        let mut octets = [0u8; 6];
        for (slot, part) in octets.iter_mut().zip(parts) {
            if part.len() != 2 {
                return Err(MacParseError::InvalidOctet(part.to_string()));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| MacParseError::InvalidOctet(part.to_string()))?;
        }
        Ok(MacAddr(octets))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_display_is_uppercase_colon_hex() {
        let mac = MacAddr([0x0a, 0x1b, 0x2c, 0x3d, 0x4e, 0x5f]);
        assert_eq!(mac.to_string(), "0A:1B:2C:3D:4E:5F");
        assert_eq!(MacAddr::BROADCAST.to_string(), "FF:FF:FF:FF:FF:FF");
        assert_eq!(MacAddr::UNSPECIFIED.to_string(), "00:00:00:00:00:00");
    }

    #[test]
    fn test_parse() {
        let mac: MacAddr = "0a:1B:2c:3D:4e:5F".parse().unwrap();
        assert_eq!(mac.octets(), [0x0a, 0x1b, 0x2c, 0x3d, 0x4e, 0x5f]);

        assert_eq!("00:11:22".parse::<MacAddr>(), Err(MacParseError::WrongLength(3)));
        assert!("00:11:22:33:44:GG".parse::<MacAddr>().is_err());
        assert!("00:11:22:33:44:555".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_random_is_seed_stable() {
        let a = MacAddr::random(&mut StdRng::seed_from_u64(7));
        let b = MacAddr::random(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_as_string() {
        let mac = MacAddr([0xde, 0xad, 0xbe, 0xef, 0x00, 0x01]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"DE:AD:BE:EF:00:01\"");
        let back: MacAddr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
    }
}
