//! Network addressing types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A `host:port` network address.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct HostAndPort {
    pub host: String,
    pub port: u16,
}

impl HostAndPort {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for HostAndPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for HostAndPort {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let (host, port) = s
            .trim()
            .rsplit_once(':')
            .ok_or_else(|| crate::Error::InvalidAddress(format!("missing port in {s:?}")))?;
        if host.is_empty() {
            return Err(crate::Error::InvalidAddress(format!("missing host in {s:?}")));
        }
        let port = port
            .parse()
            .map_err(|e| crate::Error::InvalidAddress(format!("{s:?}: {e}")))?;
        Ok(Self::new(host, port))
    }
}

impl Serialize for HostAndPort {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HostAndPort {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_and_port_parse() {
        let addr: HostAndPort = "localhost:10005".parse().unwrap();
        assert_eq!(addr, HostAndPort::new("localhost", 10005));
        assert_eq!(addr.to_string(), "localhost:10005");
    }

    #[test]
    fn test_host_and_port_rejects_invalid() {
        assert!("localhost".parse::<HostAndPort>().is_err());
        assert!(":10005".parse::<HostAndPort>().is_err());
        assert!("localhost:99999".parse::<HostAndPort>().is_err());
    }
}
