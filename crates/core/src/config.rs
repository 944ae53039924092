//! Configuration types shared across crates.

use crate::network::HostAndPort;
use crate::node_name::NodeName;
use crate::party::PartyName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted request body size for attachment uploads.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Per-node backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeConfig {
    /// A node reached through its HTTP RPC bridge.
    Rpc {
        /// Base URL of the bridge (e.g., "http://localhost:10050/").
        url: String,
        /// Basic auth username.
        username: Option<String>,
        /// Basic auth password.
        /// WARNING: Prefer LEDGERWEB_NODES__<NAME>__PASSWORD over storing in config.
        password: Option<String>,
        /// Per-request timeout in seconds.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
    /// An in-process node for local development and tests.
    Memory(MemoryNodeConfig),
}

fn default_timeout_secs() -> u64 {
    30
}

impl NodeConfig {
    /// Short backend label used in logs and health output.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Rpc { .. } => "rpc",
            Self::Memory(_) => "memory",
        }
    }

    /// Validate backend configuration invariants.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Rpc {
                url,
                username,
                password,
                timeout_secs,
            } => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(format!("rpc url must be http(s), got {url:?}"));
                }
                if *timeout_secs == 0 {
                    return Err("rpc timeout_secs must be greater than zero".to_string());
                }
                match (username.as_ref(), password.as_ref()) {
                    (Some(_), _) | (None, None) => Ok(()),
                    (None, Some(_)) => Err("rpc password requires a username".to_string()),
                }
            }
            Self::Memory(_) => Ok(()),
        }
    }
}

/// Settings for an in-memory node.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryNodeConfig {
    /// The node's own legal identity.
    pub identity: PartyName,
    #[serde(default)]
    pub notaries: Vec<PartyName>,
    #[serde(default)]
    pub peers: Vec<PartyName>,
    #[serde(default)]
    pub flows: Vec<String>,
    #[serde(default)]
    pub addresses: Vec<HostAndPort>,
    #[serde(default = "default_platform_version")]
    pub platform_version: u32,
    /// Simulate an unreachable node: every operation fails as unavailable.
    #[serde(default)]
    pub offline: bool,
}

fn default_platform_version() -> u32 {
    4
}

impl MemoryNodeConfig {
    pub fn new(identity: PartyName) -> Self {
        Self {
            identity,
            notaries: Vec::new(),
            peers: Vec::new(),
            flows: Vec::new(),
            addresses: Vec::new(),
            platform_version: default_platform_version(),
            offline: false,
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Node to use when a request does not name one.
    #[serde(default)]
    pub default_node: Option<NodeName>,
    /// Configured nodes by logical name.
    #[serde(default)]
    pub nodes: BTreeMap<NodeName, NodeConfig>,
}

impl AppConfig {
    /// Create a test configuration with a single in-memory `cordform` node.
    ///
    /// **For testing only.**
    pub fn for_testing() -> Self {
        let mut nodes = BTreeMap::new();
        if let Ok(identity) = PartyName::new("PartyA", "London", "GB") {
            nodes.insert(
                NodeName::cordform(),
                NodeConfig::Memory(MemoryNodeConfig::new(identity)),
            );
        }
        Self {
            server: ServerConfig::default(),
            default_node: None,
            nodes,
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.max_upload_bytes == 0 {
            return Err("server.max_upload_bytes must be greater than zero".to_string());
        }
        for (name, node) in &self.nodes {
            node.validate().map_err(|e| format!("node {name}: {e}"))?;
        }
        if let Some(default_node) = &self.default_node
            && !self.nodes.contains_key(default_node)
        {
            return Err(format!(
                "default_node {default_node} is not a configured node"
            ));
        }
        Ok(())
    }
}
