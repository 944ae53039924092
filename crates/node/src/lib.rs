//! Node service abstraction, registry and backends for ledgerweb.
//!
//! This crate provides:
//! - The per-node `NodeService` and `MembershipService` façades
//! - An immutable name-to-service registry with default node resolution
//! - Attachment archive streaming, entry extraction and uploads
//! - Backends: RPC bridge client and in-memory node

pub mod archive;
pub mod backends;
pub mod error;
pub mod registry;
pub mod traits;

pub use archive::{ArchiveDownload, AttachmentArchiveAccessor};
pub use backends::{memory::MemoryNode, rpc::RpcNode};
pub use error::{NodeError, NodeResult};
pub use registry::ServiceRegistry;
pub use traits::{ByteStream, MembershipService, NodeService};

use ledgerweb_core::NodeName;
use ledgerweb_core::config::{AppConfig, NodeConfig};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Registry of node façades.
pub type NodeServiceRegistry = ServiceRegistry<dyn NodeService>;

/// Registry of membership services.
pub type MembershipRegistry = ServiceRegistry<dyn MembershipService>;

/// Everything built from the `nodes` section of the configuration.
#[derive(Debug)]
pub struct NodeServices {
    pub nodes: NodeServiceRegistry,
    pub memberships: MembershipRegistry,
}

/// Create node and membership services from configuration.
pub fn from_config(config: &AppConfig) -> NodeResult<NodeServices> {
    config.validate().map_err(NodeError::Config)?;

    let mut nodes: BTreeMap<NodeName, Arc<dyn NodeService>> = BTreeMap::new();
    let mut memberships: BTreeMap<NodeName, Arc<dyn MembershipService>> = BTreeMap::new();

    for (name, node_config) in &config.nodes {
        match node_config {
            NodeConfig::Rpc {
                url,
                username,
                password,
                timeout_secs,
            } => {
                let backend = Arc::new(RpcNode::new(
                    url,
                    username.clone(),
                    password.clone(),
                    Duration::from_secs(*timeout_secs),
                )?);
                nodes.insert(name.clone(), backend.clone());
                memberships.insert(name.clone(), backend);
            }
            NodeConfig::Memory(memory) => {
                let backend = Arc::new(MemoryNode::new(memory.clone()));
                nodes.insert(name.clone(), backend.clone());
                memberships.insert(name.clone(), backend);
            }
        }
        info!(node = %name, backend = node_config.backend_name(), "Configured node");
    }

    Ok(NodeServices {
        nodes: ServiceRegistry::new("node", nodes, config.default_node.clone())?,
        memberships: ServiceRegistry::new("membership", memberships, config.default_node.clone())?,
    })
}
