//! Application state.

use ledgerweb_core::config::AppConfig;
use ledgerweb_node::{
    AttachmentArchiveAccessor, MembershipRegistry, NodeResult, NodeServiceRegistry, NodeServices,
};
use std::sync::Arc;

/// Shared application state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<AppConfig>,
    /// Node façades by logical name.
    pub nodes: Arc<NodeServiceRegistry>,
    /// Membership services by logical name.
    pub memberships: Arc<MembershipRegistry>,
    /// Attachment archive reader and builder.
    pub archives: AttachmentArchiveAccessor,
}

impl AppState {
    pub fn new(config: AppConfig, services: NodeServices) -> Self {
        Self {
            config: Arc::new(config),
            nodes: Arc::new(services.nodes),
            memberships: Arc::new(services.memberships),
            archives: AttachmentArchiveAccessor::default(),
        }
    }

    /// Validate the configuration and build every configured node.
    pub fn from_config(config: AppConfig) -> NodeResult<Self> {
        let services = ledgerweb_node::from_config(&config)?;
        Ok(Self::new(config, services))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("nodes", &self.nodes)
            .field("memberships", &self.memberships)
            .finish_non_exhaustive()
    }
}
