//! Immutable name-to-service registry with default node resolution.

use crate::error::{NodeError, NodeResult};
use ledgerweb_core::{NodeName, NodeSelector, default_node_name};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Services keyed by logical node name, fixed at startup.
///
/// The default node is computed once at construction: the explicit default,
/// else the only registered node, else the `cordform` sentinel.
pub struct ServiceRegistry<S: ?Sized> {
    services: BTreeMap<NodeName, Arc<S>>,
    default_node: NodeName,
}

impl<S: ?Sized> ServiceRegistry<S> {
    /// Build a registry. An explicit default must name a registered service.
    pub fn new(
        kind: &'static str,
        services: BTreeMap<NodeName, Arc<S>>,
        explicit_default: Option<NodeName>,
    ) -> NodeResult<Self> {
        if let Some(explicit) = &explicit_default
            && !services.contains_key(explicit)
        {
            return Err(NodeError::Config(format!(
                "default node {explicit} has no {kind} service"
            )));
        }

        let default_node = default_node_name(services.keys(), explicit_default.as_ref());
        if services.is_empty() {
            warn!(kind, "No {kind} services configured; every node lookup will fail");
        } else {
            debug!(
                kind,
                nodes = ?services.keys().map(NodeName::as_str).collect::<Vec<_>>(),
                default_node = %default_node,
                "Configured {kind} services"
            );
        }

        Ok(Self {
            services,
            default_node,
        })
    }

    /// The node used for requests that do not name one.
    pub fn default_node(&self) -> &NodeName {
        &self.default_node
    }

    /// Resolve a request selector to a concrete node name.
    pub fn resolve(&self, selector: &NodeSelector) -> NodeName {
        selector.resolve(&self.default_node)
    }

    /// Look up a service by name.
    pub fn get(&self, name: &NodeName) -> NodeResult<Arc<S>> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| NodeError::NodeNotFound {
                name: name.to_string(),
                available: self.names().map(|n| n.to_string()).collect(),
            })
    }

    /// Resolve a selector and look up the resulting node.
    pub fn resolve_and_get(&self, selector: &NodeSelector) -> NodeResult<(NodeName, Arc<S>)> {
        let name = self.resolve(selector);
        let service = self.get(&name)?;
        Ok((name, service))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &NodeName> {
        self.services.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeName, &Arc<S>)> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl<S: ?Sized> std::fmt::Debug for ServiceRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("nodes", &self.services.keys().collect::<Vec<_>>())
            .field("default_node", &self.default_node)
            .finish()
    }
}
