//! Logical node names and request-side node selection.
//!
//! Every node-scoped request carries an optional node name. Instead of passing
//! `Option<String>` around, the request side is modelled as [`NodeSelector`] and
//! defaulting happens in exactly one place: [`NodeSelector::resolve`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reserved node name for a single-node "network from config" deployment.
pub const CORDFORM_NODE_NAME: &str = "cordform";

/// A non-empty, trimmed key identifying a configured node.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeName(String);

impl NodeName {
    /// Parse a node name, trimming surrounding whitespace.
    pub fn new(name: impl AsRef<str>) -> crate::Result<Self> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidNodeName(
                "node name must not be empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The reserved `cordform` sentinel.
    pub fn cordform() -> Self {
        Self(CORDFORM_NODE_NAME.to_string())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeName({})", self.0)
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeName {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for NodeName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

/// The node a request asked for.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum NodeSelector {
    /// An explicit node name.
    Named(NodeName),
    /// No node name given; the deployment default applies.
    #[default]
    Unspecified,
}

impl NodeSelector {
    /// Build a selector from an optional raw request value.
    /// Missing, empty or whitespace-only values select the default node.
    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.and_then(|value| NodeName::new(value).ok())
            .map(Self::Named)
            .unwrap_or(Self::Unspecified)
    }

    /// Resolve to a concrete node name. Existence is not checked here.
    pub fn resolve(&self, default_node: &NodeName) -> NodeName {
        match self {
            Self::Named(name) => name.clone(),
            Self::Unspecified => default_node.clone(),
        }
    }
}

impl From<NodeName> for NodeSelector {
    fn from(name: NodeName) -> Self {
        Self::Named(name)
    }
}

/// Compute the deployment's default node name.
///
/// Order: the explicitly configured default, else the only registered node,
/// else the `cordform` sentinel (which may or may not be registered).
pub fn default_node_name<'a>(
    registered: impl IntoIterator<Item = &'a NodeName>,
    explicit: Option<&NodeName>,
) -> NodeName {
    if let Some(explicit) = explicit {
        return explicit.clone();
    }
    let mut names = registered.into_iter();
    match (names.next(), names.next()) {
        (Some(only), None) => only.clone(),
        _ => NodeName::cordform(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<NodeName> {
        raw.iter().map(|n| NodeName::new(n).unwrap()).collect()
    }

    #[test]
    fn test_node_name_trims_and_rejects_empty() {
        assert_eq!(NodeName::new("  partyA ").unwrap().as_str(), "partyA");
        assert!(NodeName::new("").is_err());
        assert!(NodeName::new("   ").is_err());
    }

    #[test]
    fn test_selector_from_optional() {
        assert_eq!(NodeSelector::from_optional(None), NodeSelector::Unspecified);
        assert_eq!(
            NodeSelector::from_optional(Some(" ")),
            NodeSelector::Unspecified
        );
        assert_eq!(
            NodeSelector::from_optional(Some("partyB")),
            NodeSelector::Named(NodeName::new("partyB").unwrap())
        );
    }

    #[test]
    fn test_resolve_named_is_unchanged() {
        let default = NodeName::new("partyA").unwrap();
        let named = NodeSelector::Named(NodeName::new("nobody").unwrap());
        assert_eq!(named.resolve(&default).as_str(), "nobody");
        assert_eq!(NodeSelector::Unspecified.resolve(&default), default);
    }

    #[test]
    fn test_default_single_node() {
        let registered = names(&["partyA"]);
        assert_eq!(default_node_name(&registered, None).as_str(), "partyA");
    }

    #[test]
    fn test_default_prefers_cordform_sentinel() {
        let registered = names(&["partyA", "cordform", "partyB"]);
        assert_eq!(default_node_name(&registered, None).as_str(), "cordform");
    }

    #[test]
    fn test_default_without_sentinel_is_still_sentinel() {
        let registered = names(&["partyA", "partyB"]);
        assert_eq!(default_node_name(&registered, None), NodeName::cordform());
    }

    #[test]
    fn test_default_empty_registry() {
        assert_eq!(default_node_name(&[], None), NodeName::cordform());
    }

    #[test]
    fn test_explicit_default_wins() {
        let registered = names(&["partyA", "cordform"]);
        let explicit = NodeName::new("partyA").unwrap();
        assert_eq!(
            default_node_name(&registered, Some(&explicit)).as_str(),
            "partyA"
        );
    }

    #[test]
    fn test_node_name_deserialize_rejects_blank() {
        assert!(serde_json::from_str::<NodeName>("\"  \"").is_err());
        let name: NodeName = serde_json::from_str("\"partyA\"").unwrap();
        assert_eq!(name.as_str(), "partyA");
    }
}
