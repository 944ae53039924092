//! Business-network membership types.

use crate::identifier::CompositeIdentifier;
use crate::party::PartyName;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Network id used when a membership request does not name one.
pub const DEFAULT_NETWORK_ID: &str = "default";

/// Membership lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipStatus {
    Pending,
    Active,
    Suspended,
}

/// A membership as seen by a member node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipState {
    pub linear_id: CompositeIdentifier,
    pub member: PartyName,
    pub bno: PartyName,
    pub network_id: String,
    pub status: MembershipStatus,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(with = "time::serde::rfc3339")]
    pub issued: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
}

/// Body of a create or amend membership call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    pub bno: PartyName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl MembershipRequest {
    /// The requested network id, or [`DEFAULT_NETWORK_ID`].
    pub fn network_id(&self) -> &str {
        self.network_id.as_deref().unwrap_or(DEFAULT_NETWORK_ID)
    }
}

/// Filter for listing memberships.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipQuery {
    pub bno: PartyName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
    #[serde(default = "default_filter_out_missing")]
    pub filter_out_missing_from_network_map: bool,
}

impl MembershipQuery {
    pub fn new(bno: PartyName) -> Self {
        Self {
            bno,
            network_id: None,
            force_refresh: false,
            filter_out_missing_from_network_map: default_filter_out_missing(),
        }
    }

    /// Whether `state` passes the BNO and network filters.
    pub fn matches(&self, state: &MembershipState) -> bool {
        state.bno == self.bno
            && self
                .network_id
                .as_deref()
                .is_none_or(|network_id| state.network_id == network_id)
    }
}

fn default_filter_out_missing() -> bool {
    true
}
