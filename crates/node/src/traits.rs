//! Node service trait definitions.

use crate::error::NodeResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use ledgerweb_core::{
    AttachmentHash, AttachmentReceipt, AttachmentUpload, HostAndPort, MembershipQuery,
    MembershipRequest, MembershipState, Party,
};
use std::pin::Pin;
use time::OffsetDateTime;

/// A boxed stream of bytes for streaming reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = NodeResult<Bytes>> + Send>>;

/// Per-node façade over a ledger node's capabilities.
///
/// Implementations never retry; transport failures surface as
/// [`crate::NodeError::RemoteUnavailable`].
#[async_trait]
pub trait NodeService: Send + Sync + 'static {
    /// The node's own legal identity.
    async fn identity(&self) -> NodeResult<Party>;

    /// All parties on the network map.
    async fn nodes(&self) -> NodeResult<Vec<Party>>;

    /// Notaries on the network map.
    async fn notaries(&self) -> NodeResult<Vec<Party>>;

    /// Network map parties other than this node and the notaries.
    async fn peers(&self) -> NodeResult<Vec<Party>>;

    /// Identities this node holds keys for.
    async fn identities(&self) -> NodeResult<Vec<Party>>;

    async fn server_time(&self) -> NodeResult<OffsetDateTime>;

    async fn addresses(&self) -> NodeResult<Vec<HostAndPort>>;

    async fn platform_version(&self) -> NodeResult<u32>;

    /// Registered flow class names.
    async fn flows(&self) -> NodeResult<Vec<String>>;

    async fn refresh_network_map_cache(&self) -> NodeResult<()>;

    /// Open a stored attachment archive.
    ///
    /// Fails with `NotFound` before returning if the hash is unknown.
    async fn open_attachment(&self, hash: &AttachmentHash) -> NodeResult<ByteStream>;

    /// Persist an archive and return its receipt.
    async fn save_attachment(&self, upload: AttachmentUpload) -> NodeResult<AttachmentReceipt>;

    /// Get the name of this backend.
    ///
    /// Returns a static string identifier (e.g., "rpc", "memory").
    /// Used for logging and health output.
    fn backend_name(&self) -> &'static str;
}

/// Business-network membership operations of a member node.
#[async_trait]
pub trait MembershipService: Send + Sync + 'static {
    /// Ask the BNO to start on-boarding this node.
    async fn create_membership_request(
        &self,
        request: MembershipRequest,
    ) -> NodeResult<MembershipState>;

    /// Propose new metadata for this node's existing membership.
    async fn amend_membership_request(
        &self,
        request: MembershipRequest,
    ) -> NodeResult<MembershipState>;

    async fn list_memberships(&self, query: MembershipQuery) -> NodeResult<Vec<MembershipState>>;
}
