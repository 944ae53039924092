//! In-process node backend for local development and tests.

use crate::error::{NodeError, NodeResult};
use crate::traits::{ByteStream, MembershipService, NodeService};
use async_trait::async_trait;
use bytes::Bytes;
use ledgerweb_core::config::MemoryNodeConfig;
use ledgerweb_core::{
    AttachmentHash, AttachmentReceipt, AttachmentUpload, CompositeIdentifier, HostAndPort,
    MembershipQuery, MembershipRequest, MembershipState, MembershipStatus, Party, PartyName,
};
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Chunk size for attachment streams (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// A node whose network view comes from configuration and whose attachments
/// and memberships live in memory.
pub struct MemoryNode {
    config: MemoryNodeConfig,
    attachments: RwLock<HashMap<AttachmentHash, Bytes>>,
    memberships: RwLock<Vec<MembershipState>>,
}

impl std::fmt::Debug for MemoryNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNode")
            .field("identity", &self.config.identity.to_string())
            .field("offline", &self.config.offline)
            .finish_non_exhaustive()
    }
}

impl MemoryNode {
    pub fn new(config: MemoryNodeConfig) -> Self {
        Self {
            config,
            attachments: RwLock::new(HashMap::new()),
            memberships: RwLock::new(Vec::new()),
        }
    }

    fn ensure_online(&self) -> NodeResult<()> {
        if self.config.offline {
            return Err(NodeError::RemoteUnavailable(format!(
                "{} is offline",
                self.config.identity
            )));
        }
        Ok(())
    }

    fn parties<'a>(names: impl IntoIterator<Item = &'a PartyName>) -> Vec<Party> {
        let mut parties: Vec<Party> = Vec::new();
        for name in names {
            if !parties.iter().any(|party| &party.name == name) {
                parties.push(Party::new(name.clone()));
            }
        }
        parties
    }

    fn network_nodes(&self) -> Vec<Party> {
        Self::parties(
            std::iter::once(&self.config.identity)
                .chain(&self.config.peers)
                .chain(&self.config.notaries),
        )
    }
}

#[async_trait]
impl NodeService for MemoryNode {
    async fn identity(&self) -> NodeResult<Party> {
        self.ensure_online()?;
        Ok(Party::new(self.config.identity.clone()))
    }

    async fn nodes(&self) -> NodeResult<Vec<Party>> {
        self.ensure_online()?;
        Ok(self.network_nodes())
    }

    async fn notaries(&self) -> NodeResult<Vec<Party>> {
        self.ensure_online()?;
        Ok(Self::parties(&self.config.notaries))
    }

    async fn peers(&self) -> NodeResult<Vec<Party>> {
        self.ensure_online()?;
        let identity = &self.config.identity;
        Ok(Self::parties(self.config.peers.iter().filter(|peer| {
            *peer != identity && !self.config.notaries.contains(peer)
        })))
    }

    async fn identities(&self) -> NodeResult<Vec<Party>> {
        self.ensure_online()?;
        Ok(vec![Party::new(self.config.identity.clone())])
    }

    async fn server_time(&self) -> NodeResult<OffsetDateTime> {
        self.ensure_online()?;
        Ok(OffsetDateTime::now_utc())
    }

    async fn addresses(&self) -> NodeResult<Vec<HostAndPort>> {
        self.ensure_online()?;
        Ok(self.config.addresses.clone())
    }

    async fn platform_version(&self) -> NodeResult<u32> {
        self.ensure_online()?;
        Ok(self.config.platform_version)
    }

    async fn flows(&self) -> NodeResult<Vec<String>> {
        self.ensure_online()?;
        Ok(self.config.flows.clone())
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn refresh_network_map_cache(&self) -> NodeResult<()> {
        self.ensure_online()?;
        debug!("Network map is static for in-memory nodes");
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "memory"))]
    async fn open_attachment(&self, hash: &AttachmentHash) -> NodeResult<ByteStream> {
        self.ensure_online()?;
        let data = self
            .attachments
            .read()
            .await
            .get(hash)
            .cloned()
            .ok_or_else(|| NodeError::NotFound(hash.to_string()))?;

        let chunks: Vec<NodeResult<Bytes>> = (0..data.len())
            .step_by(STREAM_CHUNK_SIZE)
            .map(|start| Ok(data.slice(start..(start + STREAM_CHUNK_SIZE).min(data.len()))))
            .collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    #[instrument(skip(self, upload), fields(backend = "memory", filename = %upload.filename))]
    async fn save_attachment(&self, upload: AttachmentUpload) -> NodeResult<AttachmentReceipt> {
        self.ensure_online()?;
        let hash = AttachmentHash::compute(&upload.data);
        let receipt = AttachmentReceipt::for_upload(&upload, hash);
        self.attachments
            .write()
            .await
            .entry(hash)
            .or_insert_with(|| Bytes::from(upload.data));
        debug!(hash = %hash, "Stored attachment");
        Ok(receipt)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[async_trait]
impl MembershipService for MemoryNode {
    #[instrument(skip(self, request), fields(backend = "memory", bno = %request.bno))]
    async fn create_membership_request(
        &self,
        request: MembershipRequest,
    ) -> NodeResult<MembershipState> {
        self.ensure_online()?;
        let mut memberships = self.memberships.write().await;
        if let Some(existing) = memberships.iter().find(|state| {
            state.bno == request.bno && state.network_id == request.network_id()
        }) {
            debug!(linear_id = %existing.linear_id, "Membership already requested");
            return Ok(existing.clone());
        }

        let now = OffsetDateTime::now_utc();
        let state = MembershipState {
            linear_id: CompositeIdentifier::generate(None),
            member: self.config.identity.clone(),
            bno: request.bno.clone(),
            network_id: request.network_id().to_string(),
            status: MembershipStatus::Pending,
            metadata: request.metadata,
            issued: now,
            modified: now,
        };
        memberships.push(state.clone());
        Ok(state)
    }

    #[instrument(skip(self, request), fields(backend = "memory", bno = %request.bno))]
    async fn amend_membership_request(
        &self,
        request: MembershipRequest,
    ) -> NodeResult<MembershipState> {
        self.ensure_online()?;
        let mut memberships = self.memberships.write().await;
        let state = memberships
            .iter_mut()
            .find(|state| state.bno == request.bno && state.network_id == request.network_id())
            .ok_or_else(|| {
                NodeError::NotFound(format!(
                    "membership with {} in network {}",
                    request.bno,
                    request.network_id()
                ))
            })?;
        state.metadata = request.metadata;
        state.modified = OffsetDateTime::now_utc();
        Ok(state.clone())
    }

    async fn list_memberships(&self, query: MembershipQuery) -> NodeResult<Vec<MembershipState>> {
        self.ensure_online()?;
        let known = self.network_nodes();
        let memberships = self.memberships.read().await;
        Ok(memberships
            .iter()
            .filter(|state| query.matches(state))
            .filter(|state| {
                !query.filter_out_missing_from_network_map
                    || known.iter().any(|party| party.name == state.member)
            })
            .cloned()
            .collect())
    }
}
