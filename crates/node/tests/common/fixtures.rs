use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use ledgerweb_core::config::MemoryNodeConfig;
use ledgerweb_core::{
    AttachmentHash, AttachmentReceipt, AttachmentUpload, HostAndPort, Party, PartyName,
};
use ledgerweb_node::{ByteStream, MemoryNode, NodeError, NodeResult, NodeService};
use std::io::{Cursor, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use zip::{CompressionMethod, ZipWriter};
use zip::write::SimpleFileOptions;

/// Parse a party name, panicking on invalid test input.
pub fn party(text: &str) -> PartyName {
    PartyName::parse(text).expect("valid party name")
}

/// An online in-memory node with one peer and one notary.
pub fn memory_node() -> MemoryNode {
    let mut config = MemoryNodeConfig::new(party("O=PartyA, L=London, C=GB"));
    config.peers = vec![party("O=PartyB, L=New York, C=US")];
    config.notaries = vec![party("O=Notary, L=London, C=GB")];
    MemoryNode::new(config)
}

/// Build a stored (uncompressed) ZIP archive; names ending in `/` become
/// directory entries.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Drain a byte stream into a vector.
pub async fn collect(stream: ByteStream) -> Vec<u8> {
    let chunks: Vec<_> = stream.try_collect().await.unwrap();
    chunks.concat()
}

/// Sets its flag when dropped.
struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A node serving one archive in small delayed chunks, recording how many
/// chunks were pulled and whether the stream was dropped.
pub struct TrickleNode {
    data: Bytes,
    chunk_size: usize,
    delay: Duration,
    pub pulled: Arc<AtomicUsize>,
    pub released: Arc<AtomicBool>,
}

impl TrickleNode {
    pub fn new(data: Vec<u8>, chunk_size: usize, delay: Duration) -> Self {
        Self {
            data: Bytes::from(data),
            chunk_size,
            delay,
            pulled: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

fn unsupported<T>() -> NodeResult<T> {
    Err(NodeError::NotFound("not served by trickle node".to_string()))
}

#[async_trait]
impl NodeService for TrickleNode {
    async fn identity(&self) -> NodeResult<Party> {
        unsupported()
    }

    async fn nodes(&self) -> NodeResult<Vec<Party>> {
        unsupported()
    }

    async fn notaries(&self) -> NodeResult<Vec<Party>> {
        unsupported()
    }

    async fn peers(&self) -> NodeResult<Vec<Party>> {
        unsupported()
    }

    async fn identities(&self) -> NodeResult<Vec<Party>> {
        unsupported()
    }

    async fn server_time(&self) -> NodeResult<OffsetDateTime> {
        unsupported()
    }

    async fn addresses(&self) -> NodeResult<Vec<HostAndPort>> {
        unsupported()
    }

    async fn platform_version(&self) -> NodeResult<u32> {
        unsupported()
    }

    async fn flows(&self) -> NodeResult<Vec<String>> {
        unsupported()
    }

    async fn refresh_network_map_cache(&self) -> NodeResult<()> {
        unsupported()
    }

    async fn open_attachment(&self, _hash: &AttachmentHash) -> NodeResult<ByteStream> {
        let flag = ReleaseFlag(self.released.clone());
        let pulled = self.pulled.clone();
        let data = self.data.clone();
        let chunk_size = self.chunk_size;
        let delay = self.delay;

        let stream = async_stream::stream! {
            let _flag = flag;
            let mut offset = 0;
            while offset < data.len() {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let end = (offset + chunk_size).min(data.len());
                pulled.fetch_add(1, Ordering::SeqCst);
                yield Ok(data.slice(offset..end));
                offset = end;
            }
        };
        Ok(Box::pin(stream))
    }

    async fn save_attachment(&self, _upload: AttachmentUpload) -> NodeResult<AttachmentReceipt> {
        unsupported()
    }

    fn backend_name(&self) -> &'static str {
        "trickle"
    }
}
