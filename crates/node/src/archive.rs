//! Attachment archive access: listing, whole/entry downloads and uploads.
//!
//! Reads spool the node's byte stream into a [`SpooledTempFile`] (memory below
//! a threshold, a temp file above it) on the blocking pool, then use the ZIP
//! central directory. Entry downloads decompress on the blocking pool and hand
//! chunks to the async side over a bounded channel; dropping the returned
//! stream closes the channel, which stops the reader and releases the spool.
//! Dropping a read while it is still spooling cancels the node stream.

use crate::error::{NodeError, NodeResult};
use crate::traits::{ByteStream, NodeService};
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use ledgerweb_core::{AttachmentFile, AttachmentHash, AttachmentReceipt, AttachmentUpload};
use std::collections::HashSet;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use tempfile::SpooledTempFile;
use tokio::sync::{mpsc, oneshot};
use tokio_util::io::{StreamReader, SyncIoBridge};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Archives up to this size are spooled in memory.
pub const DEFAULT_SPOOL_THRESHOLD: usize = 4 * 1024 * 1024;

/// Read buffer size for entry streaming (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered between the blocking reader and the response body.
const CHANNEL_CAPACITY: usize = 4;

/// Filename given to archives built from several uploaded files.
pub const BUILT_ARCHIVE_NAME: &str = "attachment.zip";

/// A download ready to be written to a response.
pub struct ArchiveDownload {
    /// Filename for the `Content-Disposition` header.
    pub filename: String,
    /// Decompressed size when known.
    pub content_length: Option<u64>,
    pub stream: ByteStream,
}

impl std::fmt::Debug for ArchiveDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveDownload")
            .field("filename", &self.filename)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct EntryInfo {
    name: String,
    is_dir: bool,
}

/// Streams stored archives, single entries within them, and saves uploads.
#[derive(Clone, Debug)]
pub struct AttachmentArchiveAccessor {
    spool_threshold: usize,
}

impl Default for AttachmentArchiveAccessor {
    fn default() -> Self {
        Self::new(DEFAULT_SPOOL_THRESHOLD)
    }
}

impl AttachmentArchiveAccessor {
    pub fn new(spool_threshold: usize) -> Self {
        Self { spool_threshold }
    }

    /// List entry names in archive order.
    #[instrument(skip(self, service), fields(backend = service.backend_name()))]
    pub async fn list_entries(
        &self,
        service: &dyn NodeService,
        hash: &AttachmentHash,
    ) -> NodeResult<Vec<String>> {
        let cancel = CancellationToken::new();
        let reader = bridge(service.open_attachment(hash).await?, cancel.clone());
        let threshold = self.spool_threshold;
        let _cancel_on_drop = cancel.drop_guard();

        let entries = tokio::task::spawn_blocking(move || {
            let mut archive = open_archive(reader, threshold)?;
            entry_listing(&mut archive)
        })
        .await
        .map_err(join_error)??;

        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    /// The whole archive, downloaded as `{hash}.zip`.
    pub async fn open_whole(
        &self,
        service: &dyn NodeService,
        hash: &AttachmentHash,
    ) -> NodeResult<ArchiveDownload> {
        let stream = service.open_attachment(hash).await?;
        Ok(ArchiveDownload {
            filename: format!("{hash}.zip"),
            content_length: None,
            stream,
        })
    }

    /// A single entry, matched by path or by unique file name.
    ///
    /// Returns `NotFound` before producing any bytes when nothing matches.
    #[instrument(skip(self, service), fields(backend = service.backend_name()))]
    pub async fn open_entry(
        &self,
        service: &dyn NodeService,
        hash: &AttachmentHash,
        sub_path: &str,
    ) -> NodeResult<ArchiveDownload> {
        let target = normalize_entry_path(sub_path);
        let filename = last_segment(&target).to_string();
        if filename.is_empty() {
            return Err(NodeError::NotFound(format!("{hash}/{sub_path}")));
        }

        let cancel = CancellationToken::new();
        let reader = bridge(service.open_attachment(hash).await?, cancel.clone());
        let threshold = self.spool_threshold;
        let cancel_on_drop = cancel.drop_guard();
        let (ready_tx, ready_rx) = oneshot::channel::<NodeResult<u64>>();
        let (chunk_tx, mut chunk_rx) = mpsc::channel::<NodeResult<Bytes>>(CHANNEL_CAPACITY);
        let missing = format!("{hash}/{sub_path}");

        tokio::task::spawn_blocking(move || {
            let (mut archive, index) = match locate_entry(reader, threshold, &target, missing) {
                Ok(found) => found,
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };
            let entry = match archive.by_index(index) {
                Ok(entry) => entry,
                Err(err) => {
                    let _ = ready_tx.send(Err(err.into()));
                    return;
                }
            };
            if ready_tx.send(Ok(entry.size())).is_ok() {
                pump(entry, &chunk_tx);
            }
        });

        let size = ready_rx
            .await
            .map_err(|_| NodeError::Io(std::io::Error::other("archive reader stopped")))??;
        // Spooling is done; the node stream has already been consumed.
        cancel_on_drop.disarm();

        let stream = async_stream::stream! {
            while let Some(chunk) = chunk_rx.recv().await {
                yield chunk;
            }
        };

        Ok(ArchiveDownload {
            filename,
            content_length: Some(size),
            stream: Box::pin(stream),
        })
    }

    /// Save uploaded files as an attachment.
    ///
    /// A single file that already is a ZIP/JAR is stored verbatim; anything
    /// else is packed into a new deflate archive.
    #[instrument(skip(self, service, files), fields(backend = service.backend_name(), files = files.len()))]
    pub async fn save(
        &self,
        service: &dyn NodeService,
        files: Vec<AttachmentFile>,
        uploader: Option<String>,
    ) -> NodeResult<AttachmentReceipt> {
        validate_upload(&files)?;

        let upload = tokio::task::spawn_blocking(move || build_upload(files, uploader))
            .await
            .map_err(join_error)??;

        debug!(
            filename = %upload.filename,
            bytes = upload.data.len(),
            saved_original = upload.saved_original,
            "Saving attachment"
        );
        service.save_attachment(upload).await
    }
}

/// Blocking reader over a node stream.
///
/// Once `cancel` fires the node stream is dropped and the reader fails, so a
/// spool running on the blocking pool stops at its next read.
fn bridge(stream: ByteStream, cancel: CancellationToken) -> impl Read + Send + 'static {
    let guarded = async_stream::stream! {
        let mut stream = stream;
        let mut cancelled = false;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                item = stream.next() => match item {
                    Some(item) => yield item,
                    None => break,
                },
            }
        }
        drop(stream);
        if cancelled {
            debug!("Archive read cancelled, node stream released");
            yield Err(NodeError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionAborted,
                "archive read cancelled",
            )));
        }
    };
    let guarded: ByteStream = Box::pin(guarded);
    SyncIoBridge::new(StreamReader::new(guarded.map_err(NodeError::into_io)))
}

fn join_error(err: tokio::task::JoinError) -> NodeError {
    NodeError::Io(std::io::Error::other(err))
}

fn open_archive(
    mut reader: impl Read,
    threshold: usize,
) -> NodeResult<ZipArchive<SpooledTempFile>> {
    let mut spool = SpooledTempFile::new(threshold);
    std::io::copy(&mut reader, &mut spool).map_err(NodeError::from_io)?;
    spool.seek(SeekFrom::Start(0))?;
    Ok(ZipArchive::new(spool)?)
}

fn entry_listing<R: Read + Seek>(archive: &mut ZipArchive<R>) -> NodeResult<Vec<EntryInfo>> {
    (0..archive.len())
        .map(|index| -> NodeResult<EntryInfo> {
            let entry = archive.by_index_raw(index)?;
            Ok(EntryInfo {
                name: entry.name().to_string(),
                is_dir: entry.is_dir(),
            })
        })
        .collect()
}

fn locate_entry(
    reader: impl Read,
    threshold: usize,
    target: &str,
    missing: String,
) -> NodeResult<(ZipArchive<SpooledTempFile>, usize)> {
    let mut archive = open_archive(reader, threshold)?;
    let entries = entry_listing(&mut archive)?;
    let index = find_entry(&entries, target).ok_or(NodeError::NotFound(missing))?;
    Ok((archive, index))
}

fn pump(mut entry: impl Read, chunks: &mpsc::Sender<NodeResult<Bytes>>) {
    let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
    loop {
        let item = match entry.read(&mut buf) {
            Ok(0) => return,
            Ok(n) => Ok(Bytes::copy_from_slice(&buf[..n])),
            Err(err) => Err(NodeError::from_io(err)),
        };
        let failed = item.is_err();
        if chunks.blocking_send(item).is_err() {
            debug!("Entry download receiver dropped, stopping reader");
            return;
        }
        if failed {
            return;
        }
    }
}

/// Strip leading slashes and use `/` as the separator.
fn normalize_entry_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Exact path match first, else the unique file entry with the same name.
fn find_entry(entries: &[EntryInfo], target: &str) -> Option<usize> {
    let files = || {
        entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_dir)
    };

    if let Some((index, _)) = files().find(|(_, entry)| normalize_entry_path(&entry.name) == target)
    {
        return Some(index);
    }

    let wanted = last_segment(target);
    let mut candidates =
        files().filter(|(_, entry)| last_segment(&normalize_entry_path(&entry.name)) == wanted);
    match (candidates.next(), candidates.next()) {
        (Some((index, _)), None) => Some(index),
        _ => None,
    }
}

fn validate_upload(files: &[AttachmentFile]) -> NodeResult<()> {
    if files.is_empty() {
        return Err(NodeError::InvalidUpload("no files uploaded".to_string()));
    }
    let mut seen = HashSet::new();
    for file in files {
        if file.name.trim().is_empty() {
            return Err(NodeError::InvalidUpload("file name must not be empty".to_string()));
        }
        if !seen.insert(file.name.as_str()) {
            return Err(NodeError::InvalidUpload(format!(
                "duplicate file name: {}",
                file.name
            )));
        }
    }
    Ok(())
}

fn is_archive(content: &[u8]) -> bool {
    ZipArchive::new(Cursor::new(content)).is_ok()
}

fn build_upload(
    mut files: Vec<AttachmentFile>,
    uploader: Option<String>,
) -> NodeResult<AttachmentUpload> {
    if files.len() == 1 && is_archive(&files[0].content) {
        let file = files.remove(0);
        return Ok(AttachmentUpload {
            filename: file.name.clone(),
            files: vec![file.name],
            data: file.content,
            uploader,
            saved_original: true,
        });
    }

    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for file in &files {
        writer.start_file(file.name.as_str(), options)?;
        writer.write_all(&file.content)?;
    }
    let data = writer.finish()?.into_inner();

    Ok(AttachmentUpload {
        data,
        filename: BUILT_ARCHIVE_NAME.to_string(),
        uploader,
        files: files.into_iter().map(|file| file.name).collect(),
        saved_original: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(names: &[&str]) -> Vec<EntryInfo> {
        names
            .iter()
            .map(|name| EntryInfo {
                name: name.to_string(),
                is_dir: name.ends_with('/'),
            })
            .collect()
    }

    #[test]
    fn test_find_entry_exact_path() {
        let listing = entries(&["docs/", "docs/readme.txt", "readme.txt"]);
        assert_eq!(find_entry(&listing, "docs/readme.txt"), Some(1));
        assert_eq!(find_entry(&listing, "readme.txt"), Some(2));
    }

    #[test]
    fn test_find_entry_by_unique_name() {
        let listing = entries(&["META-INF/", "META-INF/MANIFEST.MF", "a/b/c.txt"]);
        assert_eq!(find_entry(&listing, "MANIFEST.MF"), Some(1));
        assert_eq!(find_entry(&listing, "x/c.txt"), Some(2));
    }

    #[test]
    fn test_find_entry_ambiguous_or_missing() {
        let listing = entries(&["a/readme.txt", "b/readme.txt"]);
        assert_eq!(find_entry(&listing, "readme.txt"), None);
        assert_eq!(find_entry(&listing, "nothing.txt"), None);
    }

    #[test]
    fn test_find_entry_never_matches_directories() {
        let listing = entries(&["docs/"]);
        assert_eq!(find_entry(&listing, "docs/"), None);
        assert_eq!(find_entry(&listing, "docs"), None);
    }

    #[test]
    fn test_normalize_entry_path() {
        assert_eq!(normalize_entry_path("/a/b.txt"), "a/b.txt");
        assert_eq!(normalize_entry_path("a\\b.txt"), "a/b.txt");
        assert_eq!(last_segment("a/b.txt"), "b.txt");
        assert_eq!(last_segment("b.txt"), "b.txt");
    }

    #[test]
    fn test_pump_stops_when_receiver_dropped() {
        let (tx, mut rx) = mpsc::channel(1);
        // An endless entry: only the closed channel can end the pump.
        let reader = std::thread::spawn(move || pump(std::io::repeat(7), &tx));

        let first = rx.blocking_recv().unwrap().unwrap();
        assert_eq!(first.len(), STREAM_CHUNK_SIZE);
        drop(rx);

        reader.join().unwrap();
    }

    #[test]
    fn test_validate_upload() {
        assert!(matches!(
            validate_upload(&[]),
            Err(NodeError::InvalidUpload(_))
        ));
        assert!(validate_upload(&[AttachmentFile::new(" ", b"x".to_vec())]).is_err());
        assert!(
            validate_upload(&[
                AttachmentFile::new("a.txt", b"1".to_vec()),
                AttachmentFile::new("a.txt", b"2".to_vec()),
            ])
            .is_err()
        );
        assert!(validate_upload(&[AttachmentFile::new("a.txt", b"1".to_vec())]).is_ok());
    }

    #[test]
    fn test_build_upload_packs_plain_files() {
        let upload = build_upload(
            vec![
                AttachmentFile::new("test.txt", b"hello".to_vec()),
                AttachmentFile::new("test.png", vec![0x89, b'P', b'N', b'G']),
            ],
            Some("alice".to_string()),
        )
        .unwrap();

        assert!(!upload.saved_original);
        assert_eq!(upload.files, vec!["test.txt", "test.png"]);
        assert_eq!(upload.uploader.as_deref(), Some("alice"));

        let mut archive = ZipArchive::new(Cursor::new(upload.data)).unwrap();
        let names: Vec<_> = entry_listing(&mut archive)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["test.txt", "test.png"]);
    }

    #[test]
    fn test_build_upload_keeps_single_archive() {
        let packed = build_upload(vec![AttachmentFile::new("inner.txt", b"x".to_vec())], None)
            .unwrap()
            .data;
        let upload =
            build_upload(vec![AttachmentFile::new("test.jar", packed.clone())], None).unwrap();

        assert!(upload.saved_original);
        assert_eq!(upload.files, vec!["test.jar"]);
        assert_eq!(upload.filename, "test.jar");
        assert_eq!(upload.data, packed);
    }
}
