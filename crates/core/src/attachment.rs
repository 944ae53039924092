//! Attachment upload and receipt types.

use crate::hash::AttachmentHash;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single file as received from a client upload.
#[derive(Clone, Debug)]
pub struct AttachmentFile {
    pub name: String,
    pub content: Vec<u8>,
    pub mime_type: Option<String>,
}

impl AttachmentFile {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// A finished archive ready to be handed to a node for storage.
#[derive(Clone, Debug)]
pub struct AttachmentUpload {
    /// Archive bytes (always a ZIP).
    pub data: Vec<u8>,
    /// Filename reported to the node.
    pub filename: String,
    pub uploader: Option<String>,
    /// Names of the files the client uploaded, in upload order.
    pub files: Vec<String>,
    /// Whether `data` is the client's own archive, stored verbatim.
    pub saved_original: bool,
}

/// Result of storing an attachment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentReceipt {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub hash: AttachmentHash,
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub saved_original: bool,
}

impl AttachmentReceipt {
    /// Build the receipt for an upload the node stored under `hash`.
    pub fn for_upload(upload: &AttachmentUpload, hash: AttachmentHash) -> Self {
        Self {
            date: OffsetDateTime::now_utc(),
            hash,
            files: upload.files.clone(),
            author: upload.uploader.clone(),
            saved_original: upload.saved_original,
        }
    }
}
