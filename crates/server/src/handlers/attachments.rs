//! Attachment downloads, entry extraction and uploads.

use super::common::{RequestedNode, call_node, node_service};
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;
use axum::Json;
use axum::body::Body;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, OriginalUri, Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use ledgerweb_core::{AttachmentFile, AttachmentHash};
use ledgerweb_node::ArchiveDownload;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use tracing::{debug, info};

/// Sub-path that lists entry names instead of extracting an entry.
pub const PATHS_SEGMENT: &str = "paths";

/// RFC 5987 `attr-char`s that need no encoding in `filename*`.
const FILENAME_ATTR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

#[derive(Debug, Deserialize)]
pub struct AttachmentParams {
    hash: String,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentEntryParams {
    hash: String,
    sub_path: String,
}

/// GET /api/node/attachments/{hash}
pub async fn download_attachment(
    State(state): State<AppState>,
    node: RequestedNode,
    Path(params): Path<AttachmentParams>,
) -> ApiResult<Response> {
    let hash: AttachmentHash = params.hash.parse()?;
    let (name, service) = node_service(&state, &node)?;
    let download = call_node(
        &name,
        "open_attachment",
        state.archives.open_whole(service.as_ref(), &hash),
    )
    .await?;
    metrics::ATTACHMENT_DOWNLOADS
        .with_label_values(&["archive"])
        .inc();
    download_response(download)
}

/// GET /api/node/attachments/{hash}/{*sub_path}
///
/// `paths` lists the archive's entry names; any other sub-path streams the
/// matching entry.
pub async fn attachment_entry(
    State(state): State<AppState>,
    node: RequestedNode,
    Path(params): Path<AttachmentEntryParams>,
) -> ApiResult<Response> {
    let hash: AttachmentHash = params.hash.parse()?;
    let (name, service) = node_service(&state, &node)?;

    if params.sub_path.trim_start_matches('/') == PATHS_SEGMENT {
        let names = call_node(
            &name,
            "list_attachment_entries",
            state.archives.list_entries(service.as_ref(), &hash),
        )
        .await?;
        metrics::ATTACHMENT_DOWNLOADS
            .with_label_values(&["paths"])
            .inc();
        return Ok(Json(names).into_response());
    }

    let download = call_node(
        &name,
        "open_attachment_entry",
        state
            .archives
            .open_entry(service.as_ref(), &hash, &params.sub_path),
    )
    .await?;
    metrics::ATTACHMENT_DOWNLOADS
        .with_label_values(&["entry"])
        .inc();
    download_response(download)
}

/// POST /api/node/attachments
///
/// Multipart body with one or more `file` parts and an optional `uploader`
/// text part.
pub async fn upload_attachment(
    State(state): State<AppState>,
    node: RequestedNode,
    OriginalUri(uri): OriginalUri,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Response> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (name, service) = node_service(&state, &node)?;

    let mut files = Vec::new();
    let mut uploader = None;
    let mut total_bytes = 0u64;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mime_type = field.content_type().map(str::to_string);
                let content = field.bytes().await.map_err(multipart_error)?;
                total_bytes += content.len() as u64;

                let mut file = AttachmentFile::new(filename, content.to_vec());
                if let Some(mime_type) = mime_type {
                    file = file.with_mime_type(mime_type);
                }
                files.push(file);
            }
            Some("uploader") => {
                let text = field.text().await.map_err(multipart_error)?;
                let text = text.trim();
                if !text.is_empty() {
                    uploader = Some(text.to_string());
                }
            }
            other => debug!(field = ?other, "Ignoring multipart field"),
        }
    }

    let receipt = call_node(
        &name,
        "save_attachment",
        state.archives.save(service.as_ref(), files, uploader),
    )
    .await?;
    metrics::ATTACHMENTS_UPLOADED.inc();
    metrics::ATTACHMENT_BYTES_UPLOADED.inc_by(total_bytes);
    info!(
        node = %name,
        hash = %receipt.hash,
        files = receipt.files.len(),
        saved_original = receipt.saved_original,
        "Attachment uploaded"
    );

    let location = format!("{}/{}", uri.path().trim_end_matches('/'), receipt.hash);
    let location = HeaderValue::from_str(&location)
        .map_err(|e| ApiError::Internal(format!("invalid location header: {e}")))?;
    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(receipt)).into_response())
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

fn download_response(download: ArchiveDownload) -> ApiResult<Response> {
    let disposition = HeaderValue::from_str(&content_disposition(&download.filename))
        .map_err(|e| ApiError::Internal(format!("invalid content disposition: {e}")))?;

    let mut response = (
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
            (CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(download.stream),
    )
        .into_response();
    if let Some(length) = download.content_length {
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(length));
    }
    Ok(response)
}

/// `attachment` disposition with an ASCII `filename` and, when that had to
/// replace characters, the exact UTF-8 name as `filename*`.
fn content_disposition(name: &str) -> String {
    let fallback = header_safe_filename(name);
    if fallback == name {
        return format!("attachment; filename=\"{fallback}\"");
    }
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        utf8_percent_encode(name, FILENAME_ATTR)
    )
}

/// Replace characters that cannot appear inside a quoted header filename.
fn header_safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
