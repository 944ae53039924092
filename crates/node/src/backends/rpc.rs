//! Node backend speaking JSON over HTTP to a node-side RPC bridge.

use crate::error::{NodeError, NodeResult};
use crate::traits::{ByteStream, MembershipService, NodeService};
use async_trait::async_trait;
use futures::TryStreamExt;
use ledgerweb_core::{
    AttachmentHash, AttachmentReceipt, AttachmentUpload, HostAndPort, MembershipQuery,
    MembershipRequest, MembershipState, Party,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, instrument};

#[derive(Deserialize)]
struct TimeResponse {
    #[serde(with = "time::serde::rfc3339")]
    time: OffsetDateTime,
}

#[derive(Deserialize)]
struct VersionResponse {
    version: u32,
}

#[derive(Deserialize)]
struct SavedAttachmentResponse {
    hash: AttachmentHash,
}

/// RPC bridge client for one node.
#[derive(Clone)]
pub struct RpcNode {
    http: reqwest::Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl std::fmt::Debug for RpcNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcNode")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl RpcNode {
    pub fn new(
        url: &str,
        username: Option<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> NodeResult<Self> {
        let mut base = url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url =
            Url::parse(&base).map_err(|e| NodeError::Config(format!("invalid url {url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NodeError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            username,
            password,
        })
    }

    fn url(&self, path: &str) -> NodeResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| NodeError::Config(format!("invalid bridge path {path}: {e}")))
    }

    fn request(&self, method: Method, path: &str) -> NodeResult<RequestBuilder> {
        let request = self.http.request(method, self.url(path)?);
        Ok(match &self.username {
            Some(username) => request.basic_auth(username, self.password.as_ref()),
            None => request,
        })
    }

    async fn send(&self, request: RequestBuilder) -> NodeResult<Response> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        debug!(%status, %url, "RPC bridge returned an error status");
        Err(status_error(status, &url, body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> NodeResult<T> {
        let body = self
            .send(request)
            .await?
            .bytes()
            .await
            .map_err(transport_error)?;
        serde_json::from_slice(&body).map_err(|e| NodeError::Protocol(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> NodeResult<T> {
        self.send_json(self.request(Method::GET, path)?).await
    }
}

fn transport_error(err: reqwest::Error) -> NodeError {
    if err.is_decode() {
        NodeError::Protocol(err.to_string())
    } else {
        NodeError::RemoteUnavailable(err.to_string())
    }
}

fn status_error(status: StatusCode, url: &str, body: String) -> NodeError {
    let message = if body.is_empty() {
        url.to_string()
    } else {
        body
    };
    match status {
        StatusCode::NOT_FOUND => NodeError::NotFound(message),
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            NodeError::RemoteUnavailable(format!("{status}: {message}"))
        }
        other => NodeError::Remote {
            status: other.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl NodeService for RpcNode {
    async fn identity(&self) -> NodeResult<Party> {
        self.get_json("identity").await
    }

    async fn nodes(&self) -> NodeResult<Vec<Party>> {
        self.get_json("network/nodes").await
    }

    async fn notaries(&self) -> NodeResult<Vec<Party>> {
        self.get_json("network/notaries").await
    }

    async fn peers(&self) -> NodeResult<Vec<Party>> {
        self.get_json("network/peers").await
    }

    async fn identities(&self) -> NodeResult<Vec<Party>> {
        self.get_json("identities").await
    }

    async fn server_time(&self) -> NodeResult<OffsetDateTime> {
        let response: TimeResponse = self.get_json("time").await?;
        Ok(response.time)
    }

    async fn addresses(&self) -> NodeResult<Vec<HostAndPort>> {
        self.get_json("addresses").await
    }

    async fn platform_version(&self) -> NodeResult<u32> {
        let response: VersionResponse = self.get_json("platform-version").await?;
        Ok(response.version)
    }

    async fn flows(&self) -> NodeResult<Vec<String>> {
        self.get_json("flows").await
    }

    #[instrument(skip(self), fields(backend = "rpc", url = %self.base_url))]
    async fn refresh_network_map_cache(&self) -> NodeResult<()> {
        self.send(self.request(Method::POST, "network-map/refresh")?)
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(backend = "rpc"))]
    async fn open_attachment(&self, hash: &AttachmentHash) -> NodeResult<ByteStream> {
        let response = self
            .send(self.request(Method::GET, &format!("attachments/{hash}"))?)
            .await?;
        Ok(Box::pin(response.bytes_stream().map_err(transport_error)))
    }

    #[instrument(skip(self, upload), fields(backend = "rpc", filename = %upload.filename))]
    async fn save_attachment(&self, mut upload: AttachmentUpload) -> NodeResult<AttachmentReceipt> {
        let data = std::mem::take(&mut upload.data);
        let mut query = vec![("filename", upload.filename.clone())];
        if let Some(uploader) = &upload.uploader {
            query.push(("uploader", uploader.clone()));
        }
        let request = self
            .request(Method::POST, "attachments")?
            .query(&query)
            .header(reqwest::header::CONTENT_TYPE, "application/zip")
            .body(data);
        let saved: SavedAttachmentResponse = self.send_json(request).await?;
        Ok(AttachmentReceipt::for_upload(&upload, saved.hash))
    }

    fn backend_name(&self) -> &'static str {
        "rpc"
    }
}

#[async_trait]
impl MembershipService for RpcNode {
    async fn create_membership_request(
        &self,
        request: MembershipRequest,
    ) -> NodeResult<MembershipState> {
        self.send_json(self.request(Method::POST, "bnms/memberships")?.json(&request))
            .await
    }

    async fn amend_membership_request(
        &self,
        request: MembershipRequest,
    ) -> NodeResult<MembershipState> {
        self.send_json(self.request(Method::PUT, "bnms/memberships")?.json(&request))
            .await
    }

    async fn list_memberships(&self, query: MembershipQuery) -> NodeResult<Vec<MembershipState>> {
        self.send_json(self.request(Method::GET, "bnms/memberships")?.query(&query))
            .await
    }
}
