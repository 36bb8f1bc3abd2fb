use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::debug;

use super::error::ApiError;
use super::normalize::normalize;
use super::types::{Comment, Page, RawComment, RawRemoteComment, RawRemotePage};

/// Resources exposed by the proxy API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Comments,
}

impl Resource {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Resource::Comments => "comments",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub resource: Resource,
    pub id: String,
    pub continuation: Option<String>,
}

impl ProxyRequest {
    pub fn comments(id: &str, continuation: Option<&str>) -> Self {
        Self {
            resource: Resource::Comments,
            id: id.to_string(),
            continuation: continuation.filter(|t| !t.is_empty()).map(String::from),
        }
    }
}

/// The remote proxy client.
pub trait ProxyApi: Send + Sync {
    fn dispatch(
        &self,
        request: ProxyRequest,
    ) -> BoxFuture<'_, Result<serde_json::Value, ApiError>>;
}

/// Top-level and reply loading through the proxy API.
#[derive(Clone)]
pub struct RemoteAdapter {
    api: Arc<dyn ProxyApi>,
}

impl RemoteAdapter {
    pub fn new(api: Arc<dyn ProxyApi>) -> Self {
        Self { api }
    }

    pub async fn fetch_top_level(
        &self,
        video_id: &str,
        continuation: Option<&str>,
    ) -> Result<Page, ApiError> {
        debug!(video_id, ?continuation, "remote: fetching comments");
        let raw = self.fetch_raw(video_id, continuation).await?;
        let comments = normalize_all(raw.comments)?;

        debug!(video_id, count = comments.len(), "remote: page received");
        Ok(Page {
            comments,
            next_token: raw.continuation.unwrap_or_default(),
        })
    }

    /// Fetch the replies behind a comment's reply token.
    ///
    /// Only the first page is fetched; the proxy's continuation for further
    /// reply pages is ignored. An empty token has no replies behind it.
    pub async fn fetch_replies(
        &self,
        video_id: &str,
        reply_token: &str,
    ) -> Result<Vec<Comment>, ApiError> {
        if reply_token.is_empty() {
            return Ok(Vec::new());
        }
        debug!(video_id, reply_token, "remote: fetching replies");
        let raw = self.fetch_raw(video_id, Some(reply_token)).await?;
        let replies = normalize_all(raw.comments)?
            .into_iter()
            .map(|reply| Comment {
                reply_count: 0,
                reply_continuation_token: String::new(),
                replies: Vec::new(),
                ..reply
            })
            .collect();
        Ok(replies)
    }

    async fn fetch_raw(
        &self,
        video_id: &str,
        continuation: Option<&str>,
    ) -> Result<RawRemotePage, ApiError> {
        let value = self
            .api
            .dispatch(ProxyRequest::comments(video_id, continuation))
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}

fn normalize_all(raw: Vec<RawRemoteComment>) -> Result<Vec<Comment>, ApiError> {
    raw.into_iter()
        .map(|c| normalize(RawComment::Remote(c)))
        .collect()
}
