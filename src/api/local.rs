use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::process::Command;
use tracing::debug;

use super::error::ApiError;
use super::normalize::normalize;
use super::types::{Comment, Page, RawComment, RawLocalComment, RawLocalPage};

/// The local extraction primitive: one page of raw comments for a video.
pub trait LocalExtractor: Send + Sync {
    fn extract<'a>(
        &'a self,
        video_id: &'a str,
        continuation: Option<&'a str>,
    ) -> BoxFuture<'a, Result<RawLocalPage, ApiError>>;
}

/// Runs an external extractor program and reads a JSON page from its stdout.
///
/// Invoked as `<program> <args...> <video_id> [<continuation>]`.
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    /// Build from a command line; `None` if it is empty.
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl LocalExtractor for CommandExtractor {
    fn extract<'a>(
        &'a self,
        video_id: &'a str,
        continuation: Option<&'a str>,
    ) -> BoxFuture<'a, Result<RawLocalPage, ApiError>> {
        async move {
            let mut cmd = Command::new(&self.program);
            cmd.args(&self.args).arg(video_id).kill_on_drop(true);
            if let Some(token) = continuation {
                cmd.arg(token);
            }

            let output = cmd.output().await.map_err(|e| {
                ApiError::Extractor(format!("failed to run {}: {e}", self.program))
            })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                return Err(ApiError::Extractor(if stderr.is_empty() {
                    format!("{} exited with {}", self.program, output.status)
                } else {
                    stderr
                }));
            }

            let page: RawLocalPage = serde_json::from_slice(&output.stdout)?;
            Ok(page)
        }
        .boxed()
    }
}

/// Top-level comment loading through the local extractor.
///
/// There is no reply fetch: the extractor returns replies inline with
/// their parent, and they are attached to the parent here.
#[derive(Clone)]
pub struct LocalAdapter {
    extractor: Arc<dyn LocalExtractor>,
}

impl LocalAdapter {
    pub fn new(extractor: Arc<dyn LocalExtractor>) -> Self {
        Self { extractor }
    }

    pub async fn fetch_top_level(
        &self,
        video_id: &str,
        continuation: Option<&str>,
    ) -> Result<Page, ApiError> {
        let continuation = continuation.filter(|t| !t.is_empty());
        debug!(video_id, ?continuation, "local: fetching comments");

        let raw = self.extractor.extract(video_id, continuation).await?;
        let comments = raw
            .comments
            .into_iter()
            .map(with_inline_replies)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(video_id, count = comments.len(), "local: page received");
        Ok(Page {
            comments,
            next_token: raw.next_page_token.unwrap_or_default(),
        })
    }
}

fn with_inline_replies(mut raw: RawLocalComment) -> Result<Comment, ApiError> {
    let nested = std::mem::take(&mut raw.replies);
    let replies = nested
        .into_iter()
        .map(|reply| normalize(RawComment::Local(reply)))
        .collect::<Result<Vec<_>, _>>()?;
    let comment = normalize(RawComment::Local(raw))?;
    Ok(Comment { replies, ..comment })
}
