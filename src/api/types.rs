use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which backend a comment (or a continuation token) came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Local,
    #[serde(alias = "invidious")]
    Remote,
}

impl Source {
    pub fn other(self) -> Self {
        match self {
            Source::Local => Source::Remote,
            Source::Remote => Source::Local,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Source::Local => "Local",
            Source::Remote => "Remote",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" | "invidious" => Ok(Self::Remote),
            _ => Err(format!("Invalid backend: {s}. Use 'local' or 'remote'")),
        }
    }
}

/// A comment from either backend, in one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author_name: String,
    pub author_id: String,
    pub author_thumbnail_url: String,
    pub text: String,
    pub like_count: u64,
    pub published_display: String,
    pub source: Source,
    pub replies_expanded: bool,
    pub replies: Vec<Comment>,
    pub reply_count: u64,
    pub reply_continuation_token: String,
}

impl Comment {
    /// Whether the reply affordance should be offered for this comment.
    ///
    /// Local comments carry their replies inline, so presence decides;
    /// remote comments only advertise a count until replies are fetched.
    pub fn has_replies(&self) -> bool {
        match self.source {
            Source::Local => !self.replies.is_empty(),
            Source::Remote => self.reply_count > 0,
        }
    }

    pub fn with_replies_expanded(&self, expanded: bool) -> Self {
        Self {
            replies_expanded: expanded,
            ..self.clone()
        }
    }

    pub fn with_replies(&self, replies: Vec<Comment>) -> Self {
        Self {
            replies_expanded: true,
            replies,
            ..self.clone()
        }
    }
}

/// One page of top-level comments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub comments: Vec<Comment>,
    pub next_token: String,
}

/// Raw comment as produced by one of the backends, tagged by origin.
#[derive(Debug, Clone)]
pub enum RawComment {
    Local(RawLocalComment),
    Remote(RawRemoteComment),
}

/// Success payload of the local extraction primitive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocalPage {
    #[serde(default)]
    pub comments: Vec<RawLocalComment>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLocalComment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_link: Option<String>,
    #[serde(default)]
    pub author_thumb: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub likes: Option<u64>,
    #[serde(default)]
    pub time: Option<String>,
    /// Replies the extractor returns inline with their parent.
    #[serde(default)]
    pub replies: Vec<RawLocalComment>,
}

/// Response body of the proxy's comments resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRemotePage {
    #[serde(default)]
    pub comments: Vec<RawRemoteComment>,
    #[serde(default)]
    pub continuation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRemoteComment {
    #[serde(default)]
    pub comment_id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
    #[serde(default)]
    pub author_thumbnails: Vec<RawThumbnail>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub published_text: Option<String>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub replies: Option<RawReplyDescriptor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawThumbnail {
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReplyDescriptor {
    #[serde(default)]
    pub reply_count: Option<u64>,
    #[serde(default)]
    pub continuation: Option<String>,
}
