//! Conversion of raw backend comments into the unified [`Comment`].

use super::error::ApiError;
use super::types::{Comment, RawComment, RawLocalComment, RawRemoteComment, Source};

const AUTHOR_LINK_PREFIXES: [&str; 2] = ["/channel/", "/user/"];

/// Normalize a raw comment from either backend.
///
/// Never fails for local payloads. Remote payloads fail with
/// [`ApiError::MalformedPayload`] when the author thumbnail list has fewer
/// than two entries.
pub fn normalize(raw: RawComment) -> Result<Comment, ApiError> {
    match raw {
        RawComment::Local(raw) => Ok(normalize_local(raw)),
        RawComment::Remote(raw) => normalize_remote(raw),
    }
}

fn normalize_local(raw: RawLocalComment) -> Comment {
    let author_id = raw
        .author_link
        .as_deref()
        .map(strip_author_prefix)
        .unwrap_or_default()
        .to_string();

    Comment {
        id: raw.id.unwrap_or_default(),
        author_name: raw.author.unwrap_or_default(),
        author_id,
        author_thumbnail_url: raw.author_thumb.unwrap_or_default(),
        text: decode(raw.text),
        like_count: raw.likes.unwrap_or(0),
        published_display: raw.time.unwrap_or_default(),
        source: Source::Local,
        replies_expanded: false,
        replies: Vec::new(),
        reply_count: 0,
        reply_continuation_token: String::new(),
    }
}

fn normalize_remote(raw: RawRemoteComment) -> Result<Comment, ApiError> {
    let id = raw.comment_id.unwrap_or_default();

    // The second entry is the mid-size avatar.
    let Some(thumbnail) = raw.author_thumbnails.get(1) else {
        return Err(ApiError::MalformedPayload {
            comment_id: id,
            thumbnails: raw.author_thumbnails.len(),
        });
    };
    let author_thumbnail_url = thumbnail.url.clone();

    let (reply_count, reply_continuation_token) = match raw.replies {
        Some(descriptor) => match descriptor.reply_count {
            Some(count) => (count, descriptor.continuation.unwrap_or_default()),
            None => (0, String::new()),
        },
        None => (0, String::new()),
    };

    Ok(Comment {
        id,
        author_name: raw.author.unwrap_or_default(),
        author_id: raw.author_id.unwrap_or_default(),
        author_thumbnail_url,
        text: decode(raw.content),
        like_count: raw.like_count.unwrap_or(0),
        published_display: raw.published_text.unwrap_or_default(),
        source: Source::Remote,
        replies_expanded: false,
        replies: Vec::new(),
        reply_count,
        reply_continuation_token,
    })
}

fn strip_author_prefix(link: &str) -> &str {
    AUTHOR_LINK_PREFIXES
        .iter()
        .find_map(|prefix| link.strip_prefix(prefix))
        .unwrap_or(link)
}

fn decode(text: Option<String>) -> String {
    text.map(|t| html_escape::decode_html_entities(&t).to_string())
        .unwrap_or_default()
}
