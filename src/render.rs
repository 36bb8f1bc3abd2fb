//! Plain-text rendering of a loaded thread.

use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::{Comment, Source};

const MIN_TEXT_WIDTH: usize = 10;

/// Render top-level comments, with expanded replies nested beneath them.
pub fn render_thread(comments: &[Comment], width: usize) -> String {
    let mut out = String::new();
    for comment in comments {
        push_comment(&mut out, comment, 0, width);
        if comment.replies_expanded {
            for reply in &comment.replies {
                push_comment(&mut out, reply, 1, width);
            }
        }
    }
    out
}

fn push_comment(out: &mut String, comment: &Comment, depth: usize, width: usize) {
    let marker = if depth > 0 { "  ├─ " } else { "" };
    let mut meta = format!(
        "{marker}{} · {} · {} likes",
        comment.author_name, comment.published_display, comment.like_count
    );
    if !comment.replies_expanded && comment.has_replies() {
        meta.push_str(&format!(" · {} replies", reply_total(comment)));
    }
    out.push_str(&truncate(&meta, width));
    out.push('\n');

    let indent = " ".repeat(depth * 4 + 2);
    let options = textwrap::Options::new(width.max(indent.len() + MIN_TEXT_WIDTH))
        .initial_indent(&indent)
        .subsequent_indent(&indent)
        .wrap_algorithm(textwrap::WrapAlgorithm::FirstFit);
    for line in textwrap::wrap(&comment.text, options) {
        out.push_str(&line);
        out.push('\n');
    }
    out.push('\n');
}

fn reply_total(comment: &Comment) -> u64 {
    match comment.source {
        Source::Local => comment.replies.len() as u64,
        Source::Remote => comment.reply_count,
    }
}

/// Cut `s` to at most `max` display columns, marking the cut with an ellipsis.
fn truncate(s: &str, max: usize) -> Cow<'_, str> {
    if s.width() <= max {
        return Cow::Borrowed(s);
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    Cow::Owned(out)
}
