//! Comment thread state for one video.
//!
//! Fetches run as spawned tasks and report back over a channel; results are
//! applied by [`ThreadManager::handle_event`], which discards anything tagged
//! with an older generation or arriving after teardown.

use std::fmt;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::{Comment, Source};
use crate::fallback::{FallbackCoordinator, TopLevelOutcome};
use crate::settings::ThreadSettings;

const EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadState {
    pub comments: Vec<Comment>,
    /// `None` until the first page has been requested.
    pub next_page_token: Option<String>,
    pub is_loading: bool,
    pub is_visible: bool,
}

impl ThreadState {
    /// False once a backend has answered with an empty continuation.
    pub fn has_more_pages(&self) -> bool {
        self.next_page_token
            .as_deref()
            .is_none_or(|token| !token.is_empty())
    }
}

/// A completed fetch, waiting to be applied.
#[derive(Debug)]
pub enum ThreadEvent {
    TopLevel {
        generation: u64,
        task_id: u64,
        outcome: TopLevelOutcome,
    },
    Replies {
        generation: u64,
        task_id: u64,
        index: usize,
        comment_id: String,
        replies: Option<Vec<Comment>>,
    },
}

/// What a reply toggle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyToggle {
    Expanded,
    Collapsed,
    /// A reply fetch was started; the comment expands when it succeeds.
    Fetching,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    IndexOutOfRange { index: usize, len: usize },
}

impl fmt::Display for ThreadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadError::IndexOutOfRange { index, len } => {
                write!(f, "comment index {index} out of range ({len} comments)")
            }
        }
    }
}

impl std::error::Error for ThreadError {}

#[derive(Debug)]
struct TaskInfo {
    id: u64,
    description: String,
    started_at: Instant,
}

pub struct ThreadManager {
    video_id: String,
    settings: ThreadSettings,
    coordinator: FallbackCoordinator,
    state: ThreadState,
    /// Backend that issued `next_page_token`.
    token_source: Option<Source>,
    generation: u64,
    alive: bool,
    cancel: CancellationToken,
    running: Vec<TaskInfo>,
    next_task_id: u64,
    event_tx: mpsc::Sender<ThreadEvent>,
    event_rx: mpsc::Receiver<ThreadEvent>,
}

impl ThreadManager {
    pub fn new(
        video_id: impl Into<String>,
        settings: ThreadSettings,
        coordinator: FallbackCoordinator,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        Self {
            video_id: video_id.into(),
            settings,
            coordinator,
            state: ThreadState::default(),
            token_source: None,
            generation: 0,
            alive: true,
            cancel: CancellationToken::new(),
            running: Vec::new(),
            next_task_id: 0,
            event_tx,
            event_rx,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn state(&self) -> &ThreadState {
        &self.state
    }

    pub fn comments(&self) -> &[Comment] {
        &self.state.comments
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn is_visible(&self) -> bool {
        self.state.is_visible
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.state.next_page_token.as_deref()
    }

    pub fn has_more_pages(&self) -> bool {
        self.state.has_more_pages()
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Number of fetches whose results have not been applied yet.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn in_flight(&self) -> usize {
        self.running.len()
    }

    /// Request the next page of top-level comments.
    ///
    /// Ignored (returns false) while a top-level fetch is already in flight
    /// or after teardown. Must be called within a tokio runtime.
    pub fn load_more_top_level(&mut self) -> bool {
        if self.state.is_loading || !self.alive {
            return false;
        }
        self.state.is_loading = true;

        let preferred = self.token_source.unwrap_or(self.settings.preference);
        let fallback_enabled = self.settings.fallback_enabled;
        let token = self.state.next_page_token.clone();
        let video_id = self.video_id.clone();
        let coordinator = self.coordinator.clone();
        let tx = self.event_tx.clone();
        let cancel = self.cancel.child_token();
        let generation = self.generation;
        let task_id = self.start_task(format!("Load comments for {video_id} from {preferred}"));

        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return,
                outcome = coordinator.load_top_level(
                    preferred,
                    fallback_enabled,
                    &video_id,
                    token.as_deref(),
                ) => outcome,
            };
            let _ = tx
                .send(ThreadEvent::TopLevel {
                    generation,
                    task_id,
                    outcome,
                })
                .await;
        });
        true
    }

    /// Show or hide the replies of the comment at `index`.
    ///
    /// Local comments, remote comments whose replies were already fetched and
    /// remote comments without a reply token just flip their expanded flag.
    /// A collapsed remote comment with a token and no replies starts a fetch.
    pub fn toggle_replies(&mut self, index: usize) -> Result<ReplyToggle, ThreadError> {
        let len = self.state.comments.len();
        debug_assert!(
            index < len,
            "toggle_replies: index {index} out of range ({len} comments)"
        );
        let Some(comment) = self.state.comments.get(index) else {
            return Err(ThreadError::IndexOutOfRange { index, len });
        };

        let needs_fetch = comment.source == Source::Remote
            && !comment.replies_expanded
            && comment.replies.is_empty()
            && !comment.reply_continuation_token.is_empty();

        if !needs_fetch {
            let expanded = !comment.replies_expanded;
            let updated = comment.with_replies_expanded(expanded);
            self.state.comments[index] = updated;
            return Ok(if expanded {
                ReplyToggle::Expanded
            } else {
                ReplyToggle::Collapsed
            });
        }

        let comment_id = comment.id.clone();
        let reply_token = comment.reply_continuation_token.clone();
        let video_id = self.video_id.clone();
        let coordinator = self.coordinator.clone();
        let tx = self.event_tx.clone();
        let cancel = self.cancel.child_token();
        let generation = self.generation;
        let task_id = self.start_task(format!("Load replies for comment {index}"));

        tokio::spawn(async move {
            let replies = tokio::select! {
                _ = cancel.cancelled() => return,
                replies = coordinator.load_replies(&video_id, &reply_token) => replies,
            };
            let _ = tx
                .send(ThreadEvent::Replies {
                    generation,
                    task_id,
                    index,
                    comment_id,
                    replies,
                })
                .await;
        });
        Ok(ReplyToggle::Fetching)
    }

    /// Toggle every collapsed comment that has replies. Returns how many were toggled.
    pub fn expand_all_replies(&mut self) -> usize {
        let targets: Vec<usize> = self
            .state
            .comments
            .iter()
            .enumerate()
            .filter(|(_, c)| c.has_replies() && !c.replies_expanded)
            .map(|(i, _)| i)
            .collect();
        for &index in &targets {
            let _ = self.toggle_replies(index);
        }
        targets.len()
    }

    /// Apply a completed fetch.
    pub fn handle_event(&mut self, event: ThreadEvent) {
        match event {
            ThreadEvent::TopLevel {
                generation,
                task_id,
                outcome,
            } => {
                if !self.is_current(generation) {
                    self.end_task(task_id, "discarded (stale)");
                    return;
                }
                match outcome {
                    TopLevelOutcome::Loaded {
                        page,
                        source,
                        fell_back,
                    } => {
                        self.end_task(task_id, "completed");
                        info!(
                            video_id = %self.video_id,
                            %source,
                            fell_back,
                            count = page.comments.len(),
                            "appending comments"
                        );
                        self.state.comments.extend(page.comments);
                        self.state.next_page_token = Some(page.next_token);
                        self.token_source = Some(source);
                        self.state.is_visible = true;
                    }
                    TopLevelOutcome::Failed => self.end_task(task_id, "failed"),
                }
                self.state.is_loading = false;
            }
            ThreadEvent::Replies {
                generation,
                task_id,
                index,
                comment_id,
                replies,
            } => {
                if !self.is_current(generation) {
                    self.end_task(task_id, "discarded (stale)");
                    return;
                }
                let Some(comment) = self
                    .state
                    .comments
                    .get(index)
                    .filter(|c| c.id == comment_id && c.source == Source::Remote)
                else {
                    self.end_task(task_id, "discarded (comment moved)");
                    return;
                };
                let (updated, outcome) = match replies {
                    Some(replies) => (comment.with_replies(replies), "completed"),
                    None => (comment.with_replies_expanded(false), "failed"),
                };
                self.end_task(task_id, outcome);
                self.state.comments[index] = updated;
            }
        }
    }

    /// Wait for the next completed fetch and apply it.
    ///
    /// Returns `None` when nothing is in flight.
    pub async fn next_event(&mut self) -> Option<()> {
        if self.running.is_empty() {
            return None;
        }
        let event = self.event_rx.recv().await?;
        self.handle_event(event);
        Some(())
    }

    /// Apply results until no fetch is in flight.
    pub async fn settle(&mut self) {
        while self.next_event().await.is_some() {}
    }

    /// Discard the thread. In-flight fetches are cancelled and any result
    /// that still arrives is ignored.
    pub fn teardown(&mut self) {
        if !self.alive {
            return;
        }
        debug!(video_id = %self.video_id, in_flight = self.running.len(), "tearing down thread");
        self.alive = false;
        self.generation += 1;
        self.cancel.cancel();
        self.running.clear();
    }

    fn is_current(&self, generation: u64) -> bool {
        self.alive && generation == self.generation
    }

    fn start_task(&mut self, description: String) -> u64 {
        let id = self.next_task_id;
        self.next_task_id += 1;
        debug!(task_id = id, "started: {description}");
        self.running.push(TaskInfo {
            id,
            description,
            started_at: Instant::now(),
        });
        id
    }

    fn end_task(&mut self, id: u64, outcome: &str) {
        if let Some(pos) = self.running.iter().position(|t| t.id == id) {
            let task = self.running.remove(pos);
            debug!(
                task_id = id,
                "{} {}: {:.2?}",
                task.description,
                outcome,
                task.started_at.elapsed()
            );
        } else {
            debug!(task_id = id, "untracked task {outcome}");
        }
    }
}

impl Drop for ThreadManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
