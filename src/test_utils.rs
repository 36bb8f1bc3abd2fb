//! Test builders and in-memory collaborators.

use std::collections::VecDeque;
use std::ops::Range;
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use crate::api::{
    ApiError, Comment, LocalAdapter, LocalExtractor, ProxyApi, ProxyRequest, RawLocalComment,
    RawLocalPage, RemoteAdapter, Source,
};
use crate::fallback::FallbackCoordinator;
use crate::notify::{ClipboardSink, Notification, Notifier};
use crate::settings::ThreadSettings;
use crate::thread::ThreadManager;

pub struct CommentBuilder {
    id: String,
    author: String,
    text: String,
    likes: u64,
    source: Source,
    replies: Vec<Comment>,
    reply_count: u64,
    reply_token: String,
}

impl Default for CommentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl CommentBuilder {
    pub fn new() -> Self {
        Self {
            id: "c1".to_string(),
            author: "commenter".to_string(),
            text: "Test comment".to_string(),
            likes: 0,
            source: Source::Local,
            replies: vec![],
            reply_count: 0,
            reply_token: String::new(),
        }
    }

    pub fn id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn likes(mut self, likes: u64) -> Self {
        self.likes = likes;
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    pub fn replies(mut self, replies: Vec<Comment>) -> Self {
        self.replies = replies;
        self
    }

    pub fn reply_count(mut self, count: u64) -> Self {
        self.reply_count = count;
        self
    }

    pub fn reply_token(mut self, token: &str) -> Self {
        self.reply_token = token.to_string();
        self
    }

    pub fn build(self) -> Comment {
        Comment {
            id: self.id,
            author_name: self.author,
            author_id: "UCtest".to_string(),
            author_thumbnail_url: "https://img/test.jpg".to_string(),
            text: self.text,
            like_count: self.likes,
            published_display: "1 day ago".to_string(),
            source: self.source,
            replies_expanded: false,
            replies: self.replies,
            reply_count: self.reply_count,
            reply_continuation_token: self.reply_token,
        }
    }
}

pub fn raw_local(id: &str) -> RawLocalComment {
    RawLocalComment {
        id: Some(id.to_string()),
        author: Some(format!("author-{id}")),
        author_link: Some(format!("/channel/UC{id}")),
        author_thumb: Some("https://img/a.jpg".to_string()),
        text: Some(format!("comment {id}")),
        likes: Some(1),
        time: Some("1 day ago".to_string()),
        replies: vec![],
    }
}

/// A local page with comments `c{start}..c{end}`.
pub fn raw_local_page(ids: Range<usize>, next: &str) -> RawLocalPage {
    RawLocalPage {
        comments: ids.map(|i| raw_local(&format!("c{i}"))).collect(),
        next_page_token: Some(next.to_string()),
    }
}

pub fn remote_page_json(ids: &[&str], continuation: Option<&str>) -> Value {
    let comments: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "commentId": id,
                "author": format!("author-{id}"),
                "authorId": format!("UC{id}"),
                "authorThumbnails": [
                    {"url": "https://img/s.jpg"},
                    {"url": "https://img/m.jpg"}
                ],
                "content": format!("comment {id}"),
                "publishedText": "1 day ago",
                "likeCount": 1
            })
        })
        .collect();
    let mut page = json!({ "comments": comments });
    if let Some(token) = continuation {
        page["continuation"] = json!(token);
    }
    page
}

/// Scripted local extractor. Responses are served in push order; an
/// optional gate holds every call until [`MockExtractor::release`].
#[derive(Default)]
pub struct MockExtractor {
    responses: Mutex<VecDeque<Result<RawLocalPage, ApiError>>>,
    calls: Mutex<Vec<(String, Option<String>)>>,
    gate: Option<Semaphore>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn push(&self, page: RawLocalPage) {
        self.responses.lock().unwrap().push_back(Ok(page));
    }

    pub fn push_page(&self, comments: Vec<RawLocalComment>, next: &str) {
        self.push(RawLocalPage {
            comments,
            next_page_token: Some(next.to_string()),
        });
    }

    pub fn push_error(&self, err: ApiError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn release(&self, calls: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(calls);
        }
    }

    pub fn calls(&self) -> Vec<(String, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl LocalExtractor for MockExtractor {
    fn extract<'a>(
        &'a self,
        video_id: &'a str,
        continuation: Option<&'a str>,
    ) -> BoxFuture<'a, Result<RawLocalPage, ApiError>> {
        self.calls
            .lock()
            .unwrap()
            .push((video_id.to_string(), continuation.map(String::from)));
        let response = self.responses.lock().unwrap().pop_front();
        async move {
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            response.unwrap_or_else(|| Err(ApiError::Extractor("no response queued".into())))
        }
        .boxed()
    }
}

/// Scripted proxy API that records every request.
#[derive(Default)]
pub struct MockProxy {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    requests: Mutex<Vec<ProxyRequest>>,
}

impl MockProxy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, body: Value) {
        self.responses.lock().unwrap().push_back(Ok(body));
    }

    pub fn push_err(&self, err: ApiError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<ProxyRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ProxyApi for MockProxy {
    fn dispatch(&self, request: ProxyRequest) -> BoxFuture<'_, Result<Value, ApiError>> {
        self.requests.lock().unwrap().push(request);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no response queued".into())));
        futures::future::ready(response).boxed()
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    /// Run the action of the `index`th notification, as a click would.
    pub fn trigger(&self, index: usize) {
        self.received.lock().unwrap()[index].trigger();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.received.lock().unwrap().push(notification);
    }
}

#[derive(Default)]
pub struct RecordingClipboard {
    texts: Mutex<Vec<String>>,
}

impl RecordingClipboard {
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

impl ClipboardSink for RecordingClipboard {
    fn write_text(&self, text: &str) {
        self.texts.lock().unwrap().push(text.to_string());
    }
}

/// Mocks wired into a real coordinator.
pub struct Harness {
    pub extractor: Arc<MockExtractor>,
    pub proxy: Arc<MockProxy>,
    pub notifier: Arc<RecordingNotifier>,
    pub clipboard: Arc<RecordingClipboard>,
    pub coordinator: FallbackCoordinator,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_extractor(MockExtractor::new())
    }

    /// Local extraction calls block until released.
    pub fn gated() -> Self {
        Self::with_extractor(MockExtractor::gated())
    }

    fn with_extractor(extractor: MockExtractor) -> Self {
        let extractor = Arc::new(extractor);
        let proxy = Arc::new(MockProxy::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let clipboard = Arc::new(RecordingClipboard::default());
        let coordinator = FallbackCoordinator::new(
            LocalAdapter::new(extractor.clone()),
            RemoteAdapter::new(proxy.clone()),
            notifier.clone(),
            clipboard.clone(),
        );
        Self {
            extractor,
            proxy,
            notifier,
            clipboard,
            coordinator,
        }
    }

    pub fn manager(&self, video_id: &str, settings: ThreadSettings) -> ThreadManager {
        ThreadManager::new(video_id, settings, self.coordinator.clone())
    }
}
