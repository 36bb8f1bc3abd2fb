//! Backend selection and one-shot failover between the two comment sources.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiError, Comment, LocalAdapter, Page, RemoteAdapter, Source};
use crate::notify::{ClipboardSink, Notification, Notifier};

/// Result of a top-level load. Failures have already been reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopLevelOutcome {
    Loaded {
        page: Page,
        source: Source,
        fell_back: bool,
    },
    Failed,
}

#[derive(Clone)]
pub struct FallbackCoordinator {
    local: LocalAdapter,
    remote: RemoteAdapter,
    notifier: Arc<dyn Notifier>,
    clipboard: Arc<dyn ClipboardSink>,
}

impl FallbackCoordinator {
    pub fn new(
        local: LocalAdapter,
        remote: RemoteAdapter,
        notifier: Arc<dyn Notifier>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        Self {
            local,
            remote,
            notifier,
            clipboard,
        }
    }

    /// Load a page of top-level comments from `preferred`.
    ///
    /// On failure the error is reported and, when `fallback_enabled`, the
    /// other backend is tried once from its first page: continuation tokens
    /// are not portable between backends.
    pub async fn load_top_level(
        &self,
        preferred: Source,
        fallback_enabled: bool,
        video_id: &str,
        token: Option<&str>,
    ) -> TopLevelOutcome {
        match self.fetch(preferred, video_id, token).await {
            Ok(page) => {
                info!(%preferred, count = page.comments.len(), "loaded comments");
                return TopLevelOutcome::Loaded {
                    page,
                    source: preferred,
                    fell_back: false,
                };
            }
            Err(err) => self.report(preferred, &err),
        }

        if !fallback_enabled {
            return TopLevelOutcome::Failed;
        }

        let other = preferred.other();
        info!(from = %preferred, to = %other, "falling back");
        self.notifier.notify(Notification::fallback(other));

        match self.fetch(other, video_id, None).await {
            Ok(page) => {
                info!(
                    source = %other,
                    count = page.comments.len(),
                    "loaded comments after fallback"
                );
                TopLevelOutcome::Loaded {
                    page,
                    source: other,
                    fell_back: true,
                }
            }
            Err(err) => {
                self.report(other, &err);
                TopLevelOutcome::Failed
            }
        }
    }

    /// Load the replies behind a remote comment's reply token. No fallback.
    pub async fn load_replies(&self, video_id: &str, reply_token: &str) -> Option<Vec<Comment>> {
        self.notifier.notify(Notification::fetching_replies());
        match self.remote.fetch_replies(video_id, reply_token).await {
            Ok(replies) => Some(replies),
            Err(err) => {
                self.report(Source::Remote, &err);
                None
            }
        }
    }

    async fn fetch(
        &self,
        source: Source,
        video_id: &str,
        token: Option<&str>,
    ) -> Result<Page, ApiError> {
        match source {
            Source::Local => self.local.fetch_top_level(video_id, token).await,
            Source::Remote => self.remote.fetch_top_level(video_id, token).await,
        }
    }

    fn report(&self, source: Source, err: &ApiError) {
        warn!(%source, error = %err.detail(), "backend request failed");
        self.notifier.notify(Notification::api_error(
            source,
            err,
            Arc::clone(&self.clipboard),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ProxyRequest;
    use crate::test_utils::{Harness, raw_local, remote_page_json};

    #[test]
    fn preferred_success_is_returned_unchanged() {
        let h = Harness::new();
        h.extractor.push_page(vec![raw_local("a")], "T1");

        let outcome = tokio_test::block_on(h.coordinator.load_top_level(
            Source::Local,
            true,
            "vid",
            Some("T0"),
        ));

        let TopLevelOutcome::Loaded {
            page,
            source,
            fell_back,
        } = outcome
        else {
            panic!("expected a page");
        };
        assert_eq!(page.next_token, "T1");
        assert_eq!(source, Source::Local);
        assert!(!fell_back);
        assert_eq!(
            h.extractor.calls(),
            vec![("vid".to_string(), Some("T0".to_string()))]
        );
        assert!(h.proxy.requests().is_empty());
        assert!(h.notifier.messages().is_empty());
    }

    #[test]
    fn local_failure_falls_back_to_remote_with_reset_token() {
        let h = Harness::new();
        h.extractor.push_error(ApiError::Extractor("blocked".into()));
        h.proxy.push_ok(remote_page_json(&["r1", "r2"], Some("C1")));

        let outcome = tokio_test::block_on(h.coordinator.load_top_level(
            Source::Local,
            true,
            "vid",
            Some("T5"),
        ));

        let TopLevelOutcome::Loaded {
            page,
            source,
            fell_back,
        } = outcome
        else {
            panic!("expected a loaded page");
        };
        assert_eq!(source, Source::Remote);
        assert!(fell_back);
        assert_eq!(page.comments.len(), 2);
        assert_eq!(h.proxy.requests(), vec![ProxyRequest::comments("vid", None)]);
        assert_eq!(
            h.notifier.messages(),
            vec![
                "Local API Error (Click to copy): blocked".to_string(),
                "Falling back to Remote API".to_string(),
            ]
        );
    }

    #[test]
    fn remote_failure_falls_back_to_local() {
        let h = Harness::new();
        h.proxy.push_err(ApiError::HttpStatus(503, "down".into()));
        h.extractor.push_page(vec![raw_local("a")], "");

        let outcome = tokio_test::block_on(h.coordinator.load_top_level(
            Source::Remote,
            true,
            "vid",
            Some("C9"),
        ));

        assert!(matches!(
            outcome,
            TopLevelOutcome::Loaded { source: Source::Local, fell_back: true, .. }
        ));
        assert_eq!(h.extractor.calls(), vec![("vid".to_string(), None)]);
    }

    #[test]
    fn disabled_fallback_only_reports() {
        let h = Harness::new();
        h.extractor.push_error(ApiError::Extractor("blocked".into()));

        let outcome =
            tokio_test::block_on(h.coordinator.load_top_level(Source::Local, false, "vid", None));

        assert_eq!(outcome, TopLevelOutcome::Failed);
        assert!(h.proxy.requests().is_empty());
        assert_eq!(h.notifier.messages().len(), 1);
    }

    #[test]
    fn both_failing_reports_twice_without_looping() {
        let h = Harness::new();
        h.extractor.push_error(ApiError::Extractor("blocked".into()));
        h.extractor.push_error(ApiError::Extractor("still blocked".into()));
        h.proxy.push_err(ApiError::Network("connection failed".into()));

        let outcome =
            tokio_test::block_on(h.coordinator.load_top_level(Source::Local, true, "vid", None));

        assert_eq!(outcome, TopLevelOutcome::Failed);
        assert_eq!(h.extractor.calls().len(), 1);
        assert_eq!(h.proxy.requests().len(), 1);
        assert_eq!(
            h.notifier.messages(),
            vec![
                "Local API Error (Click to copy): blocked".to_string(),
                "Falling back to Remote API".to_string(),
                "Remote API Error (Click to copy): connection failed".to_string(),
            ]
        );
    }

    #[test]
    fn error_notification_action_copies_detail() {
        let h = Harness::new();
        h.extractor.push_error(ApiError::Extractor("sign in to confirm".into()));

        tokio_test::block_on(h.coordinator.load_top_level(Source::Local, false, "vid", None));
        h.notifier.trigger(0);

        assert_eq!(h.clipboard.texts(), vec!["sign in to confirm".to_string()]);
    }

    #[test]
    fn replies_load_from_remote() {
        let h = Harness::new();
        h.proxy.push_ok(remote_page_json(&["r1"], None));

        let replies = tokio_test::block_on(h.coordinator.load_replies("vid", "R1")).unwrap();

        assert_eq!(replies.len(), 1);
        assert_eq!(
            h.proxy.requests(),
            vec![ProxyRequest::comments("vid", Some("R1"))]
        );
        assert_eq!(
            h.notifier.messages(),
            vec!["Getting comment replies, please wait".to_string()]
        );
    }

    #[test]
    fn reply_failure_is_reported_without_fallback() {
        let h = Harness::new();
        h.proxy.push_err(ApiError::HttpStatus(500, "oops".into()));

        let replies = tokio_test::block_on(h.coordinator.load_replies("vid", "R1"));

        assert!(replies.is_none());
        assert!(h.extractor.calls().is_empty());
        assert_eq!(h.notifier.messages().len(), 2);
    }
}
