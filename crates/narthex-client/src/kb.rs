//! The knowledge-base summary watcher: check, trigger, poll.
//!
//! One watcher per viewed document. It first asks for an existing
//! summary; a 404 means "not yet ingested", so it triggers a non-forced
//! ingestion and then re-queries on a fixed interval until the summary
//! appears, the budget runs out, or the view is torn down. Terminal
//! outcomes carry distinct user-facing messages.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use narthex_core::config::KbConfig;

use crate::backend::KbBackend;
use crate::error::BackendError;
use crate::types::{KbFailureKind, KbSummaryState};

/// Shown when the polling budget ran out; the document itself still works.
pub const TIMED_OUT_MESSAGE: &str = "Still working. Open the original link or try again.";

/// Shown when the ingestion trigger was rejected.
pub const TRIGGER_FAILED_MESSAGE: &str =
    "Unable to process this document. It may be private or inaccessible.";

/// Shown for any other failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to load summary.";

/// Drives the summary lifecycle for one document.
pub struct KbSummaryWatcher {
    backend: Arc<dyn KbBackend>,
    resource_id: Uuid,
    source_url: String,
    poll_interval: Duration,
    max_wait: Duration,
    k: usize,
    state_tx: watch::Sender<KbSummaryState>,
    cancel: CancellationToken,
}

impl KbSummaryWatcher {
    /// Create a watcher and the receiver its states are published on.
    pub fn new(
        backend: Arc<dyn KbBackend>,
        resource_id: Uuid,
        source_url: &str,
        config: &KbConfig,
    ) -> (Self, watch::Receiver<KbSummaryState>) {
        let (state_tx, state_rx) = watch::channel(KbSummaryState::Checking);
        (
            Self {
                backend,
                resource_id,
                source_url: source_url.to_string(),
                poll_interval: Duration::from_millis(config.poll_interval_ms),
                max_wait: Duration::from_millis(config.max_wait_ms),
                k: config.default_k,
                state_tx,
                cancel: CancellationToken::new(),
            },
            state_rx,
        )
    }

    /// Token that stops the watcher when the document view closes.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the watcher on its own task.
    pub fn spawn(self) -> tokio::task::JoinHandle<KbSummaryState> {
        tokio::spawn(async move { self.run().await })
    }

    /// Run the check/trigger/poll cycle to a terminal state, or until
    /// cancelled. On cancellation the current (non-terminal) state is
    /// returned unchanged and no further requests are issued.
    pub async fn run(&self) -> KbSummaryState {
        self.set(KbSummaryState::Checking);

        // 1) Existing summary?
        match self.backend.query_summary(self.resource_id, self.k).await {
            Ok(response) if response.has_usable_summary() => {
                return self.set(KbSummaryState::Ready(response));
            }
            Ok(_) => {
                // 200 without usable content: nothing to poll for.
                return self.fail(KbFailureKind::Failed, GENERIC_FAILURE_MESSAGE, None);
            }
            Err(BackendError::NotIngested) => {}
            Err(e) => {
                return self.fail(
                    KbFailureKind::Failed,
                    GENERIC_FAILURE_MESSAGE,
                    Some(e.to_string()),
                );
            }
        }

        if self.cancel.is_cancelled() {
            return self.current();
        }

        // 2) Trigger a non-forced ingestion.
        if let Err(e) = self
            .backend
            .trigger_ingest(self.resource_id, &self.source_url, false)
            .await
        {
            warn!(resource_id = %self.resource_id, error = %e, "ingest trigger failed");
            let detail = match &e {
                BackendError::Upstream { body, .. } => Some(body.clone()),
                other => Some(other.to_string()),
            };
            return self.fail(KbFailureKind::TriggerFailed, TRIGGER_FAILED_MESSAGE, detail);
        }

        // 3) Poll until ready, budget measured from the start of polling.
        let start = Instant::now();
        while start.elapsed() < self.max_wait {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.cancel.cancelled() => {
                    debug!(resource_id = %self.resource_id, "summary watcher cancelled");
                    return self.current();
                }
            }

            match self.backend.query_summary(self.resource_id, self.k).await {
                Ok(response) if response.has_usable_summary() => {
                    return self.set(KbSummaryState::Ready(response));
                }
                Ok(_) => {
                    return self.fail(KbFailureKind::Failed, GENERIC_FAILURE_MESSAGE, None);
                }
                Err(BackendError::NotIngested) => continue,
                Err(e) => {
                    return self.fail(
                        KbFailureKind::Failed,
                        GENERIC_FAILURE_MESSAGE,
                        Some(e.to_string()),
                    );
                }
            }
        }

        self.fail(KbFailureKind::TimedOut, TIMED_OUT_MESSAGE, None)
    }

    fn set(&self, state: KbSummaryState) -> KbSummaryState {
        let _ = self.state_tx.send(state.clone());
        state
    }

    fn fail(
        &self,
        kind: KbFailureKind,
        message: &str,
        detail: Option<String>,
    ) -> KbSummaryState {
        self.set(KbSummaryState::Unavailable {
            kind,
            message: message.to_string(),
            detail,
        })
    }

    fn current(&self) -> KbSummaryState {
        self.state_tx.borrow().clone()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use narthex_kb::KbResponse;

    /// One scripted kb-query outcome.
    enum Step {
        Ready,
        EmptyOk,
        NotIngested,
        Error(u16),
    }

    struct ScriptedKb {
        steps: Mutex<VecDeque<Step>>,
        trigger_result: Option<BackendError>,
        queries: AtomicUsize,
        triggers: AtomicUsize,
        query_times: Mutex<Vec<Instant>>,
    }

    impl ScriptedKb {
        fn new(steps: Vec<Step>, trigger_result: Option<BackendError>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into_iter().collect()),
                trigger_result,
                queries: AtomicUsize::new(0),
                triggers: AtomicUsize::new(0),
                query_times: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> usize {
            self.queries.load(Ordering::SeqCst)
        }

        fn triggers(&self) -> usize {
            self.triggers.load(Ordering::SeqCst)
        }

        fn response(resource_id: Uuid) -> KbResponse {
            KbResponse {
                answer: None,
                summary: Some("A ready summary.".to_string()),
                key_points: vec![],
                chunks: vec![],
                resource_id,
                mode: "summary".to_string(),
            }
        }
    }

    #[async_trait]
    impl KbBackend for ScriptedKb {
        async fn query_summary(
            &self,
            resource_id: Uuid,
            _k: usize,
        ) -> Result<KbResponse, BackendError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.query_times.lock().unwrap().push(Instant::now());
            // The queue's tail repeats as NotIngested (endless 404s).
            match self.steps.lock().unwrap().pop_front() {
                Some(Step::Ready) => Ok(Self::response(resource_id)),
                Some(Step::EmptyOk) => Ok(KbResponse {
                    summary: None,
                    ..Self::response(resource_id)
                }),
                Some(Step::Error(status)) => Err(BackendError::Upstream {
                    status,
                    body: "boom".to_string(),
                }),
                Some(Step::NotIngested) | None => Err(BackendError::NotIngested),
            }
        }

        async fn trigger_ingest(
            &self,
            _resource_id: Uuid,
            _url: &str,
            _refresh: bool,
        ) -> Result<(), BackendError> {
            self.triggers.fetch_add(1, Ordering::SeqCst);
            match &self.trigger_result {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    const URL: &str = "https://docs.google.com/document/d/abc";

    fn config() -> KbConfig {
        KbConfig::default()
    }

    fn watcher(backend: Arc<ScriptedKb>) -> (KbSummaryWatcher, watch::Receiver<KbSummaryState>) {
        KbSummaryWatcher::new(backend, Uuid::new_v4(), URL, &config())
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_summary_is_ready_without_trigger() {
        let backend = ScriptedKb::new(vec![Step::Ready], None);
        let (watcher, rx) = watcher(backend.clone());

        let state = watcher.run().await;
        assert!(matches!(state, KbSummaryState::Ready(_)));
        assert!(matches!(&*rx.borrow(), KbSummaryState::Ready(_)));
        assert_eq!(backend.queries(), 1);
        assert_eq!(backend.triggers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_until_ready_with_expected_spacing() {
        // Check 404, then three 404 polls, then ready on the fourth poll.
        let backend = ScriptedKb::new(
            vec![
                Step::NotIngested,
                Step::NotIngested,
                Step::NotIngested,
                Step::NotIngested,
                Step::Ready,
            ],
            None,
        );
        let (watcher, _rx) = watcher(backend.clone());
        let t0 = Instant::now();

        let state = watcher.run().await;
        assert!(matches!(state, KbSummaryState::Ready(_)));

        // One check plus exactly four polls, and none after Ready.
        assert_eq!(backend.queries(), 5);
        assert_eq!(backend.triggers(), 1);

        // Polls were spaced at the configured 2.5s interval.
        let times = backend.query_times.lock().unwrap();
        let offsets: Vec<u64> = times
            .iter()
            .map(|t| t.duration_since(t0).as_millis() as u64)
            .collect();
        assert_eq!(offsets, vec![0, 2_500, 5_000, 7_500, 10_000]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_failure_is_terminal_with_body_captured() {
        let backend = ScriptedKb::new(
            vec![Step::NotIngested],
            Some(BackendError::Upstream {
                status: 403,
                body: "document is private".to_string(),
            }),
        );
        let (watcher, _rx) = watcher(backend.clone());

        let state = watcher.run().await;
        match state {
            KbSummaryState::Unavailable {
                kind,
                message,
                detail,
            } => {
                assert_eq!(kind, KbFailureKind::TriggerFailed);
                assert_eq!(message, TRIGGER_FAILED_MESSAGE);
                assert_eq!(detail.as_deref(), Some("document is private"));
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
        // No polls after a failed trigger.
        assert_eq!(backend.queries(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_budget_with_no_further_polls() {
        // Endless 404s.
        let backend = ScriptedKb::new(vec![], None);
        let (watcher, _rx) = watcher(backend.clone());

        let state = watcher.run().await;
        match &state {
            KbSummaryState::Unavailable { kind, message, .. } => {
                assert_eq!(*kind, KbFailureKind::TimedOut);
                assert_eq!(message, TIMED_OUT_MESSAGE);
            }
            other => panic!("expected timeout, got {:?}", other),
        }

        // 60s budget at 2.5s spacing: one check plus 24 polls.
        let after_run = backend.queries();
        assert_eq!(after_run, 25);

        // Nothing polls after the terminal state.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.queries(), after_run);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_404_poll_error_is_terminal_generic() {
        let backend = ScriptedKb::new(
            vec![Step::NotIngested, Step::NotIngested, Step::Error(500)],
            None,
        );
        let (watcher, _rx) = watcher(backend.clone());

        let state = watcher.run().await;
        match state {
            KbSummaryState::Unavailable { kind, message, .. } => {
                assert_eq!(kind, KbFailureKind::Failed);
                assert_eq!(message, GENERIC_FAILURE_MESSAGE);
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
        assert_eq!(backend.queries(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ok_without_usable_summary_is_terminal() {
        let backend = ScriptedKb::new(vec![Step::EmptyOk], None);
        let (watcher, _rx) = watcher(backend.clone());

        let state = watcher.run().await;
        assert!(matches!(
            state,
            KbSummaryState::Unavailable {
                kind: KbFailureKind::Failed,
                ..
            }
        ));
        assert_eq!(backend.triggers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_polling_without_terminal_state() {
        // Endless 404s; cancel mid-poll.
        let backend = ScriptedKb::new(vec![], None);
        let (watcher, rx) = watcher(backend.clone());
        let token = watcher.cancel_token();

        let canceller = async {
            tokio::time::sleep(Duration::from_millis(6_000)).await;
            token.cancel();
        };
        let (state, _) = tokio::join!(watcher.run(), canceller);

        // Not a terminal state; the view simply went away.
        assert_eq!(state, KbSummaryState::Checking);
        assert_eq!(*rx.borrow(), KbSummaryState::Checking);

        // Check at 0s plus polls at 2.5s and 5s, then nothing.
        let at_cancel = backend.queries();
        assert_eq!(at_cancel, 3);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.queries(), at_cancel);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchers_for_different_documents_are_independent() {
        let ready = ScriptedKb::new(vec![Step::Ready], None);
        let stuck = ScriptedKb::new(vec![], None);

        let (w1, _rx1) = watcher(ready.clone());
        let (w2, _rx2) = watcher(stuck.clone());

        let handle = w2.spawn();
        let state1 = w1.run().await;
        assert!(matches!(state1, KbSummaryState::Ready(_)));

        // The stuck watcher eventually times out on its own.
        let state2 = handle.await.unwrap();
        assert!(matches!(
            state2,
            KbSummaryState::Unavailable {
                kind: KbFailureKind::TimedOut,
                ..
            }
        ));
    }
}
