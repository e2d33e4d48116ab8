//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::SlotStore;
use super::{spawn_session_with_ids, SessionEvent, SessionHandle, SessionSnapshot};
use crate::llm::{IntentReply, IntentRequest, IntentService, TransportError, Usage};
use crate::session::{Event, Outcome, Session};
use crate::todo::SequentialIds;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};

// ============================================================================
// Mock Intent Client
// ============================================================================

/// Mock model client that returns queued replies
pub struct MockIntentClient {
    replies: Mutex<VecDeque<Result<IntentReply, TransportError>>>,
    model_id: String,
    /// Record of all requests made
    pub requests: Mutex<Vec<IntentRequest>>,
}

impl MockIntentClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply whose message content is `content`
    pub fn queue_reply(&self, content: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(IntentReply {
            content: content.into(),
            usage: Usage::default(),
        }));
    }

    /// Queue a transport failure
    pub fn queue_error(&self, error: TransportError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<IntentRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self) -> Result<IntentReply, TransportError> {
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock reply queued")))
    }
}

#[async_trait]
impl IntentService for MockIntentClient {
    async fn request_intent(&self, request: &IntentRequest) -> Result<IntentReply, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.next_reply()
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Mock model client that waits before answering (for in-flight testing)
pub struct DelayedMockIntentClient {
    inner: MockIntentClient,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockIntentClient {
    pub fn new(model_id: impl Into<String>, delay: Duration) -> Self {
        Self {
            inner: MockIntentClient::new(model_id),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, content: impl Into<String>) {
        self.inner.queue_reply(content);
    }

    pub fn recorded_requests(&self) -> Vec<IntentRequest> {
        self.inner.recorded_requests()
    }
}

#[async_trait]
impl IntentService for DelayedMockIntentClient {
    async fn request_intent(&self, request: &IntentRequest) -> Result<IntentReply, TransportError> {
        self.inner.requests.lock().unwrap().push(request.clone());
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

// ============================================================================
// In-Memory Slots
// ============================================================================

/// In-memory slot store for testing
#[derive(Default)]
pub struct InMemorySlots {
    values: Mutex<HashMap<String, String>>,
    /// Keys in the order they were written or cleared
    writes: Mutex<Vec<String>>,
    fail_reads: bool,
    fail_writes: bool,
}

impl InMemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a slot
    pub fn with_slot(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn recorded_writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SlotStore for InMemorySlots {
    async fn load_slot(&self, key: &str) -> Result<Option<String>, String> {
        if self.fail_reads {
            return Err(format!("read of {key} failed"));
        }
        Ok(self.value(key))
    }

    async fn save_slot(&self, key: &str, value: &str) -> Result<(), String> {
        if self.fail_writes {
            return Err(format!("write of {key} failed"));
        }
        self.writes.lock().unwrap().push(key.to_string());
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn clear_slot(&self, key: &str) -> Result<(), String> {
        if self.fail_writes {
            return Err(format!("clear of {key} failed"));
        }
        self.writes.lock().unwrap().push(format!("clear:{key}"));
        self.values.lock().unwrap().remove(key);
        Ok(())
    }
}

// ============================================================================
// Test Runtime Builder
// ============================================================================

/// Helper for building test runtimes with minimal boilerplate
pub struct TestRuntime<L: IntentService + 'static> {
    pub handle: SessionHandle,
    pub events: broadcast::Receiver<SessionEvent>,
    pub slots: Arc<InMemorySlots>,
    pub llm: Arc<L>,
}

impl TestRuntime<MockIntentClient> {
    /// Create a simple test runtime with an instant mock
    pub fn new() -> TestRuntimeBuilder<MockIntentClient> {
        TestRuntimeBuilder::new(MockIntentClient::new("test-model"))
    }
}

pub struct TestRuntimeBuilder<L> {
    llm: L,
    session: Session,
    slots: InMemorySlots,
}

impl<L: IntentService + 'static> TestRuntimeBuilder<L> {
    pub fn new(llm: L) -> Self {
        Self {
            llm,
            session: Session::default(),
            slots: InMemorySlots::new(),
        }
    }

    pub fn session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn slots(mut self, slots: InMemorySlots) -> Self {
        self.slots = slots;
        self
    }

    pub fn build(self) -> TestRuntime<L> {
        let slots = Arc::new(self.slots);
        let llm = Arc::new(self.llm);
        let handle = spawn_session_with_ids(
            self.session,
            slots.clone(),
            llm.clone(),
            Box::new(SequentialIds::new()),
        );
        let events = handle.subscribe();

        TestRuntime {
            handle,
            events,
            slots,
            llm,
        }
    }
}

impl<L: IntentService + 'static> TestRuntime<L> {
    pub async fn submit(&self, message: &str) {
        self.handle
            .send(Event::Submit {
                message: message.to_string(),
            })
            .await
            .expect("Failed to send message");
    }

    pub async fn send(&self, event: Event) {
        self.handle.send(event).await.expect("Failed to send event");
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.handle.snapshot()
    }

    /// Wait for the next event `pick` accepts
    async fn wait_for<T>(
        &mut self,
        timeout: Duration,
        mut pick: impl FnMut(SessionEvent) -> Option<T>,
    ) -> Option<T> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return None;
            }
            match tokio::time::timeout(remaining, self.events.recv()).await {
                Ok(Ok(event)) => {
                    if let Some(found) = pick(event) {
                        return Some(found);
                    }
                }
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => {}
                Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => return None,
            }
        }
    }

    pub async fn wait_for_outcome(&mut self, timeout: Duration) -> Option<Outcome> {
        self.wait_for(timeout, |event| match event {
            SessionEvent::Outcome(outcome) => Some(outcome),
            _ => None,
        })
        .await
    }

    pub async fn wait_for_cleared(&mut self, timeout: Duration) -> bool {
        self.wait_for(timeout, |event| matches!(event, SessionEvent::Cleared).then_some(()))
            .await
            .is_some()
    }

    pub async fn wait_for_error(&mut self, timeout: Duration) -> Option<String> {
        self.wait_for(timeout, |event| match event {
            SessionEvent::Error { message } => Some(message),
            _ => None,
        })
        .await
    }

    pub async fn wait_for_snapshot(&mut self, timeout: Duration) -> Option<SessionSnapshot> {
        self.wait_for(timeout, |event| match event {
            SessionEvent::Snapshot(snapshot) => Some(snapshot),
            _ => None,
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Intent;
    use crate::runtime::{load_session, CommandError, DatabaseSlots};
    use crate::session::TransitionError;
    use crate::store::{Database, CHAT_HISTORY_SLOT, TODOS_SLOT};
    use crate::todo::TodoCollection;
    use crate::transcript::{Transcript, MALFORMED_INTENT_REPLY, TRANSPORT_FAILURE_REPLY};

    const WAIT: Duration = Duration::from_secs(2);

    fn create(item: &str, response: &str) -> String {
        serde_json::json!({ "action": "create", "item": item, "response": response }).to_string()
    }

    #[tokio::test]
    async fn test_mock_intent_client() {
        let mock = MockIntentClient::new("test-model");
        mock.queue_reply("{}");

        let request = IntentRequest::new("hi", TodoCollection::new());
        assert_eq!(mock.request_intent(&request).await.unwrap().content, "{}");

        // Second call should fail (nothing queued)
        assert!(mock.request_intent(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    /// Integration test: the add-milk round-trip end to end
    #[tokio::test]
    async fn test_add_milk_round_trip() {
        let llm = MockIntentClient::new("test-model");
        llm.queue_reply(create("milk", "Added \"milk\" to your list"));

        let mut rt = TestRuntimeBuilder::new(llm).build();
        rt.submit("Add milk").await;

        let outcome = rt.wait_for_outcome(WAIT).await.expect("no outcome");
        match outcome {
            Outcome::Applied {
                action,
                collection_changed,
            } => {
                assert_eq!(action.intent, Intent::Create { item: "milk".into() });
                assert!(collection_changed);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let snapshot = rt.snapshot();
        assert!(!snapshot.busy);
        assert_eq!(snapshot.todos.len(), 1);
        assert_eq!(snapshot.todos.as_slice()[0].text, "milk");
        assert_eq!(
            snapshot.chat_history.rendered(),
            vec!["You: Add milk", "AI: Added \"milk\" to your list"]
        );

        // Request carried the message and the list as it was
        let requests = rt.llm.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].message, "Add milk");
        assert!(requests[0].todos.is_empty());

        // Both slots written, todos before the completing transcript write
        let todos: TodoCollection =
            serde_json::from_str(&rt.slots.value(TODOS_SLOT).unwrap()).unwrap();
        assert_eq!(todos, snapshot.todos);
        let history: Transcript =
            serde_json::from_str(&rt.slots.value(CHAT_HISTORY_SLOT).unwrap()).unwrap();
        assert_eq!(history, snapshot.chat_history);
        assert_eq!(
            rt.slots.recorded_writes(),
            vec![CHAT_HISTORY_SLOT, TODOS_SLOT, CHAT_HISTORY_SLOT]
        );
    }

    #[tokio::test]
    async fn test_malformed_reply_keeps_todos() {
        let llm = MockIntentClient::new("test-model");
        llm.queue_reply(r#"{"action":"archive","item":"milk","response":"Archived"}"#);
        let session = Session::hydrated(
            TodoCollection::new().with_created("1", "milk"),
            Transcript::new(),
        );

        let mut rt = TestRuntimeBuilder::new(llm).session(session).build();
        rt.submit("archive milk").await;

        let outcome = rt.wait_for_outcome(WAIT).await.expect("no outcome");
        assert!(matches!(outcome, Outcome::MalformedIntent { .. }));

        let snapshot = rt.snapshot();
        assert_eq!(snapshot.todos.len(), 1);
        assert_eq!(snapshot.chat_history.last().unwrap().text, MALFORMED_INTENT_REPLY);
        assert!(rt.slots.value(TODOS_SLOT).is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_reply() {
        let llm = MockIntentClient::new("test-model");
        llm.queue_error(TransportError::auth("Invalid API key"));

        let mut rt = TestRuntimeBuilder::new(llm).build();
        rt.submit("Add milk").await;

        let outcome = rt.wait_for_outcome(WAIT).await.expect("no outcome");
        match outcome {
            Outcome::TransportFailed { reason } => assert_eq!(reason, "Invalid API key"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let snapshot = rt.snapshot();
        assert!(!snapshot.busy);
        assert_eq!(
            snapshot.chat_history.rendered(),
            vec!["You: Add milk".to_string(), format!("AI: {TRANSPORT_FAILURE_REPLY}")]
        );
    }

    #[tokio::test]
    async fn test_submit_while_busy_is_rejected() {
        let llm = DelayedMockIntentClient::new("test-model", Duration::from_millis(200));
        llm.queue_reply(create("milk", "Added milk"));
        let started = llm.request_started.clone();

        let mut rt = TestRuntimeBuilder::new(llm).build();
        rt.submit("Add milk").await;
        started.notified().await;
        assert!(rt.snapshot().busy);

        rt.submit("Add eggs").await;
        let error = rt.wait_for_error(WAIT).await.expect("no busy error");
        assert!(error.contains("already in flight"));

        assert!(rt.wait_for_outcome(WAIT).await.is_some());
        assert_eq!(rt.llm.recorded_requests().len(), 1);
        assert_eq!(rt.snapshot().chat_history.len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_reports_busy() {
        let llm = DelayedMockIntentClient::new("test-model", Duration::from_millis(200));
        llm.queue_reply(create("milk", "Added milk"));

        let mut rt = TestRuntimeBuilder::new(llm).build();
        let submit = |message: &str| Event::Submit {
            message: message.to_string(),
        };

        rt.handle.dispatch(submit("Add milk")).await.unwrap();
        assert!(rt.snapshot().busy);

        let err = rt.handle.dispatch(submit("Add eggs")).await.unwrap_err();
        assert!(matches!(err, CommandError::Rejected(TransitionError::Busy)));

        assert!(rt.wait_for_outcome(WAIT).await.is_some());
        assert_eq!(
            rt.snapshot().chat_history.rendered(),
            vec!["You: Add milk", "AI: Added milk"]
        );
        assert_eq!(rt.llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_matches_stored_whitespace() {
        let llm = MockIntentClient::new("test-model");
        llm.queue_reply(r#"{"action":"toggle","item":" milk","response":"Done!"}"#);
        let slots = InMemorySlots::new()
            .with_slot(TODOS_SLOT, r#"[{"id":"1","text":" milk","completed":false}]"#);
        let session = load_session(&slots).await;

        let mut rt = TestRuntimeBuilder::new(llm)
            .session(session)
            .slots(slots)
            .build();
        rt.submit("I got the milk").await;

        let outcome = rt.wait_for_outcome(WAIT).await.expect("no outcome");
        assert!(matches!(
            outcome,
            Outcome::Applied {
                collection_changed: true,
                ..
            }
        ));
        let item = rt.snapshot().todos.find_by_id("1").cloned().unwrap();
        assert_eq!(item.text, " milk");
        assert!(item.completed);
    }

    #[tokio::test]
    async fn test_read_leaves_todos_slot_untouched() {
        let stored = r#"[{"id":"1","text":"milk","completed":false}]"#;
        let llm = MockIntentClient::new("test-model");
        llm.queue_reply(r#"{"action":"read","item":"milk","response":"Yes, it is"}"#);
        let slots = InMemorySlots::new().with_slot(TODOS_SLOT, stored);
        let session = load_session(&slots).await;

        let mut rt = TestRuntimeBuilder::new(llm)
            .session(session)
            .slots(slots)
            .build();
        rt.submit("Is milk on my list?").await;

        let outcome = rt.wait_for_outcome(WAIT).await.expect("no outcome");
        assert!(matches!(
            outcome,
            Outcome::Applied {
                collection_changed: false,
                ..
            }
        ));

        // Only the transcript is written, the todos slot keeps its bytes
        assert_eq!(
            rt.slots.recorded_writes(),
            vec![CHAT_HISTORY_SLOT, CHAT_HISTORY_SLOT]
        );
        assert_eq!(rt.slots.value(TODOS_SLOT).as_deref(), Some(stored));
        assert_eq!(rt.snapshot().todos.len(), 1);
    }

    #[tokio::test]
    async fn test_reply_after_reset_is_discarded() {
        let llm = DelayedMockIntentClient::new("test-model", Duration::from_millis(150));
        llm.queue_reply(create("stale", "Added stale"));
        llm.queue_reply(create("fresh", "Added fresh"));
        let started = llm.request_started.clone();

        let mut rt = TestRuntimeBuilder::new(llm).build();
        rt.submit("Add stale").await;
        started.notified().await;

        rt.send(Event::Reset { confirmed: true }).await;
        assert!(rt.wait_for_cleared(WAIT).await);
        let cleared = rt.snapshot();
        assert!(cleared.todos.is_empty());
        assert!(cleared.chat_history.is_empty());
        assert!(!cleared.busy);
        assert!(rt.slots.value(CHAT_HISTORY_SLOT).is_none());

        rt.submit("Add fresh").await;
        let outcome = rt.wait_for_outcome(WAIT).await.expect("no outcome");
        match outcome {
            Outcome::Applied { action, .. } => {
                // The first reply was consumed by the stale request and dropped
                assert_eq!(action.intent, Intent::Create { item: "fresh".into() });
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let snapshot = rt.snapshot();
        let texts: Vec<_> = snapshot.todos.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["fresh"]);
        assert_eq!(
            snapshot.chat_history.rendered(),
            vec!["You: Add fresh", "AI: Added fresh"]
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_reset_keeps_everything() {
        let session = Session::hydrated(
            TodoCollection::new().with_created("1", "milk"),
            Transcript::new(),
        );
        let mut rt = TestRuntime::new().session(session).build();
        rt.send(Event::Reset { confirmed: false }).await;
        assert!(!rt.wait_for_cleared(Duration::from_millis(100)).await);
        assert_eq!(rt.snapshot().todos.len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_item_persists() {
        let session = Session::hydrated(
            TodoCollection::new().with_created("1", "milk"),
            Transcript::new(),
        );
        let mut rt = TestRuntime::new().session(session).build();
        rt.send(Event::ToggleItem { id: "1".into() }).await;

        let snapshot = rt.wait_for_snapshot(WAIT).await.expect("no snapshot");
        assert!(snapshot.todos.find_by_id("1").unwrap().completed);
        assert!(snapshot.chat_history.is_empty());

        // The write happens right after the snapshot is published
        tokio::time::sleep(Duration::from_millis(50)).await;
        let stored: TodoCollection =
            serde_json::from_str(&rt.slots.value(TODOS_SLOT).unwrap()).unwrap();
        assert!(stored.find_by_id("1").unwrap().completed);
    }

    #[tokio::test]
    async fn test_write_failures_are_not_fatal() {
        let llm = MockIntentClient::new("test-model");
        llm.queue_reply(create("milk", "Added milk"));
        llm.queue_reply(create("eggs", "Added eggs"));

        let mut rt = TestRuntimeBuilder::new(llm)
            .slots(InMemorySlots::new().failing_writes())
            .build();
        rt.submit("Add milk").await;
        assert!(rt.wait_for_outcome(WAIT).await.is_some());
        rt.submit("Add eggs").await;
        assert!(rt.wait_for_outcome(WAIT).await.is_some());

        assert_eq!(rt.snapshot().todos.len(), 2);
        assert!(rt.slots.value(TODOS_SLOT).is_none());
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("todo-chat.db");

        {
            let slots = DatabaseSlots::new(Database::open(&path).unwrap());
            let llm = MockIntentClient::new("test-model");
            llm.queue_reply(create("milk", "Added milk"));
            let handle = spawn_session_with_ids(
                load_session(&slots).await,
                slots,
                llm,
                Box::new(SequentialIds::new()),
            );
            let mut events = handle.subscribe();
            handle
                .send(Event::Submit {
                    message: "Add milk".into(),
                })
                .await
                .unwrap();
            loop {
                let event = tokio::time::timeout(WAIT, events.recv()).await.unwrap().unwrap();
                if matches!(event, SessionEvent::Outcome(_)) {
                    break;
                }
            }
        }

        let slots = DatabaseSlots::new(Database::open(&path).unwrap());
        let session = load_session(&slots).await;
        assert!(!session.is_busy());
        assert_eq!(session.todos.len(), 1);
        assert_eq!(session.todos.as_slice()[0].id, "todo-1");
        assert_eq!(
            session.transcript.rendered(),
            vec!["You: Add milk", "AI: Added milk"]
        );
    }
}
