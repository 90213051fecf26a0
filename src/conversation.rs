use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use rust_i18n::t;
use tokio::runtime::Handle;

use crate::common::{ChatError, ChatReply, EntryKind, SessionState, Transcript};
use crate::openai::ChatBackend;

/// Request/response lifecycle behind the input box.
///
/// All transcript and state changes happen on the thread that owns the
/// `Conversation` (the UI thread). Worker tasks only send a [`ChatReply`]
/// back over the channel; [`Conversation::poll`] applies it.
pub struct Conversation {
    backend: Option<Arc<dyn ChatBackend>>,
    fatal: Option<ChatError>,
    rt: Handle,
    state: SessionState,
    transcript: Transcript,
    tx: Sender<ChatReply>,
    rx: Receiver<ChatReply>,
}

impl Conversation {
    /// `session` is the outcome of loading the credential and building the
    /// client. A failure here is final for this process.
    pub fn new(rt: Handle, session: Result<Arc<dyn ChatBackend>, ChatError>) -> Self {
        let (tx, rx) = channel();
        let mut transcript = Transcript::default();

        let (backend, fatal, state) = match session {
            Ok(backend) => {
                log::info!("session ready, model {}", backend.model());
                transcript.push(EntryKind::Info,
                    t!("session_ready", model = backend.model()));
                (Some(backend), None, SessionState::Ready)
            }
            Err(err) => {
                log::error!("session could not start: {}", err);
                transcript.push(EntryKind::Error, err.to_string());
                (None, Some(err), SessionState::Uninitialized)
            }
        };

        Self { backend, fatal, rt, state, transcript, tx, rx }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn fatal_error(&self) -> Option<&ChatError> {
        self.fatal.as_ref()
    }

    pub fn model(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.model())
    }

    pub fn input_enabled(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Returns true when the text was accepted and a request dispatched.
    pub fn submit(&mut self, text: &str, ctx: &egui::Context) -> bool {
        if self.state != SessionState::Ready || text.trim().is_empty() {
            return false;
        }
        let Some(backend) = self.backend.clone() else {
            return false;
        };

        self.transcript.push(EntryKind::User, text);
        self.state = SessionState::AwaitingResponse;
        log::debug!("dispatching prompt ({} chars)", text.chars().count());

        let tx = self.tx.clone();
        let ctx = ctx.clone();
        let prompt = text.to_string();
        self.rt.spawn(async move {
            let reply = ChatReply::from(backend.complete(prompt).await);
            // the receiver is gone only when the app is shutting down
            let _ = tx.send(reply);
            ctx.request_repaint();
        });
        true
    }

    /// Applies finished replies. Call once per frame from the UI loop.
    /// Returns the number of replies applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(reply) = self.rx.try_recv() {
            if self.state != SessionState::AwaitingResponse {
                log::warn!("dropping reply that arrived while {:?}", self.state);
                continue;
            }
            match reply {
                ChatReply::Success(text) => {
                    log::info!("reply received ({} chars)", text.chars().count());
                    self.transcript.push(EntryKind::Assistant, text.trim());
                }
                ChatReply::Failure(reason) => {
                    log::warn!("request failed: {}", reason);
                    self.transcript.push(EntryKind::Error, reason);
                }
            }
            self.state = SessionState::Ready;
            applied += 1;
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    use futures_util::future::BoxFuture;
    use tokio::runtime::Runtime;

    use super::*;

    struct StubBackend {
        reply: Result<String, ChatError>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubBackend {
        fn new(reply: Result<String, ChatError>) -> Arc<Self> {
            Arc::new(Self { reply, prompts: Mutex::new(vec![]) })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl ChatBackend for StubBackend {
        fn model(&self) -> &str {
            "stub-model"
        }

        fn complete(&self, prompt: String) -> BoxFuture<'static, Result<String, ChatError>> {
            self.prompts.lock().unwrap().push(prompt);
            let reply = self.reply.clone();
            Box::pin(async move { reply })
        }
    }

    fn start(rt: &Runtime, backend: Arc<StubBackend>) -> Conversation {
        let backend: Arc<dyn ChatBackend> = backend;
        Conversation::new(rt.handle().clone(), Ok(backend))
    }

    // pump the channel the way the UI loop would until the reply lands
    fn settle(conv: &mut Conversation) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while conv.state() == SessionState::AwaitingResponse {
            conv.poll();
            assert!(Instant::now() < deadline, "reply never arrived");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn texts(conv: &Conversation) -> Vec<(EntryKind, String)> {
        conv.transcript().entries().iter()
            .map(|e| (e.kind, e.text.clone()))
            .collect()
    }

    #[test]
    fn test_ready_after_init() {
        let rt = Runtime::new().unwrap();
        let conv = start(&rt, StubBackend::new(Ok("x".into())));
        assert_eq!(conv.state(), SessionState::Ready);
        assert!(conv.input_enabled());
        assert!(conv.fatal_error().is_none());
        assert_eq!(conv.model(), Some("stub-model"));
        assert_eq!(conv.transcript().kinds(), vec![EntryKind::Info]);
    }

    #[test]
    fn test_welcome_shown_until_first_prompt() {
        let rt = Runtime::new().unwrap();
        let mut conv = start(&rt, StubBackend::new(Err(
            ChatError::RequestFailed("rate limited".into()))));
        let ctx = egui::Context::default();

        // the startup notice alone does not end the welcome
        assert_eq!(conv.transcript().len(), 1);
        assert!(conv.transcript().awaiting_first_prompt());

        // blank input sends nothing, so the welcome stays
        assert!(!conv.submit("   ", &ctx));
        assert!(conv.transcript().awaiting_first_prompt());

        assert!(conv.submit("capital of France?", &ctx));
        assert!(!conv.transcript().awaiting_first_prompt());

        // and it does not come back after a failed request
        settle(&mut conv);
        assert_eq!(conv.transcript().last().map(|e| e.kind),
            Some(EntryKind::Error));
        assert!(!conv.transcript().awaiting_first_prompt());
    }

    #[test]
    fn test_round_trip_success() {
        let rt = Runtime::new().unwrap();
        let backend = StubBackend::new(Ok("Paris".into()));
        let mut conv = start(&rt, backend.clone());
        let ctx = egui::Context::default();

        assert!(conv.submit("capital of France?", &ctx));
        assert_eq!(conv.state(), SessionState::AwaitingResponse);
        assert!(!conv.input_enabled());
        assert_eq!(conv.transcript().last().map(|e| e.kind),
            Some(EntryKind::User));

        settle(&mut conv);

        assert_eq!(conv.state(), SessionState::Ready);
        assert_eq!(&texts(&conv)[1..], &[
            (EntryKind::User, "capital of France?".to_string()),
            (EntryKind::Assistant, "Paris".to_string()),
        ]);
        assert_eq!(backend.prompts(), vec!["capital of France?".to_string()]);
    }

    #[test]
    fn test_reply_is_trimmed() {
        let rt = Runtime::new().unwrap();
        let mut conv = start(&rt, StubBackend::new(Ok("\n  Paris.  \n".into())));
        let ctx = egui::Context::default();

        conv.submit("capital of France?", &ctx);
        settle(&mut conv);

        assert_eq!(conv.transcript().last().map(|e| e.text.as_str()),
            Some("Paris."));
    }

    #[test]
    fn test_failure_is_recoverable() {
        let rt = Runtime::new().unwrap();
        let backend = StubBackend::new(
            Err(ChatError::RequestFailed("rate limited".into())));
        let mut conv = start(&rt, backend.clone());
        let ctx = egui::Context::default();

        assert!(conv.submit("hello", &ctx));
        settle(&mut conv);

        let entries = texts(&conv);
        assert_eq!(entries[1], (EntryKind::User, "hello".to_string()));
        assert_eq!(entries[2].0, EntryKind::Error);
        assert!(entries[2].1.contains("rate limited"));
        assert_eq!(entries.len(), 3);
        assert_eq!(conv.state(), SessionState::Ready);
        assert!(conv.fatal_error().is_none());

        // the next submission goes through as usual
        assert!(conv.submit("again", &ctx));
        settle(&mut conv);
        assert_eq!(backend.prompts().len(), 2);
        assert_eq!(conv.transcript().len(), 5);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let rt = Runtime::new().unwrap();
        let backend = StubBackend::new(Ok("x".into()));
        let mut conv = start(&rt, backend.clone());
        let ctx = egui::Context::default();

        for text in ["", " ", "\n\t  "] {
            assert!(!conv.submit(text, &ctx));
        }
        assert_eq!(conv.state(), SessionState::Ready);
        assert_eq!(conv.transcript().len(), 1);
        assert_eq!(conv.poll(), 0);
        assert!(backend.prompts().is_empty());
    }

    #[test]
    fn test_second_submit_rejected_while_waiting() {
        let rt = Runtime::new().unwrap();
        let backend = StubBackend::new(Ok("first answer".into()));
        let mut conv = start(&rt, backend.clone());
        let ctx = egui::Context::default();

        assert!(conv.submit("first", &ctx));
        // state only changes in poll(), so this is still AwaitingResponse
        assert!(!conv.submit("second", &ctx));
        settle(&mut conv);

        assert_eq!(conv.transcript().kinds(), vec![
            EntryKind::Info, EntryKind::User, EntryKind::Assistant]);
        assert_eq!(backend.prompts(), vec!["first".to_string()]);
    }

    #[test]
    fn test_each_request_carries_only_current_text() {
        let rt = Runtime::new().unwrap();
        let backend = StubBackend::new(Ok("ok".into()));
        let mut conv = start(&rt, backend.clone());
        let ctx = egui::Context::default();

        for prompt in ["one", "two", "three"] {
            assert!(conv.submit(prompt, &ctx));
            settle(&mut conv);
        }

        assert_eq!(backend.prompts(), vec!["one", "two", "three"]);
        let kinds = conv.transcript().kinds();
        assert_eq!(kinds.len(), 7);
        assert_eq!(kinds.iter().filter(|k| **k == EntryKind::User).count(), 3);
        assert_eq!(kinds.iter()
            .filter(|k| **k == EntryKind::Assistant).count(), 3);
    }

    #[test]
    fn test_missing_credential_disables_everything() {
        let rt = Runtime::new().unwrap();
        let mut conv = Conversation::new(rt.handle().clone(),
            Err(ChatError::MissingCredential("OPENAI_API_KEY".into())));
        let ctx = egui::Context::default();

        assert_eq!(conv.state(), SessionState::Uninitialized);
        assert!(!conv.input_enabled());
        assert!(conv.fatal_error().is_some_and(|e| e.is_fatal()));
        assert_eq!(conv.model(), None);
        assert_eq!(conv.transcript().kinds(), vec![EntryKind::Error]);
        assert!(conv.transcript().awaiting_first_prompt());

        assert!(!conv.submit("capital of France?", &ctx));
        assert_eq!(conv.poll(), 0);
        assert_eq!(conv.state(), SessionState::Uninitialized);
        assert_eq!(conv.transcript().len(), 1);
    }

    #[test]
    fn test_stray_reply_is_dropped() {
        let rt = Runtime::new().unwrap();
        let mut conv = start(&rt, StubBackend::new(Ok("x".into())));

        conv.tx.send(ChatReply::Success("unexpected".into())).unwrap();
        assert_eq!(conv.poll(), 0);
        assert_eq!(conv.state(), SessionState::Ready);
        assert_eq!(conv.transcript().len(), 1);
    }
}
