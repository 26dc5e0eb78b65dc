//! Streaming chat client.
//!
//! [`ChatSession`] is the pure state machine (`Idle -> Sending -> Streaming ->
//! Idle`, with every failure returning to `Idle`). [`ChatController`] drives
//! it from the network: it opens the event stream, feeds bytes through the
//! [`SseDecoder`], and hands the session to a render callback after each
//! visible change.

use std::pin::pin;
use std::time::Duration;

use futures::StreamExt;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::Config;
use crate::format::{format_message, FormattedMessage};
use crate::models::{ChatRequest, ChatTurn, StreamEvent};
use crate::sse::SseDecoder;
use crate::{Error, Result};

/// Example prompts offered the first time the panel opens.
pub const SUGGESTIONS: &[&str] = &[
    "Which carpet tiles have the highest recycled content?",
    "Show me acoustic ceiling panels with Declare labels",
    "Compare low-carbon flooring options",
    "What insulation products have published carbon data?",
];

const STREAM_ERROR_FALLBACK: &str = "The assistant could not complete the response.";
const INCOMPLETE_STREAM: &str = "The response ended before it was complete.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Idle,
    /// Request sent, waiting for the first byte
    Sending,
    Streaming,
}

/// One entry of the visible transcript.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEntry {
    User(String),
    Assistant {
        text: String,
        formatted: FormattedMessage,
    },
    /// Synthetic assistant turn with example prompts; never sent to the backend
    Suggestions(Vec<String>),
    Error(String),
}

/// What handling a stream event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStep {
    /// Keep reading; the partial buffer may have changed
    Continue,
    /// `done` arrived and the reply was committed
    Completed,
    /// `error` arrived; nothing was committed
    Failed(String),
}

/// Render model for the chat panel.
#[derive(Debug, Clone)]
pub struct ChatView<'a> {
    pub entries: &'a [ChatEntry],
    pub typing: bool,
    pub partial: Option<&'a str>,
    pub input_enabled: bool,
}

/// Conversation state for one page session.
#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    history: Vec<ChatTurn>,
    transcript: Vec<ChatEntry>,
    phase: ChatPhase,
    buffer: String,
    history_window: usize,
    panel_opened: bool,
    suggestions_shown: bool,
}

impl ChatSession {
    pub fn new(history_window: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            history: Vec::new(),
            transcript: Vec::new(),
            phase: ChatPhase::Idle,
            buffer: String::new(),
            history_window,
            panel_opened: false,
            suggestions_shown: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> ChatPhase {
        self.phase
    }

    pub fn is_processing(&self) -> bool {
        self.phase != ChatPhase::Idle
    }

    /// Full conversation history, kept client-side for display.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    /// Accept a user message and build the request for it.
    ///
    /// Returns `None` (and changes nothing) for blank input or while another
    /// message is in flight.
    pub fn begin(&mut self, text: &str) -> Option<ChatRequest> {
        let text = text.trim();
        if text.is_empty() || self.is_processing() {
            return None;
        }

        self.history.push(ChatTurn::user(text));
        self.transcript.push(ChatEntry::User(text.to_string()));
        self.buffer.clear();
        self.phase = ChatPhase::Sending;

        let skip = self.history.len().saturating_sub(self.history_window);
        Some(ChatRequest {
            query: text.to_string(),
            history: self.history[skip..].to_vec(),
        })
    }

    /// First byte of the response arrived; drop the typing placeholder.
    pub fn stream_opened(&mut self) {
        if self.phase == ChatPhase::Sending {
            self.phase = ChatPhase::Streaming;
        }
    }

    pub fn apply(&mut self, event: StreamEvent) -> StreamStep {
        match event {
            StreamEvent::Start => StreamStep::Continue,
            StreamEvent::Content { text } => {
                self.stream_opened();
                self.buffer.push_str(&text);
                StreamStep::Continue
            }
            StreamEvent::Error { message } => {
                if message.trim().is_empty() {
                    StreamStep::Failed(STREAM_ERROR_FALLBACK.to_string())
                } else {
                    StreamStep::Failed(message)
                }
            }
            StreamEvent::Done => {
                self.commit();
                StreamStep::Completed
            }
        }
    }

    /// Abandon the in-flight message, surfacing an error turn. History is not
    /// touched beyond the user's own turn.
    pub fn fail(&mut self, error: &Error) {
        self.buffer.clear();
        self.phase = ChatPhase::Idle;
        self.transcript.push(ChatEntry::Error(error.user_message()));
    }

    /// Mark the panel opened. True only the first time, when suggestions
    /// should be scheduled.
    pub fn open_panel(&mut self) -> bool {
        if self.panel_opened {
            return false;
        }
        self.panel_opened = true;
        true
    }

    /// Append the example prompts once per session.
    pub fn inject_suggestions(&mut self) -> bool {
        if self.suggestions_shown {
            return false;
        }
        self.suggestions_shown = true;
        self.transcript.push(ChatEntry::Suggestions(
            SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        ));
        true
    }

    pub fn suggestion(&self, index: usize) -> Option<&'static str> {
        if !self.suggestions_shown {
            return None;
        }
        SUGGESTIONS.get(index).copied()
    }

    pub fn view(&self) -> ChatView<'_> {
        ChatView {
            entries: &self.transcript,
            typing: self.phase == ChatPhase::Sending,
            partial: (self.phase == ChatPhase::Streaming).then_some(self.buffer.as_str()),
            input_enabled: self.phase == ChatPhase::Idle,
        }
    }

    fn commit(&mut self) {
        let text = std::mem::take(&mut self.buffer);
        self.history.push(ChatTurn::assistant(text.clone()));
        self.transcript.push(ChatEntry::Assistant {
            formatted: format_message(&text),
            text,
        });
        self.phase = ChatPhase::Idle;
    }
}

/// Drives a [`ChatSession`] against the chat endpoint.
pub struct ChatController {
    client: ApiClient,
    session: ChatSession,
    max_bad_frames: Option<usize>,
    suggestion_delay: Duration,
}

impl ChatController {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        Self {
            client,
            session: ChatSession::new(config.chat_history_window),
            max_bad_frames: config.max_bad_frames,
            suggestion_delay: config.suggestion_delay,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    /// Open the panel; on the first open, wait the configured delay and add
    /// the suggestions turn.
    pub async fn open_panel(&mut self) -> bool {
        if !self.session.open_panel() {
            return false;
        }
        tokio::time::sleep(self.suggestion_delay).await;
        self.session.inject_suggestions()
    }

    /// Send the suggestion at `index` as if the user had typed it.
    pub async fn send_suggestion<F>(&mut self, index: usize, render: F) -> Result<bool>
    where
        F: FnMut(&ChatSession),
    {
        match self.session.suggestion(index) {
            Some(text) => self.send_message(text, render).await,
            None => Ok(false),
        }
    }

    /// Send one message and stream the reply.
    ///
    /// Returns `Ok(false)` without doing anything when the input is blank or a
    /// message is already in flight. `render` is called after the user's turn
    /// is echoed, after every content chunk, and once at the end.
    pub async fn send_message<F>(&mut self, text: &str, mut render: F) -> Result<bool>
    where
        F: FnMut(&ChatSession),
    {
        let Some(request) = self.session.begin(text) else {
            return Ok(false);
        };
        render(&self.session);

        let span = info_span!("chat", session_id = %self.session.id());
        let outcome = self.stream_reply(request, &mut render).instrument(span).await;

        if let Err(e) = &outcome {
            warn!(session_id = %self.session.id(), error = %e, "Chat message failed");
            self.session.fail(e);
        }
        render(&self.session);
        outcome.map(|_| true)
    }

    async fn stream_reply<F>(&mut self, request: ChatRequest, render: &mut F) -> Result<()>
    where
        F: FnMut(&ChatSession),
    {
        info!(history = request.history.len(), "Opening chat stream");
        let response = self.client.open_chat_stream(&request).await?;

        let mut decoder = SseDecoder::new(self.max_bad_frames);
        let mut body = pin!(response.bytes_stream());

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if self.session.phase() == ChatPhase::Sending {
                self.session.stream_opened();
                render(&self.session);
            }
            for event in decoder.push(&chunk)? {
                if self.handle(event, render)? {
                    return Ok(());
                }
            }
        }

        if let Some(event) = decoder.finish()? {
            if self.handle(event, render)? {
                return Ok(());
            }
        }
        Err(Error::Stream(INCOMPLETE_STREAM.to_string()))
    }

    /// Returns `Ok(true)` once the reply is committed.
    fn handle<F>(&mut self, event: StreamEvent, render: &mut F) -> Result<bool>
    where
        F: FnMut(&ChatSession),
    {
        let is_content = matches!(event, StreamEvent::Content { .. });
        match self.session.apply(event) {
            StreamStep::Continue => {
                if is_content {
                    render(&self.session);
                }
                Ok(false)
            }
            StreamStep::Completed => {
                info!(turns = self.session.history().len(), "Chat reply committed");
                Ok(true)
            }
            StreamStep::Failed(message) => Err(Error::Stream(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn content(text: &str) -> StreamEvent {
        StreamEvent::Content {
            text: text.to_string(),
        }
    }

    fn sse_body(frames: &[&str]) -> String {
        frames.iter().map(|f| format!("data: {}\n\n", f)).collect()
    }

    fn controller(uri: String) -> ChatController {
        let config = Config {
            api_base_url: uri.clone(),
            suggestion_delay: Duration::ZERO,
            ..Config::default()
        };
        ChatController::new(ApiClient::new(uri), &config)
    }

    #[test]
    fn test_chunks_commit_on_done() {
        let mut session = ChatSession::new(6);
        session.begin("hi").unwrap();
        assert!(session.view().typing);

        assert_eq!(session.apply(StreamEvent::Start), StreamStep::Continue);
        assert_eq!(session.apply(content("Hel")), StreamStep::Continue);
        assert_eq!(session.view().partial, Some("Hel"));
        assert_eq!(session.apply(content("lo")), StreamStep::Continue);
        assert_eq!(session.apply(StreamEvent::Done), StreamStep::Completed);

        let last = session.history().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, "Hello");
        assert!(session.view().input_enabled);
        assert!(session.view().partial.is_none());
    }

    #[test]
    fn test_error_event_commits_nothing() {
        let mut session = ChatSession::new(6);
        session.begin("hi").unwrap();
        session.apply(content("partial"));

        let step = session.apply(StreamEvent::Error {
            message: "x".to_string(),
        });
        assert_eq!(step, StreamStep::Failed("x".to_string()));
        session.fail(&Error::Stream("x".to_string()));

        assert_eq!(session.history().len(), 1);
        assert_eq!(session.phase(), ChatPhase::Idle);
        assert_eq!(session.transcript().last(), Some(&ChatEntry::Error("x".to_string())));
    }

    #[test]
    fn test_second_message_while_in_flight_is_noop() {
        let mut session = ChatSession::new(6);
        assert!(session.begin("first").is_some());
        assert!(session.begin("second").is_none());
        assert_eq!(session.history().len(), 1);

        session.apply(StreamEvent::Done);
        assert!(session.begin("second").is_some());
    }

    #[test]
    fn test_blank_message_is_noop() {
        let mut session = ChatSession::new(6);
        assert!(session.begin("   ").is_none());
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn test_request_history_truncated() {
        let mut session = ChatSession::new(6);
        for i in 0..5 {
            session.begin(&format!("q{}", i)).unwrap();
            session.apply(content(&format!("a{}", i)));
            session.apply(StreamEvent::Done);
        }
        let request = session.begin("latest").unwrap();
        assert_eq!(session.history().len(), 11);
        assert_eq!(request.history.len(), 6);
        assert_eq!(request.history.last().unwrap().content, "latest");
        assert_eq!(request.history[0].content, "a2");
    }

    #[test]
    fn test_suggestions_once() {
        let mut session = ChatSession::new(6);
        assert!(session.suggestion(0).is_none());
        assert!(session.open_panel());
        assert!(!session.open_panel());
        assert!(session.inject_suggestions());
        assert!(!session.inject_suggestions());
        assert_eq!(session.suggestion(0), Some(SUGGESTIONS[0]));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_streamed_reply_end_to_end() {
        let server = MockServer::start().await;
        let body = sse_body(&[
            r#"{"type":"start"}"#,
            r#"{"type":"content","text":"**Hel"}"#,
            "not json",
            r#"{"type":"content","text":"lo**"}"#,
            r#"{"type":"done"}"#,
        ]);

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut chat = controller(server.uri());
        let mut partials = Vec::new();
        let sent = chat
            .send_message("hello", |session| {
                if let Some(partial) = session.view().partial {
                    partials.push(partial.to_string());
                }
            })
            .await
            .unwrap();

        assert!(sent);
        assert!(partials.contains(&"**Hel".to_string()));
        let session = chat.session();
        assert_eq!(session.history().last().unwrap().content, "**Hello**");
        match session.transcript().last().unwrap() {
            ChatEntry::Assistant { formatted, .. } => {
                assert_eq!(formatted.to_html(), "<strong>Hello</strong>");
            }
            other => panic!("unexpected entry: {:?}", other),
        }
        assert!(session.view().input_enabled);
    }

    #[tokio::test]
    async fn test_stream_error_event_end_to_end() {
        let server = MockServer::start().await;
        let body = sse_body(&[
            r#"{"type":"content","text":"Working"}"#,
            r#"{"type":"error","message":"Rate limited"}"#,
            r#"{"type":"content","text":"ignored"}"#,
        ]);

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
            )
            .mount(&server)
            .await;

        let mut chat = controller(server.uri());
        let err = chat.send_message("hello", |_| {}).await.unwrap_err();
        assert!(matches!(err, Error::Stream(ref m) if m == "Rate limited"));

        let session = chat.session();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.phase(), ChatPhase::Idle);
        assert_eq!(
            session.transcript().last(),
            Some(&ChatEntry::Error("Rate limited".to_string()))
        );
    }

    #[tokio::test]
    async fn test_stream_without_done_fails() {
        let server = MockServer::start().await;
        let body = sse_body(&[r#"{"type":"content","text":"cut off"}"#]);

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
            )
            .mount(&server)
            .await;

        let mut chat = controller(server.uri());
        assert!(chat.send_message("hello", |_| {}).await.is_err());
        assert_eq!(chat.session().history().len(), 1);
        assert!(chat.session().view().input_enabled);
    }

    #[tokio::test]
    async fn test_rejected_request_shows_generic_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut chat = controller(server.uri());
        let err = chat.send_message("hello", |_| {}).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(
            chat.session().transcript().last(),
            Some(&ChatEntry::Error(crate::error::GENERIC_ERROR_MESSAGE.to_string()))
        );
    }

    #[tokio::test]
    async fn test_first_open_injects_suggestions() {
        let mut chat = controller("http://localhost:1".to_string());
        assert!(chat.open_panel().await);
        assert!(!chat.open_panel().await);
        assert!(matches!(
            chat.session().transcript(),
            [ChatEntry::Suggestions(items)] if items.len() == SUGGESTIONS.len()
        ));
    }
}
