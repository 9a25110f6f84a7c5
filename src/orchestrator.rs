use crate::api::streaming::process_streaming_response;
use crate::api::{ChatReply, ChatRequest, ChatTransport};
use crate::config::Config;
use crate::error::{Result, RunixError};
use crate::exchange::Exchange;
use crate::inspector::Inspector;
use crate::models::{Agent, Author, Message};
use crate::session::SessionManager;
use chrono::Utc;
use colored::*;
use futures::future::{AbortHandle, AbortRegistration, Abortable};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Reply shown in place of an answer when the backend cannot be reached.
pub const APOLOGY: &str = "Sorry, I couldn't reach the assistant. Please try again.";

#[derive(Debug, Clone, Default)]
pub struct ChatSettings {
    /// Explicitly chosen agent. `None` keeps each session's own agent.
    pub agent: Option<Agent>,
    pub stream: bool,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub stream_timeout: u64,
    pub verbose: bool,
}

impl From<&Config> for ChatSettings {
    fn from(config: &Config) -> Self {
        Self {
            agent: config.agent,
            stream: config.stream,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            stream_timeout: config.stream_timeout,
            verbose: config.verbose,
        }
    }
}

/// How an exchange ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The reply completed and was stored.
    Replied(Message),
    /// The stream closed without a `done` frame; what arrived was kept.
    Incomplete(Message),
    /// Cancelled mid-flight. Partial content, if any, stays in the session.
    Aborted { partial: Option<Message> },
    /// The transport failed and the apology was appended.
    Failed { error: String, apology: Message },
}

/// Cancels whichever exchange is currently in flight.
///
/// Clones share the slot, so a handle taken before `send` can stop it from
/// another future.
#[derive(Clone, Default)]
pub struct CancelHandle {
    inflight: Arc<Mutex<Option<AbortHandle>>>,
}

impl CancelHandle {
    /// Abort the in-flight exchange. Returns false if nothing was running.
    pub fn cancel(&self) -> bool {
        let Ok(mut slot) = self.inflight.lock() else {
            return false;
        };
        match slot.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    // Aborts any previous exchange before handing out the next registration.
    fn register(&self) -> AbortRegistration {
        let (handle, registration) = AbortHandle::new_pair();
        if let Ok(mut slot) = self.inflight.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
        registration
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.inflight.lock() {
            slot.take();
        }
    }
}

pub struct ChatClient {
    transport: Box<dyn ChatTransport>,
    sessions: SessionManager,
    settings: ChatSettings,
    exchange: Exchange,
    evidence: Vec<Value>,
    cancel: CancelHandle,
    // (session id, message id) of a streaming reply not yet finalized
    pending_reply: Option<(String, u64)>,
    typing: bool,
}

impl ChatClient {
    pub fn new(
        transport: Box<dyn ChatTransport>,
        sessions: SessionManager,
        settings: ChatSettings,
    ) -> Self {
        Self {
            transport,
            sessions,
            settings,
            exchange: Exchange::new(),
            evidence: Vec::new(),
            cancel: CancelHandle::default(),
            pending_reply: None,
            typing: false,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionManager {
        &mut self.sessions
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    pub fn evidence(&self) -> &[Value] {
        &self.evidence
    }

    pub fn inspector(&self) -> Inspector<'_> {
        Inspector::new(&self.exchange, &self.evidence)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Send a user message to the active session (creating one if needed)
    /// and wait for the reply. Any exchange still in flight is aborted first.
    pub async fn send<F>(&mut self, text: &str, on_delta: F) -> Result<SendOutcome>
    where
        F: FnMut(&str),
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(RunixError::Other("Message is empty".to_string()));
        }

        let registration = self.cancel.register();
        let session_id = self
            .sessions
            .ensure_active(self.settings.agent.unwrap_or_default())?;
        self.sessions.append_message(&session_id, Author::User, text)?;

        self.run_exchange(session_id, registration, on_delta).await
    }

    /// Drop everything after the active session's last user message and ask
    /// again. Returns `None` when there is nothing to regenerate.
    pub async fn regenerate<F>(&mut self, on_delta: F) -> Result<Option<SendOutcome>>
    where
        F: FnMut(&str),
    {
        let Some(session_id) = self.sessions.active_id().map(str::to_string) else {
            return Ok(None);
        };
        if self.sessions.truncate_for_regenerate(&session_id)?.is_none() {
            return Ok(None);
        }

        let registration = self.cancel.register();
        self.run_exchange(session_id, registration, on_delta)
            .await
            .map(Some)
    }

    async fn run_exchange<F>(
        &mut self,
        session_id: String,
        registration: AbortRegistration,
        mut on_delta: F,
    ) -> Result<SendOutcome>
    where
        F: FnMut(&str),
    {
        let request = self.build_request(&session_id)?;

        self.exchange.begin(Utc::now());
        self.evidence.clear();
        self.pending_reply = None;
        self.typing = true;

        let delivered = Abortable::new(
            self.deliver(&session_id, &request, &mut on_delta),
            registration,
        )
        .await;

        self.typing = false;
        self.cancel.clear();

        match delivered {
            Ok(outcome) => outcome,
            Err(_aborted) => {
                if self.settings.verbose {
                    eprintln!("{}", "[runix] Exchange aborted".dimmed());
                }
                let partial = self.settle_pending_reply()?;
                Ok(SendOutcome::Aborted { partial })
            }
        }
    }

    fn build_request(&self, session_id: &str) -> Result<ChatRequest> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| RunixError::SessionError(format!("no session with id {}", session_id)))?;

        Ok(ChatRequest {
            messages: session.messages.clone(),
            agent: self.settings.agent.unwrap_or(session.agent),
            stream: self.settings.stream,
            temperature: self.settings.temperature,
            max_output_tokens: self.settings.max_output_tokens,
        })
    }

    async fn deliver<F>(
        &mut self,
        session_id: &str,
        request: &ChatRequest,
        on_delta: &mut F,
    ) -> Result<SendOutcome>
    where
        F: FnMut(&str),
    {
        let reply = match self.transport.send_chat(request).await {
            Ok(reply) => reply,
            Err(e) => return self.fail(session_id, e),
        };

        let body = match reply {
            ChatReply::Message(reply) => {
                self.exchange.finish(Utc::now());
                on_delta(&reply.content);
                let message = self
                    .sessions
                    .append_message(session_id, Author::Ai, &reply.content)?;
                self.sessions.auto_title(session_id, &message.content)?;
                return Ok(SendOutcome::Replied(message));
            }
            ChatReply::Stream(body) => body,
        };

        let placeholder = self.sessions.append_message(session_id, Author::Ai, "")?;
        let message_id = placeholder.id;
        self.pending_reply = Some((session_id.to_string(), message_id));

        let sessions = &mut self.sessions;
        let mut append_error = None;
        let streamed = process_streaming_response(
            body,
            &mut self.exchange,
            self.settings.stream_timeout,
            self.settings.verbose,
            |delta| {
                if append_error.is_none() {
                    append_error = sessions
                        .append_to_message(session_id, message_id, delta)
                        .err();
                }
                on_delta(delta);
            },
        )
        .await;

        if let Some(e) = append_error {
            self.pending_reply = None;
            return Err(e);
        }

        let streamed = match streamed {
            Ok(streamed) => streamed,
            Err(e) => return self.fail(session_id, e),
        };
        self.pending_reply = None;

        let Some(completion) = streamed.completion else {
            if self.settings.verbose {
                eprintln!(
                    "{}",
                    format!(
                        "[runix] Stream ended after {} frames without a done frame",
                        streamed.frames
                    )
                    .dimmed()
                );
            }
            let content = self.exchange.content().to_string();
            let message = self
                .sessions
                .finalize_message(session_id, message_id, &content)?;
            return Ok(SendOutcome::Incomplete(message));
        };

        let message = self
            .sessions
            .finalize_message(session_id, message_id, &completion.content)?;
        self.sessions.auto_title(session_id, &message.content)?;

        if let Some(task_id) = completion.task_id {
            self.load_evidence(&task_id).await;
        }

        Ok(SendOutcome::Replied(message))
    }

    async fn load_evidence(&mut self, task_id: &str) {
        match self.transport.fetch_evidence(task_id).await {
            Ok(evidence) => self.evidence = evidence,
            Err(e) => {
                if self.settings.verbose {
                    eprintln!(
                        "{}",
                        format!("[runix] Evidence lookup for {} failed: {}", task_id, e).dimmed()
                    );
                }
            }
        }
    }

    /// Keep whatever a cut-short reply received and persist it.
    fn settle_pending_reply(&mut self) -> Result<Option<Message>> {
        let Some((session_id, message_id)) = self.pending_reply.take() else {
            return Ok(None);
        };
        let content = self.exchange.content().to_string();
        let message = self
            .sessions
            .finalize_message(&session_id, message_id, &content)?;
        Ok(Some(message))
    }

    fn fail(&mut self, session_id: &str, error: RunixError) -> Result<SendOutcome> {
        if self.settings.verbose {
            eprintln!("{}", format!("[runix] Exchange failed: {}", error).dimmed());
        }
        self.settle_pending_reply()?;
        let apology = self
            .sessions
            .append_message(session_id, Author::Ai, APOLOGY)?;
        Ok(SendOutcome::Failed {
            error: error.to_string(),
            apology,
        })
    }
}
