//! Classification of stream payloads for a single request/response exchange.
//!
//! An [`Exchange`] owns the three logs a payload can touch: the in-progress
//! reply text, the capped event trace and the per-tool trace. It is reset at
//! the start of every request so nothing leaks between exchanges.

use crate::api::models::ReplyMessage;
use crate::api::sse::SseFrame;
use crate::models::{ToolPhase, ToolTrace, TraceEvent};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};

/// Most recent trace events retained per exchange.
pub const MAX_TRACE_EVENTS: usize = 200;

/// The terminal `done` frame, reduced to what the session needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub task_id: Option<String>,
}

/// Effects of one frame that reach beyond the exchange itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    pub delta: Option<String>,
    pub completion: Option<Completion>,
    pub dropped: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Exchange {
    content: String,
    events: VecDeque<TraceEvent>,
    tools: Vec<ToolTrace>,
    tool_started: HashMap<String, DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    dropped_frames: usize,
}

impl Exchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every log and stamp the start of a new exchange.
    pub fn begin(&mut self, now: DateTime<Utc>) {
        *self = Self {
            started_at: Some(now),
            ..Self::default()
        };
    }

    /// Mark the exchange complete without a `done` frame (non-streaming replies).
    pub fn finish(&mut self, now: DateTime<Utc>) {
        self.ended_at = Some(now);
    }

    pub fn apply_frame(&mut self, frame: &SseFrame) -> FrameOutcome {
        self.apply_frame_at(frame, Utc::now())
    }

    pub fn apply_frame_at(&mut self, frame: &SseFrame, now: DateTime<Utc>) -> FrameOutcome {
        match serde_json::from_str::<Value>(&frame.data) {
            Ok(payload) => self.apply_payload_at(&payload, now),
            Err(_) => {
                self.dropped_frames += 1;
                FrameOutcome {
                    dropped: true,
                    ..FrameOutcome::default()
                }
            }
        }
    }

    /// Apply one decoded payload. Shapes that match nothing are absorbed.
    pub fn apply_payload_at(&mut self, payload: &Value, now: DateTime<Utc>) -> FrameOutcome {
        let mut outcome = FrameOutcome::default();

        if let Some(delta) = payload.get("delta").and_then(Value::as_str) {
            self.content.push_str(delta);
            outcome.delta = Some(delta.to_string());
        }

        match payload.get("event").and_then(Value::as_str) {
            Some("tool_call") => self.record_tool_call(payload, now),
            Some("tool_result") => self.record_tool_result(payload, now),
            _ => {}
        }

        if let Some(error) = payload.get("error").filter(|e| !e.is_null()) {
            self.push_event(now, "error", Some(stringify(error)));
        }

        if is_truthy(payload.get("done")) {
            if let Some(message) = payload.get("message").filter(|m| !m.is_null()) {
                outcome.completion = Some(self.complete(payload, message, now));
            }
        }

        outcome
    }

    fn record_tool_call(&mut self, payload: &Value, now: DateTime<Utc>) {
        let tool = tool_name(payload);
        self.push_event(now, "tool_call", tool.clone());

        let Some(tool) = tool else { return };
        if self.tools.iter().any(|t| t.tool == tool) {
            return;
        }
        self.tool_started.insert(tool.clone(), now);
        self.tools.push(ToolTrace {
            tool,
            phase: ToolPhase::Call,
            t_ms: None,
        });
    }

    fn record_tool_result(&mut self, payload: &Value, now: DateTime<Utc>) {
        let tool = tool_name(payload);
        self.push_event(now, "tool_result", tool.clone());

        let Some(tool) = tool else { return };
        let t_ms = self
            .tool_started
            .get(&tool)
            .map(|start| (now - *start).num_milliseconds().max(0) as f64);

        match self.tools.iter_mut().find(|t| t.tool == tool) {
            Some(entry) => {
                entry.phase = ToolPhase::Result;
                entry.t_ms = t_ms;
            }
            None => self.tools.push(ToolTrace {
                tool,
                phase: ToolPhase::Result,
                t_ms,
            }),
        }
    }

    fn complete(&mut self, payload: &Value, message: &Value, now: DateTime<Utc>) -> Completion {
        let reply: ReplyMessage = serde_json::from_value(message.clone()).unwrap_or_default();
        let has_content = message.get("content").map_or(false, Value::is_string);
        if has_content {
            self.content = reply.content;
        }

        if let Some(server_trace) = payload.get("tool_trace").and_then(Value::as_array) {
            self.tools = server_trace
                .iter()
                .filter_map(|entry| serde_json::from_value::<ToolTrace>(entry.clone()).ok())
                .collect();
        }

        self.ended_at = Some(now);

        Completion {
            content: self.content.clone(),
            task_id: payload
                .get("task_id")
                .filter(|id| !id.is_null())
                .map(stringify),
        }
    }

    fn push_event(&mut self, ts: DateTime<Utc>, event_type: &str, detail: Option<String>) {
        self.events.push_back(TraceEvent {
            ts,
            event_type: event_type.to_string(),
            detail,
        });
        while self.events.len() > MAX_TRACE_EVENTS {
            self.events.pop_front();
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn events(&self) -> &VecDeque<TraceEvent> {
        &self.events
    }

    pub fn tool_trace(&self) -> &[ToolTrace] {
        &self.tools
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Wall-clock length of the exchange, once it has both ends.
    pub fn elapsed_ms(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }

    pub fn dropped_frames(&self) -> usize {
        self.dropped_frames
    }
}

fn tool_name(payload: &Value) -> Option<String> {
    payload
        .get("tool")
        .filter(|t| !t.is_null())
        .map(stringify)
        .filter(|t| !t.is_empty())
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
