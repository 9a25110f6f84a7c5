use crate::exchange::Exchange;
use crate::models::{ToolPhase, ToolTrace, TraceEvent};
use chrono::Local;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;

pub const MAX_EVENTS: usize = 24;
pub const MAX_TOOLS: usize = 12;
pub const MAX_EVIDENCE: usize = 12;

/// Shown instead of a duration while an exchange is in flight or absent.
pub const DURATION_PLACEHOLDER: &str = "—";

/// Read-only rollup of the current exchange for debugging.
pub struct Inspector<'a> {
    exchange: &'a Exchange,
    evidence: &'a [Value],
}

impl<'a> Inspector<'a> {
    pub fn new(exchange: &'a Exchange, evidence: &'a [Value]) -> Self {
        Self { exchange, evidence }
    }

    pub fn event_count(&self) -> usize {
        self.exchange.events().len()
    }

    pub fn distinct_tools(&self) -> usize {
        self.exchange
            .tool_trace()
            .iter()
            .map(|t| t.tool.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn elapsed_ms(&self) -> Option<i64> {
        self.exchange.elapsed_ms()
    }

    pub fn duration_label(&self) -> String {
        match self.elapsed_ms() {
            Some(ms) => format!("{:.1}s", ms as f64 / 1000.0),
            None => DURATION_PLACEHOLDER.to_string(),
        }
    }

    pub fn recent_events(&self) -> impl Iterator<Item = &'a TraceEvent> {
        let exchange: &'a Exchange = self.exchange;
        let events = exchange.events();
        events.iter().skip(events.len().saturating_sub(MAX_EVENTS))
    }

    pub fn recent_tools(&self) -> &'a [ToolTrace] {
        let exchange: &'a Exchange = self.exchange;
        let tools = exchange.tool_trace();
        &tools[tools.len().saturating_sub(MAX_TOOLS)..]
    }

    pub fn evidence(&self) -> &'a [Value] {
        &self.evidence[..self.evidence.len().min(MAX_EVIDENCE)]
    }

    pub fn dropped_frames(&self) -> usize {
        self.exchange.dropped_frames()
    }
}

impl fmt::Display for Inspector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run Inspector  events: {}  tools: {}  duration: {}",
            self.event_count(),
            self.distinct_tools(),
            self.duration_label()
        )?;
        if self.dropped_frames() > 0 {
            writeln!(f, "  dropped frames: {}", self.dropped_frames())?;
        }

        if self.event_count() > 0 {
            writeln!(f, "Events")?;
            for event in self.recent_events() {
                let time = event.ts.with_timezone(&Local).format("%H:%M:%S");
                match &event.detail {
                    Some(detail) => writeln!(f, "  [{}] {}: {}", time, event.event_type, detail)?,
                    None => writeln!(f, "  [{}] {}", time, event.event_type)?,
                }
            }
        }

        let tools = self.recent_tools();
        if !tools.is_empty() {
            writeln!(f, "Tools")?;
            for tool in tools {
                let phase = match tool.phase {
                    ToolPhase::Call => "call",
                    ToolPhase::Result => "result",
                };
                match tool.t_ms {
                    Some(ms) => writeln!(f, "  {:<24} {:<6} {:.0}ms", tool.tool, phase, ms)?,
                    None => writeln!(f, "  {:<24} {}", tool.tool, phase)?,
                }
            }
        }

        let evidence = self.evidence();
        if !evidence.is_empty() {
            writeln!(f, "Evidence")?;
            for record in evidence {
                let source = record
                    .get("doc_id")
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown source");
                writeln!(f, "  {}", source)?;
                if let Some(text) = record.get("raw_text").and_then(Value::as_str) {
                    let preview: String = text.chars().take(120).collect();
                    writeln!(f, "    {}", preview)?;
                }
            }
        }

        Ok(())
    }
}
