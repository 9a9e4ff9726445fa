//! Event rendering: human-readable text or one wire-format JSON object per line.

use std::collections::HashMap;
use std::io::Write;

use stream_event::{to_json, EnvelopeState, ProtocolEvent};

use ragent::RunEvent;

/// How events are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Reply text to stdout as it streams; tool activity and errors to stderr.
    Text,
    /// Every event as a JSON object (with `threadId`, `runId`, `eventId`) to stdout.
    Json { pretty: bool },
}

/// Truncates to at most `max` chars, ending in `...` when cut. `0` disables. UTF-8 safe.
pub fn truncate_display(s: &str, max: usize) -> String {
    const SUFFIX: &str = "...";
    if max == 0 || s.chars().count() <= max {
        return s.to_string();
    }
    if max <= SUFFIX.len() {
        return s.chars().take(max).collect();
    }
    let kept: String = s.chars().take(max - SUFFIX.len()).collect();
    format!("{}{}", kept, SUFFIX)
}

/// Renders the events of one turn.
pub struct EventRenderer {
    mode: OutputMode,
    envelope: EnvelopeState,
    max_len: usize,
    /// name and buffered arguments per open tool call
    open_calls: HashMap<String, (String, String)>,
}

impl EventRenderer {
    pub fn new(mode: OutputMode, thread_id: &str, run_id: &str, max_len: usize) -> Self {
        Self {
            mode,
            envelope: EnvelopeState::new(thread_id, run_id),
            max_len,
            open_calls: HashMap::new(),
        }
    }

    pub fn render(
        &mut self,
        event: &RunEvent,
        out: &mut dyn Write,
        diag: &mut dyn Write,
    ) -> Result<(), super::RunError> {
        match self.mode {
            OutputMode::Json { pretty } => {
                let value = to_json(&ProtocolEvent::from(event), &mut self.envelope)?;
                let line = if pretty {
                    serde_json::to_string_pretty(&value)?
                } else {
                    serde_json::to_string(&value)?
                };
                writeln!(out, "{}", line)?;
            }
            OutputMode::Text => self.render_text(event, out, diag)?,
        }
        Ok(())
    }

    fn render_text(
        &mut self,
        event: &RunEvent,
        out: &mut dyn Write,
        diag: &mut dyn Write,
    ) -> std::io::Result<()> {
        match event {
            RunEvent::TextMessageContent { delta, .. } => {
                write!(out, "{}", delta)?;
                out.flush()?;
            }
            RunEvent::TextMessageEnd { .. } => writeln!(out)?,
            RunEvent::ToolCallStart { call_id, name, .. } => {
                self.open_calls
                    .insert(call_id.clone(), (name.clone(), String::new()));
            }
            RunEvent::ToolCallArgs { call_id, delta } => {
                if let Some((_, args)) = self.open_calls.get_mut(call_id) {
                    args.push_str(delta);
                }
            }
            RunEvent::ToolCallEnd { call_id } => {
                if let Some((name, args)) = self.open_calls.remove(call_id) {
                    writeln!(diag, "→ {}({})", name, truncate_display(&args, self.max_len))?;
                }
            }
            RunEvent::ToolCallResult {
                content, is_error, ..
            } => {
                let marker = if *is_error { "✗" } else { "←" };
                writeln!(diag, "{} {}", marker, truncate_display(content, self.max_len))?;
            }
            RunEvent::RunError { code, message } => {
                writeln!(diag, "error [{}]: {}", code, message)?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_all(mode: OutputMode, events: &[RunEvent]) -> (String, String) {
        let mut r = EventRenderer::new(mode, "T1", "R1", 20);
        let (mut out, mut diag) = (Vec::new(), Vec::new());
        for e in events {
            r.render(e, &mut out, &mut diag).unwrap();
        }
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(diag).unwrap(),
        )
    }

    fn tool_events() -> Vec<RunEvent> {
        vec![
            RunEvent::ToolCallStart {
                call_id: "c1".into(),
                name: "get_weather_update".into(),
                parent_message_id: "m1".into(),
            },
            RunEvent::ToolCallArgs {
                call_id: "c1".into(),
                delta: r#"{"city":"Paris"}"#.into(),
            },
            RunEvent::ToolCallEnd {
                call_id: "c1".into(),
            },
            RunEvent::ToolCallResult {
                message_id: "m2".into(),
                call_id: "c1".into(),
                content: "It is sunny: 25 degrees celsius in Paris".into(),
                is_error: false,
            },
            RunEvent::TextMessageStart {
                message_id: "m3".into(),
            },
            RunEvent::TextMessageContent {
                message_id: "m3".into(),
                delta: "Sunny ".into(),
            },
            RunEvent::TextMessageContent {
                message_id: "m3".into(),
                delta: "today.".into(),
            },
            RunEvent::TextMessageEnd {
                message_id: "m3".into(),
            },
        ]
    }

    #[test]
    fn truncation_is_char_based() {
        assert_eq!(truncate_display("héllo wörld", 8), "héllo...");
        assert_eq!(truncate_display("short", 10), "short");
        assert_eq!(truncate_display("abcdef", 2), "ab");
        assert_eq!(truncate_display("abcdef", 0), "abcdef");
    }

    #[test]
    fn text_mode_splits_reply_and_tool_activity() {
        let (out, diag) = render_all(OutputMode::Text, &tool_events());
        assert_eq!(out, "Sunny today.\n");
        assert!(diag.contains(r#"→ get_weather_update({"city":"Paris"})"#));
        assert!(diag.contains("← It is sunny: 25 d..."));
    }

    #[test]
    fn json_mode_writes_one_enveloped_object_per_line() {
        let (out, diag) = render_all(OutputMode::Json { pretty: false }, &tool_events());
        assert!(diag.is_empty());
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0]["type"], "TOOL_CALL_START");
        assert_eq!(lines[0]["toolCallName"], "get_weather_update");
        assert_eq!(lines[0]["threadId"], "T1");
        assert_eq!(lines[0]["runId"], "R1");
        assert_eq!(lines[7]["eventId"], 8);
    }
}
