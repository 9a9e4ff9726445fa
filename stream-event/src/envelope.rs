//! Envelope (threadId, runId, eventId) and SSE framing.
//! EnvelopeState numbers the events of one run and injects the envelope into each.

use crate::event::ProtocolEvent;
use serde_json::Value;

/// Envelope fields added to every event of a run.
#[derive(Clone, Debug, Default)]
pub struct Envelope {
    /// Conversation thread; constant across runs of one thread.
    pub thread_id: Option<String>,
    /// One external call (turn).
    pub run_id: Option<String>,
    /// Per-event sequence number; monotonically increasing within a run.
    pub event_id: Option<u64>,
}

impl Envelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thread_id(mut self, id: impl Into<String>) -> Self {
        self.thread_id = Some(id.into());
        self
    }

    pub fn with_run_id(mut self, id: impl Into<String>) -> Self {
        self.run_id = Some(id.into());
        self
    }

    pub fn with_event_id(mut self, id: u64) -> Self {
        self.event_id = Some(id);
        self
    }

    /// Merges envelope fields into the given JSON object (top-level only).
    /// Does not overwrite existing keys.
    pub fn inject_into(&self, obj: &mut Value) {
        let Some(obj) = obj.as_object_mut() else {
            return;
        };
        if let Some(ref id) = self.thread_id {
            obj.entry("threadId")
                .or_insert_with(|| Value::String(id.clone()));
        }
        if let Some(ref id) = self.run_id {
            obj.entry("runId")
                .or_insert_with(|| Value::String(id.clone()));
        }
        if let Some(id) = self.event_id {
            obj.entry("eventId")
                .or_insert_with(|| Value::Number(serde_json::Number::from(id)));
        }
    }
}

/// Envelope state for one run: thread id, run id, next event id.
#[derive(Clone, Debug)]
pub struct EnvelopeState {
    pub thread_id: String,
    pub run_id: String,
    pub next_event_id: u64,
}

impl EnvelopeState {
    pub fn new(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            next_event_id: 1,
        }
    }

    /// Injects the envelope into the event value and advances the event id.
    pub fn inject_into(&mut self, value: &mut Value) {
        let env = Envelope::new()
            .with_thread_id(&self.thread_id)
            .with_run_id(&self.run_id)
            .with_event_id(self.next_event_id);
        self.next_event_id += 1;
        env.inject_into(value);
    }
}

/// Converts a protocol event to JSON and injects envelope using the given state.
pub fn to_json(
    event: &ProtocolEvent,
    state: &mut EnvelopeState,
) -> Result<Value, serde_json::Error> {
    let mut value = event.to_value()?;
    state.inject_into(&mut value);
    Ok(value)
}

/// One Server-Sent Events frame: `data: <json>\n\n`.
pub fn to_sse(event: &ProtocolEvent, state: &mut EnvelopeState) -> Result<String, serde_json::Error> {
    let value = to_json(event, state)?;
    Ok(format!("data: {}\n\n", serde_json::to_string(&value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ProtocolEvent;

    #[test]
    fn envelope_does_not_overwrite_payload() {
        let mut obj = serde_json::json!({"type": "RUN_STARTED", "threadId": "T1", "runId": "r-1"});
        Envelope::new()
            .with_thread_id("other")
            .with_run_id("r-2")
            .with_event_id(1)
            .inject_into(&mut obj);
        assert_eq!(obj["threadId"], "T1");
        assert_eq!(obj["runId"], "r-1");
        assert_eq!(obj["eventId"], 1);
    }

    #[test]
    fn event_ids_increase_per_event() {
        let mut state = EnvelopeState::new("T1", "r-1");
        let ev = ProtocolEvent::TextMessageEnd {
            message_id: "m1".to_string(),
        };
        let a = to_json(&ev, &mut state).unwrap();
        let b = to_json(&ev, &mut state).unwrap();
        assert_eq!(a["eventId"], 1);
        assert_eq!(b["eventId"], 2);
        assert_eq!(b["threadId"], "T1");
        assert_eq!(b["runId"], "r-1");
    }

    #[test]
    fn sse_frame_shape() {
        let mut state = EnvelopeState::new("T1", "r-1");
        let frame = to_sse(
            &ProtocolEvent::StepStarted {
                step_name: "agent_step".to_string(),
            },
            &mut state,
        )
        .unwrap();
        assert!(frame.starts_with("data: {"));
        assert!(frame.ends_with("}\n\n"));
        assert!(frame.contains(r#""stepName":"agent_step""#));
    }
}
