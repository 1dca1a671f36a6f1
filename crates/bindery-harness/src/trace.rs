#![forbid(unsafe_code)]

//! Render trace recorder.
//!
//! Records the lifecycle calls and outputs of a [`TestHost`](crate::TestHost)
//! run and emits them as JSONL, one object per event:
//! - `mount` / `update` / `unmount` (component display name and chain depth)
//! - `output` (what the chain rendered at the end of a pass)
//! - `settled` (number of passes a `settle` call needed)
//!
//! Two runs of the same scenario produce byte-identical JSONL, so the
//! [`digest`](RenderTrace::digest) can be compared across runs.

use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    Mount { depth: usize, component: String },
    Update { depth: usize, component: String },
    Unmount { depth: usize, component: String },
    Output { pass: usize, output: String },
    Settled { passes: usize },
}

impl TraceEvent {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mount { .. } => "mount",
            Self::Update { .. } => "update",
            Self::Unmount { .. } => "unmount",
            Self::Output { .. } => "output",
            Self::Settled { .. } => "settled",
        }
    }

    fn to_json(&self) -> Value {
        let event = self.as_str();
        match self {
            Self::Mount { depth, component }
            | Self::Update { depth, component }
            | Self::Unmount { depth, component } => {
                json!({ "event": event, "depth": depth, "component": component })
            }
            Self::Output { pass, output } => {
                json!({ "event": event, "pass": pass, "output": output })
            }
            Self::Settled { passes } => json!({ "event": event, "passes": passes }),
        }
    }
}

/// In-memory event log of one host run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTrace {
    events: Vec<TraceEvent>,
}

impl RenderTrace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: TraceEvent) {
        tracing::trace!(event = event.as_str(), "trace event");
        self.events.push(event);
    }

    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Count of events of one kind (`"mount"`, `"output"`, ...).
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.as_str() == kind).count()
    }

    /// One JSON object per line, newline-terminated.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&event.to_json().to_string());
            out.push('\n');
        }
        out
    }

    /// Hex BLAKE3 digest of [`to_jsonl`](Self::to_jsonl).
    #[must_use]
    pub fn digest(&self) -> String {
        blake3::hash(self.to_jsonl().as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RenderTrace {
        let mut trace = RenderTrace::new();
        trace.record(TraceEvent::Mount {
            depth: 0,
            component: "LeafB".into(),
        });
        trace.record(TraceEvent::Output {
            pass: 1,
            output: "placeholder:spinner".into(),
        });
        trace.record(TraceEvent::Settled { passes: 1 });
        trace
    }

    #[test]
    fn jsonl_one_object_per_line() {
        let jsonl = sample().to_jsonl();
        let lines: Vec<&str> = jsonl.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            let value: Value = serde_json::from_str(line).unwrap();
            assert!(value.get("event").is_some());
        }
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["event"], "mount");
        assert_eq!(first["component"], "LeafB");
        assert_eq!(first["depth"], 0);
    }

    #[test]
    fn digest_is_stable_and_content_sensitive() {
        assert_eq!(sample().digest(), sample().digest());
        assert_eq!(sample().digest().len(), 64);

        let mut other = sample();
        other.record(TraceEvent::Settled { passes: 0 });
        assert_ne!(sample().digest(), other.digest());
    }

    #[test]
    fn count_by_kind() {
        let trace = sample();
        assert_eq!(trace.count("mount"), 1);
        assert_eq!(trace.count("unmount"), 0);
        assert!(!trace.is_empty());
    }
}
