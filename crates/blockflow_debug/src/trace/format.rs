//! Trace output formatters.
//!
//! Provides human-readable and JSON formatters for trace records.

use std::fmt::Write;

use blockflow_foundation::Value;

use super::record::{TraceEvent, TraceRecord};

// =============================================================================
// Trace Formatter Trait
// =============================================================================

/// Trait for formatting trace records.
pub trait TraceFormatter {
    /// Formats a single trace record to a string.
    fn format(&self, record: &TraceRecord) -> String;

    /// Formats multiple records.
    fn format_many(&self, records: &[&TraceRecord]) -> String {
        records
            .iter()
            .map(|r| self.format(r))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// =============================================================================
// Human-Readable Formatter
// =============================================================================

/// Formats trace records in human-readable form.
#[derive(Clone, Debug, Default)]
pub struct HumanFormatter {
    /// Whether to include timestamps.
    pub show_timestamps: bool,
    /// Whether to include record IDs.
    pub show_ids: bool,
}

impl HumanFormatter {
    /// Creates a new human formatter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to show timestamps.
    #[must_use]
    pub fn with_timestamps(mut self) -> Self {
        self.show_timestamps = true;
        self
    }

    /// Builder method to show record IDs.
    #[must_use]
    pub fn with_ids(mut self) -> Self {
        self.show_ids = true;
        self
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_timestamp(ns: u64) -> String {
        let us = ns / 1000;
        if us >= 1_000_000 {
            format!("{:.3}s", us as f64 / 1_000_000.0)
        } else if us >= 1000 {
            format!("{:.3}ms", us as f64 / 1000.0)
        } else {
            format!("{us}us")
        }
    }
}

impl TraceFormatter for HumanFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let mut prefix = String::new();

        if self.show_ids {
            let _ = write!(prefix, "[{:06}] ", record.id);
        }

        let _ = write!(prefix, "T{:04} ", record.tick);

        if self.show_timestamps {
            let _ = write!(
                prefix,
                "{:>10} ",
                Self::format_timestamp(record.timestamp_ns)
            );
        }

        let event_str = match &record.event {
            TraceEvent::TickStart { tick } => format!("=== TICK {tick} START ==="),
            TraceEvent::TickEnd { tick, processes } => {
                format!("=== TICK {tick} END ({processes} running) ===")
            }
            TraceEvent::ProcessStarted { process, script } => {
                format!("  START {process} {script}")
            }
            TraceEvent::ProcessYielded {
                process,
                evaluations,
            } => format!("    YIELD {process} after {evaluations} steps"),
            TraceEvent::ProcessStopped { process } => format!("  STOP {process}"),
            TraceEvent::ProcessFinished { process, result } => match result {
                Some(value) => format!("  DONE {process} -> {value}"),
                None => format!("  DONE {process}"),
            },
            TraceEvent::ProcessError {
                process,
                element,
                message,
            } => format!("  ERROR {process} in {element}: {message}"),
            TraceEvent::Broadcast {
                process,
                message,
                receivers,
            } => format!("    BROADCAST {process} {message:?} to {receivers}"),
            TraceEvent::Forked { parent, child } => format!("    FORK {parent} -> {child}"),
            TraceEvent::ContinuationInvoked { process } => format!("    CONTINUE {process}"),
            TraceEvent::Collection {
                contexts_freed,
                frames_freed,
                live_contexts,
            } => format!(
                "  GC freed {contexts_freed} contexts, {frames_freed} frames ({live_contexts} live)"
            ),
            TraceEvent::Custom { name, data } => format!("  CUSTOM {name}: {data}"),
        };

        format!("{prefix}{event_str}")
    }
}

// =============================================================================
// JSON Formatter
// =============================================================================

/// Formats trace records as JSON.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    /// Whether to put each record of a batch on its own line.
    pub pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method for pretty printing.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn escape_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    fn format_value(value: &Value) -> String {
        match value {
            Value::Nil => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) if f.is_finite() => f.to_string(),
            Value::List(items) => {
                let inner: Vec<_> = items.iter().map(Self::format_value).collect();
                format!("[{}]", inner.join(","))
            }
            _ => format!("\"{}\"", Self::escape_string(&value.to_string())),
        }
    }
}

impl TraceFormatter for JsonFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let esc = Self::escape_string;
        let event_data = match &record.event {
            TraceEvent::TickStart { tick } => format!("\"tick\":{tick}"),
            TraceEvent::TickEnd { tick, processes } => {
                format!("\"tick\":{tick},\"processes\":{processes}")
            }
            TraceEvent::ProcessStarted { process, script } => {
                format!("\"process\":{},\"script\":\"{}\"", process.0, esc(script))
            }
            TraceEvent::ProcessYielded {
                process,
                evaluations,
            } => format!("\"process\":{},\"evaluations\":{evaluations}", process.0),
            TraceEvent::ProcessStopped { process }
            | TraceEvent::ContinuationInvoked { process } => {
                format!("\"process\":{}", process.0)
            }
            TraceEvent::ProcessFinished { process, result } => {
                let result = result
                    .as_ref()
                    .map_or_else(|| "null".to_string(), Self::format_value);
                format!("\"process\":{},\"result\":{result}", process.0)
            }
            TraceEvent::ProcessError {
                process,
                element,
                message,
            } => format!(
                "\"process\":{},\"element\":\"{}\",\"message\":\"{}\"",
                process.0,
                esc(element),
                esc(message)
            ),
            TraceEvent::Broadcast {
                process,
                message,
                receivers,
            } => format!(
                "\"process\":{},\"message\":\"{}\",\"receivers\":{receivers}",
                process.0,
                esc(message)
            ),
            TraceEvent::Forked { parent, child } => {
                format!("\"parent\":{},\"child\":{}", parent.0, child.0)
            }
            TraceEvent::Collection {
                contexts_freed,
                frames_freed,
                live_contexts,
            } => format!(
                "\"contexts_freed\":{contexts_freed},\"frames_freed\":{frames_freed},\"live_contexts\":{live_contexts}"
            ),
            TraceEvent::Custom { name, data } => format!(
                "\"name\":\"{}\",\"data\":{}",
                esc(name),
                Self::format_value(data)
            ),
        };

        format!(
            "{{\"id\":{},\"tick\":{},\"timestamp_ns\":{},\"type\":\"{}\",{}}}",
            record.id,
            record.tick,
            record.timestamp_ns,
            record.event_type(),
            event_data
        )
    }

    fn format_many(&self, records: &[&TraceRecord]) -> String {
        let items: Vec<_> = records.iter().map(|r| self.format(r)).collect();
        if self.pretty {
            format!("[\n  {}\n]", items.join(",\n  "))
        } else {
            format!("[{}]", items.join(","))
        }
    }
}
