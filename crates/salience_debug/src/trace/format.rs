//! Trace output formatters.
//!
//! Provides human-readable and JSON formatters for trace records.

use std::fmt::Write as _;

use super::record::{TraceEvent, TraceRecord};

// =============================================================================
// Trace Formatter Trait
// =============================================================================

/// Trait for formatting trace records.
pub trait TraceFormatter {
    /// Formats a single trace record to a string.
    fn format(&self, record: &TraceRecord) -> String;

    /// Formats multiple records, one per line.
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

    fn facts(ids: &[salience_foundation::FactId]) -> String {
        if ids.is_empty() {
            return "*".to_string();
        }
        ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
    }
}

impl TraceFormatter for HumanFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let mut line = String::new();

        if self.show_ids {
            let _ = write!(line, "[{:06}] ", record.id);
        }
        let _ = write!(line, "C{:04} ", record.cycle);
        if self.show_timestamps {
            let _ = write!(line, "{:>10} ", Self::format_timestamp(record.timestamp_ns));
        }

        let _ = match &record.event {
            TraceEvent::StateChange { state } => write!(line, "-- {state}"),
            TraceEvent::ActivationQueued {
                rule,
                branch,
                salience,
                facts,
            } => write!(
                line,
                "  QUEUED {rule}#{branch} ({salience}) {}",
                Self::facts(facts)
            ),
            TraceEvent::RuleFiring {
                sequence,
                rule,
                branch,
                facts,
                bindings,
            } => {
                let _ = write!(line, "FIRE {sequence} {rule}#{branch} {}", Self::facts(facts));
                if bindings.is_empty() {
                    Ok(())
                } else {
                    let rendered: Vec<_> = bindings.iter().map(|(k, v)| format!("?{k}={v}")).collect();
                    write!(line, " {{{}}}", rendered.join(", "))
                }
            }
            TraceEvent::FactAsserted { fact, text, .. } => write!(line, "    ==> {fact} {text}"),
            TraceEvent::LineEmitted { line: emitted, .. } => write!(line, "    >> {emitted}"),
            TraceEvent::RunHalted { firings, error } => match error {
                Some(message) => write!(line, "== HALTED after {firings} firing(s): {message}"),
                None => write!(line, "== HALTED after {firings} firing(s)"),
            },
        };
        line
    }
}

// =============================================================================
// JSON Formatter
// =============================================================================

/// Formats trace records as JSON objects, one per record.
#[derive(Clone, Debug, Default)]
pub struct JsonFormatter {
    /// Whether to pretty-print JSON.
    pub pretty: bool,
}

impl JsonFormatter {
    /// Creates a new compact JSON formatter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to pretty-print.
    #[must_use]
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }
}

impl TraceFormatter for JsonFormatter {
    fn format(&self, record: &TraceRecord) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        };
        rendered.unwrap_or_else(|e| format!("{{\"id\":{},\"error\":{:?}}}", record.id, e.to_string()))
    }

    fn format_many(&self, records: &[&TraceRecord]) -> String {
        let items: Vec<_> = records.iter().map(|r| self.format(r)).collect();
        if self.pretty {
            format!("[\n{}\n]", items.join(",\n"))
        } else {
            format!("[{}]", items.join(","))
        }
    }
}
