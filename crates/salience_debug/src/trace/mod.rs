//! Tracing of engine runs.
//!
//! A [`Tracer`] is a [`FireObserver`]: pass it to
//! [`Engine::run_observed`](salience_engine::Engine::run_observed) and it
//! records every state change, queued activation, firing, assertion, and
//! emitted line into a bounded buffer. Records can also be mirrored to
//! stderr or to the `log` facade as they happen.
//!
//! # Example
//!
//! ```text
//! C0000 -- matching
//! C0000   QUEUED start-primary#0 (120) f-1
//! C0001 FIRE 1 start-primary#0 f-1
//! C0001     >> Begin primary survey
//! ```

pub mod buffer;
pub mod format;
pub mod record;

pub use buffer::{TraceBuffer, TraceBufferStats};
pub use format::{HumanFormatter, JsonFormatter, TraceFormatter};
pub use record::{TraceEvent, TraceRecord};

use std::io::{self, Write};
use std::time::Instant;

use salience_engine::{Activation, EngineState, FireObserver};
use salience_foundation::Error;
use salience_storage::Fact;

// =============================================================================
// Trace Output
// =============================================================================

/// Where trace output should be sent as records are made.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TraceOutput {
    /// No output (traces still recorded in buffer).
    #[default]
    None,
    /// Write to stderr.
    Stderr,
    /// Forward to the `log` facade at debug level, target `salience::trace`.
    Log,
}

// =============================================================================
// Tracer Configuration
// =============================================================================

/// Configuration for the tracer.
#[derive(Clone, Debug)]
pub struct TracerConfig {
    /// Whether tracing is enabled.
    pub enabled: bool,
    /// Maximum records to keep in buffer.
    pub buffer_size: usize,
    /// Where to mirror records.
    pub output: TraceOutput,
    /// Whether to use JSON format when mirroring.
    pub json_format: bool,
    /// Event types to keep (empty = all).
    pub event_filter: Vec<String>,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            buffer_size: TraceBuffer::DEFAULT_SIZE,
            output: TraceOutput::None,
            json_format: false,
            event_filter: Vec::new(),
        }
    }
}

impl TracerConfig {
    /// Creates a new tracer configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable tracing.
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Builder method to set buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Builder method to mirror records to stderr.
    #[must_use]
    pub fn to_stderr(mut self) -> Self {
        self.output = TraceOutput::Stderr;
        self
    }

    /// Builder method to mirror records to the `log` facade.
    #[must_use]
    pub fn to_log(mut self) -> Self {
        self.output = TraceOutput::Log;
        self
    }

    /// Builder method to use JSON format.
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json_format = true;
        self
    }

    /// Builder method to keep only some event types.
    #[must_use]
    pub fn filter_events(mut self, types: Vec<String>) -> Self {
        self.event_filter = types;
        self
    }
}

// =============================================================================
// Tracer
// =============================================================================

/// Records engine events.
///
/// `record` returns immediately when tracing is disabled.
pub struct Tracer {
    config: TracerConfig,
    buffer: TraceBuffer,
    cycle: usize,
    start_time: Instant,
    human_formatter: HumanFormatter,
    json_formatter: JsonFormatter,
}

impl Tracer {
    /// Creates a new tracer with the given configuration.
    #[must_use]
    pub fn new(config: TracerConfig) -> Self {
        let buffer_size = config.buffer_size;
        Self {
            config,
            buffer: TraceBuffer::new(buffer_size),
            cycle: 0,
            start_time: Instant::now(),
            human_formatter: HumanFormatter::new(),
            json_formatter: JsonFormatter::new(),
        }
    }

    /// Creates an enabled tracer that only buffers.
    #[must_use]
    pub fn buffered() -> Self {
        Self::new(TracerConfig::new().enabled())
    }

    /// Creates a tracer with default configuration (disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(TracerConfig::default())
    }

    /// Creates an enabled tracer that outputs to stderr.
    #[must_use]
    pub fn to_stderr() -> Self {
        Self::new(TracerConfig::new().enabled().to_stderr())
    }

    /// Returns whether tracing is enabled.
    #[must_use]
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Enables tracing.
    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    /// Disables tracing.
    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    /// Returns the current firing cycle.
    #[must_use]
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Records a trace event.
    #[inline]
    pub fn record(&mut self, event: TraceEvent) {
        if !self.config.enabled {
            return;
        }
        self.record_internal(event);
    }

    fn record_internal(&mut self, event: TraceEvent) {
        if !self.config.event_filter.is_empty()
            && !self
                .config
                .event_filter
                .iter()
                .any(|t| t == event.event_type())
        {
            return;
        }

        #[allow(clippy::cast_possible_truncation)]
        let timestamp_ns = self.start_time.elapsed().as_nanos() as u64;
        self.buffer.push(self.cycle, timestamp_ns, event);

        if self.config.output == TraceOutput::None {
            return;
        }
        let Some(record) = self.buffer.last() else {
            return;
        };
        let line = self.format_record(record);
        match self.config.output {
            TraceOutput::Stderr => {
                let _ = writeln!(io::stderr(), "{line}");
            }
            TraceOutput::Log => log::debug!(target: "salience::trace", "{line}"),
            TraceOutput::None => {}
        }
    }

    /// Formats a record using the current format settings.
    #[must_use]
    pub fn format_record(&self, record: &TraceRecord) -> String {
        if self.config.json_format {
            self.json_formatter.format(record)
        } else {
            self.human_formatter.format(record)
        }
    }

    /// Formats multiple records.
    #[must_use]
    pub fn format_records(&self, records: &[&TraceRecord]) -> String {
        if self.config.json_format {
            self.json_formatter.format_many(records)
        } else {
            self.human_formatter.format_many(records)
        }
    }

    /// Returns the trace buffer.
    #[must_use]
    pub fn buffer(&self) -> &TraceBuffer {
        &self.buffer
    }

    /// Consumes the tracer, returning its buffer.
    #[must_use]
    pub fn into_buffer(self) -> TraceBuffer {
        self.buffer
    }

    /// Clears the trace buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Returns buffer statistics.
    #[must_use]
    pub fn stats(&self) -> TraceBufferStats {
        self.buffer.stats()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::disabled()
    }
}

impl FireObserver for Tracer {
    fn on_state(&mut self, state: EngineState) {
        self.record(TraceEvent::StateChange { state });
    }

    fn on_activation(&mut self, activation: &Activation) {
        self.record(TraceEvent::ActivationQueued {
            rule: activation.rule.clone(),
            branch: activation.branch,
            salience: activation.salience,
            facts: activation.facts.clone(),
        });
    }

    fn on_fire(&mut self, sequence: usize, activation: &Activation) {
        self.cycle = sequence;
        self.record(TraceEvent::RuleFiring {
            sequence,
            rule: activation.rule.clone(),
            branch: activation.branch,
            facts: activation.facts.clone(),
            bindings: activation
                .bindings
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        });
    }

    fn on_assert(&mut self, rule: &str, fact: &Fact) {
        self.record(TraceEvent::FactAsserted {
            rule: rule.into(),
            fact: fact.id(),
            text: fact.to_string(),
        });
    }

    fn on_emit(&mut self, rule: &str, line: &str) {
        self.record(TraceEvent::LineEmitted {
            rule: rule.into(),
            line: line.to_string(),
        });
    }

    fn on_halt(&mut self, firings: usize, error: Option<&Error>) {
        self.record(TraceEvent::RunHalted {
            firings,
            error: error.map(ToString::to_string),
        });
    }
}
