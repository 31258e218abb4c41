//! One-shot sessions: load, run, explain.
//!
//! A [`Session`] holds a rule base and the settings for running it. Each
//! call to [`Session::run`] loads a fresh engine, asserts the scenario, runs
//! it under a tracer, and collects everything into a [`SessionReport`].
//! Run errors do not discard the partial outcome: the report keeps the
//! facts, output, and firings produced before the halt.

use std::path::Path;

use log::{info, warn};

use salience_debug::{AuditConfig, AuditReport, TraceBuffer, Tracer, TracerConfig, WhyTrail};
use salience_engine::{Engine, EngineConfig, RuleBase, RunOutcome, Scenario};
use salience_foundation::{Error, ErrorContext, Result};

use crate::serialize;

// =============================================================================
// Session
// =============================================================================

/// A rule base plus the settings to run it with.
#[derive(Clone, Debug)]
pub struct Session {
    base: RuleBase,
    engine_config: EngineConfig,
    tracer_config: TracerConfig,
    audit_config: AuditConfig,
}

impl Session {
    /// Creates a session with default engine, tracer, and audit settings.
    /// Tracing is enabled and buffered.
    #[must_use]
    pub fn new(base: RuleBase) -> Self {
        Self {
            base,
            engine_config: EngineConfig::default(),
            tracer_config: TracerConfig::new().enabled(),
            audit_config: AuditConfig::default(),
        }
    }

    /// Builder method to set the engine configuration.
    #[must_use]
    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    /// Builder method to set the tracer configuration.
    #[must_use]
    pub fn with_tracer(mut self, config: TracerConfig) -> Self {
        self.tracer_config = config;
        self
    }

    /// Builder method to set the audit configuration.
    #[must_use]
    pub fn with_audit(mut self, config: AuditConfig) -> Self {
        self.audit_config = config;
        self
    }

    /// Returns the rule base.
    #[must_use]
    pub fn rule_base(&self) -> &RuleBase {
        &self.base
    }

    /// Runs a scenario against a freshly loaded engine.
    ///
    /// # Errors
    /// Returns load errors: an invalid rule base, an audit configuration
    /// that does not fit the audit template, or an invalid scenario fact.
    /// Nothing has run when these are returned. Errors raised while running
    /// are kept in [`SessionReport::error`] instead.
    pub fn run(&self, scenario: &Scenario) -> Result<SessionReport> {
        let mut engine = Engine::with_config(&self.base, self.engine_config.clone())?;
        let audited = self
            .audit_config
            .applies_to(engine.facts().registry())
            .map_err(|e| e.with_context(ErrorContext::new().at_load()))?;
        engine.load_scenario(scenario)?;

        let mut tracer = Tracer::new(self.tracer_config.clone());
        let error = engine.run_observed(&mut tracer).err();
        let outcome = engine.into_outcome();

        let audit = if audited {
            self.audit(&outcome)
        } else {
            None
        };

        info!(
            "session finished: {} firing(s), {} line(s){}",
            outcome.firings.len(),
            outcome.output.len(),
            if error.is_some() { ", halted on error" } else { "" }
        );

        Ok(SessionReport {
            outcome,
            error,
            audit,
            trace: tracer.into_buffer(),
        })
    }

    fn audit(&self, outcome: &RunOutcome) -> Option<(WhyTrail, AuditReport)> {
        match WhyTrail::from_outcome(outcome, &self.audit_config) {
            Ok(trail) => {
                let report = trail.check(&outcome.firings);
                if !report.is_complete() {
                    warn!("audit trail incomplete: {report}");
                }
                Some((trail, report))
            }
            Err(e) => {
                warn!("audit skipped: {e}");
                None
            }
        }
    }
}

// =============================================================================
// Session Report
// =============================================================================

/// Everything one session run produced.
#[derive(Clone, Debug)]
pub struct SessionReport {
    /// Facts, output, and firing log.
    pub outcome: RunOutcome,
    /// The error that halted the run, if any.
    pub error: Option<Error>,
    /// The audit trail and its check, if the rule base has an audit template.
    pub audit: Option<(WhyTrail, AuditReport)>,
    /// Trace records of the run.
    pub trace: TraceBuffer,
}

impl SessionReport {
    /// Returns true if the run reached quiescence without error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the audit trail.
    #[must_use]
    pub fn trail(&self) -> Option<&WhyTrail> {
        self.audit.as_ref().map(|(trail, _)| trail)
    }

    /// Returns the audit check.
    #[must_use]
    pub fn audit_report(&self) -> Option<&AuditReport> {
        self.audit.as_ref().map(|(_, report)| report)
    }

    /// Saves the outcome as a `MessagePack` snapshot.
    ///
    /// # Errors
    /// See [`serialize::save_to_file`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        serialize::save_to_file(&self.outcome, path)
    }
}
