//! The forward-chaining engine and its fire cycle.
//!
//! A run proceeds as:
//! 1. Match every rule against the initial facts and fill the agenda
//! 2. Select the best activation and execute its actions in order
//! 3. Match the facts that firing asserted, adding new activations
//! 4. Repeat from 2 until the agenda is empty
//!
//! Any error halts the run. The facts, output, and firing log accumulated
//! up to that point stay readable.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, trace, warn};
use salience_foundation::{Error, ErrorContext, ErrorKind, FactId, Result, SemanticLimit};
use salience_storage::{FactSpec, FactStore};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::action::{ActionEffect, ActionExecutor};
use crate::agenda::Agenda;
use crate::config::{EngineConfig, MatchMode};
use crate::observer::{FireObserver, NoopObserver};
use crate::pattern::{Bindings, PatternMatcher};
use crate::rule::compiler::RuleCompiler;
use crate::rule::{Activation, CompiledRule, RuleBase, Scenario};

// =============================================================================
// Run Records
// =============================================================================

/// Lifecycle state of an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EngineState {
    /// Loaded, accepting initial facts, not yet run.
    Idle,
    /// Computing activations.
    Matching,
    /// Executing an activation's actions.
    Firing,
    /// Run finished, normally or on error.
    Halted,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Matching => "matching",
            Self::Firing => "firing",
            Self::Halted => "halted",
        };
        write!(f, "{name}")
    }
}

/// One entry of the firing log.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FiringRecord {
    /// 1-based position in the run.
    pub sequence: usize,
    /// Rule that fired.
    pub rule: Arc<str>,
    /// `or` branch that matched.
    pub branch: usize,
    /// Rule salience.
    pub salience: i32,
    /// Matched facts, in condition order.
    pub facts: Vec<FactId>,
    /// Bindings the actions ran with.
    pub bindings: Bindings,
    /// Facts asserted by the actions.
    pub asserted: Vec<FactId>,
    /// Lines emitted by the actions.
    pub emitted: Vec<String>,
}

/// Counts describing a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rules fired.
    pub firings: usize,
    /// Facts in the store, initial facts included.
    pub facts: usize,
    /// Lines in the output stream.
    pub output_lines: usize,
}

/// Everything a run produced.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RunOutcome {
    /// Final fact store.
    pub facts: FactStore,
    /// Emitted lines, in order.
    pub output: Vec<String>,
    /// Firing log, in order.
    pub firings: Vec<FiringRecord>,
}

// =============================================================================
// Engine
// =============================================================================

/// Forward-chaining production rule engine.
///
/// # Example
///
/// ```
/// use salience_engine::{Action, Condition, Engine, RuleBase, RuleDef};
/// use salience_storage::{FactSpec, SlotSchema, TemplateSchema};
///
/// let base = RuleBase::new()
///     .template(TemplateSchema::new("circulation").with_slot(SlotSchema::new("ext_bleed", false)))
///     .rule(
///         RuleDef::new("massive-external-hemorrhage")
///             .salience(95)
///             .when(Condition::new("circulation").eq("ext_bleed", true))
///             .then(Action::emit("Apply direct pressure")),
///     );
///
/// let mut engine = Engine::new(&base).unwrap();
/// engine.assert_initial(&FactSpec::new("circulation").with("ext_bleed", true)).unwrap();
/// let summary = engine.run().unwrap();
/// assert_eq!(summary.firings, 1);
/// assert_eq!(engine.output(), ["Apply direct pressure"]);
/// ```
pub struct Engine {
    rules: Vec<CompiledRule>,
    store: FactStore,
    agenda: Agenda,
    output: Vec<String>,
    firings: Vec<FiringRecord>,
    state: EngineState,
    config: EngineConfig,
}

impl Engine {
    /// Loads a rule base with the default configuration.
    ///
    /// # Errors
    /// Returns the first load error: duplicate or invalid templates,
    /// duplicate rules, or conditions that do not fit their templates.
    pub fn new(base: &RuleBase) -> Result<Self> {
        Self::with_config(base, EngineConfig::default())
    }

    /// Loads a rule base.
    ///
    /// # Errors
    /// See [`Engine::new`].
    pub fn with_config(base: &RuleBase, config: EngineConfig) -> Result<Self> {
        let mut store = FactStore::new();
        for schema in &base.templates {
            store
                .define_template(schema.clone())
                .map_err(|e| e.with_context(ErrorContext::new().at_load()))?;
        }
        let rules = RuleCompiler::compile_all(&base.rules, store.registry())?;

        info!(
            "loaded {} template(s) and {} rule(s)",
            store.registry().len(),
            rules.len()
        );

        Ok(Self {
            rules,
            store,
            agenda: Agenda::new(),
            output: Vec::new(),
            firings: Vec::new(),
            state: EngineState::Idle,
            config,
        })
    }

    /// Asserts a fact before the run.
    ///
    /// # Errors
    /// Returns `RunCompleted` once the engine has run, or the store's error
    /// for an invalid fact.
    pub fn assert_initial(&mut self, spec: &FactSpec) -> Result<FactId> {
        if self.state != EngineState::Idle {
            return Err(Error::new(ErrorKind::RunCompleted));
        }
        let id = self
            .store
            .assert_spec(spec)
            .map_err(|e| e.with_context(ErrorContext::new().at_load()))?;
        debug!("initial {id} {}", spec.template);
        Ok(id)
    }

    /// Asserts a scenario's facts in order.
    ///
    /// # Errors
    /// See [`Engine::assert_initial`]. Facts before the failing one remain
    /// asserted.
    pub fn load_scenario(&mut self, scenario: &Scenario) -> Result<Vec<FactId>> {
        scenario
            .facts
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                self.assert_initial(spec).map_err(|e| {
                    e.with_context(ErrorContext::new().with_frame(format!("scenario fact #{index}")))
                })
            })
            .collect()
    }

    /// Runs to quiescence.
    ///
    /// # Errors
    /// Returns `RunCompleted` if the engine already ran, or the fatal error
    /// that halted the run.
    pub fn run(&mut self) -> Result<RunSummary> {
        self.run_observed(&mut NoopObserver)
    }

    /// Runs to quiescence, reporting events to an observer.
    ///
    /// # Errors
    /// See [`Engine::run`].
    pub fn run_observed(&mut self, observer: &mut dyn FireObserver) -> Result<RunSummary> {
        if self.state != EngineState::Idle {
            return Err(Error::new(ErrorKind::RunCompleted));
        }
        info!(
            "run started: {} rule(s), {} initial fact(s)",
            self.rules.len(),
            self.store.len()
        );

        let result = self.cycle(observer);
        self.transition(EngineState::Halted, observer);

        match &result {
            Ok(()) => {
                info!("run halted after {} firing(s)", self.firings.len());
                observer.on_halt(self.firings.len(), None);
            }
            Err(e) => {
                warn!("run halted after {} firing(s): {e}", self.firings.len());
                observer.on_halt(self.firings.len(), Some(e));
            }
        }
        result.map(|()| self.summary())
    }

    fn cycle(&mut self, observer: &mut dyn FireObserver) -> Result<()> {
        self.transition(EngineState::Matching, observer);
        let initial = self.match_all()?;
        self.enqueue(initial, observer);

        while let Some(next) = self.agenda.peek() {
            // Over the limit, the next activation stays pending.
            if let Some(limit) = self.config.max_firings {
                if self.firings.len() >= limit {
                    return Err(Error::limit_exceeded(SemanticLimit::MaxFirings {
                        limit,
                        rule: Some(next.rule.to_string()),
                    }));
                }
            }
            let Some(activation) = self.agenda.select_next() else {
                break;
            };
            self.transition(EngineState::Firing, observer);
            let asserted = self.fire(&activation, observer)?;

            self.transition(EngineState::Matching, observer);
            let batch = self.rematch(&asserted)?;
            self.enqueue(batch, observer);
        }
        Ok(())
    }

    fn fire(&mut self, activation: &Activation, observer: &mut dyn FireObserver) -> Result<Vec<FactId>> {
        let sequence = self.firings.len() + 1;
        debug!("fire #{sequence} {activation} [{}]", activation.bindings);
        observer.on_fire(sequence, activation);

        let rule = &self.rules[activation.rule_index];
        let mut executor = ActionExecutor::new(&mut self.store, &mut self.output);
        let mut asserted = Vec::new();
        let mut emitted = Vec::new();

        for (index, action) in rule.actions.iter().enumerate() {
            let effect = executor
                .execute(action, &activation.bindings)
                .map_err(|e| e.with_context(ErrorContext::rule(&*rule.name).with_action(index)))?;
            match effect {
                ActionEffect::Emitted(line) => {
                    debug!("{} emitted: {line}", rule.name);
                    observer.on_emit(&rule.name, &line);
                    emitted.push(line);
                }
                ActionEffect::Asserted(id) => {
                    if let Some(fact) = executor.store().get(id) {
                        debug!("{} asserted {fact}", rule.name);
                        observer.on_assert(&rule.name, fact);
                    }
                    asserted.push(id);
                }
            }
        }

        self.firings.push(FiringRecord {
            sequence,
            rule: rule.name.clone(),
            branch: activation.branch,
            salience: activation.salience,
            facts: activation.facts.clone(),
            bindings: activation.bindings.clone(),
            asserted: asserted.clone(),
            emitted,
        });
        Ok(asserted)
    }

    fn match_all(&self) -> Result<Vec<Activation>> {
        let mut batch = Vec::new();
        for rule in &self.rules {
            trace!("matching {} against {} fact(s)", rule.name, self.store.len());
            batch.extend(
                PatternMatcher::match_rule(rule, &self.store)
                    .map_err(|e| e.with_context(ErrorContext::rule(&*rule.name)))?,
            );
        }
        Ok(batch)
    }

    fn rematch(&self, asserted: &[FactId]) -> Result<Vec<Activation>> {
        if asserted.is_empty() {
            return Ok(Vec::new());
        }
        if self.config.match_mode == MatchMode::Full {
            return self.match_all();
        }

        let mut batch = Vec::new();
        for &id in asserted {
            let Some(fact) = self.store.get(id) else {
                continue;
            };
            for rule in self.rules.iter().filter(|r| r.watches(fact.template_name())) {
                trace!("matching {} against {id}", rule.name);
                batch.extend(
                    PatternMatcher::match_delta(rule, &self.store, id)
                        .map_err(|e| e.with_context(ErrorContext::rule(&*rule.name)))?,
                );
            }
        }
        Ok(batch)
    }

    /// Queues a batch in canonical order so both match modes agree on
    /// insertion sequence.
    fn enqueue(&mut self, mut batch: Vec<Activation>, observer: &mut dyn FireObserver) {
        batch.sort_by_cached_key(Activation::key);
        for activation in batch {
            if self.agenda.push(activation.clone()) {
                trace!("queued {activation}");
                observer.on_activation(&activation);
            }
        }
    }

    fn transition(&mut self, state: EngineState, observer: &mut dyn FireObserver) {
        if self.state != state {
            trace!("{} -> {state}", self.state);
            self.state = state;
            observer.on_state(state);
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the compiled rules, in rule-base order.
    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Returns the fact store.
    #[must_use]
    pub fn facts(&self) -> &FactStore {
        &self.store
    }

    /// Returns the pending agenda.
    #[must_use]
    pub fn agenda(&self) -> &Agenda {
        &self.agenda
    }

    /// Returns the lines emitted so far.
    #[must_use]
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Returns the firing log.
    #[must_use]
    pub fn firings(&self) -> &[FiringRecord] {
        &self.firings
    }

    /// Returns counts for the run so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            firings: self.firings.len(),
            facts: self.store.len(),
            output_lines: self.output.len(),
        }
    }

    /// Copies out the run's results.
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        RunOutcome {
            facts: self.store.clone(),
            output: self.output.clone(),
            firings: self.firings.clone(),
        }
    }

    /// Consumes the engine, returning the run's results.
    #[must_use]
    pub fn into_outcome(self) -> RunOutcome {
        RunOutcome {
            facts: self.store,
            output: self.output,
            firings: self.firings,
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("rules", &self.rules.len())
            .field("facts", &self.store.len())
            .field("pending", &self.agenda.len())
            .field("firings", &self.firings.len())
            .finish_non_exhaustive()
    }
}
