//! Integration tests for the fire cycle, observers, and run errors

use salience_engine::{
    Action, Activation, Condition, DEFAULT_MAX_FIRINGS, Engine, EngineConfig, EngineState,
    FireObserver, RuleDef, Scenario, SlotSource, TextPart,
};
use salience_foundation::{Error, ErrorKind, FactId, SemanticLimit, Value};
use salience_storage::{Fact, FactSpec};

use crate::common::{engine_with, fired, templates, why};

#[derive(Default)]
struct Counter {
    states: Vec<EngineState>,
    queued: usize,
    fired: Vec<usize>,
    asserted: Vec<FactId>,
    emitted: Vec<String>,
    halted: Option<(usize, bool)>,
}

impl FireObserver for Counter {
    fn on_state(&mut self, state: EngineState) {
        self.states.push(state);
    }

    fn on_activation(&mut self, _activation: &Activation) {
        self.queued += 1;
    }

    fn on_fire(&mut self, sequence: usize, _activation: &Activation) {
        self.fired.push(sequence);
    }

    fn on_assert(&mut self, _rule: &str, fact: &Fact) {
        self.asserted.push(fact.id());
    }

    fn on_emit(&mut self, rule: &str, line: &str) {
        self.emitted.push(format!("{rule}: {line}"));
    }

    fn on_halt(&mut self, firings: usize, error: Option<&Error>) {
        self.halted = Some((firings, error.is_some()));
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn engine_starts_idle_and_ends_halted() {
    let base = templates().rule(
        RuleDef::new("start-primary")
            .when(Condition::new("pt"))
            .then(Action::emit("primary")),
    );
    let mut engine = engine_with(&base, &[FactSpec::new("pt")]);
    assert_eq!(engine.state(), EngineState::Idle);
    assert_eq!(engine.agenda().len(), 0);

    let mut counter = Counter::default();
    engine.run_observed(&mut counter).unwrap();

    assert_eq!(engine.state(), EngineState::Halted);
    assert!(engine.agenda().is_empty());
    assert_eq!(
        counter.states,
        [
            EngineState::Matching,
            EngineState::Firing,
            EngineState::Matching,
            EngineState::Halted,
        ]
    );
    assert_eq!(counter.halted, Some((1, false)));
}

#[test]
fn empty_rule_base_halts_immediately() {
    let mut engine = engine_with(&templates(), &[FactSpec::new("pt")]);
    let summary = engine.run().unwrap();
    assert_eq!(summary.firings, 0);
    assert_eq!(summary.facts, 1);
    assert_eq!(summary.output_lines, 0);
}

#[test]
fn observer_sees_every_effect() {
    let base = templates()
        .rule(
            RuleDef::new("hypotension-resuscitation")
                .salience(92)
                .when(Condition::new("circulation").test(
                    "sbp",
                    "sbp",
                    salience_engine::Expr::var("sbp").lt(90),
                ))
                .then(Action::emit("2 large-bore IVs"))
                .then(why("hypotension-resuscitation", "sbp-below-90")),
        )
        .rule(
            RuleDef::new("report")
                .when(Condition::new("why").bind("rule", "r"))
                .then(Action::emit_parts([
                    TextPart::Text("logged ".to_string()),
                    TextPart::Var("r".to_string()),
                ])),
        );
    let mut engine = engine_with(&base, &[FactSpec::new("circulation").with("sbp", 70)]);
    let mut counter = Counter::default();
    engine.run_observed(&mut counter).unwrap();

    assert_eq!(counter.queued, 2);
    assert_eq!(counter.fired, [1, 2]);
    assert_eq!(counter.asserted, [FactId::new(2)]);
    assert_eq!(
        counter.emitted,
        [
            "hypotension-resuscitation: 2 large-bore IVs",
            "report: logged hypotension-resuscitation",
        ]
    );
}

#[test]
fn failing_action_keeps_earlier_effects() {
    let base = templates().rule(
        RuleDef::new("copy-sbp")
            .when(Condition::new("circulation").bind("sbp", "sbp"))
            .then(Action::emit_parts([TextPart::Var("sbp".to_string())]))
            .then(Action::assert(
                "why",
                [
                    ("rule", SlotSource::from("copy-sbp")),
                    ("reason", SlotSource::var("sbp")),
                ],
            )),
    );
    // The reason slot is a symbol; binding an integer into it is a run error.
    let mut engine = engine_with(&base, &[FactSpec::new("circulation").with("sbp", 70)]);
    let err = engine.run().unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SlotTypeMismatch { .. }));
    assert_eq!(err.rule(), Some("copy-sbp"));
    assert_eq!(err.action(), Some(1));
    assert_eq!(engine.output(), ["70"]);
    assert!(engine.firings().is_empty());
}

#[test]
fn assert_substitutes_bound_values() {
    let base = templates()
        .rule(
            RuleDef::new("label")
                .salience(10)
                .when(Condition::new("airway").bind("status", "s"))
                .then(Action::assert(
                    "why",
                    [
                        ("rule", SlotSource::from("label")),
                        ("reason", SlotSource::var("s")),
                    ],
                )),
        );
    let mut engine = engine_with(&base, &[FactSpec::new("airway").with("status", "obstructed")]);
    engine.run().unwrap();

    let record = &engine.firings()[0];
    assert_eq!(record.asserted, [FactId::new(2)]);
    let fact = engine.facts().get(FactId::new(2)).unwrap();
    assert_eq!(fact.get("reason"), Some(&Value::from("obstructed")));
    assert_eq!(fact.to_string(), "(f-2 why (rule label) (reason obstructed))");
}

// =============================================================================
// Scenario loading
// =============================================================================

#[test]
fn scenario_facts_are_asserted_in_order() {
    let mut engine = Engine::new(&templates()).unwrap();
    let ids = engine
        .load_scenario(
            &Scenario::new()
                .fact(FactSpec::new("pt"))
                .fact(FactSpec::new("airway").with("status", "obstructed")),
        )
        .unwrap();
    assert_eq!(ids, [FactId::new(1), FactId::new(2)]);
}

#[test]
fn bad_scenario_fact_names_its_position() {
    let mut engine = Engine::new(&templates()).unwrap();
    let err = engine
        .load_scenario(
            &Scenario::new()
                .fact(FactSpec::new("pt"))
                .fact(FactSpec::new("airway").with("status", "blocked")),
        )
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::DisallowedValue { .. }));
    assert!(err.to_string().contains("scenario fact #1"));
    assert_eq!(engine.facts().len(), 1);
}

#[test]
fn engine_runs_only_once() {
    let mut engine = Engine::new(&templates()).unwrap();
    engine.run().unwrap();
    assert!(matches!(engine.run().unwrap_err().kind, ErrorKind::RunCompleted));
    assert!(matches!(
        engine.assert_initial(&FactSpec::new("pt")).unwrap_err().kind,
        ErrorKind::RunCompleted
    ));
}

// =============================================================================
// Kill switch
// =============================================================================

fn runaway() -> salience_engine::RuleBase {
    templates().rule(
        RuleDef::new("runaway")
            .when(Condition::new("pt"))
            .then(Action::assert("pt", Vec::<(&str, SlotSource)>::new())),
    )
}

#[test]
fn default_configuration_has_a_kill_switch() {
    assert_eq!(EngineConfig::default().max_firings, Some(DEFAULT_MAX_FIRINGS));

    let mut engine = engine_with(&runaway(), &[FactSpec::new("pt")]);
    let err = engine.run().unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(SemanticLimit::MaxFirings { limit: DEFAULT_MAX_FIRINGS, .. })
    ));
    assert_eq!(engine.firings().len(), DEFAULT_MAX_FIRINGS);
}

#[test]
fn custom_limit_is_respected() {
    let mut engine =
        Engine::with_config(&runaway(), EngineConfig::new().max_firings(3)).unwrap();
    engine.assert_initial(&FactSpec::new("pt")).unwrap();

    let mut counter = Counter::default();
    let err = engine.run_observed(&mut counter).unwrap_err();
    assert!(err.to_string().contains("runaway"));
    assert_eq!(fired(&engine), ["runaway", "runaway", "runaway"]);
    assert_eq!(counter.halted, Some((3, true)));
    assert_eq!(engine.facts().len(), 4);
}

#[test]
fn limit_leaves_the_next_activation_pending() {
    let mut engine =
        Engine::with_config(&runaway(), EngineConfig::new().max_firings(3)).unwrap();
    engine.assert_initial(&FactSpec::new("pt")).unwrap();
    let err = engine.run().unwrap_err();

    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(SemanticLimit::MaxFirings { limit: 3, .. })
    ));
    assert_eq!(engine.firings().len(), 3);
    assert_eq!(engine.agenda().selected(), 3);
    assert_eq!(engine.agenda().len(), 1);
    let pending = engine.agenda().peek().unwrap();
    assert_eq!(&*pending.rule, "runaway");
    assert_eq!(pending.facts, [FactId::new(4)]);
}
