//! Shared rule-base fragments for engine tests.

use salience_engine::{Action, Engine, RuleBase, SlotSource};
use salience_storage::{FactSpec, SlotSchema, TemplateSchema};

/// Templates shared by most engine tests.
pub fn templates() -> RuleBase {
    RuleBase::new()
        .template(TemplateSchema::new("pt").with_slot(SlotSchema::new("status", "primary")))
        .template(TemplateSchema::new("airway").with_slot(SlotSchema::symbols(
            "status",
            "unknown",
            &["patent", "obstructed", "compromised", "unknown"],
        )))
        .template(
            TemplateSchema::new("circulation")
                .with_slot(SlotSchema::new("sbp", 120))
                .with_slot(SlotSchema::new("ext_bleed", false)),
        )
        .template(
            TemplateSchema::new("disability")
                .with_slot(SlotSchema::new("gcs", 15))
                .with_slot(SlotSchema::symbols(
                    "pupils",
                    "unknown",
                    &["equal", "unequal", "unknown"],
                )),
        )
        .template(
            TemplateSchema::new("why")
                .with_slot(SlotSchema::new("rule", "none"))
                .with_slot(SlotSchema::new("reason", "none")),
        )
}

/// An action asserting an explanatory fact.
pub fn why(rule: &'static str, reason: &'static str) -> Action {
    Action::assert(
        "why",
        [
            ("rule", SlotSource::from(rule)),
            ("reason", SlotSource::from(reason)),
        ],
    )
}

/// Loads a rule base and asserts the given facts in order.
pub fn engine_with(base: &RuleBase, facts: &[FactSpec]) -> Engine {
    let mut engine = Engine::new(base).unwrap();
    for fact in facts {
        engine.assert_initial(fact).unwrap();
    }
    engine
}

/// Names of the fired rules, in order.
pub fn fired(engine: &Engine) -> Vec<String> {
    engine.firings().iter().map(|f| f.rule.to_string()).collect()
}
