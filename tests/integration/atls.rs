//! A trauma primary-survey rule base (ABCDE) used as a fixture.
//!
//! Every rule emits one instruction and asserts one `why` fact naming
//! itself and its justification.

use salience_engine::{
    Action, Condition, Expr, RuleBase, RuleDef, Scenario, SlotSource, TextPart,
};
use salience_storage::{FactSpec, SlotSchema, TemplateSchema};

fn why(rule: &'static str, reason: &'static str) -> Action {
    Action::assert(
        "why",
        [
            ("rule", SlotSource::from(rule)),
            ("reason", SlotSource::from(reason)),
        ],
    )
}

fn rule(name: &'static str, salience: i32, text: &str, reason: &'static str) -> RuleDef {
    RuleDef::new(name)
        .salience(salience)
        .then(Action::emit(text))
        .then(why(name, reason))
}

fn flag(template: &str, slot: &str) -> Condition {
    Condition::new(template).eq(slot, true)
}

fn low_sbp() -> Condition {
    Condition::new("circulation").test("sbp", "sbp", Expr::var("sbp").lt(90))
}

/// Templates of the rule base.
pub fn templates() -> Vec<TemplateSchema> {
    vec![
        TemplateSchema::new("pt").with_slot(SlotSchema::symbols(
            "status",
            "primary",
            &["primary", "secondary", "transfer"],
        )),
        TemplateSchema::new("airway").with_slot(SlotSchema::symbols(
            "status",
            "unknown",
            &["patent", "obstructed", "compromised", "unknown"],
        )),
        TemplateSchema::new("cspine").with_slot(SlotSchema::symbols(
            "risk",
            "unknown",
            &["yes", "no", "unknown"],
        )),
        TemplateSchema::new("breathing")
            .with_slot(SlotSchema::new("tension_ptx", false))
            .with_slot(SlotSchema::new("open_ptx", false))
            .with_slot(SlotSchema::new("flail", false))
            .with_slot(SlotSchema::new("resp_distress", false)),
        TemplateSchema::new("circulation")
            .with_slot(SlotSchema::new("sbp", 120))
            .with_slot(SlotSchema::new("ext_bleed", false))
            .with_slot(SlotSchema::new("pelvic_unstable", false)),
        TemplateSchema::new("disability")
            .with_slot(SlotSchema::new("gcs", 15))
            .with_slot(SlotSchema::symbols(
                "pupils",
                "unknown",
                &["equal", "unequal", "unknown"],
            )),
        TemplateSchema::new("exposure")
            .with_slot(SlotSchema::new("hypothermia", false))
            .with_slot(SlotSchema::new("burns", false)),
        TemplateSchema::new("why")
            .with_slot(SlotSchema::new("rule", "none"))
            .with_slot(SlotSchema::new("reason", "none")),
    ]
}

/// The full rule base.
pub fn rule_base() -> RuleBase {
    let mut base = RuleBase::new();
    for schema in templates() {
        base = base.template(schema);
    }

    base.rule(
        rule(
            "start-primary",
            120,
            "PRIMARY SURVEY: follow ABCDE, life threats first",
            "primary survey begins",
        )
        .when(Condition::new("pt").eq("status", "primary")),
    )
    .rule(
        rule(
            "airway-obstructed",
            110,
            "A) AIRWAY OBSTRUCTED: jaw thrust, suction, adjunct; prepare intubation",
            "obstructed airway threatens oxygenation",
        )
        .when(Condition::new("airway").eq("status", "obstructed")),
    )
    .rule(
        rule(
            "airway-compromised-or-gcs",
            105,
            "A) DEFINITIVE AIRWAY: consider RSI",
            "airway unprotected or GCS <= 8",
        )
        .when_any([
            vec![Condition::new("airway").eq("status", "compromised")],
            vec![Condition::new("disability").test("gcs", "gcs", Expr::var("gcs").le(8))],
        ]),
    )
    .rule(
        rule(
            "cspine-immobilize",
            100,
            "A) C-SPINE: maintain immobilization",
            "mechanism suggests cervical spine risk",
        )
        .when(Condition::new("cspine").eq("risk", "yes")),
    )
    .rule(
        rule(
            "tension-pneumothorax",
            98,
            "B) TENSION PNEUMOTHORAX: needle decompression, then chest tube",
            "life-threatening ventilatory compromise",
        )
        .when(flag("breathing", "tension_ptx")),
    )
    .rule(
        rule(
            "open-pneumothorax",
            97,
            "B) OPEN PNEUMOTHORAX: three-sided occlusive dressing; chest tube",
            "sucking chest wound impairs ventilation",
        )
        .when(flag("breathing", "open_ptx")),
    )
    .rule(
        rule(
            "flail-chest-or-distress",
            96,
            "B) CHEST INJURY: oxygen, analgesia; consider ventilation support",
            "impaired ventilation requires support",
        )
        .when_any([
            vec![flag("breathing", "flail")],
            vec![flag("breathing", "resp_distress")],
        ]),
    )
    .rule(
        rule(
            "massive-external-hemorrhage",
            95,
            "C) EXTERNAL HEMORRHAGE: direct pressure; tourniquet if needed",
            "stop external bleeding immediately",
        )
        .when(flag("circulation", "ext_bleed")),
    )
    .rule(
        RuleDef::new("hypotension-resuscitation")
            .salience(92)
            .when(low_sbp())
            .then(Action::emit_parts([
                TextPart::Text("C) SHOCK: SBP ".to_string()),
                TextPart::Var("sbp".to_string()),
                TextPart::Text("; two large-bore IVs; balanced resuscitation".to_string()),
            ]))
            .then(why("hypotension-resuscitation", "SBP below 90 suggests shock")),
    )
    .rule(
        rule(
            "pelvic-instability",
            90,
            "C) PELVIS UNSTABLE: apply pelvic binder",
            "pelvic ring injuries bleed significantly",
        )
        .when(flag("circulation", "pelvic_unstable")),
    )
    .rule(
        rule(
            "neuro-red-flags",
            85,
            "D) NEURO: frequent neuro checks; head CT when stable",
            "low GCS or unequal pupils suggest brain injury",
        )
        .when_any([
            vec![Condition::new("disability").test("gcs", "gcs", Expr::var("gcs").lt(13))],
            vec![Condition::new("disability").eq("pupils", "unequal")],
        ]),
    )
    .rule(rule(
        "exposure-steps",
        80,
        "E) EXPOSURE: fully expose, then prevent hypothermia",
        "hidden injuries and thermal protection",
    ))
    .rule(
        rule(
            "hypothermia-manage",
            75,
            "E) HYPOTHERMIA: remove wet clothing; warmed fluids",
            "hypothermia worsens coagulopathy",
        )
        .when(flag("exposure", "hypothermia")),
    )
    .rule(
        rule(
            "proceed-secondary",
            70,
            "SECONDARY SURVEY: head-to-toe exam",
            "stable enough for secondary survey",
        )
        .when(Condition::new("airway").one_of("status", ["patent", "compromised"]))
        .when(
            Condition::new("breathing")
                .eq("tension_ptx", false)
                .eq("open_ptx", false),
        )
        .when(Condition::new("circulation").test("sbp", "sbp", Expr::var("sbp").ge(90))),
    )
    .rule(
        rule(
            "prepare-transfer",
            65,
            "CONSIDER TRANSFER: prepare rapid transfer to a trauma center",
            "persistent life threat",
        )
        .when_any([
            vec![low_sbp()],
            vec![flag("breathing", "tension_ptx")],
            vec![Condition::new("airway").eq("status", "obstructed")],
        ]),
    )
}

/// Builds a patient scenario from the thirteen findings.
pub struct Patient {
    pub airway: &'static str,
    pub cspine: &'static str,
    pub tension_ptx: bool,
    pub open_ptx: bool,
    pub flail: bool,
    pub resp_distress: bool,
    pub sbp: i64,
    pub ext_bleed: bool,
    pub pelvic_unstable: bool,
    pub gcs: i64,
    pub pupils: &'static str,
    pub hypothermia: bool,
    pub burns: bool,
}

impl Default for Patient {
    fn default() -> Self {
        Self {
            airway: "patent",
            cspine: "no",
            tension_ptx: false,
            open_ptx: false,
            flail: false,
            resp_distress: false,
            sbp: 120,
            ext_bleed: false,
            pelvic_unstable: false,
            gcs: 15,
            pupils: "equal",
            hypothermia: false,
            burns: false,
        }
    }
}

impl Patient {
    /// The initial facts, in assertion order.
    pub fn scenario(&self) -> Scenario {
        Scenario::new()
            .fact(FactSpec::new("pt").with("status", "primary"))
            .fact(FactSpec::new("airway").with("status", self.airway))
            .fact(FactSpec::new("cspine").with("risk", self.cspine))
            .fact(
                FactSpec::new("breathing")
                    .with("tension_ptx", self.tension_ptx)
                    .with("open_ptx", self.open_ptx)
                    .with("flail", self.flail)
                    .with("resp_distress", self.resp_distress),
            )
            .fact(
                FactSpec::new("circulation")
                    .with("sbp", self.sbp)
                    .with("ext_bleed", self.ext_bleed)
                    .with("pelvic_unstable", self.pelvic_unstable),
            )
            .fact(
                FactSpec::new("disability")
                    .with("gcs", self.gcs)
                    .with("pupils", self.pupils),
            )
            .fact(
                FactSpec::new("exposure")
                    .with("hypothermia", self.hypothermia)
                    .with("burns", self.burns),
            )
    }
}

/// Obstructed airway, C-spine risk, SBP 70; everything else normal.
pub fn reference_patient() -> Patient {
    Patient {
        airway: "obstructed",
        cspine: "yes",
        sbp: 70,
        ..Patient::default()
    }
}
