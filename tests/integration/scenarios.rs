//! End-to-end runs of the trauma rule base.

use salience_engine::{Engine, EngineConfig, MatchMode, RunOutcome};
use salience_foundation::{FactId, Value};

use crate::atls::{Patient, reference_patient, rule_base};

fn run(patient: &Patient) -> RunOutcome {
    run_with(patient, EngineConfig::default())
}

fn run_with(patient: &Patient, config: EngineConfig) -> RunOutcome {
    let mut engine = Engine::with_config(&rule_base(), config).unwrap();
    engine.load_scenario(&patient.scenario()).unwrap();
    engine.run().unwrap();
    engine.into_outcome()
}

fn fired(outcome: &RunOutcome) -> Vec<&str> {
    outcome.firings.iter().map(|f| &*f.rule).collect()
}

// =============================================================================
// Reference Patient
// =============================================================================

#[test]
fn reference_patient_firing_order() {
    let outcome = run(&reference_patient());
    assert_eq!(
        fired(&outcome),
        [
            "start-primary",
            "airway-obstructed",
            "cspine-immobilize",
            "hypotension-resuscitation",
            "exposure-steps",
            "prepare-transfer",
            "prepare-transfer",
        ]
    );
}

#[test]
fn reference_patient_transfer_branches() {
    let outcome = run(&reference_patient());
    let transfers: Vec<_> = outcome
        .firings
        .iter()
        .filter(|f| &*f.rule == "prepare-transfer")
        .map(|f| (f.branch, f.facts.clone()))
        .collect();

    // Low SBP (f-5) is more recent than the obstructed airway (f-2).
    assert_eq!(
        transfers,
        [(0, vec![FactId::new(5)]), (2, vec![FactId::new(2)])]
    );
}

#[test]
fn reference_patient_output() {
    let outcome = run(&reference_patient());
    assert_eq!(outcome.output.len(), 7);
    assert!(outcome.output[0].starts_with("PRIMARY SURVEY"));
    assert!(outcome.output[1].starts_with("A) AIRWAY OBSTRUCTED"));
    assert_eq!(
        outcome.output[3],
        "C) SHOCK: SBP 70; two large-bore IVs; balanced resuscitation"
    );
    assert!(outcome.output[4].starts_with("E) EXPOSURE"));
    assert!(outcome.output[5].starts_with("CONSIDER TRANSFER"));
    assert_eq!(outcome.output[5], outcome.output[6]);
}

#[test]
fn reference_patient_asserts_one_why_per_firing() {
    let outcome = run(&reference_patient());
    let whys: Vec<_> = outcome.facts.facts_of("why").collect();
    assert_eq!(whys.len(), 7);
    assert_eq!(outcome.facts.len(), 14);

    for (firing, fact) in outcome.firings.iter().zip(&whys) {
        assert_eq!(firing.asserted, [fact.id()]);
        assert_eq!(fact.get("rule"), Some(&Value::symbol(&*firing.rule)));
    }
}

#[test]
fn firing_log_records_bindings() {
    let outcome = run(&reference_patient());
    let shock = &outcome.firings[3];
    assert_eq!(&*shock.rule, "hypotension-resuscitation");
    assert_eq!(shock.salience, 92);
    assert_eq!(shock.bindings.get("sbp"), Some(&Value::Int(70)));
    assert_eq!(shock.emitted, [outcome.output[3].clone()]);
}

// =============================================================================
// Other Patients
// =============================================================================

#[test]
fn stable_patient_proceeds_to_secondary() {
    let outcome = run(&Patient::default());
    assert_eq!(
        fired(&outcome),
        ["start-primary", "exposure-steps", "proceed-secondary"]
    );
}

#[test]
fn compromised_airway_still_allows_secondary() {
    let outcome = run(&Patient {
        airway: "compromised",
        ..Patient::default()
    });
    assert_eq!(
        fired(&outcome),
        [
            "start-primary",
            "airway-compromised-or-gcs",
            "exposure-steps",
            "proceed-secondary",
        ]
    );
}

#[test]
fn low_gcs_fires_both_airway_and_neuro_rules() {
    let outcome = run(&Patient {
        gcs: 7,
        pupils: "unequal",
        ..Patient::default()
    });
    let rules = fired(&outcome);
    assert_eq!(rules.iter().filter(|r| **r == "airway-compromised-or-gcs").count(), 1);
    // GCS < 13 and unequal pupils are separate branches on the same fact.
    assert_eq!(rules.iter().filter(|r| **r == "neuro-red-flags").count(), 2);
}

#[test]
fn tension_pneumothorax_blocks_secondary() {
    let outcome = run(&Patient {
        tension_ptx: true,
        resp_distress: true,
        ..Patient::default()
    });
    let rules = fired(&outcome);
    assert!(rules.contains(&"tension-pneumothorax"));
    assert!(rules.contains(&"flail-chest-or-distress"));
    assert!(rules.contains(&"prepare-transfer"));
    assert!(!rules.contains(&"proceed-secondary"));
}

#[test]
fn circulation_and_exposure_findings() {
    let outcome = run(&Patient {
        ext_bleed: true,
        pelvic_unstable: true,
        hypothermia: true,
        ..Patient::default()
    });
    assert_eq!(
        fired(&outcome),
        [
            "start-primary",
            "massive-external-hemorrhage",
            "pelvic-instability",
            "exposure-steps",
            "hypothermia-manage",
            "proceed-secondary",
        ]
    );
}

#[test]
fn sbp_boundary_is_not_hypotension() {
    let outcome = run(&Patient {
        sbp: 90,
        ..Patient::default()
    });
    let rules = fired(&outcome);
    assert!(!rules.contains(&"hypotension-resuscitation"));
    assert!(rules.contains(&"proceed-secondary"));
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn repeated_runs_are_identical() {
    let first = run(&reference_patient());
    let second = run(&reference_patient());
    assert_eq!(first.output, second.output);
    assert_eq!(first.firings, second.firings);
}

#[test]
fn match_modes_agree() {
    let patients = [
        reference_patient(),
        Patient::default(),
        Patient {
            gcs: 6,
            pupils: "unequal",
            tension_ptx: true,
            sbp: 80,
            hypothermia: true,
            ..Patient::default()
        },
    ];
    for patient in &patients {
        let incremental = run_with(patient, EngineConfig::new().match_mode(MatchMode::Incremental));
        let full = run_with(patient, EngineConfig::new().match_mode(MatchMode::Full));
        assert_eq!(incremental.output, full.output);
        assert_eq!(incremental.firings, full.firings);
    }
}
