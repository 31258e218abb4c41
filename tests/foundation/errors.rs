//! Integration tests for Error types
//!
//! Tests error construction, display, context, and error kinds.

use salience_foundation::{Error, ErrorContext, ErrorKind, SemanticLimit, Value};

// =============================================================================
// Error Construction
// =============================================================================

#[test]
fn error_unknown_template() {
    let err = Error::unknown_template("triage");
    assert!(matches!(err.kind, ErrorKind::UnknownTemplate(ref name) if name == "triage"));
    assert_eq!(err.to_string(), "unknown template: triage");
}

#[test]
fn error_unknown_slot() {
    let err = Error::unknown_slot("disability", "pupil");
    assert!(matches!(err.kind, ErrorKind::UnknownSlot { .. }));
    let msg = err.to_string();
    assert!(msg.contains("disability"));
    assert!(msg.contains("pupil"));
}

#[test]
fn error_unbound_variable() {
    let err = Error::unbound_variable("sbp");
    assert_eq!(err.to_string(), "unbound variable: ?sbp");
}

#[test]
fn error_predicate() {
    let err = Error::predicate("< needs integers, got primary");
    assert!(matches!(err.kind, ErrorKind::PredicateEvaluation(_)));
    assert!(err.to_string().contains("primary"));
}

#[test]
fn error_limit_exceeded() {
    let err = Error::limit_exceeded(SemanticLimit::MaxFirings {
        limit: 10,
        rule: Some("runaway".to_string()),
    });
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(SemanticLimit::MaxFirings { limit: 10, .. })
    ));
    let msg = err.to_string();
    assert!(msg.contains("10"));
    assert!(msg.contains("runaway"));
}

#[test]
fn error_slot_type_mismatch() {
    let err = Error::new(ErrorKind::SlotTypeMismatch {
        template: "circulation".to_string(),
        slot: "sbp".to_string(),
        expected: salience_foundation::Type::Int,
        actual: salience_foundation::Type::Symbol,
    });
    assert_eq!(
        err.to_string(),
        "slot circulation.sbp expects integer, got symbol"
    );
}

#[test]
fn error_disallowed_value() {
    let err = Error::new(ErrorKind::DisallowedValue {
        template: "airway".to_string(),
        slot: "status".to_string(),
        value: Value::from("obstruced"),
    });
    assert!(err.to_string().contains("obstruced"));
}

// =============================================================================
// Error Context
// =============================================================================

#[test]
fn context_names_rule_and_action() {
    let err = Error::unknown_template("triage")
        .with_context(ErrorContext::rule("prepare-transfer").with_action(1));
    assert_eq!(err.rule(), Some("prepare-transfer"));
    assert_eq!(err.action(), Some(1));
    assert_eq!(
        err.to_string(),
        "unknown template: triage in rule prepare-transfer action #1"
    );
}

#[test]
fn context_frames_are_rendered() {
    let err = Error::unknown_template("triage")
        .with_context(ErrorContext::new().with_frame("scenario fact #3"));
    assert!(err.to_string().ends_with("(in scenario fact #3)"));
    assert_eq!(err.rule(), None);
}

#[test]
fn inner_context_is_kept() {
    let err = Error::unbound_variable("gcs")
        .with_context(ErrorContext::rule("neuro-red-flags").with_condition(0))
        .with_context(ErrorContext::rule("outer").at_load());
    assert_eq!(err.rule(), Some("neuro-red-flags"));
    assert!(err.is_load_error());
}

#[test]
fn run_errors_are_not_load_errors() {
    assert!(!Error::new(ErrorKind::RunCompleted).is_load_error());
    assert!(!Error::unbound_variable("x").is_load_error());
    assert!(Error::new(ErrorKind::DuplicateRule("r".to_string())).is_load_error());
}

#[test]
fn errors_clone() {
    let err = Error::unknown_slot("why", "because").with_context(ErrorContext::rule("r"));
    let copy = err.clone();
    assert_eq!(copy.to_string(), err.to_string());
}
