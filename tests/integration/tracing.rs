//! Tracing a full run.

use salience_debug::{
    HumanFormatter, JsonFormatter, TraceEvent, TraceFormatter, Tracer, TracerConfig,
};
use salience_engine::{Engine, EngineState};

use crate::atls::{reference_patient, rule_base};

fn traced(config: TracerConfig) -> Tracer {
    let mut engine = Engine::new(&rule_base()).unwrap();
    engine.load_scenario(&reference_patient().scenario()).unwrap();
    let mut tracer = Tracer::new(config);
    engine.run_observed(&mut tracer).unwrap();
    tracer
}

#[test]
fn event_counts() {
    let tracer = traced(TracerConfig::new().enabled());
    let stats = tracer.stats();

    assert_eq!(stats.event_counts.get("activation-queued"), Some(&7));
    assert_eq!(stats.event_counts.get("rule-firing"), Some(&7));
    assert_eq!(stats.event_counts.get("fact-asserted"), Some(&7));
    assert_eq!(stats.event_counts.get("line-emitted"), Some(&7));
    // matching, then firing/matching per firing, then halted
    assert_eq!(stats.event_counts.get("state-change"), Some(&16));
    assert_eq!(stats.last_cycle, Some(7));
    assert_eq!(tracer.cycle(), 7);
}

#[test]
fn run_ends_with_halt() {
    let tracer = traced(TracerConfig::new().enabled());
    let records: Vec<_> = tracer.buffer().iter().collect();
    let n = records.len();

    assert_eq!(
        records[n - 2].event,
        TraceEvent::StateChange {
            state: EngineState::Halted
        }
    );
    assert_eq!(
        records[n - 1].event,
        TraceEvent::RunHalted {
            firings: 7,
            error: None
        }
    );
}

#[test]
fn human_format_of_one_cycle() {
    let tracer = traced(TracerConfig::new().enabled());
    let cycle = tracer.buffer().records_for_cycle(4);
    let lines: Vec<_> = cycle
        .iter()
        .map(|r| HumanFormatter::new().format(r))
        .collect();

    assert_eq!(lines[0], "C0004 FIRE 4 hypotension-resuscitation#0 f-5 {?sbp=70}");
    assert_eq!(
        lines[1],
        "C0004     >> C) SHOCK: SBP 70; two large-bore IVs; balanced resuscitation"
    );
    assert!(lines[2].starts_with("C0004     ==> f-11 (f-11 why (rule hypotension-resuscitation)"));
    assert_eq!(lines[3], "C0004 -- matching");
}

#[test]
fn per_rule_records() {
    let tracer = traced(TracerConfig::new().enabled());
    let transfer = tracer.buffer().by_rule("prepare-transfer");
    let firings: Vec<_> = transfer
        .iter()
        .filter_map(|r| match &r.event {
            TraceEvent::RuleFiring {
                sequence, branch, ..
            } => Some((*sequence, *branch)),
            _ => None,
        })
        .collect();
    assert_eq!(firings, [(6, 0), (7, 2)]);
}

#[test]
fn json_records_parse() {
    let tracer = traced(TracerConfig::new().enabled().json());
    let firings = tracer.buffer().by_event_type("rule-firing");
    let rendered = tracer.format_records(&firings);

    let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 7);
    assert_eq!(items[0]["event"], "rule-firing");
    assert_eq!(items[0]["rule"], "start-primary");
    assert_eq!(items[6]["branch"], 2);
    assert_eq!(
        JsonFormatter::new().format(firings[0]),
        serde_json::to_string(firings[0]).unwrap()
    );
}

#[test]
fn filtered_tracer_keeps_only_emitted_lines() {
    let tracer = traced(
        TracerConfig::new()
            .enabled()
            .filter_events(vec!["line-emitted".to_string()]),
    );
    assert_eq!(tracer.buffer().len(), 7);
}

#[test]
fn disabled_tracer_does_not_change_the_run() {
    let tracer = traced(TracerConfig::default());
    assert!(tracer.buffer().is_empty());
}
