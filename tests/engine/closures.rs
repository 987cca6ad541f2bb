//! Rings, `run`, `call`, and `launch`.

use blockflow_foundation::Value;
use blockflow_language::Primitive as P;
use blockflow_language::builder::{
    call_with, empty, launch, lit, prim, ring_reporter, ring_reporter_with, ring_script, run,
    script, var,
};

use crate::support::{World, change, repeat, report, script_vars, set};

// =============================================================================
// call
// =============================================================================

#[test]
fn call_reports_the_ring_value() {
    let mut world = World::new();
    let ring = ring_reporter(prim(P::ReportSum, vec![lit(1), lit(1)]));
    assert_eq!(world.evaluate(call_with(ring, vec![])), "2");
}

#[test]
fn one_argument_fills_every_empty_slot() {
    let mut world = World::new();
    let ring = ring_reporter(prim(P::ReportSum, vec![empty(), empty()]));
    assert_eq!(world.evaluate(call_with(ring, vec![lit(3)])), "6");
}

#[test]
fn arguments_fill_empty_slots_in_order() {
    let mut world = World::new();
    let ring = ring_reporter(prim(P::ReportDifference, vec![empty(), empty()]));
    assert_eq!(world.evaluate(call_with(ring, vec![lit(10), lit(4)])), "6");
}

#[test]
fn formal_parameters_bind_by_name() {
    let mut world = World::new();
    let ring = ring_reporter_with(
        prim(P::ReportSum, vec![var("a"), var("b")]),
        &["a", "b"],
    );
    assert_eq!(world.evaluate(call_with(ring, vec![lit(2), lit(3)])), "5");
}

#[test]
fn calling_nothing_reports_nothing() {
    let mut world = World::new();
    assert_eq!(world.evaluate(call_with(empty(), vec![])), "");
}

#[test]
fn wrong_argument_count_is_an_error() {
    let mut world = World::new();
    let ring = ring_reporter(prim(P::ReportSum, vec![empty(), empty()]));
    let (top, view) = world.viewed_reporter(call_with(ring, vec![]));
    let handle = world.manager.start_process(&top);
    world.run();

    assert!(handle.has_error());
    assert!(view.saw("error evaluate: expecting 2 input(s), but getting 0"));
    assert!(!view.events().iter().any(|e| e.starts_with("bubble")));
}

#[test]
fn one_slot_ring_rejects_extra_arguments() {
    let mut world = World::new();
    let ring = ring_reporter(prim(P::ReportSum, vec![empty(), lit(1)]));
    let (top, view) = world.viewed_reporter(call_with(ring, vec![lit(1), lit(2)]));
    let handle = world.manager.start_process(&top);
    world.run();

    assert!(handle.has_error());
    assert!(view.saw("error evaluate: expecting 1 input(s), but getting 2"));
}

#[test]
fn one_slot_ring_needs_an_argument() {
    let mut world = World::new();
    let ring = ring_reporter(prim(P::ReportSum, vec![empty(), lit(1)]));
    let (top, view) = world.viewed_reporter(call_with(ring, vec![]));
    let handle = world.manager.start_process(&top);
    world.run();

    assert!(handle.has_error());
    assert!(view.saw("error evaluate: expecting 1 input(s), but getting 0"));
}

#[test]
fn calling_a_number_is_a_type_error() {
    let mut world = World::new();
    let (_, handle) = world.start(script([run(lit(5), vec![])]));
    world.run();
    assert!(handle.has_error());
}

#[test]
fn rings_capture_variables_by_reference() {
    let mut world = World::new();
    world.declare("x", 0);
    world.start(script([
        script_vars(&["v", "k"]),
        set("v", lit(10)),
        set("k", ring_reporter(var("v"))),
        set("v", lit(20)),
        set("x", call_with(var("k"), vec![])),
    ]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(20));
}

#[test]
fn report_leaves_a_ring_early() {
    let mut world = World::new();
    let ring = ring_script(script([report(lit("early")), report(lit("late"))]));
    assert_eq!(world.evaluate(call_with(ring, vec![])), "early");
}

// =============================================================================
// run
// =============================================================================

#[test]
fn run_binds_an_implicit_parameter() {
    let mut world = World::new();
    world.declare("x", 1);
    let ring = ring_script(script([prim(P::DoChangeVar, vec![lit("x"), empty()])]));
    world.start(script([run(ring, vec![lit(5)])]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(6));
}

#[test]
fn run_continues_with_the_next_block() {
    let mut world = World::new();
    world.declare("x", 0);
    let ring = ring_script(script([change("x", 1)]));
    world.start(script([run(ring, vec![]), change("x", 10)]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(11));
}

// =============================================================================
// launch
// =============================================================================

#[test]
fn launch_starts_a_second_process() {
    let mut world = World::new();
    world.declare("x", 0);
    let ring = ring_script(script([repeat(3, script([change("x", 1)]))]));
    world.start(script([launch(ring, vec![])]));

    world.steps(2);
    assert_eq!(world.manager.processes().len(), 1);
    assert!(world.manager.processes()[0].top_block().is_none());

    world.run();
    assert_eq!(world.get("x"), Value::Int(3));
    assert!(world.manager.processes().is_empty());
}

#[test]
fn launched_rings_receive_arguments() {
    let mut world = World::new();
    world.declare("x", 0);
    let ring = ring_script(script([set("x", empty())]));
    world.start(script([launch(ring, vec![lit("hello")])]));
    world.run();
    assert_eq!(world.get("x"), Value::from("hello"));
}
