//! First-class continuations from `run/call w/continuation`.

use blockflow_foundation::Value;
use blockflow_language::{Expr, Primitive as P};
use blockflow_language::builder::{body, launch, lit, prim, ring_script_with, run, script, var};

use crate::support::{World, change, report, set};

fn below(name: &str, limit: i64) -> Expr {
    prim(P::ReportLessThan, vec![var(name), lit(limit)])
}

#[test]
fn command_continuation_resumes_after_the_capture() {
    let mut world = World::new();
    world.declare("k", 0);
    world.declare("x", 0);
    world.start(script([
        prim(
            P::DoCallCC,
            vec![ring_script_with(script([set("k", var("c"))]), &["c"])],
        ),
        change("x", 1),
        prim(
            P::DoIf,
            vec![below("x", 3), body(script([run(var("k"), vec![])]))],
        ),
    ]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(3));
}

#[test]
fn reporter_continuation_receives_a_value() {
    let mut world = World::new();
    world.declare("k", 0);
    world.declare("n", 0);
    world.declare("y", 0);
    let capture = prim(
        P::ReportCallCC,
        vec![ring_script_with(
            script([set("k", var("c")), report(lit(1))]),
            &["c"],
        )],
    );
    world.start(script([
        set("y", prim(P::ReportProduct, vec![capture, lit(3)])),
        change("n", 1),
        prim(
            P::DoIf,
            vec![below("n", 2), body(script([run(var("k"), vec![lit(5)])]))],
        ),
    ]));
    world.run();
    assert_eq!(world.get("y"), Value::Int(15));
    assert_eq!(world.get("n"), Value::Int(2));
}

#[test]
fn continuation_can_be_resumed_more_than_once() {
    let mut world = World::new();
    world.declare("k", 0);
    world.declare("n", 0);
    world.declare("y", 0);
    let capture = prim(
        P::ReportCallCC,
        vec![ring_script_with(
            script([set("k", var("c")), report(lit(1))]),
            &["c"],
        )],
    );
    let next = prim(P::ReportSum, vec![var("n"), lit(4)]);
    world.start(script([
        set("y", prim(P::ReportProduct, vec![capture, lit(3)])),
        change("n", 1),
        prim(
            P::DoIf,
            vec![below("n", 3), body(script([run(var("k"), vec![next])]))],
        ),
    ]));
    world.run();
    assert_eq!(world.get("y"), Value::Int(18));
    assert_eq!(world.get("n"), Value::Int(3));
}

#[test]
fn resumed_continuation_keeps_inputs_evaluated_before_the_capture() {
    let mut world = World::new();
    world.declare("k", 0);
    world.declare("n", 0);
    world.declare("y", 0);
    let capture = prim(
        P::ReportCallCC,
        vec![ring_script_with(
            script([set("k", var("c")), report(lit(1))]),
            &["c"],
        )],
    );
    world.start(script([
        set("y", prim(P::ReportSum, vec![lit(2), capture])),
        change("n", 1),
        prim(
            P::DoIf,
            vec![below("n", 2), body(script([run(var("k"), vec![lit(5)])]))],
        ),
    ]));
    world.run();
    assert_eq!(world.get("y"), Value::Int(7));
    assert_eq!(world.get("n"), Value::Int(2));
}

#[test]
fn calling_the_continuation_escapes_the_ring() {
    let mut world = World::new();
    let escape = prim(
        P::ReportCallCC,
        vec![ring_script_with(
            script([run(var("c"), vec![lit(10)]), report(lit(1))]),
            &["c"],
        )],
    );
    assert_eq!(
        world.evaluate(prim(P::ReportSum, vec![escape, lit(1)])),
        "11"
    );
}

#[test]
fn unused_continuation_returns_normally() {
    let mut world = World::new();
    let normal = prim(
        P::ReportCallCC,
        vec![ring_script_with(script([report(lit(41))]), &["c"])],
    );
    assert_eq!(
        world.evaluate(prim(P::ReportSum, vec![normal, lit(1)])),
        "42"
    );
}

#[test]
fn continuations_cannot_be_launched() {
    let mut world = World::new();
    let (top, view) = world.viewed_script(script([prim(
        P::DoCallCC,
        vec![ring_script_with(
            script([launch(var("c"), vec![])]),
            &["c"],
        )],
    )]));
    let handle = world.manager.start_process(&top);
    world.run();

    assert!(handle.has_error());
    assert!(view.saw("error fork: continuations cannot be forked"));
}
