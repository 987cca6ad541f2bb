//! Loops, conditionals, waiting, and warp.

use blockflow_foundation::Value;
use blockflow_language::builder::{body, empty_body, lit, prim, script, var};
use blockflow_language::{Expr, Primitive as P};

use crate::support::{World, change, forever, repeat, set};

fn greater(name: &str, than: i64) -> Expr {
    prim(P::ReportGreaterThan, vec![var(name), lit(than)])
}

// =============================================================================
// Loops
// =============================================================================

#[test]
fn repeat_yields_after_each_iteration() {
    let mut world = World::new();
    world.declare("x", 0);
    let (_, handle) = world.start(script([repeat(3, script([change("x", 1)]))]));

    world.step();
    assert_eq!(world.get("x"), Value::Int(0));
    for expected in 1..=3 {
        world.step();
        assert_eq!(world.get("x"), Value::Int(expected));
    }
    assert!(handle.is_running());

    world.step();
    assert!(!handle.is_running());
    assert!(world.manager.processes().is_empty());
}

#[test]
fn repeat_zero_times_skips_the_body() {
    let mut world = World::new();
    world.declare("x", 0);
    world.start(script([repeat(0, script([change("x", 1)])), set("done", lit(true))]));
    world.declare("done", false);
    world.run();
    assert_eq!(world.get("x"), Value::Int(0));
    assert_eq!(world.get("done"), Value::Bool(true));
}

#[test]
fn forever_runs_once_per_tick() {
    let mut world = World::new();
    world.declare("x", 0);
    let (_, handle) = world.start(script([forever(script([change("x", 1)]))]));
    world.steps(11);
    assert_eq!(world.get("x"), Value::Int(10));
    assert!(handle.is_running());
}

#[test]
fn until_checks_before_each_iteration() {
    let mut world = World::new();
    world.declare("x", 0);
    world.declare("done", 0);
    world.start(script([
        prim(
            P::DoUntil,
            vec![greater("x", 4), body(script([change("x", 1)]))],
        ),
        set("done", lit(1)),
    ]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(5));
    assert_eq!(world.get("done"), Value::Int(1));
}

#[test]
fn wait_until_polls_every_tick() {
    let mut world = World::new();
    world.declare("flag", 0);
    world.declare("x", 0);
    let (_, handle) = world.start(script([
        prim(
            P::DoWaitUntil,
            vec![prim(P::ReportEquals, vec![var("flag"), lit(1)])],
        ),
        set("x", lit(1)),
    ]));
    world.steps(5);
    assert!(handle.is_running());
    assert_eq!(world.get("x"), Value::Int(0));

    world.declare("flag", 1);
    world.run();
    assert_eq!(world.get("x"), Value::Int(1));
}

// =============================================================================
// Conditionals
// =============================================================================

#[test]
fn if_else_runs_one_branch() {
    let mut world = World::new();
    world.declare("x", 0);
    world.declare("y", "");
    world.start(script([prim(
        P::DoIfElse,
        vec![
            prim(P::ReportEquals, vec![var("x"), lit(0)]),
            body(script([set("y", lit("zero"))])),
            body(script([set("y", lit("other"))])),
        ],
    )]));
    world.run();
    assert_eq!(world.get("y"), Value::from("zero"));
}

#[test]
fn if_without_a_body_does_nothing() {
    let mut world = World::new();
    world.declare("x", 0);
    world.start(script([
        prim(P::DoIf, vec![lit(true), empty_body()]),
        change("x", 1),
    ]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(1));
}

#[test]
fn or_skips_its_second_input() {
    let mut world = World::new();
    assert_eq!(
        world.evaluate(prim(P::ReportOr, vec![lit(true), var("ghost")])),
        "true"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportAnd, vec![lit(false), var("ghost")])),
        "false"
    );
}

// =============================================================================
// Time
// =============================================================================

#[test]
fn wait_measures_the_clock() {
    let mut world = World::new();
    world.declare("x", 0);
    world.start(script([prim(P::DoWait, vec![lit(1)]), set("x", lit(1))]));
    world.steps(3);
    world.clock.advance(999);
    world.step();
    assert_eq!(world.get("x"), Value::Int(0));

    world.clock.advance(1);
    world.step();
    assert_eq!(world.get("x"), Value::Int(1));
}

#[test]
fn glide_interpolates_toward_the_target() {
    let mut world = World::new();
    world.start(script([prim(P::DoGlide, vec![lit(1), lit(100), lit(0)])]));
    world.steps(2);
    world.clock.advance(500);
    world.step();
    assert!((world.sprite.borrow().x - 50.0).abs() < 1e-9);

    world.clock.advance(500);
    world.run();
    assert!((world.sprite.borrow().x - 100.0).abs() < 1e-9);
}

#[test]
fn say_for_clears_the_bubble_afterwards() {
    let mut world = World::new();
    world.start(script([prim(P::DoSayFor, vec![lit("hello"), lit(2)])]));
    world.steps(2);
    assert_eq!(world.sprite.borrow().bubble.as_deref(), Some("hello"));

    world.clock.advance(2000);
    world.run();
    assert_eq!(world.sprite.borrow().bubble, None);
    assert_eq!(world.sprite.borrow().bubbles_shown, vec!["hello".to_string()]);
}

// =============================================================================
// Warp and stop
// =============================================================================

#[test]
fn warp_finishes_its_body_in_one_slice() {
    let mut world = World::new();
    world.declare("x", 0);
    world.start(script([prim(
        P::DoWarp,
        vec![body(script([repeat(100, script([change("x", 1)]))]))],
    )]));
    world.steps(2);
    assert_eq!(world.get("x"), Value::Int(100));

    let sprite = world.sprite.borrow();
    assert!(sprite.warps_started >= 1);
    assert_eq!(sprite.warps_started, sprite.warps_ended);
}

#[test]
fn stop_ends_the_script() {
    let mut world = World::new();
    world.declare("x", 0);
    let (_, handle) = world.start(script([
        change("x", 1),
        prim(P::DoStop, vec![]),
        change("x", 1),
    ]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(1));
    assert!(!handle.is_running());
    assert!(!handle.has_error());
}
