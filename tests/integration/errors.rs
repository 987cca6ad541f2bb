//! A failing process is flagged and marked; the rest keep running.

use blockflow_engine::EngineConfig;
use blockflow_foundation::{ErrorKind, Value};
use blockflow_language::builder::{
    call_with, empty, lit, prim, receiver_block, ring_reporter, script,
};
use blockflow_language::{Expr, Primitive as P};

use crate::support::{World, change, forever, set};

fn broken_call() -> Expr {
    call_with(
        ring_reporter(prim(P::ReportSum, vec![empty(), empty()])),
        vec![],
    )
}

#[test]
fn errors_do_not_stop_other_scripts() {
    let mut world = World::new();
    world.declare("x", 0);
    world.declare("y", 0);
    let (top, view) = world.viewed_script(script([set("y", broken_call())]));
    let failing = world.manager.start_process(&top);
    world.start(script([forever(script([change("x", 1)]))]));

    world.steps(6);
    assert!(failing.has_error());
    assert!(!failing.is_running());
    assert_eq!(world.get("x"), Value::Int(5));
    assert!(view.saw("error evaluate: expecting 2 input(s), but getting 0"));
}

#[test]
fn failed_processes_stay_until_stopped() {
    let mut world = World::new();
    let (top, _) = world.viewed_script(script([receiver_block("fly", vec![])]));
    world.manager.start_process(&top);
    world.run();

    let process = world.manager.find_process(&top).unwrap();
    assert!(process.error_flag());
    let error = process.last_error().unwrap();
    assert!(matches!(error.kind, ErrorKind::Primitive { .. }));
    let context = error.context.as_ref().unwrap();
    assert_eq!(context.element.as_deref(), Some("fly"));

    world.manager.stop_all();
    world.step();
    assert!(world.manager.processes().is_empty());
}

#[test]
fn restarting_clears_the_error() {
    let mut world = World::new();
    world.declare("x", 0);
    let (top, _) =
        world.viewed_script(script([change("x", 1), receiver_block("fly", vec![])]));
    world.manager.start_process(&top);
    world.run();
    assert!(world.manager.find_process(&top).unwrap().error_flag());

    let handle = world.manager.start_process(&top);
    assert!(!handle.has_error());
    assert_eq!(world.manager.processes().len(), 1);
    world.run();
    assert_eq!(world.get("x"), Value::Int(2));
}

#[test]
fn debug_mode_returns_the_error_from_step() {
    let mut world = World::with_config(EngineConfig::default().debug());
    world.start(script([receiver_block("fly", vec![])]));
    world.step();
    let error = world.manager.step().unwrap_err();
    assert_eq!(error.to_string(), "fly: no such block");
}

#[test]
fn error_highlight_replaces_the_running_highlight() {
    let mut world = World::new();
    let (top, view) =
        world.viewed_script(script([prim(P::DoChangeVar, vec![lit("ghost"), lit(1)])]));
    world.manager.start_process(&top);
    world.run();

    let events = view.events();
    assert_eq!(events[0], "highlight");
    assert!(events.contains(&"error-highlight".to_string()));
    assert!(!events.contains(&"unhighlight".to_string()));
}
