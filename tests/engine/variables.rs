//! Variable lookup, assignment, script variables, and watchers.

use blockflow_foundation::Value;
use blockflow_language::Primitive as P;
use blockflow_language::builder::{lit, prim, script, var};

use crate::support::{World, change, script_vars, set};

#[test]
fn script_variables_stay_in_the_script() {
    let mut world = World::new();
    world.declare("x", 0);
    world.start(script([
        script_vars(&["a"]),
        set("a", lit(5)),
        set("x", var("a")),
    ]));
    world.run();

    assert_eq!(world.get("x"), Value::Int(5));
    let sprite = world.manager.heap().frame(world.sprite_frame).unwrap();
    assert!(!sprite.has_var("a"));
}

#[test]
fn script_variables_start_at_zero() {
    let mut world = World::new();
    world.declare("x", "unset");
    world.start(script([script_vars(&["a", "b"]), set("x", var("b"))]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(0));
}

#[test]
fn script_variables_shadow_sprite_variables() {
    let mut world = World::new();
    world.declare("score", 100);
    world.start(script([script_vars(&["score"]), change("score", 1)]));
    world.run();
    assert_eq!(world.get("score"), Value::Int(100));
}

#[test]
fn setting_an_unknown_variable_fails() {
    let mut world = World::new();
    let (top, view) = world.viewed_script(script([set("ghost", lit(1))]));
    let handle = world.manager.start_process(&top);
    world.run();

    assert!(handle.has_error());
    assert!(view.saw("error-highlight"));
    assert!(view.saw(
        "error doSetVar: a variable of name 'ghost' does not exist in this context"
    ));
}

#[test]
fn changing_never_creates_a_variable() {
    let mut world = World::new();
    let (_, handle) = world.start(script([change("ghost", 1)]));
    world.run();

    assert!(handle.has_error());
    let sprite = world.manager.heap().frame(world.sprite_frame).unwrap();
    assert!(!sprite.has_var("ghost"));
}

#[test]
fn change_reads_numeric_text() {
    let mut world = World::new();
    world.declare("x", "4");
    world.start(script([change("x", 1)]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(5));
}

#[test]
fn change_by_a_fraction_goes_float() {
    let mut world = World::new();
    world.declare("x", 1);
    world.start(script([prim(P::DoChangeVar, vec![lit("x"), lit(0.5)])]));
    world.run();
    assert_eq!(world.get("x"), Value::Float(1.5));
}

#[test]
fn reading_an_unknown_variable_names_it() {
    let mut world = World::new();
    world.declare("x", 0);
    let (_, handle) = world.start(script([set("x", var("nowhere"))]));
    world.run();

    assert!(handle.has_error());
    let process = &world.manager.processes()[0];
    let error = process.last_error().unwrap();
    assert_eq!(
        error.to_string(),
        "a variable of name 'nowhere' does not exist in this context"
    );
}

#[test]
fn watchers_are_shown_and_hidden() {
    let mut world = World::new();
    world.declare("x", 0);
    world.start(script([
        prim(P::DoShowVar, vec![lit("x")]),
        prim(P::DoHideVar, vec![lit("x")]),
    ]));
    world.run();
    assert_eq!(
        *world.stage.watchers.borrow(),
        vec![("x".to_string(), true), ("x".to_string(), false)]
    );
}
