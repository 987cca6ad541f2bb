//! User-defined blocks: parameters, upvars, `report`, and `stop this block`.

use std::sync::Arc;

use blockflow_foundation::Value;
use blockflow_language::builder::{body, custom, lit, prim, script, var};
use blockflow_language::{BlockKind, CustomBlockDefinition, Expr, Parameter, Primitive as P};

use crate::support::{World, change, forever, report, script_vars, set};

fn define(
    spec: &str,
    kind: BlockKind,
    parameters: Vec<Parameter>,
    body: Expr,
) -> Arc<CustomBlockDefinition> {
    Arc::new(CustomBlockDefinition::new(spec, kind, parameters).with_body(body))
}

fn factorial() -> Arc<CustomBlockDefinition> {
    let fact = Arc::new(CustomBlockDefinition::new(
        "fact %n",
        BlockKind::Reporter,
        vec![Parameter::normal("n")],
    ));
    let smaller = prim(P::ReportDifference, vec![var("n"), lit(1)]);
    let recursive = prim(
        P::ReportProduct,
        vec![var("n"), custom(&fact, vec![smaller])],
    );
    assert!(fact.set_body(script([prim(
        P::DoIfElse,
        vec![
            prim(P::ReportLessThan, vec![var("n"), lit(2)]),
            body(script([report(lit(1))])),
            body(script([report(recursive)])),
        ],
    )])));
    fact
}

// =============================================================================
// Reporters
// =============================================================================

#[test]
fn custom_reporter_reports() {
    let mut world = World::new();
    let double = define(
        "double %n",
        BlockKind::Reporter,
        vec![Parameter::normal("n")],
        script([report(prim(P::ReportProduct, vec![var("n"), lit(2)]))]),
    );
    assert_eq!(world.evaluate(custom(&double, vec![lit(21)])), "42");
}

#[test]
fn custom_reporter_without_report_reports_nothing() {
    let mut world = World::new();
    world.declare("x", 0);
    let tick = define("tick", BlockKind::Reporter, vec![], script([change("x", 1)]));
    assert_eq!(world.evaluate(custom(&tick, vec![])), "");
    assert_eq!(world.get("x"), Value::Int(1));
}

#[test]
fn recursion_reports_through_every_level() {
    let mut world = World::new();
    let fact = factorial();
    assert_eq!(world.evaluate(custom(&fact, vec![lit(10)])), "3628800");
}

#[test]
fn report_leaves_a_loop_inside_the_block() {
    let mut world = World::new();
    let first_over = define(
        "first over %limit",
        BlockKind::Reporter,
        vec![Parameter::normal("limit")],
        script([
            script_vars(&["i"]),
            forever(script([
                change("i", 1),
                prim(
                    P::DoIf,
                    vec![
                        prim(P::ReportGreaterThan, vec![var("i"), var("limit")]),
                        body(script([report(var("i"))])),
                    ],
                ),
            ])),
        ]),
    );
    assert_eq!(world.evaluate(custom(&first_over, vec![lit(3)])), "4");
}

#[test]
fn missing_inputs_default_to_nothing() {
    let mut world = World::new();
    let echo = define(
        "echo %a",
        BlockKind::Reporter,
        vec![Parameter::normal("a")],
        script([report(var("a"))]),
    );
    assert_eq!(world.evaluate(custom(&echo, vec![])), "");
}

#[test]
fn parameters_are_invisible_to_the_caller() {
    let mut world = World::new();
    let noop = define(
        "noop %secret",
        BlockKind::Command,
        vec![Parameter::normal("secret")],
        script(Vec::new()),
    );
    let (_, handle) = world.start(script([
        custom(&noop, vec![lit(1)]),
        set("secret", lit(2)),
    ]));
    world.run();
    assert!(handle.has_error());
}

#[test]
fn callers_script_variables_are_visible_dynamically() {
    let mut world = World::new();
    world.declare("x", 0);
    let peek = define("peek", BlockKind::Reporter, vec![], script([report(var("secret"))]));
    world.start(script([
        script_vars(&["secret"]),
        set("secret", lit(7)),
        set("x", custom(&peek, vec![])),
    ]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(7));
}

// =============================================================================
// Commands
// =============================================================================

#[test]
fn stop_this_block_returns_to_the_caller() {
    let mut world = World::new();
    world.declare("x", 0);
    let early = define(
        "early",
        BlockKind::Command,
        vec![],
        script([
            change("x", 1),
            prim(P::DoStopBlock, vec![]),
            change("x", 100),
        ]),
    );
    world.start(script([custom(&early, vec![]), change("x", 10)]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(11));
}

#[test]
fn stop_this_block_outside_a_block_stops_the_script() {
    let mut world = World::new();
    world.declare("x", 0);
    let (_, handle) = world.start(script([prim(P::DoStopBlock, vec![]), change("x", 1)]));
    world.run();
    assert_eq!(world.get("x"), Value::Int(0));
    assert!(!handle.has_error());
}

#[test]
fn custom_command_yields_before_its_body() {
    let mut world = World::new();
    world.declare("x", 0);
    let bump = define("bump", BlockKind::Command, vec![], script([change("x", 1)]));
    world.start(script([custom(&bump, vec![]), custom(&bump, vec![])]));

    world.steps(2);
    assert_eq!(world.get("x"), Value::Int(0));
    world.step();
    assert_eq!(world.get("x"), Value::Int(1));
    world.step();
    assert_eq!(world.get("x"), Value::Int(2));
}

// =============================================================================
// Upvars
// =============================================================================

#[test]
fn upvar_aliases_the_callers_variable() {
    let mut world = World::new();
    world.declare("myVar", 5);
    let incr = define(
        "incr %var",
        BlockKind::Command,
        vec![Parameter::upvar("var")],
        script([change("var", 1)]),
    );
    world.start(script([custom(&incr, vec![lit("myVar")])]));
    world.run();
    assert_eq!(world.get("myVar"), Value::Int(6));
}

#[test]
fn normal_parameters_are_copies() {
    let mut world = World::new();
    world.declare("myVar", 5);
    let bump = define(
        "bump %n",
        BlockKind::Command,
        vec![Parameter::normal("n")],
        script([change("n", 1)]),
    );
    world.start(script([custom(&bump, vec![var("myVar")])]));
    world.run();
    assert_eq!(world.get("myVar"), Value::Int(5));
}

#[test]
fn upvar_declares_a_missing_variable_in_the_caller() {
    let mut world = World::new();
    world.declare("x", 0);
    let incr = define(
        "incr %var",
        BlockKind::Command,
        vec![Parameter::upvar("var")],
        script([change("var", 1)]),
    );
    world.start(script([
        custom(&incr, vec![lit("fresh")]),
        set("x", var("fresh")),
    ]));
    world.run();

    assert_eq!(world.get("x"), Value::Int(1));
    let sprite = world.manager.heap().frame(world.sprite_frame).unwrap();
    assert!(!sprite.has_var("fresh"));
}
