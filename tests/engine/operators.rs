//! Operators, text, lists, sensing, and receiver blocks evaluated as
//! reporters.

use blockflow_engine::EngineConfig;
use blockflow_language::{Expr, Primitive as P};
use blockflow_language::builder::{empty, lit, multi, prim, receiver_block, script};

use crate::support::World;

fn list(items: &[i64]) -> Expr {
    prim(
        P::ReportNewList,
        vec![multi(items.iter().map(|i| lit(*i)).collect())],
    )
}

// =============================================================================
// Arithmetic
// =============================================================================

#[test]
fn arithmetic_reads_numeric_text() {
    let mut world = World::new();
    assert_eq!(world.evaluate(prim(P::ReportSum, vec![lit("3"), lit(4)])), "7");
    assert_eq!(
        world.evaluate(prim(P::ReportProduct, vec![lit(" 2.5 "), lit(2)])),
        "5"
    );
}

#[test]
fn division_by_zero_is_infinite() {
    let mut world = World::new();
    assert_eq!(
        world.evaluate(prim(P::ReportQuotient, vec![lit(1), lit(0)])),
        "Infinity"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportModulus, vec![lit(1), lit(0)])),
        "NaN"
    );
}

#[test]
fn modulus_follows_the_divisor() {
    let mut world = World::new();
    assert_eq!(
        world.evaluate(prim(P::ReportModulus, vec![lit(-7), lit(3)])),
        "2"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportModulus, vec![lit(7), lit(-3)])),
        "-2"
    );
}

#[test]
fn monadic_functions_use_degrees() {
    let mut world = World::new();
    assert_eq!(
        world.evaluate(prim(P::ReportMonadic, vec![lit("sqrt"), lit(16)])),
        "4"
    );
    assert_eq!(
        world.evaluate(prim(
            P::ReportRound,
            vec![prim(P::ReportMonadic, vec![lit("sin"), lit(90)])]
        )),
        "1"
    );
}

#[test]
fn arithmetic_on_words_is_an_error() {
    let mut world = World::new();
    let (top, view) = world.viewed_reporter(prim(P::ReportSum, vec![lit("apple"), lit(1)]));
    let handle = world.manager.start_process(&top);
    world.run();

    assert!(handle.has_error());
    assert!(view.saw("error reportSum: expecting number but getting text"));
}

// =============================================================================
// Comparison and logic
// =============================================================================

#[test]
fn equality_ignores_case_and_number_formatting() {
    let mut world = World::new();
    assert_eq!(
        world.evaluate(prim(P::ReportEquals, vec![lit("Hello"), lit("hello")])),
        "true"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportEquals, vec![lit("1.0"), lit(1)])),
        "true"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportLessThan, vec![lit(2), lit("10")])),
        "true"
    );
}

#[test]
fn not_inverts_truthiness() {
    let mut world = World::new();
    assert_eq!(world.evaluate(prim(P::ReportNot, vec![lit(false)])), "true");
    assert_eq!(world.evaluate(prim(P::ReportNot, vec![empty()])), "true");
}

// =============================================================================
// Text and lists
// =============================================================================

#[test]
fn text_primitives() {
    let mut world = World::new();
    assert_eq!(
        world.evaluate(prim(
            P::ReportJoinWords,
            vec![multi(vec![lit("block"), lit("flow")])]
        )),
        "blockflow"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportLetter, vec![lit(2), lit("abc")])),
        "b"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportLetter, vec![lit(9), lit("abc")])),
        ""
    );
    assert_eq!(
        world.evaluate(prim(P::ReportStringSize, vec![lit("hello")])),
        "5"
    );
}

#[test]
fn list_primitives() {
    let mut world = World::new();
    assert_eq!(world.evaluate(list(&[10, 20, 30])), "[10 20 30]");
    assert_eq!(
        world.evaluate(prim(P::ReportListItem, vec![lit(2), list(&[10, 20, 30])])),
        "20"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportListItem, vec![lit("last"), list(&[10, 20, 30])])),
        "30"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportListLength, vec![list(&[1, 2])])),
        "2"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportCONS, vec![lit(0), list(&[1, 2])])),
        "[0 1 2]"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportCDR, vec![list(&[1, 2])])),
        "[2]"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportListContainsItem, vec![list(&[1, 2]), lit("2")])),
        "true"
    );
}

// =============================================================================
// Random numbers
// =============================================================================

#[test]
fn random_numbers_repeat_for_a_seed() {
    let draw = |seed| {
        let mut world = World::with_config(EngineConfig::default().with_seed(seed));
        (0..5)
            .map(|_| world.evaluate(prim(P::ReportRandom, vec![lit(1), lit(1000)])))
            .collect::<Vec<_>>()
    };
    assert_eq!(draw(7), draw(7));
}

#[test]
fn random_whole_bounds_give_whole_numbers() {
    let mut world = World::new();
    for _ in 0..20 {
        let drawn: i64 = world
            .evaluate(prim(P::ReportRandom, vec![lit(1), lit(6)]))
            .parse()
            .unwrap();
        assert!((1..=6).contains(&drawn));
    }
}

#[test]
fn random_with_an_infinite_bound_is_an_error() {
    let mut world = World::new();
    let infinity = prim(P::ReportQuotient, vec![lit(1), lit(0)]);
    let (top, view) = world.viewed_reporter(prim(P::ReportRandom, vec![lit(1), infinity]));
    let handle = world.manager.start_process(&top);
    world.run();

    assert!(handle.has_error());
    assert!(view.saw("error reportRandom: reportRandom: bounds must be finite numbers"));
}

// =============================================================================
// Sensing and receivers
// =============================================================================

#[test]
fn key_pressed_asks_the_stage() {
    let mut world = World::new();
    world.stage.keys.borrow_mut().insert("space".to_string());
    assert_eq!(
        world.evaluate(prim(P::ReportKeyPressed, vec![lit("space")])),
        "true"
    );
    assert_eq!(
        world.evaluate(prim(P::ReportKeyPressed, vec![lit("up arrow")])),
        "false"
    );
}

#[test]
fn receiver_blocks_reach_the_sprite() {
    let mut world = World::new();
    world.start(script([receiver_block("forward", vec![lit(10)])]));
    world.run();
    assert_eq!(world.evaluate(receiver_block("xPosition", vec![])), "10");
}

#[test]
fn receiver_errors_name_the_block() {
    let mut world = World::new();
    let (top, view) = world.viewed_script(script([receiver_block("explode", vec![])]));
    world.manager.start_process(&top);
    world.run();
    assert!(view.saw("error explode: explode: the sprite fell apart"));
}

#[test]
fn unknown_blocks_are_errors() {
    let mut world = World::new();
    let (top, view) = world.viewed_script(script([receiver_block("fly", vec![])]));
    world.manager.start_process(&top);
    world.run();
    assert!(view.saw("error fly: fly: no such block"));
}
