//! Integration tests for expression trees
//!
//! Tests display, labelling of implicit parameters, and continuation rebinding.

use std::sync::Arc;

use blockflow_language::builder::{
    block, body, empty, lit, multi, prim, ring_reporter, script, var,
};
use blockflow_language::{Callee, Expression, Primitive, Slot, SlotContents};

// =============================================================================
// Display
// =============================================================================

#[test]
fn scripts_print_compactly() {
    let s = script([
        prim(Primitive::DoSetVar, vec![lit("x"), lit(0)]),
        block("forward", vec![var("x")]),
    ]);
    assert_eq!(s.to_string(), "[doSetVar(\"x\", 0); forward(x())]");
}

#[test]
fn empty_slots_print_as_holes() {
    let e = prim(Primitive::ReportSum, vec![empty(), lit(1)]);
    assert_eq!(e.to_string(), "reportSum(_, 1)");
}

// =============================================================================
// Labelling
// =============================================================================

#[test]
fn labelled_copy_numbers_empty_slots_in_reading_order() {
    let e = prim(
        Primitive::ReportSum,
        vec![empty(), prim(Primitive::ReportProduct, vec![empty(), lit(2)])],
    );
    let (copy, count) = e.labelled_copy();

    assert_eq!(count, 2);
    assert_eq!(copy.to_string(), "reportSum(#1, reportProduct(#2, 2))");
    assert_eq!(e.empty_slot_count(), 2);
    // The original is untouched.
    assert_eq!(e.to_string(), "reportSum(_, reportProduct(_, 2))");
}

#[test]
fn nested_rings_keep_their_own_slots() {
    let inner = ring_reporter(prim(Primitive::ReportSum, vec![empty(), lit(1)]));
    let e = prim(Primitive::Evaluate, vec![inner, multi(vec![empty()])]);
    let (_, count) = e.labelled_copy();
    assert_eq!(count, 1);
}

#[test]
fn c_slot_bodies_are_labelled() {
    let s = script([prim(
        Primitive::DoRepeat,
        vec![lit(2), body(script([block("forward", vec![empty()])]))],
    )]);
    let (copy, count) = s.labelled_copy();
    assert_eq!(count, 1);
    assert_eq!(copy.to_string(), "[doRepeat(2, [forward(#1)])]");
}

#[test]
fn deep_copy_shares_nothing() {
    let e = prim(Primitive::ReportSum, vec![lit(1), lit(2)]);
    let copy = Arc::new(e.deep_copy());
    assert_eq!(*copy, *e);
    assert!(!Arc::ptr_eq(&copy, &e));
    let (Expression::BlockCall(a), Expression::BlockCall(b)) = (e.as_ref(), copy.as_ref()) else {
        panic!("both are block calls");
    };
    assert!(!Arc::ptr_eq(&a.args[0], &b.args[0]));
}

// =============================================================================
// Continuation rebinding
// =============================================================================

#[test]
fn with_input_bound_reads_parameter_one() {
    let e = prim(Primitive::ReportProduct, vec![empty(), lit(3)]);
    let bound = e.with_input_bound(0).unwrap();
    assert_eq!(bound.to_string(), "reportProduct(#1, 3)");
    assert!(e.with_input_bound(5).is_none());
    assert!(script(Vec::new()).with_input_bound(0).is_none());
}

// =============================================================================
// Shapes
// =============================================================================

#[test]
fn shapes_and_labels() {
    assert!(script(Vec::new()).is_sequence());
    assert!(lit(1).is_reporter_shaped());
    assert!(!script(Vec::new()).is_reporter_shaped());
    assert_eq!(block("forward", vec![]).label(), "forward");
    assert_eq!(script([lit(1), lit(2)]).label(), "script (2 blocks)");
}

#[test]
fn literal_slots_hold_values() {
    let Expression::BoundInput(Slot { binding_id, contents }) = lit("hi").as_ref().clone() else {
        panic!("literal is a slot");
    };
    assert_eq!(binding_id, None);
    assert!(matches!(contents, SlotContents::Literal(v) if v.as_str() == Some("hi")));
}

#[test]
fn variable_getters_are_their_own_callee() {
    let Expression::BlockCall(call) = var("score").as_ref().clone() else {
        panic!("getter is a block call");
    };
    assert!(matches!(call.callee, Callee::Variable(ref name) if name.as_ref() == "score"));
}
