//! Integration tests for primitive selectors

use blockflow_language::builder::block;
use blockflow_language::{Callee, Expression, Primitive};

#[test]
fn selectors_round_trip() {
    for primitive in [
        Primitive::DoIf,
        Primitive::DoRepeat,
        Primitive::DoCallCC,
        Primitive::ReportCallCC,
        Primitive::ReportSum,
        Primitive::ReportListContainsItem,
        Primitive::ReportKeyPressed,
    ] {
        assert_eq!(Primitive::from_selector(primitive.selector()), Some(primitive));
    }
}

#[test]
fn unknown_selectors_are_not_primitives() {
    assert_eq!(Primitive::from_selector("forward"), None);
    assert_eq!(Primitive::from_selector(""), None);
}

#[test]
fn special_forms() {
    assert!(Primitive::ReportAnd.is_special_form());
    assert!(Primitive::ReportOr.is_special_form());
    assert!(Primitive::ReportScript.is_special_form());
    assert!(!Primitive::DoIf.is_special_form());
}

#[test]
fn block_dispatches_on_selector() {
    let Expression::BlockCall(engine) = block("doWait", vec![]).as_ref().clone() else {
        panic!("block call");
    };
    let Expression::BlockCall(sprite) = block("turn", vec![]).as_ref().clone() else {
        panic!("block call");
    };
    assert_eq!(engine.callee, Callee::Primitive(Primitive::DoWait));
    assert!(matches!(sprite.callee, Callee::Receiver(_)));
}
