//! Integration tests for Error
//!
//! Tests messages users see and the context attached to them.

use blockflow_foundation::{Error, ErrorContext, ErrorKind, Type};

#[test]
fn arity_message() {
    let err = Error::arity_mismatch(2, 0);
    assert_eq!(err.to_string(), "expecting 2 input(s), but getting 0");
}

#[test]
fn unbound_variable_message() {
    let err = Error::unbound_variable("score");
    assert_eq!(
        err.to_string(),
        "a variable of name 'score' does not exist in this context"
    );
    assert!(matches!(err.kind, ErrorKind::UnboundVariable(ref name) if name == "score"));
}

#[test]
fn primitive_and_selector_errors() {
    assert_eq!(
        Error::primitive("doGlide", "nobody to run this").to_string(),
        "doGlide: nobody to run this"
    );
    assert!(matches!(
        Error::unknown_selector("jump").kind,
        ErrorKind::Primitive { .. }
    ));
}

#[test]
fn continuation_fork_message() {
    assert_eq!(
        Error::continuation_fork().to_string(),
        "continuations cannot be forked"
    );
}

#[test]
fn type_mismatch_uses_type_names() {
    let err = Error::type_mismatch(Type::Number, Type::List);
    assert_eq!(err.to_string(), "expecting number but getting list");
}

#[test]
fn context_is_optional_and_displayable() {
    let err = Error::internal("boom");
    assert!(err.context.is_none());

    let err = err.with_context(
        ErrorContext::new()
            .with_element("reportSum")
            .with_script("when clicked"),
    );
    let context = err.context.as_ref().unwrap();
    assert_eq!(context.element.as_deref(), Some("reportSum"));
    assert_eq!(context.to_string(), "in reportSum (when clicked)");
}
