//! Convenience constructors for building scripts in code.
//!
//! Hosts translate their block morphs into expressions with these; tests use
//! them to write scripts compactly:
//!
//! ```
//! use blockflow_language::builder::{block, lit, prim, script, body};
//! use blockflow_language::Primitive;
//!
//! // repeat 3 [ move 10 ]
//! let s = script([prim(
//!     Primitive::DoRepeat,
//!     vec![lit(3), body(script([block("forward", vec![lit(10)])]))],
//! )]);
//! assert_eq!(s.to_string(), "[doRepeat(3, [forward(10)])]");
//! ```

use std::sync::Arc;

use blockflow_foundation::Value;

use crate::definition::CustomBlockDefinition;
use crate::expression::{BlockCall, Callee, Expr, Expression, PseudoOp, Slot, SlotContents};
use crate::primitive::Primitive;

/// A command script.
pub fn script(blocks: impl IntoIterator<Item = Expr>) -> Expr {
    Arc::new(Expression::Sequence(blocks.into_iter().collect()))
}

/// A block by selector: an engine primitive if the engine knows it, otherwise
/// a receiver primitive.
#[must_use]
pub fn block(selector: &str, args: Vec<Expr>) -> Expr {
    match Primitive::from_selector(selector) {
        Some(p) => prim(p, args),
        None => receiver_block(selector, args),
    }
}

/// An engine primitive.
#[must_use]
pub fn prim(primitive: Primitive, args: Vec<Expr>) -> Expr {
    call(Callee::Primitive(primitive), args)
}

/// A receiver primitive.
#[must_use]
pub fn receiver_block(selector: &str, args: Vec<Expr>) -> Expr {
    call(Callee::Receiver(Arc::from(selector)), args)
}

/// An invocation of a custom block.
#[must_use]
pub fn custom(definition: &Arc<CustomBlockDefinition>, args: Vec<Expr>) -> Expr {
    call(Callee::Custom(Arc::clone(definition)), args)
}

/// A variable getter.
#[must_use]
pub fn var(name: &str) -> Expr {
    call(Callee::Variable(Arc::from(name)), Vec::new())
}

fn call(callee: Callee, args: Vec<Expr>) -> Expr {
    Arc::new(Expression::BlockCall(BlockCall { callee, args }))
}

fn slot(contents: SlotContents) -> Expr {
    Arc::new(Expression::BoundInput(Slot::new(contents)))
}

/// A typed-in constant.
pub fn lit(value: impl Into<Value>) -> Expr {
    slot(SlotContents::Literal(value.into()))
}

/// An empty input slot.
#[must_use]
pub fn empty() -> Expr {
    slot(SlotContents::Empty)
}

/// A C-slot holding a script.
#[must_use]
pub fn body(script: Expr) -> Expr {
    slot(SlotContents::Body(Some(script)))
}

/// An empty C-slot.
#[must_use]
pub fn empty_body() -> Expr {
    slot(SlotContents::Body(None))
}

/// A variadic input group.
#[must_use]
pub fn multi(items: Vec<Expr>) -> Expr {
    Arc::new(Expression::MultiArg(items))
}

/// `the script [...]` with no formal parameters.
#[must_use]
pub fn ring_script(script: Expr) -> Expr {
    ring(SlotContents::Script(Some(script)), &[])
}

/// `the (...) block` with no formal parameters.
#[must_use]
pub fn ring_reporter(reporter: Expr) -> Expr {
    ring(SlotContents::Reporter(Some(reporter)), &[])
}

/// `the script [...] input names: ...`.
#[must_use]
pub fn ring_script_with(script: Expr, parameters: &[&str]) -> Expr {
    ring(SlotContents::Script(Some(script)), parameters)
}

/// `the (...) block input names: ...`.
#[must_use]
pub fn ring_reporter_with(reporter: Expr, parameters: &[&str]) -> Expr {
    ring(SlotContents::Reporter(Some(reporter)), parameters)
}

fn ring(contents: SlotContents, parameters: &[&str]) -> Expr {
    let names = parameters.iter().map(|name| lit(*name)).collect();
    prim(Primitive::ReportScript, vec![multi(names), slot(contents)])
}

/// `run (script) with inputs ...`.
#[must_use]
pub fn run(closure: Expr, inputs: Vec<Expr>) -> Expr {
    prim(Primitive::DoRun, vec![closure, multi(inputs)])
}

/// `call (reporter) with inputs ...`.
#[must_use]
pub fn call_with(closure: Expr, inputs: Vec<Expr>) -> Expr {
    prim(Primitive::Evaluate, vec![closure, multi(inputs)])
}

/// `launch (script) with inputs ...`.
#[must_use]
pub fn launch(closure: Expr, inputs: Vec<Expr>) -> Expr {
    prim(Primitive::Fork, vec![closure, multi(inputs)])
}

/// An internal pseudo-op node.
#[must_use]
pub fn pseudo(op: PseudoOp) -> Expr {
    Arc::new(Expression::Selector(op))
}
