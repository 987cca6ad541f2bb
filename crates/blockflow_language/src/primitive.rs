//! The closed set of engine primitives.
//!
//! Blocks name their behaviour with a selector string. Selectors the engine
//! implements itself map onto [`Primitive`]; everything else is dispatched to
//! the receiver by name.

#![allow(clippy::doc_markdown)]

use std::fmt;

/// A primitive implemented by the engine itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    // === Control ===
    /// `if <cond> [body]`
    DoIf,
    /// `if <cond> [a] else [b]`
    DoIfElse,
    /// `forever [body]`
    DoForever,
    /// `repeat (n) [body]`
    DoRepeat,
    /// `repeat until <cond> [body]`
    DoUntil,
    /// `wait until <cond>`
    DoWaitUntil,
    /// `wait (secs) secs`
    DoWait,
    /// `warp [body]`
    DoWarp,
    /// `report (value)`
    DoReport,
    /// `stop block`
    DoStopBlock,
    /// `stop script`
    DoStop,
    /// `stop all`
    DoStopAll,
    /// `broadcast (message)`
    DoBroadcast,
    /// `broadcast (message) and wait`
    DoBroadcastAndWait,
    /// `run (script) with inputs ...`
    DoRun,
    /// `call (reporter) with inputs ...`
    Evaluate,
    /// `launch (script) with inputs ...`
    Fork,
    /// `run (script) w/continuation`
    DoCallCC,
    /// `call (script) w/continuation`
    ReportCallCC,
    /// `the script` / `the block` ring.
    ReportScript,

    // === Timed receiver primitives ===
    /// `glide (secs) secs to x: (x) y: (y)`
    DoGlide,
    /// `say (text) for (secs) secs`
    DoSayFor,
    /// `think (text) for (secs) secs`
    DoThinkFor,

    // === Variables ===
    /// `set (var) to (value)`
    DoSetVar,
    /// `change (var) by (delta)`
    DoChangeVar,
    /// `script variables (a) (b) ...`
    DoDeclareVariables,
    /// `show variable (var)`
    DoShowVar,
    /// `hide variable (var)`
    DoHideVar,

    // === Operators ===
    /// `(a) + (b)`
    ReportSum,
    /// `(a) - (b)`
    ReportDifference,
    /// `(a) * (b)`
    ReportProduct,
    /// `(a) / (b)`
    ReportQuotient,
    /// `(a) mod (b)`
    ReportModulus,
    /// `round (n)`
    ReportRound,
    /// `(fn) of (n)`
    ReportMonadic,
    /// `pick random (a) to (b)`
    ReportRandom,
    /// `(a) < (b)`
    ReportLessThan,
    /// `(a) = (b)`
    ReportEquals,
    /// `(a) > (b)`
    ReportGreaterThan,
    /// `<a> and <b>` (short-circuit)
    ReportAnd,
    /// `<a> or <b>` (short-circuit)
    ReportOr,
    /// `not <a>`
    ReportNot,
    /// `true`
    ReportTrue,
    /// `false`
    ReportFalse,
    /// `join (a) (b) ...`
    ReportJoinWords,
    /// `letter (i) of (text)`
    ReportLetter,
    /// `length of (text)`
    ReportStringSize,

    // === Lists ===
    /// `list (a) (b) ...`
    ReportNewList,
    /// `item (i) of (list)`
    ReportListItem,
    /// `length of (list)`
    ReportListLength,
    /// `(item) in front of (list)`
    ReportCONS,
    /// `all but first of (list)`
    ReportCDR,
    /// `(list) contains (item)`
    ReportListContainsItem,

    // === Sensing ===
    /// `key (name) pressed?`
    ReportKeyPressed,
}

impl Primitive {
    /// Every primitive, in declaration order.
    pub const ALL: &'static [Primitive] = &[
        Self::DoIf,
        Self::DoIfElse,
        Self::DoForever,
        Self::DoRepeat,
        Self::DoUntil,
        Self::DoWaitUntil,
        Self::DoWait,
        Self::DoWarp,
        Self::DoReport,
        Self::DoStopBlock,
        Self::DoStop,
        Self::DoStopAll,
        Self::DoBroadcast,
        Self::DoBroadcastAndWait,
        Self::DoRun,
        Self::Evaluate,
        Self::Fork,
        Self::DoCallCC,
        Self::ReportCallCC,
        Self::ReportScript,
        Self::DoGlide,
        Self::DoSayFor,
        Self::DoThinkFor,
        Self::DoSetVar,
        Self::DoChangeVar,
        Self::DoDeclareVariables,
        Self::DoShowVar,
        Self::DoHideVar,
        Self::ReportSum,
        Self::ReportDifference,
        Self::ReportProduct,
        Self::ReportQuotient,
        Self::ReportModulus,
        Self::ReportRound,
        Self::ReportMonadic,
        Self::ReportRandom,
        Self::ReportLessThan,
        Self::ReportEquals,
        Self::ReportGreaterThan,
        Self::ReportAnd,
        Self::ReportOr,
        Self::ReportNot,
        Self::ReportTrue,
        Self::ReportFalse,
        Self::ReportJoinWords,
        Self::ReportLetter,
        Self::ReportStringSize,
        Self::ReportNewList,
        Self::ReportListItem,
        Self::ReportListLength,
        Self::ReportCONS,
        Self::ReportCDR,
        Self::ReportListContainsItem,
        Self::ReportKeyPressed,
    ];

    /// The selector string a block uses for this primitive.
    #[must_use]
    pub const fn selector(self) -> &'static str {
        match self {
            Self::DoIf => "doIf",
            Self::DoIfElse => "doIfElse",
            Self::DoForever => "doForever",
            Self::DoRepeat => "doRepeat",
            Self::DoUntil => "doUntil",
            Self::DoWaitUntil => "doWaitUntil",
            Self::DoWait => "doWait",
            Self::DoWarp => "doWarp",
            Self::DoReport => "doReport",
            Self::DoStopBlock => "doStopBlock",
            Self::DoStop => "doStop",
            Self::DoStopAll => "doStopAll",
            Self::DoBroadcast => "doBroadcast",
            Self::DoBroadcastAndWait => "doBroadcastAndWait",
            Self::DoRun => "doRun",
            Self::Evaluate => "evaluate",
            Self::Fork => "fork",
            Self::DoCallCC => "doCallCC",
            Self::ReportCallCC => "reportCallCC",
            Self::ReportScript => "reportScript",
            Self::DoGlide => "doGlide",
            Self::DoSayFor => "doSayFor",
            Self::DoThinkFor => "doThinkFor",
            Self::DoSetVar => "doSetVar",
            Self::DoChangeVar => "doChangeVar",
            Self::DoDeclareVariables => "doDeclareVariables",
            Self::DoShowVar => "doShowVar",
            Self::DoHideVar => "doHideVar",
            Self::ReportSum => "reportSum",
            Self::ReportDifference => "reportDifference",
            Self::ReportProduct => "reportProduct",
            Self::ReportQuotient => "reportQuotient",
            Self::ReportModulus => "reportModulus",
            Self::ReportRound => "reportRound",
            Self::ReportMonadic => "reportMonadic",
            Self::ReportRandom => "reportRandom",
            Self::ReportLessThan => "reportLessThan",
            Self::ReportEquals => "reportEquals",
            Self::ReportGreaterThan => "reportGreaterThan",
            Self::ReportAnd => "reportAnd",
            Self::ReportOr => "reportOr",
            Self::ReportNot => "reportNot",
            Self::ReportTrue => "reportTrue",
            Self::ReportFalse => "reportFalse",
            Self::ReportJoinWords => "reportJoinWords",
            Self::ReportLetter => "reportLetter",
            Self::ReportStringSize => "reportStringSize",
            Self::ReportNewList => "reportNewList",
            Self::ReportListItem => "reportListItem",
            Self::ReportListLength => "reportListLength",
            Self::ReportCONS => "reportCONS",
            Self::ReportCDR => "reportCDR",
            Self::ReportListContainsItem => "reportListContainsItem",
            Self::ReportKeyPressed => "reportKeyPressed",
        }
    }

    /// Looks up an engine primitive by selector.
    #[must_use]
    pub fn from_selector(selector: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.selector() == selector)
    }

    /// Special forms control the evaluation of their own inputs.
    #[must_use]
    pub const fn is_special_form(self) -> bool {
        matches!(self, Self::ReportAnd | Self::ReportOr | Self::ReportScript)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.selector())
    }
}
