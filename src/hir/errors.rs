//! Internal-consistency faults.
//!
//! A fault means the tree walker broke the analyzer's calling contract
//! (unbalanced enter/leave, a query in the wrong context, a pass run out of
//! order). Faults are never produced by malformed user source and are never
//! converted into user diagnostics.

use thiserror::Error;

use super::analyzer::AnalyzerState;
use super::location::LocationKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisFault {
    #[error("location stack mismatch: expected to leave {expected:?}, found {found:?}")]
    LocationMismatch {
        expected: LocationKind,
        found: LocationKind,
    },

    #[error("location stack is empty, cannot leave {expected:?}")]
    EmptyLocationStack { expected: LocationKind },

    #[error("query requires the innermost location to be {expected:?}, found {found:?}")]
    WrongLocation {
        expected: LocationKind,
        found: LocationKind,
    },

    #[error("method declarations must be entered directly inside a type declaration, found {found:?}")]
    MethodOutsideType { found: LocationKind },

    #[error("actual parameter {index} is out of range for a call with {count} arguments")]
    ActualParamOverflow { index: usize, count: usize },

    #[error("no actual parameter has been entered yet")]
    NoCurrentActualParam,

    #[error("conditional nesting level would become negative")]
    ConditionalUnderflow,

    #[error("loop nesting level would become negative")]
    LoopNestingUnderflow,

    #[error("namespace declarations cannot be nested")]
    NestedNamespace,

    #[error("no namespace declaration is open")]
    NoOpenNamespace,

    #[error("scope is available only during full analysis")]
    ScopeUnavailable,

    #[error("no source unit is being analyzed")]
    NoSourceUnit,

    #[error("analyzer cannot move back from {from:?} to {to:?}")]
    StateRegression { from: AnalyzerState, to: AnalyzerState },

    #[error("post-analysis queue has already been drained")]
    PostAnalysisClosed,

    #[error("'{name}' was analyzed before it was declared")]
    NotDeclared { name: String },
}
