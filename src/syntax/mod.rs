//! Reference syntax tree.
//!
//! The nodes here cover the constructs the analyzer has an opinion about:
//! declarations, calls, member accesses, control flow and jumps. They are
//! built directly (there is no parser in this crate) and implement
//! [`Analyzable`](crate::hir::Analyzable) by recursing into their children
//! and calling back into the [`Analyzer`](crate::hir::Analyzer).
//!
//! Results of analysis are attached to nodes through their
//! [`PropertyCollection`](crate::base::PropertyCollection) as typed
//! properties: resolved routines and types, [`ArgumentPassing`] on call
//! arguments, the routine's variables table on declarations, and
//! [`Unreachable`] on skipped statements.

mod decl;
mod expr;
mod global;
mod stmt;

pub use decl::{ClassConstDecl, ClassDecl, ConstDecl, FunctionDecl, MethodDecl, NamespaceDecl, Param, PropertyDecl};
pub use expr::{BinaryOp, Expr, ExprKind};
pub use global::GlobalCode;
pub use stmt::{Stmt, StmtKind, SwitchItem};

/// Marks a statement that was skipped because it cannot be reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unreachable;

/// How a call argument is handed to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgumentPassing {
    pub by_ref: bool,
    /// The target's signature is unknown, so by-reference passing is
    /// decided at runtime.
    pub target_unknown: bool,
}
