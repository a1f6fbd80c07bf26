//! # quill
//!
//! Semantic analysis core for a PHP-like scripting language compiled to IL:
//! name, type and member resolution over an already-built syntax tree.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! project → Compilation runner, parallel batch runner
//!   ↓
//! syntax  → Reference syntax tree implementing the analysis contract
//!   ↓
//! hir     → Symbols, analyzer state machine, resolver, diagnostics
//!   ↓
//! base    → Primitives (names, spans, property bag)
//! ```

/// Foundation types: identifiers, source positions, node properties
pub mod base;

/// Semantic core: symbols, analyzer, resolver, diagnostics
pub mod hir;

/// Reference syntax tree nodes
pub mod syntax;

/// Compilation and batch drivers
pub mod project;

pub use base::{Name, QualifiedName, SourceId, Span, VariableName};
pub use hir::{AnalysisFault, AnalysisOptions, Analyzer, Diagnostic, DiagnosticPolicy, codes};
pub use project::{Compilation, analyze_batch};
