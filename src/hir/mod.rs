//! Semantic analysis.
//!
//! ## Layout
//!
//! - [`symbols`] - types, routines, properties and constants
//! - [`unit`] - the [`SourceUnit`] contract and the in-memory [`UnitCatalog`]
//! - [`location`], [`reachability`], [`variables`] - walker context
//! - [`constructed`] - generic instantiation cache
//! - [`analyzer`] - pass state machine; [`resolve`] adds name resolution
//! - [`diagnostics`], [`errors`], [`config`] - reporting, faults, options

pub mod analyzer;
pub mod config;
pub mod constructed;
pub mod diagnostics;
pub mod errors;
pub mod location;
pub mod node;
pub mod reachability;
pub mod resolve;
pub mod symbols;
pub mod unit;
pub mod variables;

pub use analyzer::{Analyzer, AnalyzerState, Declaration};
pub use config::AnalysisOptions;
pub use constructed::{ConstructedShape, ConstructedType, ConstructedTypeCache, Origin};
pub use diagnostics::{
    codes, Diagnostic, DiagnosticCollector, DiagnosticPolicy, RelatedInfo, Severity,
};
pub use errors::AnalysisFault;
pub use location::{LocationKind, LocationStack, RoutineFrame};
pub use node::{Analyzable, PostAnalyzable};
pub use reachability::Reachability;
pub use resolve::{MemberResolution, MethodResolution};
pub use symbols::{
    ClassConstant, ConstValue, DType, FormalParam, GenericParameter, GlobalConstant,
    MemberLookup, Property, Routine, RoutineKind, RoutineProperties, RoutineSignature, Scope,
    TypeDecl, TypeDeclBuilder, TypeKind, UnknownType, Visibility,
};
pub use unit::{NameLookup, SourceUnit, SymbolTable, UnitCatalog};
pub use variables::{LabelProblem, LabelTable, VariableEntry, VariablesTable};
