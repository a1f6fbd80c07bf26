//! Foundation types for the analyzer.
//!
//! - [`Name`], [`VariableName`], [`QualifiedName`], [`GenericQualifiedName`] - identifiers
//! - [`Span`], [`LineCol`], [`SourceId`] - source positions
//! - [`PropertyCollection`] - keyed facts attached to syntax nodes
//!
//! This module has NO dependencies on other crate modules.

mod names;
mod property_bag;
mod span;

pub use names::{
    GenericQualifiedName, Name, NameError, PrimitiveType, QualifiedName, TypeArgument,
    VariableName, SEPARATOR,
};
pub use property_bag::{PropertyCollection, PropertyKey, MAX_LIST_SIZE};
pub use span::{LineCol, SourceId, Span, TextRange, TextSize};
