//! Compile-time variable and label tables of one routine (or global code).

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::base::{Span, VariableName};

// ============================================================================
// VARIABLES
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableEntry {
    pub name: VariableName,
    pub is_ref: bool,
    pub is_parameter: bool,
    /// Parameters start unused; ordinary locals are always directly used.
    pub is_directly_used: bool,
}

/// Locals and parameters of a routine, with their by-reference classification.
///
/// Classification only ever moves from by-value to by-reference. After
/// [`set_all_ref`](Self::set_all_ref) every entry, existing or future, is
/// by-reference.
#[derive(Clone, Debug, Default)]
pub struct VariablesTable {
    entries: IndexMap<VariableName, VariableEntry, FxBuildHasher>,
    all_ref: bool,
}

impl VariablesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a use of `name`. Superglobals are never recorded.
    pub fn set(&mut self, name: &VariableName, is_ref: bool) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.is_directly_used = true;
            entry.is_ref |= is_ref || self.all_ref;
            return;
        }
        if name.is_auto_global() {
            return;
        }
        self.entries.insert(
            name.clone(),
            VariableEntry {
                name: name.clone(),
                is_ref: is_ref || self.all_ref,
                is_parameter: false,
                is_directly_used: true,
            },
        );
    }

    /// Declare a formal parameter. Redeclaring a name replaces the entry.
    pub fn add_parameter(&mut self, name: VariableName, passed_by_ref: bool) {
        let entry = VariableEntry {
            name: name.clone(),
            is_ref: passed_by_ref || self.all_ref,
            is_parameter: true,
            is_directly_used: false,
        };
        self.entries.insert(name, entry);
    }

    pub fn set_all_ref(&mut self) {
        self.all_ref = true;
        for entry in self.entries.values_mut() {
            entry.is_ref = true;
        }
    }

    pub fn is_all_ref(&self) -> bool {
        self.all_ref
    }

    pub fn get(&self, name: &VariableName) -> Option<&VariableEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &VariableName) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// LABELS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LabelState {
    Declared { span: Span, referred: bool },
    /// Target of a `goto` with no declaration seen yet.
    Referenced { span: Span },
}

/// Problem found when a label table is validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelProblem {
    Unused { name: VariableName, span: Span },
    Undefined { name: VariableName, span: Span },
}

#[derive(Clone, Debug, Default)]
pub struct LabelTable {
    labels: IndexMap<VariableName, LabelState, FxBuildHasher>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a label. On redeclaration returns the span of the first one.
    pub fn declare(&mut self, name: VariableName, span: Span) -> Result<(), Span> {
        match self.labels.get_mut(&name) {
            Some(LabelState::Declared { span: previous, .. }) => Err(*previous),
            Some(state @ LabelState::Referenced { .. }) => {
                *state = LabelState::Declared {
                    span,
                    referred: true,
                };
                Ok(())
            }
            None => {
                self.labels.insert(
                    name,
                    LabelState::Declared {
                        span,
                        referred: false,
                    },
                );
                Ok(())
            }
        }
    }

    /// Record a jump to `name`.
    pub fn reference(&mut self, name: VariableName, span: Span) {
        match self.labels.get_mut(&name) {
            Some(LabelState::Declared { referred, .. }) => *referred = true,
            Some(LabelState::Referenced { .. }) => {}
            None => {
                self.labels.insert(name, LabelState::Referenced { span });
            }
        }
    }

    pub fn is_declared(&self, name: &VariableName) -> bool {
        matches!(self.labels.get(name), Some(LabelState::Declared { .. }))
    }

    /// Unused and undefined labels, in declaration order.
    pub fn validate(&self) -> Vec<LabelProblem> {
        self.labels
            .iter()
            .filter_map(|(name, state)| match *state {
                LabelState::Declared { referred: true, .. } => None,
                LabelState::Declared { span, referred: false } => Some(LabelProblem::Unused {
                    name: name.clone(),
                    span,
                }),
                LabelState::Referenced { span } => Some(LabelProblem::Undefined {
                    name: name.clone(),
                    span,
                }),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
