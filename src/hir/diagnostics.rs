//! Diagnostics: user-facing errors and warnings produced during analysis.
//!
//! The analyzer reports through a [`DiagnosticCollector`]. What the collector
//! keeps, drops or promotes is decided by the caller's [`DiagnosticPolicy`].

use std::sync::Arc;

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::base::{LineCol, SourceId, Span};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    /// Severity implied by a code from [`codes`]: `E…` is an error, anything
    /// else a warning.
    pub fn of_code(code: &str) -> Self {
        if code.starts_with('E') {
            Severity::Error
        } else {
            Severity::Warning
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// The source unit containing this diagnostic.
    pub source: SourceId,
    pub start: LineCol,
    pub end: LineCol,
    pub severity: Severity,
    /// Code from [`codes`] (e.g., "E0101").
    pub code: &'static str,
    pub message: Arc<str>,
    pub related: Vec<RelatedInfo>,
}

/// A secondary location attached to a diagnostic.
#[derive(Clone, Debug)]
pub struct RelatedInfo {
    pub source: SourceId,
    pub position: LineCol,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a diagnostic; severity follows the code.
    pub fn new(code: &'static str, source: SourceId, span: Span, message: impl Into<Arc<str>>) -> Self {
        Self {
            source,
            start: span.start,
            end: span.end,
            severity: Severity::of_code(code),
            code,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Add related information.
    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Diagnostic codes reported by the analyzer.
pub mod codes {
    // -- names --------------------------------------------------------------
    pub const UNKNOWN_FUNCTION: &str = "W0101";
    pub const UNKNOWN_FUNCTION_WITH_ALIAS: &str = "W0102";
    pub const UNKNOWN_CLASS: &str = "W0103";
    pub const UNKNOWN_CLASS_WITH_ALIAS: &str = "W0104";
    pub const UNKNOWN_CONSTANT: &str = "W0105";
    pub const UNKNOWN_CONSTANT_WITH_ALIAS: &str = "W0106";
    pub const AMBIGUOUS_NAME: &str = "E0107";

    // -- members ------------------------------------------------------------
    pub const UNKNOWN_METHOD: &str = "E0201";
    pub const PRIVATE_METHOD_CALLED: &str = "E0202";
    pub const PROTECTED_METHOD_CALLED: &str = "E0203";
    pub const PRIVATE_CTOR_CALLED: &str = "E0204";
    pub const PROTECTED_CTOR_CALLED: &str = "E0205";
    pub const UNKNOWN_PROPERTY: &str = "E0206";
    pub const PRIVATE_PROPERTY_ACCESSED: &str = "E0207";
    pub const PROTECTED_PROPERTY_ACCESSED: &str = "E0208";
    pub const UNKNOWN_CLASS_CONSTANT: &str = "E0209";
    pub const PRIVATE_CONSTANT_ACCESSED: &str = "E0210";
    pub const PROTECTED_CONSTANT_ACCESSED: &str = "E0211";

    // -- contextual class keywords -------------------------------------------
    pub const SELF_OUTSIDE_CLASS: &str = "E0301";
    pub const STATIC_OUTSIDE_CLASS: &str = "E0302";
    pub const PARENT_OUTSIDE_CLASS: &str = "E0303";
    pub const PARENT_ON_INTERFACE: &str = "E0304";
    pub const CLASS_HAS_NO_PARENT: &str = "E0305";
    pub const RESERVED_CLASS_NAME: &str = "E0306";

    // -- control flow -------------------------------------------------------
    pub const DUPLICATE_SWITCH_CASE: &str = "W0401";
    pub const DUPLICATE_DEFAULT: &str = "W0402";
    pub const UNREACHABLE_CODE: &str = "W0403";
    pub const INVALID_BREAK_LEVEL: &str = "E0404";
    pub const LABEL_REDECLARED: &str = "E0405";
    pub const UNUSED_LABEL: &str = "W0406";
    pub const UNDEFINED_LABEL: &str = "E0407";

    // -- misc ---------------------------------------------------------------
    pub const UNOPTIMIZED_LOCALS: &str = "W0501";
    pub const GENERIC_ARITY_MISMATCH: &str = "W0502";
}

// ============================================================================
// POLICY
// ============================================================================

/// Caller-controlled handling of reported diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DiagnosticPolicy {
    /// Warning codes that are dropped on arrival.
    pub disabled_warnings: FxHashSet<SmolStr>,
    /// Promote every warning to an error.
    pub warnings_as_errors: bool,
    /// Stop storing errors after this many (they are still counted).
    pub max_errors: Option<usize>,
}

impl DiagnosticPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disabled_warning(mut self, code: &str) -> Self {
        self.disabled_warnings.insert(SmolStr::new(code));
        self
    }

    pub fn with_warnings_as_errors(mut self, enabled: bool) -> Self {
        self.warnings_as_errors = enabled;
        self
    }

    pub fn with_max_errors(mut self, limit: usize) -> Self {
        self.max_errors = Some(limit);
        self
    }
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during semantic analysis.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    policy: DiagnosticPolicy,
    error_total: usize,
    suppressed: usize,
}

impl DiagnosticCollector {
    /// Create a new empty collector with the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DiagnosticPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> &DiagnosticPolicy {
        &self.policy
    }

    /// Add a diagnostic, applying the policy.
    pub fn add(&mut self, mut diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Warning {
            if self.policy.disabled_warnings.contains(diagnostic.code) {
                self.suppressed += 1;
                return;
            }
            if self.policy.warnings_as_errors {
                diagnostic.severity = Severity::Error;
            }
        }

        if diagnostic.severity == Severity::Error {
            self.error_total += 1;
            if self
                .policy
                .max_errors
                .is_some_and(|limit| self.error_total > limit)
            {
                return;
            }
        }

        self.diagnostics.push(diagnostic);
    }

    /// Report `(code, location, message)`.
    pub fn report(&mut self, code: &'static str, source: SourceId, span: Span, message: impl Into<Arc<str>>) {
        self.add(Diagnostic::new(code, source, span, message));
    }

    /// Get all stored diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get stored diagnostics for a specific source unit.
    pub fn diagnostics_for_source(&self, source: SourceId) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.source == source).collect()
    }

    /// Number of stored diagnostics with the given code.
    pub fn count_code(&self, code: &str) -> usize {
        self.diagnostics.iter().filter(|d| d.code == code).count()
    }

    /// Number of errors reported, including those past `max_errors`.
    pub fn error_count(&self) -> usize {
        self.error_total
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    /// Number of warnings dropped by the policy.
    pub fn suppressed_count(&self) -> usize {
        self.suppressed
    }

    pub fn has_errors(&self) -> bool {
        self.error_total > 0
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.error_total = 0;
        self.suppressed = 0;
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning() -> Diagnostic {
        Diagnostic::new(codes::UNKNOWN_CLASS, SourceId::new(0), Span::at(0, 0), "unknown class")
    }

    fn error() -> Diagnostic {
        Diagnostic::new(codes::UNKNOWN_METHOD, SourceId::new(0), Span::at(0, 0), "unknown method")
    }

    #[test]
    fn test_severity_from_code() {
        assert_eq!(warning().severity, Severity::Warning);
        assert_eq!(error().severity, Severity::Error);
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new();
        collector.add(error());
        collector.add(error());
        collector.add(warning());

        assert_eq!(collector.error_count(), 2);
        assert_eq!(collector.warning_count(), 1);
        assert_eq!(collector.count_code(codes::UNKNOWN_METHOD), 2);
        assert!(collector.has_errors());
    }

    #[test]
    fn test_collector_by_source() {
        let mut collector = DiagnosticCollector::new();
        collector.report(codes::UNKNOWN_METHOD, SourceId::new(0), Span::at(1, 0), "a");
        collector.report(codes::UNKNOWN_METHOD, SourceId::new(1), Span::at(1, 0), "b");
        collector.report(codes::UNKNOWN_METHOD, SourceId::new(0), Span::at(2, 0), "c");

        assert_eq!(collector.diagnostics_for_source(SourceId::new(0)).len(), 2);
        assert_eq!(collector.diagnostics_for_source(SourceId::new(1)).len(), 1);
    }

    #[test]
    fn test_disabled_warning_is_dropped() {
        let policy = DiagnosticPolicy::new().with_disabled_warning(codes::UNKNOWN_CLASS);
        let mut collector = DiagnosticCollector::with_policy(policy);
        collector.add(warning());
        collector.add(error());

        assert_eq!(collector.diagnostics().len(), 1);
        assert_eq!(collector.suppressed_count(), 1);
    }

    #[test]
    fn test_warnings_as_errors() {
        let mut collector =
            DiagnosticCollector::with_policy(DiagnosticPolicy::new().with_warnings_as_errors(true));
        collector.add(warning());

        assert_eq!(collector.diagnostics()[0].severity, Severity::Error);
        assert_eq!(collector.error_count(), 1);
    }

    #[test]
    fn test_max_errors_keeps_counting() {
        let mut collector = DiagnosticCollector::with_policy(DiagnosticPolicy::new().with_max_errors(1));
        collector.add(error());
        collector.add(error());
        collector.add(warning());

        assert_eq!(collector.diagnostics().len(), 2);
        assert_eq!(collector.error_count(), 2);
    }

    #[test]
    fn test_related_info() {
        let diag = error().with_related(RelatedInfo {
            source: SourceId::new(0),
            position: LineCol::new(3, 1),
            message: Arc::from("previous definition"),
        });
        assert_eq!(diag.related.len(), 1);
    }
}
