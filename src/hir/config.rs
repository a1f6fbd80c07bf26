//! Analysis options.

use super::diagnostics::DiagnosticPolicy;

/// Options for one analyzer.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnalysisOptions {
    /// How reported diagnostics are filtered and promoted.
    pub policy: DiagnosticPolicy,
    /// Report unknown global constants that were not reached through an
    /// alias. Off by default: such constants may be defined at runtime.
    pub report_unknown_constants: bool,
    /// Reject type declarations named `self`, `parent` or `static`.
    pub check_reserved_names: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            policy: DiagnosticPolicy::default(),
            report_unknown_constants: false,
            check_reserved_names: true,
        }
    }
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: DiagnosticPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_report_unknown_constants(mut self, enabled: bool) -> Self {
        self.report_unknown_constants = enabled;
        self
    }

    pub fn with_check_reserved_names(mut self, enabled: bool) -> Self {
        self.check_reserved_names = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = AnalysisOptions::new();
        assert!(!options.report_unknown_constants);
        assert!(options.check_reserved_names);
        assert!(!options.policy.warnings_as_errors);
    }

    #[test]
    fn test_builder() {
        let options = AnalysisOptions::new()
            .with_report_unknown_constants(true)
            .with_check_reserved_names(false)
            .with_policy(DiagnosticPolicy::new().with_max_errors(3));

        assert!(options.report_unknown_constants);
        assert!(!options.check_reserved_names);
        assert_eq!(options.policy.max_errors, Some(3));
    }
}
