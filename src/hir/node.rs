//! The capability contract between syntax nodes and the analyzer.
//!
//! Nodes own their children and recurse into them; the analyzer only keeps
//! context and answers resolution queries. Each hook runs once per node in
//! the matching pass.

use super::analyzer::Analyzer;
use super::errors::AnalysisFault;

pub trait Analyzable {
    /// Pass 1. No scope is available.
    fn pre_analyze(&mut self, _analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        Ok(())
    }

    /// Pass 2. Member shapes: bases, signatures, fields.
    fn analyze_members(&mut self, _analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        Ok(())
    }

    /// Pass 3, with the global scope active.
    fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault>;
}

/// Work queued with [`Analyzer::defer`] during full analysis and run once
/// in pass 4.
pub trait PostAnalyzable: Send {
    fn post_analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault>;
}
