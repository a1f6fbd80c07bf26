use std::sync::Arc;

use tracing::debug;

use crate::hir::{AnalysisFault, AnalysisOptions, Analyzer, Declaration, Diagnostic, SourceUnit};
use crate::syntax::GlobalCode;

/// One source unit of a compilation together with its syntax tree.
pub struct CompilationUnit {
    pub unit: Arc<dyn SourceUnit>,
    pub code: GlobalCode,
}

/// The units of one compilation and the analyzer that checks them.
///
/// [`run`](Compilation::run) drives the passes in order: pre-analysis of all
/// units, member analysis of all units, full analysis unit by unit, then
/// constructed-type finalization and post-analysis. Post-analysis finalizes
/// again whatever its deferred items instantiated. Every pass completes
/// for the whole compilation before the next begins, so a call may bind to a
/// function declared later or in another unit.
pub struct Compilation {
    analyzer: Analyzer,
    units: Vec<CompilationUnit>,
}

impl Default for Compilation {
    fn default() -> Self {
        Self::new(AnalysisOptions::default())
    }
}

impl Compilation {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            analyzer: Analyzer::new(options),
            units: Vec::new(),
        }
    }

    pub fn add_unit(&mut self, unit: Arc<dyn SourceUnit>, code: GlobalCode) {
        self.units.push(CompilationUnit { unit, code });
    }

    pub fn with_unit(mut self, unit: Arc<dyn SourceUnit>, code: GlobalCode) -> Self {
        self.add_unit(unit, code);
        self
    }

    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    /// Run all passes and return the collected diagnostics.
    ///
    /// A compilation runs once; running it again is a state regression.
    pub fn run(&mut self) -> Result<Vec<Diagnostic>, AnalysisFault> {
        let Self { analyzer, units } = self;
        debug!(units = units.len(), "compilation started");

        analyzer.pre_analyze(
            units
                .iter_mut()
                .map(|u| Declaration::new(Arc::clone(&u.unit), &mut u.code)),
        )?;
        analyzer.analyze_members(
            units
                .iter_mut()
                .map(|u| Declaration::new(Arc::clone(&u.unit), &mut u.code)),
        )?;
        for u in units.iter_mut() {
            analyzer.analyze(Arc::clone(&u.unit), &mut u.code)?;
        }
        analyzer.finalize_constructed_types();
        analyzer.post_analyze()?;

        let diagnostics = analyzer.take_diagnostics();
        debug!(count = diagnostics.len(), "compilation finished");
        Ok(diagnostics)
    }
}
