use crate::base::PropertyCollection;
use crate::hir::{Analyzable, AnalysisFault, Analyzer, VariablesTable};

use super::stmt::{analyze_members_all, pre_analyze_all, Stmt};

/// Top-level code of one source unit.
///
/// After full analysis the global code's [`VariablesTable`] is stored in
/// `props`.
#[derive(Debug, Default)]
pub struct GlobalCode {
    pub statements: Vec<Stmt>,
    pub props: PropertyCollection,
}

impl GlobalCode {
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self {
            statements,
            props: PropertyCollection::new(),
        }
    }

    pub fn variables(&self) -> Option<&VariablesTable> {
        self.props.get_typed()
    }
}

impl Analyzable for GlobalCode {
    fn pre_analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        pre_analyze_all(&mut self.statements, analyzer)
    }

    fn analyze_members(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        analyze_members_all(&mut self.statements, analyzer)
    }

    fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        // Each unit starts reachable.
        analyzer.leave_unreachable_code();

        for stmt in &mut self.statements {
            // A top-level declaration after `return` is still hoisted, so it
            // is valid and analyzed as reachable code.
            let hoisted = stmt.is_declaration() && analyzer.is_this_code_unreachable();
            if hoisted {
                analyzer.leave_unreachable_code();
                stmt.analyze(analyzer)?;
                analyzer.enter_unreachable_code();
            } else {
                stmt.analyze(analyzer)?;
            }
        }

        analyzer.validate_global_labels();
        analyzer.leave_unreachable_code();
        self.props.set_typed(analyzer.global_var_table().clone());
        Ok(())
    }
}
