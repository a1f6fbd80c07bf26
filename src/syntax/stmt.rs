use crate::base::{PropertyCollection, Span, VariableName};
use crate::hir::{Analyzable, AnalysisFault, Analyzer};

use super::decl::{ClassDecl, ConstDecl, FunctionDecl, NamespaceDecl};
use super::expr::{is_truthy, Expr};
use super::Unreachable;

#[derive(Debug)]
pub enum StmtKind {
    Expr(Expr),
    Block(Vec<Stmt>),
    If {
        cond: Expr,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    While { cond: Expr, body: Vec<Stmt> },
    Switch { subject: Expr, items: Vec<SwitchItem> },
    /// `break n;`
    Break(usize),
    /// `continue n;`
    Continue(usize),
    Return(Option<Expr>),
    Goto(VariableName),
    Label(VariableName),
    Function(FunctionDecl),
    Class(ClassDecl),
    Const(ConstDecl),
    Namespace(NamespaceDecl),
}

#[derive(Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
    pub props: PropertyCollection,
}

#[derive(Debug)]
pub enum SwitchItem {
    Case { value: Expr, body: Vec<Stmt>, span: Span },
    Default { body: Vec<Stmt>, span: Span },
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self {
            kind,
            span,
            props: PropertyCollection::new(),
        }
    }

    pub fn expr(expr: Expr) -> Self {
        let span = expr.span;
        Self::new(StmtKind::Expr(expr), span)
    }

    /// Function, class and constant declarations.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self.kind,
            StmtKind::Function(_) | StmtKind::Class(_) | StmtKind::Const(_)
        )
    }

    pub fn is_unreachable(&self) -> bool {
        self.props.get_typed::<Unreachable>().is_some()
    }
}

// ============================================================================
// WALKERS
// ============================================================================

pub(super) fn conditionally(
    analyzer: &mut Analyzer,
    walk: impl FnOnce(&mut Analyzer) -> Result<(), AnalysisFault>,
) -> Result<(), AnalysisFault> {
    analyzer.enter_conditional_code();
    walk(analyzer)?;
    analyzer.leave_conditional_code()
}

pub(super) fn pre_analyze_all(stmts: &mut [Stmt], analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
    stmts.iter_mut().try_for_each(|s| s.pre_analyze(analyzer))
}

pub(super) fn analyze_members_all(stmts: &mut [Stmt], analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
    stmts.iter_mut().try_for_each(|s| s.analyze_members(analyzer))
}

pub(super) fn analyze_all(stmts: &mut [Stmt], analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
    stmts.iter_mut().try_for_each(|s| s.analyze(analyzer))
}

/// Report a body that is never entered, without analyzing it.
fn report_skipped(body: &[Stmt], analyzer: &mut Analyzer) {
    if let Some(first) = body.first() {
        analyzer.enter_unreachable_code();
        analyzer.report_unreachable_code(first.span);
        analyzer.leave_unreachable_code();
    }
}

fn analyze_arm(body: &mut [Stmt], never_taken: bool, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
    if never_taken {
        report_skipped(body, analyzer);
        return Ok(());
    }
    conditionally(analyzer, |a| analyze_all(body, a))
}

impl SwitchItem {
    fn body_mut(&mut self) -> &mut Vec<Stmt> {
        match self {
            SwitchItem::Case { body, .. } | SwitchItem::Default { body, .. } => body,
        }
    }

    fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        match self {
            SwitchItem::Case { value, span, .. } => {
                value.analyze(analyzer)?;
                if let Some(constant) = value.constant_value() {
                    analyzer.add_const_case(constant, *span)?;
                }
            }
            SwitchItem::Default { span, .. } => analyzer.add_default(*span)?,
        }
        conditionally(analyzer, |a| analyze_all(self.body_mut(), a))
    }
}

impl Analyzable for Stmt {
    /// Register declarations. Anything under a branch, loop or routine body
    /// is declared conditionally.
    fn pre_analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        match &mut self.kind {
            StmtKind::Function(decl) => decl.pre_analyze(analyzer),
            StmtKind::Class(decl) => decl.pre_analyze(analyzer),
            StmtKind::Const(decl) => decl.pre_analyze(analyzer),
            StmtKind::Namespace(decl) => decl.pre_analyze(analyzer),
            StmtKind::Block(body) => pre_analyze_all(body, analyzer),
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => conditionally(analyzer, |a| {
                pre_analyze_all(then_body, a)?;
                pre_analyze_all(else_body, a)
            }),
            StmtKind::While { body, .. } => conditionally(analyzer, |a| pre_analyze_all(body, a)),
            StmtKind::Switch { items, .. } => conditionally(analyzer, |a| {
                items
                    .iter_mut()
                    .try_for_each(|item| pre_analyze_all(item.body_mut(), a))
            }),
            _ => Ok(()),
        }
    }

    fn analyze_members(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        match &mut self.kind {
            StmtKind::Function(decl) => decl.analyze_members(analyzer),
            StmtKind::Class(decl) => decl.analyze_members(analyzer),
            StmtKind::Namespace(decl) => decl.analyze_members(analyzer),
            StmtKind::Block(body) | StmtKind::While { body, .. } => analyze_members_all(body, analyzer),
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => {
                analyze_members_all(then_body, analyzer)?;
                analyze_members_all(else_body, analyzer)
            }
            StmtKind::Switch { items, .. } => items
                .iter_mut()
                .try_for_each(|item| analyze_members_all(item.body_mut(), analyzer)),
            _ => Ok(()),
        }
    }

    fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        let span = self.span;

        // Labels are jump targets and are declared even in dead code.
        if let StmtKind::Label(label) = &self.kind {
            analyzer.declare_label(label.clone(), span);
            return Ok(());
        }

        if analyzer.is_this_code_unreachable() {
            analyzer.report_unreachable_code(span);
            self.props.set_typed(Unreachable);
            // Declarations are still analyzed to find more errors.
            if !self.is_declaration() {
                return Ok(());
            }
        }

        match &mut self.kind {
            StmtKind::Expr(expr) => expr.analyze(analyzer),
            StmtKind::Block(body) => analyze_all(body, analyzer),
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                cond.analyze(analyzer)?;
                let known = cond.constant_value().map(|v| is_truthy(&v));
                analyze_arm(then_body, known == Some(false), analyzer)?;
                analyze_arm(else_body, known == Some(true), analyzer)
            }
            StmtKind::While { cond, body } => {
                cond.analyze(analyzer)?;
                if cond.constant_value().is_some_and(|v| !is_truthy(&v)) {
                    report_skipped(body, analyzer);
                    return Ok(());
                }
                analyzer.enter_loop_body();
                analyze_all(body, analyzer)?;
                analyzer.leave_loop_body()
            }
            StmtKind::Switch { subject, items } => {
                subject.analyze(analyzer)?;
                analyzer.enter_switch_body();
                for item in items.iter_mut() {
                    item.analyze(analyzer)?;
                }
                analyzer.leave_switch_body()
            }
            StmtKind::Break(level) | StmtKind::Continue(level) => {
                analyzer.check_jump_level(*level, span);
                Ok(())
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    value.analyze(analyzer)?;
                }
                analyzer.enter_unreachable_code();
                Ok(())
            }
            StmtKind::Goto(label) => {
                analyzer.reference_label(label.clone(), span);
                analyzer.enter_unreachable_code();
                Ok(())
            }
            StmtKind::Label(_) => Ok(()),
            StmtKind::Function(decl) => decl.analyze(analyzer),
            StmtKind::Class(decl) => decl.analyze(analyzer),
            StmtKind::Const(decl) => decl.analyze(analyzer),
            StmtKind::Namespace(decl) => decl.analyze(analyzer),
        }
    }
}
