use std::sync::Arc;

use tracing::trace;

use crate::base::{GenericQualifiedName, Name, PropertyCollection, QualifiedName, Span, VariableName};
use crate::hir::{
    Analyzable, AnalysisFault, Analyzer, ConstValue, ConstructedType, DType, PostAnalyzable, Routine,
    RoutineProperties, UnknownType,
};

use super::ArgumentPassing;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Concat,
    Equal,
}

impl BinaryOp {
    /// The right operand may not run.
    fn short_circuits(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

#[derive(Debug)]
pub enum ExprKind {
    Literal(ConstValue),
    Variable(VariableName),
    Assign {
        target: VariableName,
        value: Box<Expr>,
        by_ref: bool,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `name(args)`
    Call { name: QualifiedName, args: Vec<Expr> },
    /// `$callee(args)`
    IndirectCall { callee: Box<Expr>, args: Vec<Expr> },
    /// `Class::method(args)`
    StaticCall {
        class: GenericQualifiedName,
        method: Name,
        args: Vec<Expr>,
    },
    /// `$this->method(args)`
    ThisCall { method: Name, args: Vec<Expr> },
    /// `new Class(args)`
    New { class: GenericQualifiedName, args: Vec<Expr> },
    /// `Class::NAME`
    ClassConstant { class: QualifiedName, name: VariableName },
    /// `Class::$name`
    StaticProperty { class: QualifiedName, name: VariableName },
    /// `NAME`
    Constant(QualifiedName),
    /// `exit` / `die`
    Exit,
}

#[derive(Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub props: PropertyCollection,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            props: PropertyCollection::new(),
        }
    }

    pub fn literal(value: ConstValue, span: Span) -> Self {
        Self::new(ExprKind::Literal(value), span)
    }

    pub fn variable(name: impl Into<VariableName>, span: Span) -> Self {
        Self::new(ExprKind::Variable(name.into()), span)
    }

    pub fn assign(target: impl Into<VariableName>, value: Expr, span: Span) -> Self {
        Self::new(
            ExprKind::Assign {
                target: target.into(),
                value: Box::new(value),
                by_ref: false,
            },
            span,
        )
    }

    pub fn call(name: QualifiedName, args: Vec<Expr>, span: Span) -> Self {
        Self::new(ExprKind::Call { name, args }, span)
    }

    pub fn static_call(class: impl Into<GenericQualifiedName>, method: impl Into<Name>, args: Vec<Expr>, span: Span) -> Self {
        Self::new(
            ExprKind::StaticCall {
                class: class.into(),
                method: method.into(),
                args,
            },
            span,
        )
    }

    pub fn new_object(class: impl Into<GenericQualifiedName>, args: Vec<Expr>, span: Span) -> Self {
        Self::new(
            ExprKind::New {
                class: class.into(),
                args,
            },
            span,
        )
    }

    /// Value known at compile time: literals and `true`/`false`/`null`.
    pub fn constant_value(&self) -> Option<ConstValue> {
        match &self.kind {
            ExprKind::Literal(value) => Some(value.clone()),
            ExprKind::Constant(name) if *name == QualifiedName::TRUE => Some(ConstValue::Bool(true)),
            ExprKind::Constant(name) if *name == QualifiedName::FALSE => Some(ConstValue::Bool(false)),
            ExprKind::Constant(name) if *name == QualifiedName::NULL => Some(ConstValue::Null),
            _ => None,
        }
    }
}

pub(super) fn is_truthy(value: &ConstValue) -> bool {
    match value {
        ConstValue::Null => false,
        ConstValue::Bool(b) => *b,
        ConstValue::Int(i) => *i != 0,
        ConstValue::Double(d) => *d != 0.0,
        ConstValue::String(s) => !(s.is_empty() || s == "0"),
    }
}

/// Finalizes a constructed type once the whole unit has been analyzed.
/// Instantiations of unresolved generics never enter the cache, so this is
/// their only way to be finalized.
#[derive(Debug)]
struct FinalizeConstructed(Arc<ConstructedType>);

impl PostAnalyzable for FinalizeConstructed {
    fn post_analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        analyzer.analyze_constructed_type(&self.0);
        Ok(())
    }
}

fn defer_constructed(ty: &DType, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
    if let DType::Constructed(constructed) = ty {
        if !constructed.generic_type().is_definite() {
            analyzer.defer(Box::new(FinalizeConstructed(Arc::clone(constructed))))?;
        }
    }
    Ok(())
}

/// Analyze call arguments against `target`'s signature.
fn analyze_args(args: &mut [Expr], target: Arc<Routine>, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
    analyzer.enter_actual_params(target, args.len());
    for arg in args.iter_mut() {
        analyzer.enter_act_param()?;
        let passing = ArgumentPassing {
            by_ref: analyzer.act_param_passed_by_ref()?,
            target_unknown: analyzer.act_param_decl_is_unknown()?,
        };
        if passing.by_ref || passing.target_unknown {
            if let ExprKind::Variable(name) = &arg.kind {
                analyzer.current_var_table().set(name, true);
            }
        }
        arg.props.set_typed(passing);
        arg.analyze(analyzer)?;
    }
    analyzer.leave_actual_params()
}

impl Analyzable for Expr {
    fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        let span = self.span;
        let known_value = self.constant_value().is_some();
        match &mut self.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Variable(name) => {
                if !name.is_this() {
                    analyzer.current_var_table().set(name, false);
                }
            }
            ExprKind::Assign { target, value, by_ref } => {
                value.analyze(analyzer)?;
                if !target.is_this() {
                    analyzer.current_var_table().set(target, *by_ref);
                }
            }
            ExprKind::Binary { op, left, right } => {
                left.analyze(analyzer)?;
                if op.short_circuits() {
                    analyzer.enter_conditional_code();
                    right.analyze(analyzer)?;
                    analyzer.leave_conditional_code()?;
                } else {
                    right.analyze(analyzer)?;
                }
            }
            ExprKind::Call { name, args } => {
                let routine = analyzer.resolve_function_name(name, span)?;
                analyzer.note_callee(&routine, span);
                analyze_args(args, Arc::clone(&routine), analyzer)?;
                self.props.set_typed(routine);
            }
            ExprKind::IndirectCall { callee, args } => {
                callee.analyze(analyzer)?;
                analyzer.add_current_routine_property(RoutineProperties::CONTAINS_INDIRECT_CALL);
                analyze_args(args, Routine::unknown_function(&QualifiedName::ERROR), analyzer)?;
            }
            ExprKind::StaticCall { class, method, args } => {
                let ty = analyzer.resolve_generic_type_name(class, span)?;
                defer_constructed(&ty, analyzer)?;
                let resolution = analyzer.resolve_method(&ty, method, span, true);
                analyzer.note_callee(&resolution.routine, span);
                analyze_args(args, Arc::clone(&resolution.routine), analyzer)?;
                self.props.set_typed(ty);
                self.props.set_typed(resolution);
            }
            ExprKind::ThisCall { method, args } => {
                let ty = analyzer
                    .current_type()
                    .map_or(DType::Unknown(UnknownType::SelfRef), DType::Known);
                let resolution = analyzer.resolve_method(&ty, method, span, false);
                analyze_args(args, Arc::clone(&resolution.routine), analyzer)?;
                self.props.set_typed(resolution);
            }
            ExprKind::New { class, args } => {
                let ty = analyzer.resolve_generic_type_name(class, span)?;
                defer_constructed(&ty, analyzer)?;
                let resolution = analyzer.resolve_constructor(&ty, span);
                analyze_args(args, Arc::clone(&resolution.routine), analyzer)?;
                self.props.set_typed(ty);
                self.props.set_typed(resolution);
            }
            ExprKind::ClassConstant { class, name } => {
                let ty = analyzer.resolve_type_name(class, span)?;
                let resolution = analyzer.resolve_class_constant_name(&ty, name, span);
                self.props.set_typed(ty);
                self.props.set_typed(resolution);
            }
            ExprKind::StaticProperty { class, name } => {
                let ty = analyzer.resolve_type_name(class, span)?;
                let resolution = analyzer.resolve_property(&ty, name, span, true);
                self.props.set_typed(ty);
                self.props.set_typed(resolution);
            }
            ExprKind::Constant(name) => {
                if !known_value {
                    let constant = analyzer.resolve_global_constant_name(name, span)?;
                    trace!(%name, unknown = constant.is_unknown, "constant use");
                    self.props.set_typed(constant);
                }
            }
            ExprKind::Exit => analyzer.enter_unreachable_code(),
        }
        Ok(())
    }
}
