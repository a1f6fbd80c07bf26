//! Declarations: functions, classes with their members, global constants
//! and namespace blocks.
//!
//! Symbols are created in the first two passes. Pre-analysis creates the
//! function routine or the type shell and registers it with the source
//! unit; member analysis resolves bases and fills in methods, properties and
//! class constants. Full analysis then walks bodies.

use std::sync::Arc;

use tracing::trace;

use crate::base::{Name, PropertyCollection, QualifiedName, Span, VariableName};
use crate::hir::{
    Analyzable, AnalysisFault, Analyzer, ClassConstant, ConstValue, FormalParam, GlobalConstant, Property,
    Routine, RoutineSignature, TypeDecl, TypeKind, Visibility,
};

use super::expr::Expr;
use super::stmt::{analyze_all, analyze_members_all, conditionally, pre_analyze_all, Stmt};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub name: VariableName,
    pub by_ref: bool,
}

impl Param {
    pub fn new(name: impl Into<VariableName>) -> Self {
        Self {
            name: name.into(),
            by_ref: false,
        }
    }

    pub fn by_ref(name: impl Into<VariableName>) -> Self {
        Self {
            name: name.into(),
            by_ref: true,
        }
    }
}

fn signature(params: &[Param], generic_params: &[Name]) -> RoutineSignature {
    let formal = params
        .iter()
        .map(|p| FormalParam {
            name: p.name.clone(),
            by_ref: p.by_ref,
        })
        .collect();
    RoutineSignature::new(formal).with_generic_params(generic_params.iter().cloned())
}

fn declare_params(params: &[Param], analyzer: &mut Analyzer) {
    let locals = analyzer.current_var_table();
    for param in params {
        locals.add_parameter(param.name.clone(), param.by_ref);
    }
}

fn not_declared(name: impl ToString) -> AnalysisFault {
    AnalysisFault::NotDeclared {
        name: name.to_string(),
    }
}

// ============================================================================
// FUNCTIONS
// ============================================================================

#[derive(Debug)]
pub struct FunctionDecl {
    pub name: QualifiedName,
    pub params: Vec<Param>,
    pub generic_params: Vec<Name>,
    pub body: Vec<Stmt>,
    pub span: Span,
    pub props: PropertyCollection,
    routine: Option<Arc<Routine>>,
}

impl FunctionDecl {
    pub fn new(name: impl Into<Name>, params: Vec<Param>, body: Vec<Stmt>, span: Span) -> Self {
        Self {
            name: QualifiedName::simple(name),
            params,
            generic_params: Vec::new(),
            body,
            span,
            props: PropertyCollection::new(),
            routine: None,
        }
    }

    pub fn with_generic_params(mut self, names: Vec<Name>) -> Self {
        self.generic_params = names;
        self
    }

    /// The declared routine, once pre-analysis has run.
    pub fn routine(&self) -> Option<&Arc<Routine>> {
        self.routine.as_ref()
    }

    pub(super) fn pre_analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        let scope = analyzer.declaration_scope();
        let full_name = analyzer.qualify_declared_name(&self.name);
        let routine = Arc::new(
            Routine::function(full_name.name().clone(), signature(&self.params, &self.generic_params))
                .with_scope(scope),
        );
        trace!(name = %full_name, ?scope, "declare function");
        analyzer
            .source_unit()?
            .declare_function(full_name, Arc::clone(&routine));
        self.routine = Some(routine);

        conditionally(analyzer, |a| pre_analyze_all(&mut self.body, a))
    }

    pub(super) fn analyze_members(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        analyze_members_all(&mut self.body, analyzer)
    }

    pub(super) fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        let routine = self.routine.clone().ok_or_else(|| not_declared(&self.name))?;

        analyzer.enter_function_declaration(routine);
        declare_params(&self.params, analyzer);
        analyze_all(&mut self.body, analyzer)?;
        let frame = analyzer.leave_function_declaration()?;

        self.props.set_typed(frame.locals);
        Ok(())
    }
}

// ============================================================================
// CLASSES
// ============================================================================

#[derive(Debug)]
pub struct MethodDecl {
    pub name: Name,
    pub visibility: Visibility,
    pub is_static: bool,
    pub params: Vec<Param>,
    pub generic_params: Vec<Name>,
    pub body: Vec<Stmt>,
    pub span: Span,
    pub props: PropertyCollection,
    routine: Option<Arc<Routine>>,
}

impl MethodDecl {
    pub fn new(name: impl Into<Name>, params: Vec<Param>, body: Vec<Stmt>, span: Span) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            is_static: false,
            params,
            generic_params: Vec::new(),
            body,
            span,
            props: PropertyCollection::new(),
            routine: None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn routine(&self) -> Option<&Arc<Routine>> {
        self.routine.as_ref()
    }

    fn declare(&mut self, owner: &TypeDecl) {
        let routine = Arc::new(
            Routine::method(
                owner.name().clone(),
                self.name.clone(),
                self.visibility,
                signature(&self.params, &self.generic_params),
            )
            .with_static(self.is_static)
            .with_scope(owner.scope()),
        );
        owner.add_method(Arc::clone(&routine));
        self.routine = Some(routine);
    }

    fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        let routine = self.routine.clone().ok_or_else(|| not_declared(&self.name))?;

        analyzer.enter_method_declaration(routine)?;
        declare_params(&self.params, analyzer);
        analyze_all(&mut self.body, analyzer)?;
        let frame = analyzer.leave_method_declaration()?;

        self.props.set_typed(frame.locals);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct PropertyDecl {
    pub name: VariableName,
    pub visibility: Visibility,
    pub is_static: bool,
}

#[derive(Clone, Debug)]
pub struct ClassConstDecl {
    pub name: VariableName,
    pub visibility: Visibility,
    pub value: ConstValue,
}

#[derive(Debug)]
pub struct ClassDecl {
    pub name: QualifiedName,
    pub kind: TypeKind,
    pub is_final: bool,
    pub generic_params: Vec<Name>,
    pub base: Option<QualifiedName>,
    pub methods: Vec<MethodDecl>,
    pub properties: Vec<PropertyDecl>,
    pub constants: Vec<ClassConstDecl>,
    pub span: Span,
    pub props: PropertyCollection,
    decl: Option<Arc<TypeDecl>>,
}

impl ClassDecl {
    pub fn new(name: impl Into<Name>, span: Span) -> Self {
        Self {
            name: QualifiedName::simple(name),
            kind: TypeKind::Class,
            is_final: false,
            generic_params: Vec::new(),
            base: None,
            methods: Vec::new(),
            properties: Vec::new(),
            constants: Vec::new(),
            span,
            props: PropertyCollection::new(),
            decl: None,
        }
    }

    pub fn interface(mut self) -> Self {
        self.kind = TypeKind::Interface;
        self
    }

    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn with_generic_param(mut self, name: impl Into<Name>) -> Self {
        self.generic_params.push(name.into());
        self
    }

    pub fn with_base(mut self, base: QualifiedName) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_property(mut self, name: impl Into<VariableName>, visibility: Visibility, is_static: bool) -> Self {
        self.properties.push(PropertyDecl {
            name: name.into(),
            visibility,
            is_static,
        });
        self
    }

    pub fn with_constant(mut self, name: impl Into<VariableName>, value: ConstValue) -> Self {
        self.constants.push(ClassConstDecl {
            name: name.into(),
            visibility: Visibility::Public,
            value,
        });
        self
    }

    /// The declared type, once pre-analysis has run.
    pub fn type_decl(&self) -> Option<&Arc<TypeDecl>> {
        self.decl.as_ref()
    }

    fn declared(&self) -> Result<Arc<TypeDecl>, AnalysisFault> {
        self.decl.clone().ok_or_else(|| not_declared(&self.name))
    }

    pub(super) fn pre_analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        analyzer.check_type_declaration_name(&self.name, self.span);

        let scope = analyzer.declaration_scope();
        let full_name = analyzer.qualify_declared_name(&self.name);
        let mut builder = TypeDecl::builder(full_name).scope(scope);
        if self.kind == TypeKind::Interface {
            builder = builder.interface();
        }
        if self.is_final {
            builder = builder.final_();
        }
        for param in &self.generic_params {
            builder = builder.generic_param(param.clone());
        }
        let decl = builder.build();

        trace!(name = %decl.name(), ?scope, "declare type");
        analyzer.source_unit()?.declare_type(Arc::clone(&decl));
        self.decl = Some(decl);

        conditionally(analyzer, |a| {
            self.methods
                .iter_mut()
                .try_for_each(|m| pre_analyze_all(&mut m.body, a))
        })
    }

    pub(super) fn analyze_members(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        let decl = self.declared()?;

        if let Some(base) = &self.base {
            let base_type = analyzer.resolve_type_name_from(base, self.span, Some(&decl), None)?;
            decl.set_base(base_type);
        }

        for method in &mut self.methods {
            method.declare(&decl);
            analyze_members_all(&mut method.body, analyzer)?;
        }
        for property in &self.properties {
            let mut member = Property::new(decl.name().clone(), property.name.clone(), property.visibility);
            member.is_static = property.is_static;
            decl.add_property(Arc::new(member));
        }
        for constant in &self.constants {
            decl.add_constant(Arc::new(
                ClassConstant::new(decl.name().clone(), constant.name.clone(), constant.value.clone())
                    .with_visibility(constant.visibility),
            ));
        }

        decl.mark_definite();
        trace!(name = %decl.name(), definite = decl.is_definite(), "type members");
        Ok(())
    }

    pub(super) fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        let decl = self.declared()?;

        analyzer.enter_type_declaration(decl);
        for method in &mut self.methods {
            method.analyze(analyzer)?;
        }
        analyzer.leave_type_declaration()?;
        Ok(())
    }
}

// ============================================================================
// GLOBAL CONSTANTS & NAMESPACES
// ============================================================================

/// `const NAME = value;`
#[derive(Debug)]
pub struct ConstDecl {
    pub name: QualifiedName,
    pub value: Expr,
    pub span: Span,
    constant: Option<Arc<GlobalConstant>>,
}

impl ConstDecl {
    pub fn new(name: impl Into<Name>, value: Expr, span: Span) -> Self {
        Self {
            name: QualifiedName::simple(name),
            value,
            span,
            constant: None,
        }
    }

    pub fn constant(&self) -> Option<&Arc<GlobalConstant>> {
        self.constant.as_ref()
    }

    pub(super) fn pre_analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        let constant = Arc::new(GlobalConstant {
            name: analyzer.qualify_declared_name(&self.name),
            value: self.value.constant_value(),
            scope: analyzer.declaration_scope(),
            is_unknown: false,
        });
        analyzer.source_unit()?.declare_constant(Arc::clone(&constant));
        self.constant = Some(constant);
        Ok(())
    }

    pub(super) fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        self.value.analyze(analyzer)
    }
}

/// `namespace A\B { ... }`
#[derive(Debug)]
pub struct NamespaceDecl {
    pub name: QualifiedName,
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl NamespaceDecl {
    /// `path` is a namespace path such as `App\Models`.
    pub fn new(path: &QualifiedName, body: Vec<Stmt>, span: Span) -> Self {
        Self {
            name: path.clone().into_namespace(),
            body,
            span,
        }
    }

    fn within(
        &mut self,
        analyzer: &mut Analyzer,
        walk: impl FnOnce(&mut [Stmt], &mut Analyzer) -> Result<(), AnalysisFault>,
    ) -> Result<(), AnalysisFault> {
        analyzer.enter_namespace(self.name.clone())?;
        walk(&mut self.body, analyzer)?;
        analyzer.leave_namespace()
    }

    pub(super) fn pre_analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        self.within(analyzer, pre_analyze_all)
    }

    pub(super) fn analyze_members(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        self.within(analyzer, analyze_members_all)
    }

    pub(super) fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
        self.within(analyzer, analyze_all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::SourceId;
    use crate::hir::{MemberLookup, SourceUnit, SymbolTable, UnitCatalog, VariablesTable};
    use crate::project::Compilation;
    use crate::syntax::{GlobalCode, StmtKind};

    fn sp(line: u32) -> Span {
        Span::at(line, 0)
    }

    fn unit() -> Arc<dyn SourceUnit> {
        Arc::new(UnitCatalog::new(SourceId::new(0), SymbolTable::new()))
    }

    #[test]
    fn test_analyze_without_declaration_is_a_fault() {
        let function = FunctionDecl::new("f", vec![], vec![], sp(1));
        let mut code = GlobalCode::new(vec![Stmt::new(StmtKind::Function(function), sp(1))]);

        let mut analyzer = Analyzer::default();
        let err = analyzer.analyze(unit(), &mut code).unwrap_err();
        assert!(matches!(err, AnalysisFault::NotDeclared { .. }));
    }

    #[test]
    fn test_class_members_are_registered() {
        let method = MethodDecl::new("run", vec![Param::by_ref("out")], vec![], sp(2))
            .with_visibility(Visibility::Protected);
        let decl = ClassDecl::new("Job", sp(1))
            .with_method(method)
            .with_property("state", Visibility::Private, false)
            .with_constant("LIMIT", ConstValue::Int(10));

        let code = GlobalCode::new(vec![Stmt::new(StmtKind::Class(decl), sp(1))]);
        let mut compilation = Compilation::default().with_unit(unit(), code);
        let diagnostics = compilation.run().unwrap();
        assert!(diagnostics.is_empty(), "{diagnostics:?}");

        let StmtKind::Class(decl) = &compilation.units()[0].code.statements[0].kind else {
            panic!("expected a class");
        };
        let ty = decl.type_decl().unwrap();
        assert!(ty.is_definite());
        assert!(matches!(
            ty.get_method(&Name::new("RUN"), Some(ty)),
            MemberLookup::Found(_)
        ));
        assert!(matches!(
            ty.get_method(&Name::new("run"), None),
            MemberLookup::BadVisibility(_)
        ));
        assert!(matches!(ty.get_property(&"state".into(), None), MemberLookup::BadVisibility(_)));
        assert!(matches!(ty.get_constant(&"LIMIT".into(), None), MemberLookup::Found(_)));

        let locals = decl.methods[0].props.get_typed::<VariablesTable>().unwrap();
        let out = locals.get(&"out".into()).unwrap();
        assert!(out.is_parameter);
        assert!(out.is_ref);
    }

    #[test]
    fn test_conditional_function_gets_own_scope() {
        let nested = FunctionDecl::new("nested", vec![], vec![], sp(2));
        let outer = FunctionDecl::new("outer", vec![], vec![Stmt::new(StmtKind::Function(nested), sp(2))], sp(1));

        let code = GlobalCode::new(vec![Stmt::new(StmtKind::Function(outer), sp(1))]);
        let mut compilation = Compilation::default().with_unit(unit(), code);
        compilation.run().unwrap();

        let StmtKind::Function(outer) = &compilation.units()[0].code.statements[0].kind else {
            panic!("expected a function");
        };
        let StmtKind::Function(nested) = &outer.body[0].kind else {
            panic!("expected a function");
        };
        assert!(outer.routine().unwrap().scope().is_global());
        assert!(!nested.routine().unwrap().scope().is_global());
    }
}
