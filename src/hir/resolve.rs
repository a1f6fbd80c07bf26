//! Name and member resolution.
//!
//! Every resolution returns a usable symbol. When a name cannot be bound the
//! result is a placeholder (unknown function, unknown method, `self`/`parent`
//! placeholder types, ...) and at most one diagnostic is reported, so a
//! single bad name does not cascade.
//!
//! Member resolution has three outcomes, mirrored by [`MemberLookup`]:
//! found, not found, and found-but-inaccessible. An inaccessible member seen
//! from a context with no known calling type or routine cannot be ruled out
//! yet; it is returned with a runtime visibility check attached.

use std::sync::Arc;

use tracing::trace;

use super::analyzer::Analyzer;
use super::constructed::Origin;
use super::diagnostics::codes;
use super::errors::AnalysisFault;
use super::symbols::{
    ClassConstant, DType, GlobalConstant, MemberLookup, Property, Routine, RoutineProperties,
    TypeDecl, UnknownType,
};
use super::unit::NameLookup;
use crate::base::{GenericQualifiedName, Name, QualifiedName, Span, TypeArgument, VariableName};

/// Name used in diagnostics when code is not inside any type.
const GLOBAL_CONTEXT: &str = "<global>";

// ============================================================================
// RESULTS
// ============================================================================

/// A resolved method or constructor call target.
#[derive(Clone, Debug)]
pub struct MethodResolution {
    pub routine: Arc<Routine>,
    /// Visibility could not be decided statically.
    pub check_visibility_at_runtime: bool,
    /// The call goes through `__call`/`__callStatic`.
    pub is_call_method: bool,
}

impl MethodResolution {
    fn found(routine: Arc<Routine>) -> Self {
        Self {
            routine,
            check_visibility_at_runtime: false,
            is_call_method: false,
        }
    }

    fn runtime_checked(routine: Arc<Routine>) -> Self {
        Self {
            check_visibility_at_runtime: true,
            ..Self::found(routine)
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.routine.is_unknown()
    }
}

/// A resolved property or class constant.
#[derive(Clone, Debug)]
pub struct MemberResolution<T> {
    pub member: Arc<T>,
    pub check_visibility_at_runtime: bool,
}

impl<T> MemberResolution<T> {
    fn found(member: Arc<T>) -> Self {
        Self {
            member,
            check_visibility_at_runtime: false,
        }
    }

    fn runtime_checked(member: Arc<T>) -> Self {
        Self {
            member,
            check_visibility_at_runtime: true,
        }
    }
}

fn referring_name(referring_type: Option<&Arc<TypeDecl>>) -> String {
    referring_type.map_or_else(|| GLOBAL_CONTEXT.to_string(), |t| t.name().to_string())
}

// ============================================================================
// GLOBAL NAMES
// ============================================================================

impl Analyzer {
    /// Resolve a function name from the current scope. Only valid during
    /// full analysis.
    pub fn resolve_function_name(&mut self, name: &QualifiedName, span: Span) -> Result<Arc<Routine>, AnalysisFault> {
        let scope = self.require_scope()?;
        let unit = Arc::clone(self.source_unit()?);

        match unit.resolve_function_name(name, self.current_namespace(), scope) {
            NameLookup::Found(routine) => {
                trace!(%name, "function resolved");
                Ok(routine)
            }
            NameLookup::Missing { alias: None } => {
                self.report(codes::UNKNOWN_FUNCTION, span, format!("call to undefined function '{name}'"));
                Ok(Routine::unknown_function(name))
            }
            NameLookup::Missing { alias: Some(alias) } => {
                self.report(
                    codes::UNKNOWN_FUNCTION_WITH_ALIAS,
                    span,
                    format!("call to undefined function '{name}' (alias of '{alias}')"),
                );
                Ok(Routine::unknown_function(name))
            }
            NameLookup::Ambiguous { candidates } => {
                self.report_ambiguous(name, &candidates, span);
                Ok(Routine::unknown_function(name))
            }
        }
    }

    /// Resolve a global constant. Unknown constants are reported only when
    /// reached through an alias, unless enabled in the options.
    pub fn resolve_global_constant_name(
        &mut self,
        name: &QualifiedName,
        span: Span,
    ) -> Result<Arc<GlobalConstant>, AnalysisFault> {
        let scope = self.require_scope()?;
        let unit = Arc::clone(self.source_unit()?);

        match unit.resolve_constant_name(name, self.current_namespace(), scope) {
            NameLookup::Found(constant) => Ok(constant),
            NameLookup::Missing { alias: Some(alias) } => {
                self.report(
                    codes::UNKNOWN_CONSTANT_WITH_ALIAS,
                    span,
                    format!("undefined constant '{name}' (alias of '{alias}')"),
                );
                Ok(GlobalConstant::unknown(name.clone()))
            }
            NameLookup::Missing { alias: None } => {
                if self.options().report_unknown_constants {
                    self.report(codes::UNKNOWN_CONSTANT, span, format!("undefined constant '{name}'"));
                }
                Ok(GlobalConstant::unknown(name.clone()))
            }
            NameLookup::Ambiguous { candidates } => {
                self.report_ambiguous(name, &candidates, span);
                Ok(GlobalConstant::unknown(name.clone()))
            }
        }
    }

    fn report_ambiguous(&mut self, name: &QualifiedName, candidates: &[QualifiedName], span: Span) {
        let listed: Vec<String> = candidates.iter().map(ToString::to_string).collect();
        self.report(
            codes::AMBIGUOUS_NAME,
            span,
            format!("name '{name}' is ambiguous: {}", listed.join(", ")),
        );
    }

    // ========================================================================
    // TYPE NAMES
    // ========================================================================

    /// Resolve a type name from the current type and routine.
    pub fn resolve_type_name(&mut self, name: &QualifiedName, span: Span) -> Result<DType, AnalysisFault> {
        let referring_type = self.current_type();
        let referring_routine = self.current_routine();
        self.resolve_type_name_from(name, span, referring_type.as_ref(), referring_routine.as_ref())
    }

    /// Resolve a type name as seen from an explicit referring type and
    /// routine.
    pub fn resolve_type_name_from(
        &mut self,
        name: &QualifiedName,
        span: Span,
        referring_type: Option<&Arc<TypeDecl>>,
        referring_routine: Option<&Arc<Routine>>,
    ) -> Result<DType, AnalysisFault> {
        if name.is_self_class_name() {
            return Ok(self.resolve_self(span, referring_type, referring_routine));
        }
        if name.is_static_class_name() {
            return Ok(self.resolve_static(span, referring_type, referring_routine));
        }
        if name.is_parent_class_name() {
            return Ok(self.resolve_parent(span, referring_type, referring_routine));
        }

        if name.is_simple_name() {
            let param = referring_routine
                .and_then(|r| r.signature().generic_parameter(name.name()))
                .or_else(|| referring_type.and_then(|t| t.generic_parameter(name.name())));
            if let Some(param) = param {
                trace!(%name, index = param.index, "type parameter");
                return Ok(DType::GenericParam(param));
            }
        }

        let scope = self.referring_scope(referring_type, referring_routine)?;
        let unit = Arc::clone(self.source_unit()?);

        match unit.resolve_type_name(name, self.current_namespace(), scope) {
            NameLookup::Found(ty) => Ok(ty),
            NameLookup::Missing { alias: None } => {
                self.report(codes::UNKNOWN_CLASS, span, format!("class '{name}' not found"));
                Ok(DType::unknown(name.clone()))
            }
            NameLookup::Missing { alias: Some(alias) } => {
                self.report(
                    codes::UNKNOWN_CLASS_WITH_ALIAS,
                    span,
                    format!("class '{name}' not found (alias of '{alias}')"),
                );
                Ok(DType::unknown(alias))
            }
            NameLookup::Ambiguous { candidates } => {
                self.report_ambiguous(name, &candidates, span);
                Ok(DType::unknown(name.clone()))
            }
        }
    }

    fn resolve_self(
        &mut self,
        span: Span,
        referring_type: Option<&Arc<TypeDecl>>,
        referring_routine: Option<&Arc<Routine>>,
    ) -> DType {
        if let Some(ty) = referring_type {
            return DType::Known(Arc::clone(ty));
        }
        // Global code may be included into a method body at runtime.
        if referring_routine.is_some() {
            self.report(codes::SELF_OUTSIDE_CLASS, span, "cannot access self:: when no class scope is active");
        }
        DType::Unknown(UnknownType::SelfRef)
    }

    fn resolve_static(
        &mut self,
        span: Span,
        referring_type: Option<&Arc<TypeDecl>>,
        referring_routine: Option<&Arc<Routine>>,
    ) -> DType {
        match referring_type {
            Some(ty) if ty.is_final() => DType::Known(Arc::clone(ty)),
            Some(_) => {
                if let Some(routine) = referring_routine {
                    routine.add_properties(RoutineProperties::LATE_STATIC_BINDING);
                }
                DType::LateStatic
            }
            None => {
                self.report(
                    codes::STATIC_OUTSIDE_CLASS,
                    span,
                    "cannot access static:: when no class scope is active",
                );
                DType::Unknown(UnknownType::StaticRef)
            }
        }
    }

    fn resolve_parent(
        &mut self,
        span: Span,
        referring_type: Option<&Arc<TypeDecl>>,
        referring_routine: Option<&Arc<Routine>>,
    ) -> DType {
        let Some(ty) = referring_type else {
            if referring_routine.is_some() {
                self.report(
                    codes::PARENT_OUTSIDE_CLASS,
                    span,
                    "cannot access parent:: when no class scope is active",
                );
            }
            return DType::Unknown(UnknownType::ParentRef);
        };

        if ty.is_interface() {
            self.report(
                codes::PARENT_ON_INTERFACE,
                span,
                format!("cannot access parent:: in interface '{}'", ty.name()),
            );
            return DType::Unknown(UnknownType::ParentRef);
        }

        match ty.base() {
            Some(base) => base,
            None => {
                self.report(
                    codes::CLASS_HAS_NO_PARENT,
                    span,
                    format!("cannot access parent:: when class '{}' has no parent", ty.name()),
                );
                DType::Unknown(UnknownType::ParentRef)
            }
        }
    }

    /// Resolve a possibly generic name (`List<int, Foo>`). Arguments are
    /// resolved first; the instantiation comes from the constructed-type
    /// cache.
    pub fn resolve_generic_type_name(
        &mut self,
        name: &GenericQualifiedName,
        span: Span,
    ) -> Result<DType, AnalysisFault> {
        let generic = self.resolve_type_name(&name.qualified_name, span)?;
        if !name.is_generic() {
            return Ok(generic);
        }

        let arguments = name
            .generic_params
            .iter()
            .map(|arg| self.resolve_type(arg, span))
            .collect::<Result<Vec<_>, _>>()?;
        let count = arguments.len();

        let constructed = self.constructed.create(&generic, arguments, count);
        constructed.record_origin(Origin {
            source: self.source_id(),
            span,
        });
        Ok(DType::Constructed(constructed))
    }

    pub fn resolve_type(&mut self, argument: &TypeArgument, span: Span) -> Result<DType, AnalysisFault> {
        match argument {
            TypeArgument::Primitive(primitive) => Ok(DType::Primitive(*primitive)),
            TypeArgument::Generic(name) => self.resolve_generic_type_name(name, span),
        }
    }

    // ========================================================================
    // MEMBERS
    // ========================================================================

    /// Resolve a method of `ty` from the current type and routine.
    ///
    /// Members of indefinite types are not resolved; the type resolver has
    /// already reported whatever was wrong with the type.
    pub fn resolve_method(
        &mut self,
        ty: &DType,
        name: &Name,
        span: Span,
        called_statically: bool,
    ) -> MethodResolution {
        let decl = match ty.as_type_decl() {
            Some(decl) if ty.is_definite() => Arc::clone(decl),
            _ => return MethodResolution::found(Routine::unknown_method(ty.qualified_name(), name.clone())),
        };

        // A method named after its class is that class's constructor.
        if name.is_construct_name() || name == decl.name().name() {
            return self.resolve_constructor(ty, span);
        }

        let referring_type = self.current_type();
        let referring_routine = self.current_routine();

        let mut is_call_method = false;
        let mut lookup = decl.get_method(name, referring_type.as_ref());
        if lookup.is_not_found() && called_statically {
            let in_instance_context = referring_routine.as_ref().is_some_and(|r| !r.is_static())
                && referring_type
                    .as_ref()
                    .is_some_and(|t| t.is_same_or_subtype_of(&decl));
            let magic = if in_instance_context { Name::CALL } else { Name::CALL_STATIC };
            lookup = decl.get_method(&magic, referring_type.as_ref());
            is_call_method = !lookup.is_not_found();
        }

        match lookup {
            MemberLookup::Found(routine) => {
                trace!(method = %routine.full_name(), is_call_method, "method resolved");
                MethodResolution {
                    is_call_method,
                    ..MethodResolution::found(routine)
                }
            }
            MemberLookup::NotFound => {
                // An instance call may still be served by a subclass.
                if called_statically {
                    self.report(
                        codes::UNKNOWN_METHOD,
                        span,
                        format!("call to undefined method {}::{}()", ty.full_name(), name),
                    );
                }
                MethodResolution::found(Routine::unknown_method(ty.qualified_name(), name.clone()))
            }
            MemberLookup::BadVisibility(routine) => {
                if !called_statically {
                    return MethodResolution::found(Routine::unknown_method(ty.qualified_name(), name.clone()));
                }
                if referring_type.is_none() && referring_routine.is_none() {
                    return MethodResolution {
                        is_call_method,
                        ..MethodResolution::runtime_checked(routine)
                    };
                }
                let (code, kind) = if routine.is_private() {
                    (codes::PRIVATE_METHOD_CALLED, "private")
                } else {
                    (codes::PROTECTED_METHOD_CALLED, "protected")
                };
                self.report(
                    code,
                    span,
                    format!(
                        "call to {kind} method {}::{}() from context '{}'",
                        ty.full_name(),
                        name,
                        referring_name(referring_type.as_ref())
                    ),
                );
                MethodResolution::found(Routine::unknown_method(ty.qualified_name(), name.clone()))
            }
        }
    }

    /// Resolve the constructor of `ty`. A type without one gets the default
    /// constructor placeholder, with no diagnostic.
    pub fn resolve_constructor(&mut self, ty: &DType, span: Span) -> MethodResolution {
        let Some(decl) = ty.as_type_decl().cloned() else {
            return MethodResolution::found(Routine::unknown_method(ty.qualified_name(), Name::CONSTRUCT));
        };

        let referring_type = self.current_type();
        let referring_routine = self.current_routine();

        match decl.get_constructor(referring_type.as_ref()) {
            MemberLookup::Found(ctor) => MethodResolution::found(ctor),
            MemberLookup::NotFound => {
                MethodResolution::found(Routine::unknown_method(ty.qualified_name(), Name::CONSTRUCT))
            }
            MemberLookup::BadVisibility(ctor) => {
                if referring_type.is_none() && referring_routine.is_none() {
                    return MethodResolution::runtime_checked(ctor);
                }
                let (code, kind) = if ctor.is_private() {
                    (codes::PRIVATE_CTOR_CALLED, "private")
                } else {
                    (codes::PROTECTED_CTOR_CALLED, "protected")
                };
                self.report(
                    code,
                    span,
                    format!(
                        "call to {kind} constructor of '{}' from context '{}'",
                        ty.full_name(),
                        referring_name(referring_type.as_ref())
                    ),
                );
                MethodResolution::found(Routine::unknown_method(ty.qualified_name(), Name::CONSTRUCT))
            }
        }
    }

    /// Resolve a property of `ty`. With `static_only`, an instance property
    /// counts as missing.
    pub fn resolve_property(
        &mut self,
        ty: &DType,
        name: &VariableName,
        span: Span,
        static_only: bool,
    ) -> MemberResolution<Property> {
        let decl = match ty.as_type_decl() {
            Some(decl) if ty.is_definite() => Arc::clone(decl),
            _ => return MemberResolution::found(Property::unknown(ty.qualified_name(), name)),
        };

        let referring_type = self.current_type();
        let referring_routine = self.current_routine();

        let lookup = match decl.get_property(name, referring_type.as_ref()) {
            MemberLookup::Found(property) if static_only && !property.is_static => MemberLookup::NotFound,
            other => other,
        };

        match lookup {
            MemberLookup::Found(property) => MemberResolution::found(property),
            MemberLookup::NotFound => {
                self.report(
                    codes::UNKNOWN_PROPERTY,
                    span,
                    format!("access to undeclared property {}::${}", ty.full_name(), name),
                );
                MemberResolution::found(Property::unknown(ty.qualified_name(), name))
            }
            MemberLookup::BadVisibility(property) => {
                if referring_type.is_none() && referring_routine.is_none() {
                    return MemberResolution::runtime_checked(property);
                }
                let (code, kind) = if property.is_private() {
                    (codes::PRIVATE_PROPERTY_ACCESSED, "private")
                } else {
                    (codes::PROTECTED_PROPERTY_ACCESSED, "protected")
                };
                self.report(
                    code,
                    span,
                    format!(
                        "cannot access {kind} property {}::${} from context '{}'",
                        ty.full_name(),
                        name,
                        referring_name(referring_type.as_ref())
                    ),
                );
                MemberResolution::found(Property::unknown(ty.qualified_name(), name))
            }
        }
    }

    pub fn resolve_class_constant_name(
        &mut self,
        ty: &DType,
        name: &VariableName,
        span: Span,
    ) -> MemberResolution<ClassConstant> {
        let decl = match ty.as_type_decl() {
            Some(decl) if ty.is_definite() => Arc::clone(decl),
            _ => return MemberResolution::found(ClassConstant::unknown(ty.qualified_name(), name)),
        };

        let referring_type = self.current_type();
        let referring_routine = self.current_routine();

        match decl.get_constant(name, referring_type.as_ref()) {
            MemberLookup::Found(constant) => MemberResolution::found(constant),
            MemberLookup::NotFound => {
                self.report(
                    codes::UNKNOWN_CLASS_CONSTANT,
                    span,
                    format!("undefined class constant {}::{}", ty.full_name(), name),
                );
                MemberResolution::found(ClassConstant::unknown(ty.qualified_name(), name))
            }
            MemberLookup::BadVisibility(constant) => {
                if referring_type.is_none() && referring_routine.is_none() {
                    return MemberResolution::runtime_checked(constant);
                }
                let (code, kind) = if constant.is_private() {
                    (codes::PRIVATE_CONSTANT_ACCESSED, "private")
                } else {
                    (codes::PROTECTED_CONSTANT_ACCESSED, "protected")
                };
                self.report(
                    code,
                    span,
                    format!(
                        "cannot access {kind} constant {}::{} from context '{}'",
                        ty.full_name(),
                        name,
                        referring_name(referring_type.as_ref())
                    ),
                );
                MemberResolution::found(ClassConstant::unknown(ty.qualified_name(), name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{PrimitiveType, SourceId};
    use crate::hir::node::Analyzable;
    use crate::hir::symbols::{ConstValue, FormalParam, RoutineSignature, Visibility};
    use crate::hir::unit::{SourceUnit, SymbolTable, UnitCatalog};

    fn qn(text: &str) -> QualifiedName {
        QualifiedName::parse(text).unwrap()
    }

    /// Runs a closure as the body of full analysis.
    struct Body<F>(F);

    impl<F> Analyzable for Body<F>
    where
        F: FnMut(&mut Analyzer) -> Result<(), AnalysisFault>,
    {
        fn analyze(&mut self, analyzer: &mut Analyzer) -> Result<(), AnalysisFault> {
            (self.0)(analyzer)
        }
    }

    fn full_analysis(
        table: Arc<SymbolTable>,
        body: impl FnMut(&mut Analyzer) -> Result<(), AnalysisFault>,
    ) -> Analyzer {
        let unit: Arc<dyn SourceUnit> = Arc::new(UnitCatalog::new(SourceId::new(1), table));
        let mut analyzer = Analyzer::default();
        analyzer.analyze(unit, &mut Body(body)).unwrap();
        analyzer
    }

    fn widget() -> Arc<TypeDecl> {
        TypeDecl::builder(qn("Widget"))
            .definite()
            .method(Routine::method(qn("Widget"), "render", Visibility::Public, RoutineSignature::default()))
            .method(
                Routine::method(qn("Widget"), "secret", Visibility::Private, RoutineSignature::default())
                    .with_static(true),
            )
            .property(Property::new(qn("Widget"), "count", Visibility::Public).static_())
            .property(Property::new(qn("Widget"), "hidden", Visibility::Protected))
            .constant(ClassConstant::new(qn("Widget"), "MAX", ConstValue::Int(10)))
            .build()
    }

    #[test]
    fn test_scope_required_for_function_names() {
        let mut analyzer = Analyzer::default();
        assert_eq!(
            analyzer.resolve_function_name(&qn("strlen"), Span::default()).unwrap_err(),
            AnalysisFault::ScopeUnavailable
        );
    }

    #[test]
    fn test_unknown_function_placeholder() {
        let table = SymbolTable::new();
        table.add_function(
            qn("known"),
            Arc::new(Routine::function("known", RoutineSignature::new(vec![FormalParam::by_value("x")]))),
        );
        let mut analyzer = full_analysis(table, |a| {
            let known = a.resolve_function_name(&qn("known"), Span::at(1, 0))?;
            assert!(!known.is_unknown());
            let missing = a.resolve_function_name(&qn("missing"), Span::at(2, 0))?;
            assert!(missing.is_unknown());
            Ok(())
        });
        let diagnostics = analyzer.take_diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, codes::UNKNOWN_FUNCTION);
    }

    #[test]
    fn test_self_in_global_code_is_silent() {
        let analyzer = full_analysis(SymbolTable::new(), |a| {
            let ty = a.resolve_type_name(&QualifiedName::SELF_CLASS, Span::at(1, 0))?;
            assert!(matches!(ty, DType::Unknown(UnknownType::SelfRef)));
            Ok(())
        });
        assert_eq!(analyzer.diagnostics().count_code(codes::SELF_OUTSIDE_CLASS), 0);
    }

    #[test]
    fn test_self_in_function_is_reported() {
        let analyzer = full_analysis(SymbolTable::new(), |a| {
            a.enter_function_declaration(Arc::new(Routine::function("f", RoutineSignature::default())));
            let ty = a.resolve_type_name(&QualifiedName::SELF_CLASS, Span::at(1, 0))?;
            assert!(matches!(ty, DType::Unknown(UnknownType::SelfRef)));
            a.leave_function_declaration()?;
            Ok(())
        });
        assert_eq!(analyzer.diagnostics().count_code(codes::SELF_OUTSIDE_CLASS), 1);
    }

    #[test]
    fn test_static_binds_late_in_open_class() {
        let open = TypeDecl::builder(qn("Open")).definite().build();
        let closed = TypeDecl::builder(qn("Closed")).definite().final_().build();
        let method = Arc::new(Routine::method(qn("Open"), "make", Visibility::Public, RoutineSignature::default()));
        let caller = Arc::clone(&method);

        full_analysis(SymbolTable::new(), move |a| {
            a.enter_type_declaration(Arc::clone(&open));
            a.enter_method_declaration(Arc::clone(&method))?;
            let ty = a.resolve_type_name(&QualifiedName::STATIC_CLASS, Span::default())?;
            assert!(matches!(ty, DType::LateStatic));
            a.leave_method_declaration()?;
            a.leave_type_declaration()?;

            a.enter_type_declaration(Arc::clone(&closed));
            let ty = a.resolve_type_name(&QualifiedName::STATIC_CLASS, Span::default())?;
            assert!(ty.as_type_decl().is_some_and(|d| d.name() == closed.name()));
            a.leave_type_declaration()?;
            Ok(())
        });
        assert!(caller.properties().contains(RoutineProperties::LATE_STATIC_BINDING));
    }

    #[test]
    fn test_parent_diagnostics() {
        let iface = TypeDecl::builder(qn("Shape")).interface().definite().build();
        let root = TypeDecl::builder(qn("Root")).definite().build();
        let child = TypeDecl::builder(qn("Child"))
            .base(DType::Known(Arc::clone(&root)))
            .definite()
            .build();

        let analyzer = full_analysis(SymbolTable::new(), |a| {
            for (decl, expect_base) in [(&iface, false), (&root, false), (&child, true)] {
                a.enter_type_declaration(Arc::clone(decl));
                let parent = a.resolve_type_name(&QualifiedName::PARENT_CLASS, Span::default())?;
                assert_eq!(parent.as_type_decl().is_some(), expect_base);
                a.leave_type_declaration()?;
            }
            Ok(())
        });
        let d = analyzer.diagnostics();
        assert_eq!(d.count_code(codes::PARENT_ON_INTERFACE), 1);
        assert_eq!(d.count_code(codes::CLASS_HAS_NO_PARENT), 1);
    }

    #[test]
    fn test_type_parameter_shadows_class() {
        let table = SymbolTable::new();
        table.add_type(TypeDecl::builder(qn("T")).definite().build());
        let boxed = TypeDecl::builder(qn("Box")).generic_param("T").definite().build();

        full_analysis(table, move |a| {
            a.enter_type_declaration(Arc::clone(&boxed));
            let ty = a.resolve_type_name(&qn("T"), Span::default())?;
            assert!(matches!(ty, DType::GenericParam(ref p) if p.index == 0));
            a.leave_type_declaration()?;

            let ty = a.resolve_type_name(&qn("T"), Span::default())?;
            assert!(matches!(ty, DType::Known(_)));
            Ok(())
        });
    }

    #[test]
    fn test_generic_instantiation_is_shared() {
        let table = SymbolTable::new();
        table.add_type(TypeDecl::builder(qn("List")).generic_param("T").definite().build());
        let list_of_int = GenericQualifiedName::new(
            qn("List"),
            vec![TypeArgument::Primitive(PrimitiveType::Integer)],
        );

        full_analysis(table, move |a| {
            let first = a.resolve_generic_type_name(&list_of_int, Span::at(1, 0))?;
            let second = a.resolve_generic_type_name(&list_of_int, Span::at(2, 0))?;
            match (first, second) {
                (DType::Constructed(x), DType::Constructed(y)) => {
                    assert!(Arc::ptr_eq(&x, &y));
                    assert_eq!(x.origin().map(|o| o.span), Some(Span::at(1, 0)));
                }
                other => panic!("expected constructed types, got {other:?}"),
            }
            Ok(())
        });
    }

    #[test]
    fn test_static_call_miss_reports_once() {
        let ty = DType::Known(widget());
        let analyzer = full_analysis(SymbolTable::new(), |a| {
            let resolved = a.resolve_method(&ty, &Name::new("explode"), Span::at(3, 4), true);
            assert!(resolved.is_unknown());
            assert!(!resolved.is_call_method);

            let instance = a.resolve_method(&ty, &Name::new("explode"), Span::at(4, 4), false);
            assert!(instance.is_unknown());
            Ok(())
        });
        assert_eq!(analyzer.diagnostics().count_code(codes::UNKNOWN_METHOD), 1);
    }

    #[test]
    fn test_static_call_falls_back_to_call_static() {
        let magic = TypeDecl::builder(qn("Magic"))
            .definite()
            .method(
                Routine::method(qn("Magic"), "__callStatic", Visibility::Public, RoutineSignature::default())
                    .with_static(true),
            )
            .build();
        let ty = DType::Known(magic);
        let analyzer = full_analysis(SymbolTable::new(), |a| {
            let resolved = a.resolve_method(&ty, &Name::new("anything"), Span::default(), true);
            assert!(resolved.is_call_method);
            assert!(resolved.routine.name().is_call_static_name());
            Ok(())
        });
        assert!(analyzer.diagnostics().diagnostics().is_empty());
    }

    #[test]
    fn test_class_named_method_resolves_as_constructor() {
        let legacy = TypeDecl::builder(qn("Legacy"))
            .definite()
            .method(Routine::method(qn("Legacy"), "Legacy", Visibility::Private, RoutineSignature::default()))
            .build();
        let ty = DType::Known(legacy);
        let other = TypeDecl::builder(qn("Other")).definite().build();

        let analyzer = full_analysis(SymbolTable::new(), |a| {
            a.enter_type_declaration(Arc::clone(&other));
            let resolved = a.resolve_method(&ty, &Name::new("legacy"), Span::default(), true);
            assert!(resolved.is_unknown());
            assert!(!resolved.is_call_method);
            a.leave_type_declaration()?;
            Ok(())
        });
        let d = analyzer.diagnostics();
        assert_eq!(d.count_code(codes::PRIVATE_CTOR_CALLED), 1);
        assert_eq!(d.count_code(codes::PRIVATE_METHOD_CALLED), 0);
    }

    #[test]
    fn test_bad_visibility_outcomes() {
        let widget = widget();
        let ty = DType::Known(Arc::clone(&widget));
        let other = TypeDecl::builder(qn("Other")).definite().build();

        let analyzer = full_analysis(SymbolTable::new(), |a| {
            // No referring type or routine: defer to runtime.
            let deferred = a.resolve_method(&ty, &Name::new("secret"), Span::default(), true);
            assert!(deferred.check_visibility_at_runtime);
            assert!(!deferred.is_unknown());

            // Instance call: placeholder, silent.
            let silent = a.resolve_method(&ty, &Name::new("secret"), Span::default(), false);
            assert!(silent.is_unknown());

            a.enter_type_declaration(Arc::clone(&other));
            let denied = a.resolve_method(&ty, &Name::new("secret"), Span::default(), true);
            assert!(denied.is_unknown());
            let hidden = a.resolve_property(&ty, &VariableName::new("hidden"), Span::default(), false);
            assert!(hidden.member.is_unknown);
            a.leave_type_declaration()?;
            Ok(())
        });
        let d = analyzer.diagnostics();
        assert_eq!(d.count_code(codes::PRIVATE_METHOD_CALLED), 1);
        assert_eq!(d.count_code(codes::PROTECTED_PROPERTY_ACCESSED), 1);
    }

    #[test]
    fn test_static_only_property_lookup() {
        let ty = DType::Known(widget());
        let analyzer = full_analysis(SymbolTable::new(), |a| {
            let count = a.resolve_property(&ty, &VariableName::new("count"), Span::default(), true);
            assert!(!count.member.is_unknown);
            a.enter_type_declaration(widget());
            let hidden = a.resolve_property(&ty, &VariableName::new("hidden"), Span::default(), true);
            assert!(hidden.member.is_unknown);
            a.leave_type_declaration()?;
            Ok(())
        });
        assert_eq!(analyzer.diagnostics().count_code(codes::UNKNOWN_PROPERTY), 1);
    }

    #[test]
    fn test_indefinite_type_members_are_silent() {
        let ty = DType::unknown(qn("Ghost"));
        let analyzer = full_analysis(SymbolTable::new(), |a| {
            assert!(a.resolve_method(&ty, &Name::new("m"), Span::default(), true).is_unknown());
            assert!(a.resolve_property(&ty, &VariableName::new("p"), Span::default(), false).member.is_unknown);
            assert!(a.resolve_class_constant_name(&ty, &VariableName::new("C"), Span::default()).member.is_unknown);
            Ok(())
        });
        assert!(analyzer.diagnostics().diagnostics().is_empty());
    }

    #[test]
    fn test_class_constant_lookup() {
        let ty = DType::Known(widget());
        let analyzer = full_analysis(SymbolTable::new(), |a| {
            let max = a.resolve_class_constant_name(&ty, &VariableName::new("MAX"), Span::default());
            assert_eq!(max.member.value, Some(ConstValue::Int(10)));
            a.resolve_class_constant_name(&ty, &VariableName::new("MIN"), Span::default());
            Ok(())
        });
        assert_eq!(analyzer.diagnostics().count_code(codes::UNKNOWN_CLASS_CONSTANT), 1);
    }

    #[test]
    fn test_unknown_constant_reporting_is_optional() {
        let analyzer = full_analysis(SymbolTable::new(), |a| {
            let c = a.resolve_global_constant_name(&qn("PHP_MISSING"), Span::default())?;
            assert!(c.is_unknown);
            Ok(())
        });
        assert!(analyzer.diagnostics().diagnostics().is_empty());
    }
}
