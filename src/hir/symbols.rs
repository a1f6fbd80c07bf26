//! Symbols: types, routines, properties and constants that names resolve to.
//!
//! Symbols are shared (`Arc`) between the catalog that declares them, the
//! syntax nodes that reference them and the analyzer. Facts that grow while
//! analysis runs (member tables, routine flags) sit behind `parking_lot`
//! locks so a shared symbol can still be completed in place.
//!
//! Every symbol is either *definite* (its full member set is known) or
//! *indefinite*. Resolution never fails outright: a miss yields a placeholder
//! symbol flagged as unknown, so analysis keeps going.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::constructed::ConstructedType;
use crate::base::{Name, PrimitiveType, QualifiedName, VariableName};

// ============================================================================
// SCOPE & VISIBILITY
// ============================================================================

/// Declaration scope.
///
/// Scopes are ordered by where they start. Conditional declarations get
/// increasing scopes in declaration order; [`Scope::GLOBAL`] orders after
/// all of them. A declaration is visible from a referring scope that starts
/// no earlier than its own, and unconditional declarations are visible
/// everywhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Scope(u32);

impl Scope {
    pub const GLOBAL: Scope = Scope(u32::MAX);

    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn is_global(self) -> bool {
        self == Self::GLOBAL
    }

    /// Whether a declaration made in `self` can be seen from `referring`.
    pub fn is_visible_from(self, referring: Scope) -> bool {
        self.is_global() || self <= referring
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        })
    }
}

/// Result of a member lookup on a type.
#[derive(Clone, Debug)]
pub enum MemberLookup<T> {
    /// Found and accessible from the referring type.
    Found(T),
    NotFound,
    /// Found, but the referring type may not access it.
    BadVisibility(T),
}

impl<T> MemberLookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, MemberLookup::Found(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, MemberLookup::NotFound)
    }
}

// ============================================================================
// CONSTANT VALUES
// ============================================================================

/// Compile-time constant value (switch cases, declared constants).
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(SmolStr),
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => f.write_str("null"),
            ConstValue::Bool(b) => write!(f, "{b}"),
            ConstValue::Int(i) => write!(f, "{i}"),
            ConstValue::Double(d) => write!(f, "{d}"),
            ConstValue::String(s) => write!(f, "'{s}'"),
        }
    }
}

// ============================================================================
// TYPES
// ============================================================================

/// A generic parameter of a type or a routine.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct GenericParameter {
    pub name: Name,
    pub index: usize,
}

/// Type placeholders produced when resolution fails.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnknownType {
    /// A name the source unit could not resolve.
    Named(QualifiedName),
    /// `self` outside a type.
    SelfRef,
    /// `static` outside a type.
    StaticRef,
    /// `parent` that has no resolvable base.
    ParentRef,
}

/// A resolved type reference.
#[derive(Clone, Debug)]
pub enum DType {
    Known(Arc<TypeDecl>),
    Primitive(PrimitiveType),
    GenericParam(Arc<GenericParameter>),
    Constructed(Arc<ConstructedType>),
    /// `static` inside a non-final type; bound to the runtime type.
    LateStatic,
    Unknown(UnknownType),
}

impl DType {
    pub fn unknown(name: QualifiedName) -> Self {
        DType::Unknown(UnknownType::Named(name))
    }

    pub fn is_unknown(&self) -> bool {
        match self {
            DType::Unknown(_) => true,
            DType::Constructed(c) => c.generic_type().is_unknown(),
            _ => false,
        }
    }

    /// Whether the member set of this type is fully known.
    pub fn is_definite(&self) -> bool {
        match self {
            DType::Known(decl) => decl.is_definite(),
            DType::Primitive(_) | DType::GenericParam(_) => true,
            DType::Constructed(c) => c.generic_type().is_definite(),
            DType::LateStatic | DType::Unknown(_) => false,
        }
    }

    /// The declaration backing this type, looking through constructed types.
    pub fn as_type_decl(&self) -> Option<&Arc<TypeDecl>> {
        match self {
            DType::Known(decl) => Some(decl),
            DType::Constructed(c) => c.generic_type().as_type_decl(),
            _ => None,
        }
    }

    pub fn qualified_name(&self) -> QualifiedName {
        match self {
            DType::Known(decl) => decl.name().clone(),
            DType::Primitive(p) => p.qualified_name(),
            DType::GenericParam(p) => QualifiedName::simple(p.name.clone()),
            DType::Constructed(c) => c.generic_type().qualified_name(),
            DType::LateStatic => QualifiedName::STATIC_CLASS,
            DType::Unknown(UnknownType::Named(name)) => name.clone(),
            DType::Unknown(UnknownType::SelfRef) => QualifiedName::SELF_CLASS,
            DType::Unknown(UnknownType::StaticRef) => QualifiedName::STATIC_CLASS,
            DType::Unknown(UnknownType::ParentRef) => QualifiedName::PARENT_CLASS,
        }
    }

    /// Display name used in diagnostics (`List<int>` for constructed types).
    pub fn full_name(&self) -> String {
        match self {
            DType::Constructed(c) => c.display_name(),
            other => other.qualified_name().to_string(),
        }
    }

    /// Generic parameters declared by the underlying definition.
    pub fn generic_params(&self) -> &[Arc<GenericParameter>] {
        match self {
            DType::Known(decl) => decl.generic_params(),
            _ => &[],
        }
    }
}

impl From<PrimitiveType> for DType {
    fn from(p: PrimitiveType) -> Self {
        DType::Primitive(p)
    }
}

impl From<Arc<TypeDecl>> for DType {
    fn from(decl: Arc<TypeDecl>) -> Self {
        DType::Known(decl)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
}

#[derive(Debug, Default)]
struct TypeMembers {
    base: Option<DType>,
    methods: IndexMap<Name, Arc<Routine>>,
    properties: IndexMap<VariableName, Arc<Property>>,
    constants: IndexMap<VariableName, Arc<ClassConstant>>,
    is_complete: bool,
    is_definite: bool,
}

/// A class or interface declaration.
#[derive(Debug)]
pub struct TypeDecl {
    name: QualifiedName,
    kind: TypeKind,
    is_final: bool,
    generic_params: Vec<Arc<GenericParameter>>,
    scope: Scope,
    members: RwLock<TypeMembers>,
}

impl TypeDecl {
    pub fn builder(name: QualifiedName) -> TypeDeclBuilder {
        TypeDeclBuilder::new(name)
    }

    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn generic_params(&self) -> &[Arc<GenericParameter>] {
        &self.generic_params
    }

    pub fn generic_parameter(&self, name: &Name) -> Option<Arc<GenericParameter>> {
        self.generic_params.iter().find(|p| p.name == *name).cloned()
    }

    pub fn base(&self) -> Option<DType> {
        self.members.read().base.clone()
    }

    /// Set the base type. An unresolved or incomplete base makes the type
    /// incomplete.
    pub fn set_base(&self, base: DType) {
        let incomplete = base.is_unknown() || base.as_type_decl().is_some_and(|d| !d.is_complete());
        let mut members = self.members.write();
        if incomplete {
            members.is_complete = false;
        }
        members.base = Some(base);
    }

    /// A complete type has every ancestor known at compile time.
    pub fn is_complete(&self) -> bool {
        self.members.read().is_complete
    }

    pub fn is_definite(&self) -> bool {
        self.members.read().is_definite
    }

    /// Mark the member set as fully known. Incomplete types stay indefinite.
    pub fn mark_definite(&self) {
        let mut members = self.members.write();
        members.is_definite = members.is_complete;
    }

    pub fn add_method(&self, method: Arc<Routine>) -> Option<Arc<Routine>> {
        self.members.write().methods.insert(method.name().clone(), method)
    }

    pub fn add_property(&self, property: Arc<Property>) -> Option<Arc<Property>> {
        self.members
            .write()
            .properties
            .insert(property.name.clone(), property)
    }

    pub fn add_constant(&self, constant: Arc<ClassConstant>) -> Option<Arc<ClassConstant>> {
        self.members
            .write()
            .constants
            .insert(constant.name.clone(), constant)
    }

    /// This type followed by its known ancestors, nearest first.
    pub fn ancestors(self: &Arc<Self>) -> Vec<Arc<TypeDecl>> {
        let mut chain = vec![Arc::clone(self)];
        let mut seen = FxHashSet::default();
        seen.insert(self.name.clone());

        let mut current = self.base();
        while let Some(base) = current {
            let Some(decl) = base.as_type_decl() else {
                break;
            };
            if !seen.insert(decl.name.clone()) {
                break;
            }
            chain.push(Arc::clone(decl));
            current = decl.base();
        }
        chain
    }

    pub fn is_same_or_subtype_of(self: &Arc<Self>, other: &TypeDecl) -> bool {
        self.ancestors().iter().any(|t| t.name == other.name)
    }

    pub fn get_method(
        self: &Arc<Self>,
        name: &Name,
        referring: Option<&Arc<TypeDecl>>,
    ) -> MemberLookup<Arc<Routine>> {
        self.lookup(referring, |members| {
            members
                .methods
                .get(name)
                .map(|m| (Arc::clone(m), m.visibility()))
        })
    }

    /// The constructor: `__construct`, or failing that a method named after
    /// the type that declares it.
    pub fn get_constructor(self: &Arc<Self>, referring: Option<&Arc<TypeDecl>>) -> MemberLookup<Arc<Routine>> {
        for decl in self.ancestors() {
            let ctor = {
                let members = decl.members.read();
                members
                    .methods
                    .get(&Name::CONSTRUCT)
                    .or_else(|| members.methods.get(decl.name.name()))
                    .cloned()
            };
            if let Some(ctor) = ctor {
                return check_access(ctor.visibility(), &decl, referring, ctor);
            }
        }
        MemberLookup::NotFound
    }

    pub fn get_property(
        self: &Arc<Self>,
        name: &VariableName,
        referring: Option<&Arc<TypeDecl>>,
    ) -> MemberLookup<Arc<Property>> {
        self.lookup(referring, |members| {
            members
                .properties
                .get(name)
                .map(|p| (Arc::clone(p), p.visibility))
        })
    }

    pub fn get_constant(
        self: &Arc<Self>,
        name: &VariableName,
        referring: Option<&Arc<TypeDecl>>,
    ) -> MemberLookup<Arc<ClassConstant>> {
        self.lookup(referring, |members| {
            members
                .constants
                .get(name)
                .map(|c| (Arc::clone(c), c.visibility))
        })
    }

    fn lookup<T>(
        self: &Arc<Self>,
        referring: Option<&Arc<TypeDecl>>,
        find: impl Fn(&TypeMembers) -> Option<(T, Visibility)>,
    ) -> MemberLookup<T> {
        for decl in self.ancestors() {
            let found = find(&decl.members.read());
            if let Some((member, visibility)) = found {
                return check_access(visibility, &decl, referring, member);
            }
        }
        MemberLookup::NotFound
    }
}

fn check_access<T>(
    visibility: Visibility,
    declaring: &Arc<TypeDecl>,
    referring: Option<&Arc<TypeDecl>>,
    member: T,
) -> MemberLookup<T> {
    let accessible = match visibility {
        Visibility::Public => true,
        Visibility::Private => referring.is_some_and(|r| r.name == declaring.name),
        Visibility::Protected => referring.is_some_and(|r| {
            r.is_same_or_subtype_of(declaring) || declaring.is_same_or_subtype_of(r)
        }),
    };
    if accessible {
        MemberLookup::Found(member)
    } else {
        MemberLookup::BadVisibility(member)
    }
}

/// Builder for [`TypeDecl`].
#[derive(Debug)]
pub struct TypeDeclBuilder {
    name: QualifiedName,
    kind: TypeKind,
    is_final: bool,
    generic_params: Vec<Name>,
    scope: Scope,
    base: Option<DType>,
    definite: bool,
    methods: Vec<Arc<Routine>>,
    properties: Vec<Arc<Property>>,
    constants: Vec<Arc<ClassConstant>>,
}

impl TypeDeclBuilder {
    fn new(name: QualifiedName) -> Self {
        Self {
            name,
            kind: TypeKind::Class,
            is_final: false,
            generic_params: Vec::new(),
            scope: Scope::GLOBAL,
            base: None,
            definite: false,
            methods: Vec::new(),
            properties: Vec::new(),
            constants: Vec::new(),
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

    pub fn generic_param(mut self, name: impl Into<Name>) -> Self {
        self.generic_params.push(name.into());
        self
    }

    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn base(mut self, base: DType) -> Self {
        self.base = Some(base);
        self
    }

    /// Declare the member set fully known once built.
    pub fn definite(mut self) -> Self {
        self.definite = true;
        self
    }

    pub fn method(mut self, method: Routine) -> Self {
        self.methods.push(Arc::new(method));
        self
    }

    pub fn property(mut self, property: Property) -> Self {
        self.properties.push(Arc::new(property));
        self
    }

    pub fn constant(mut self, constant: ClassConstant) -> Self {
        self.constants.push(Arc::new(constant));
        self
    }

    pub fn build(self) -> Arc<TypeDecl> {
        let generic_params = self
            .generic_params
            .into_iter()
            .enumerate()
            .map(|(index, name)| Arc::new(GenericParameter { name, index }))
            .collect();

        let is_complete = !self.base.as_ref().is_some_and(DType::is_unknown);
        let members = TypeMembers {
            base: self.base,
            methods: self
                .methods
                .into_iter()
                .map(|m| (m.name().clone(), m))
                .collect(),
            properties: self
                .properties
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
            constants: self
                .constants
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
            is_complete,
            is_definite: self.definite && is_complete,
        };

        Arc::new(TypeDecl {
            name: self.name,
            kind: self.kind,
            is_final: self.is_final,
            generic_params,
            scope: self.scope,
            members: RwLock::new(members),
        })
    }
}

// ============================================================================
// ROUTINES
// ============================================================================

/// Behavioral flags accumulated on a routine while its body is analyzed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RoutineProperties(u32);

impl RoutineProperties {
    pub const NONE: Self = Self(0);
    /// Contains a call through a variable function name.
    pub const CONTAINS_INDIRECT_CALL: Self = Self(1);
    /// Calls a library routine that needs the caller's locals.
    pub const NEEDS_LOCALS: Self = Self(1 << 1);
    /// Uses `static::` bound to the runtime type.
    pub const LATE_STATIC_BINDING: Self = Self(1 << 2);
    /// Declared inside an incomplete type; bound at runtime.
    pub const DEFERRED_DECLARATION: Self = Self(1 << 3);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for RoutineProperties {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for RoutineProperties {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormalParam {
    pub name: VariableName,
    pub by_ref: bool,
}

impl FormalParam {
    pub fn by_value(name: impl Into<VariableName>) -> Self {
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

/// Formal parameter list plus generic parameters of a routine.
///
/// An unknown signature belongs to a routine that could not be resolved;
/// argument passing semantics are then decided at runtime.
#[derive(Clone, Debug, Default)]
pub struct RoutineSignature {
    params: Vec<FormalParam>,
    generic_params: Vec<Arc<GenericParameter>>,
    is_unknown: bool,
}

impl RoutineSignature {
    pub fn new(params: Vec<FormalParam>) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    pub fn unknown() -> Self {
        Self {
            is_unknown: true,
            ..Self::default()
        }
    }

    pub fn with_generic_params<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Name>,
    {
        self.generic_params = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| {
                Arc::new(GenericParameter {
                    name: name.into(),
                    index,
                })
            })
            .collect();
        self
    }

    pub fn params(&self) -> &[FormalParam] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn is_unknown(&self) -> bool {
        self.is_unknown
    }

    /// Whether the argument at `index` is bound by reference.
    pub fn is_alias(&self, index: usize) -> bool {
        self.params.get(index).is_some_and(|p| p.by_ref)
    }

    pub fn generic_parameter(&self, name: &Name) -> Option<Arc<GenericParameter>> {
        self.generic_params.iter().find(|p| p.name == *name).cloned()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    Function,
    Method,
}

/// A function or method.
#[derive(Debug)]
pub struct Routine {
    name: Name,
    kind: RoutineKind,
    visibility: Visibility,
    is_static: bool,
    declaring_type: Option<QualifiedName>,
    scope: Scope,
    signature: RoutineSignature,
    is_unknown: bool,
    properties: Mutex<RoutineProperties>,
}

impl Routine {
    pub fn function(name: impl Into<Name>, signature: RoutineSignature) -> Self {
        Self {
            name: name.into(),
            kind: RoutineKind::Function,
            visibility: Visibility::Public,
            is_static: true,
            declaring_type: None,
            scope: Scope::GLOBAL,
            signature,
            is_unknown: false,
            properties: Mutex::new(RoutineProperties::NONE),
        }
    }

    pub fn method(
        declaring_type: QualifiedName,
        name: impl Into<Name>,
        visibility: Visibility,
        signature: RoutineSignature,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RoutineKind::Method,
            visibility,
            is_static: false,
            declaring_type: Some(declaring_type),
            scope: Scope::GLOBAL,
            signature,
            is_unknown: false,
            properties: Mutex::new(RoutineProperties::NONE),
        }
    }

    /// Placeholder for a function that could not be resolved.
    pub fn unknown_function(name: &QualifiedName) -> Arc<Self> {
        Arc::new(Self {
            is_unknown: true,
            ..Self::function(name.name().clone(), RoutineSignature::unknown())
        })
    }

    /// Placeholder for a method (or default constructor) that could not be
    /// resolved on `type_name`.
    pub fn unknown_method(type_name: QualifiedName, name: impl Into<Name>) -> Arc<Self> {
        Arc::new(Self {
            is_unknown: true,
            ..Self::method(type_name, name, Visibility::Public, RoutineSignature::unknown())
        })
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_properties(self, properties: RoutineProperties) -> Self {
        *self.properties.lock() = properties;
        self
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn kind(&self) -> RoutineKind {
        self.kind
    }

    pub fn is_function(&self) -> bool {
        self.kind == RoutineKind::Function
    }

    pub fn is_method(&self) -> bool {
        self.kind == RoutineKind::Method
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn declaring_type(&self) -> Option<&QualifiedName> {
        self.declaring_type.as_ref()
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn signature(&self) -> &RoutineSignature {
        &self.signature
    }

    pub fn is_unknown(&self) -> bool {
        self.is_unknown
    }

    pub fn properties(&self) -> RoutineProperties {
        *self.properties.lock()
    }

    pub fn add_properties(&self, properties: RoutineProperties) {
        *self.properties.lock() |= properties;
    }

    /// `Type::name` for methods, the bare name for functions.
    pub fn full_name(&self) -> String {
        match &self.declaring_type {
            Some(t) => t.to_member_string(self.name.as_str(), false),
            None => self.name.to_string(),
        }
    }
}

// ============================================================================
// PROPERTIES & CONSTANTS
// ============================================================================

#[derive(Clone, Debug)]
pub struct Property {
    pub name: VariableName,
    pub visibility: Visibility,
    pub is_static: bool,
    pub declaring_type: QualifiedName,
    pub is_unknown: bool,
}

impl Property {
    pub fn new(declaring_type: QualifiedName, name: impl Into<VariableName>, visibility: Visibility) -> Self {
        Self {
            name: name.into(),
            visibility,
            is_static: false,
            declaring_type,
            is_unknown: false,
        }
    }

    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn unknown(declaring_type: QualifiedName, name: &VariableName) -> Arc<Self> {
        Arc::new(Self {
            is_unknown: true,
            ..Self::new(declaring_type, name.clone(), Visibility::Public)
        })
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

#[derive(Clone, Debug)]
pub struct ClassConstant {
    pub name: VariableName,
    pub visibility: Visibility,
    pub value: Option<ConstValue>,
    pub declaring_type: QualifiedName,
    pub is_unknown: bool,
}

impl ClassConstant {
    pub fn new(declaring_type: QualifiedName, name: impl Into<VariableName>, value: ConstValue) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            value: Some(value),
            declaring_type,
            is_unknown: false,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn unknown(declaring_type: QualifiedName, name: &VariableName) -> Arc<Self> {
        Arc::new(Self {
            name: name.clone(),
            visibility: Visibility::Public,
            value: None,
            declaring_type,
            is_unknown: true,
        })
    }

    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }
}

/// A global (namespace-level) constant.
#[derive(Clone, Debug)]
pub struct GlobalConstant {
    pub name: QualifiedName,
    pub value: Option<ConstValue>,
    pub scope: Scope,
    pub is_unknown: bool,
}

impl GlobalConstant {
    pub fn new(name: QualifiedName, value: ConstValue) -> Self {
        Self {
            name,
            value: Some(value),
            scope: Scope::GLOBAL,
            is_unknown: false,
        }
    }

    pub fn unknown(name: QualifiedName) -> Arc<Self> {
        Arc::new(Self {
            name,
            value: None,
            scope: Scope::GLOBAL,
            is_unknown: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qn(text: &str) -> QualifiedName {
        QualifiedName::parse(text).unwrap()
    }

    fn method(owner: &str, name: &str, visibility: Visibility) -> Routine {
        Routine::method(qn(owner), name, visibility, RoutineSignature::default())
    }

    #[test]
    fn test_member_lookup_walks_base_chain() {
        let base = TypeDecl::builder(qn("Base"))
            .method(method("Base", "run", Visibility::Public))
            .definite()
            .build();
        let derived = TypeDecl::builder(qn("Derived"))
            .base(DType::Known(Arc::clone(&base)))
            .definite()
            .build();

        assert!(derived.get_method(&Name::new("RUN"), None).is_found());
        assert!(derived.get_method(&Name::new("stop"), None).is_not_found());
        assert_eq!(derived.ancestors().len(), 2);
    }

    #[test]
    fn test_visibility_rules() {
        let base = TypeDecl::builder(qn("Base"))
            .method(method("Base", "secret", Visibility::Private))
            .method(method("Base", "shared", Visibility::Protected))
            .definite()
            .build();
        let derived = TypeDecl::builder(qn("Derived"))
            .base(DType::Known(Arc::clone(&base)))
            .definite()
            .build();
        let stranger = TypeDecl::builder(qn("Stranger")).definite().build();

        let secret = Name::new("secret");
        let shared = Name::new("shared");

        assert!(base.get_method(&secret, Some(&base)).is_found());
        assert!(matches!(
            base.get_method(&secret, Some(&derived)),
            MemberLookup::BadVisibility(_)
        ));
        assert!(base.get_method(&shared, Some(&derived)).is_found());
        assert!(matches!(
            base.get_method(&shared, Some(&stranger)),
            MemberLookup::BadVisibility(_)
        ));
        assert!(matches!(base.get_method(&shared, None), MemberLookup::BadVisibility(_)));
    }

    #[test]
    fn test_constructor_lookup() {
        let legacy = TypeDecl::builder(qn("Legacy"))
            .method(method("Legacy", "legacy", Visibility::Public))
            .definite()
            .build();
        let modern = TypeDecl::builder(qn("Modern"))
            .method(method("Modern", "__construct", Visibility::Private))
            .definite()
            .build();
        let plain = TypeDecl::builder(qn("Plain")).definite().build();

        assert!(legacy.get_constructor(None).is_found());
        assert!(matches!(modern.get_constructor(None), MemberLookup::BadVisibility(_)));
        assert!(plain.get_constructor(None).is_not_found());
    }

    #[test]
    fn test_unknown_base_makes_type_indefinite() {
        let decl = TypeDecl::builder(qn("Orphan"))
            .base(DType::unknown(qn("Missing")))
            .definite()
            .build();
        assert!(!decl.is_complete());
        assert!(!decl.is_definite());

        let late = TypeDecl::builder(qn("Late")).build();
        late.set_base(DType::unknown(qn("Missing")));
        late.mark_definite();
        assert!(!late.is_definite());
    }

    #[test]
    fn test_ancestor_cycle_terminates() {
        let a = TypeDecl::builder(qn("A")).build();
        a.set_base(DType::Known(Arc::clone(&a)));
        assert_eq!(a.ancestors().len(), 1);
    }

    #[test]
    fn test_routine_properties_accumulate() {
        let f = Routine::function("f", RoutineSignature::default());
        f.add_properties(RoutineProperties::LATE_STATIC_BINDING);
        f.add_properties(RoutineProperties::NEEDS_LOCALS);

        let props = f.properties();
        assert!(props.contains(RoutineProperties::LATE_STATIC_BINDING));
        assert!(props.contains(RoutineProperties::NEEDS_LOCALS));
        assert!(!props.contains(RoutineProperties::CONTAINS_INDIRECT_CALL));
    }

    #[test]
    fn test_signature_aliases() {
        let sig = RoutineSignature::new(vec![FormalParam::by_value("a"), FormalParam::by_ref("b")]);
        assert!(!sig.is_alias(0));
        assert!(sig.is_alias(1));
        assert!(!sig.is_alias(5));
        assert!(!sig.is_unknown());
        assert!(RoutineSignature::unknown().is_unknown());
    }

    #[test]
    fn test_placeholders_are_unknown() {
        let f = Routine::unknown_function(&qn("nope"));
        assert!(f.is_unknown());
        assert!(f.signature().is_unknown());

        let m = Routine::unknown_method(qn("A"), "m");
        assert_eq!(m.full_name(), "A::m");
        assert!(DType::unknown(qn("X")).is_unknown());
        assert!(!DType::LateStatic.is_definite());
    }
}
