//! Source units and the declarations they can see.
//!
//! The analyzer talks to a compilation unit only through [`SourceUnit`]:
//! scope-relative lookups of functions, types and global constants (with
//! alias translation and namespace context), plus registration of the
//! declarations the unit itself contributes.
//!
//! [`UnitCatalog`] is the in-memory implementation. Units of one compilation
//! share a [`SymbolTable`], so a call may resolve to a function declared in
//! another file.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::{FxBuildHasher, FxHashMap};
use tracing::trace;

use super::symbols::{DType, GlobalConstant, Routine, Scope, TypeDecl};
use crate::base::{Name, QualifiedName, SourceId};

// ============================================================================
// LOOKUP RESULT
// ============================================================================

/// Result of a scope-relative name lookup.
#[derive(Clone, Debug)]
pub enum NameLookup<T> {
    Found(T),
    /// Nothing visible under the name. `alias` holds the alias-translated
    /// name when the lookup went through a `use` alias.
    Missing { alias: Option<QualifiedName> },
    /// The name denotes different declarations through an alias and through
    /// the current namespace.
    Ambiguous { candidates: Vec<QualifiedName> },
}

impl<T> NameLookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            NameLookup::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, NameLookup::Found(_))
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, NameLookup::Ambiguous { .. })
    }
}

// ============================================================================
// SOURCE UNIT CONTRACT
// ============================================================================

/// One compilation unit (source file) as the analyzer sees it.
pub trait SourceUnit: Send + Sync {
    fn id(&self) -> SourceId;

    /// Namespace the unit starts in, if any.
    fn current_namespace(&self) -> Option<QualifiedName>;

    fn resolve_function_name(
        &self,
        name: &QualifiedName,
        namespace: Option<&QualifiedName>,
        scope: Scope,
    ) -> NameLookup<Arc<Routine>>;

    fn resolve_type_name(
        &self,
        name: &QualifiedName,
        namespace: Option<&QualifiedName>,
        scope: Scope,
    ) -> NameLookup<DType>;

    fn resolve_constant_name(
        &self,
        name: &QualifiedName,
        namespace: Option<&QualifiedName>,
        scope: Scope,
    ) -> NameLookup<Arc<GlobalConstant>>;

    fn declare_function(&self, name: QualifiedName, routine: Arc<Routine>);

    fn declare_type(&self, decl: Arc<TypeDecl>);

    fn declare_constant(&self, constant: Arc<GlobalConstant>);
}

// ============================================================================
// SYMBOL TABLE
// ============================================================================

#[derive(Debug)]
struct Declared<T> {
    scope: Scope,
    value: T,
}

type Entries<T> = IndexMap<QualifiedName, Vec<Declared<T>>, FxBuildHasher>;

/// Declarations of one compilation, keyed by fully qualified name.
///
/// A name may carry several conditional declarations, one per scope.
#[derive(Debug, Default)]
pub struct SymbolTable {
    functions: RwLock<Entries<Arc<Routine>>>,
    types: RwLock<Entries<Arc<TypeDecl>>>,
    constants: RwLock<Entries<Arc<GlobalConstant>>>,
}

impl SymbolTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_function(&self, name: QualifiedName, routine: Arc<Routine>) {
        let scope = routine.scope();
        push_entry(&self.functions, name, scope, routine);
    }

    pub fn add_type(&self, decl: Arc<TypeDecl>) {
        let (name, scope) = (decl.name().clone(), decl.scope());
        push_entry(&self.types, name, scope, decl);
    }

    pub fn add_constant(&self, constant: Arc<GlobalConstant>) {
        let (name, scope) = (constant.name.clone(), constant.scope);
        push_entry(&self.constants, name, scope, constant);
    }

    pub fn function(&self, name: &QualifiedName, scope: Scope) -> Option<Arc<Routine>> {
        visible(&self.functions, name, scope)
    }

    pub fn type_decl(&self, name: &QualifiedName, scope: Scope) -> Option<Arc<TypeDecl>> {
        visible(&self.types, name, scope)
    }

    pub fn constant(&self, name: &QualifiedName, scope: Scope) -> Option<Arc<GlobalConstant>> {
        visible(&self.constants, name, scope)
    }

    pub fn type_count(&self) -> usize {
        self.types.read().len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.read().len()
    }
}

fn push_entry<T>(entries: &RwLock<Entries<T>>, name: QualifiedName, scope: Scope, value: T) {
    trace!(%name, ?scope, "declare");
    entries
        .write()
        .entry(name)
        .or_default()
        .push(Declared { scope, value });
}

/// First declaration visible from `scope` (see [`Scope::is_visible_from`]).
fn visible<T: Clone>(entries: &RwLock<Entries<T>>, name: &QualifiedName, scope: Scope) -> Option<T> {
    entries
        .read()
        .get(name)?
        .iter()
        .find(|d| d.scope.is_visible_from(scope))
        .map(|d| d.value.clone())
}

// ============================================================================
// UNIT CATALOG
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum NameKind {
    Function,
    Type,
    Constant,
}

impl NameKind {
    /// Simple names fall back to the global namespace.
    fn falls_back_to_global(self) -> bool {
        matches!(self, NameKind::Function | NameKind::Constant)
    }

    /// Whether a `use` alias may replace a whole simple name.
    fn aliases_simple_names(self) -> bool {
        self == NameKind::Type
    }
}

/// In-memory [`SourceUnit`] over a shared [`SymbolTable`].
#[derive(Debug)]
pub struct UnitCatalog {
    id: SourceId,
    namespace: Option<QualifiedName>,
    aliases: RwLock<FxHashMap<Name, QualifiedName>>,
    table: Arc<SymbolTable>,
}

impl UnitCatalog {
    pub fn new(id: SourceId, table: Arc<SymbolTable>) -> Self {
        Self {
            id,
            namespace: None,
            aliases: RwLock::new(FxHashMap::default()),
            table,
        }
    }

    /// Set the unit's namespace. A plain name such as `App` is read as the
    /// namespace path.
    pub fn with_namespace(mut self, namespace: QualifiedName) -> Self {
        self.namespace = Some(namespace.into_namespace());
        self
    }

    /// `use target as alias;`
    pub fn add_alias(&self, alias: impl Into<Name>, target: QualifiedName) {
        self.aliases.write().insert(alias.into(), target);
    }

    pub fn table(&self) -> &Arc<SymbolTable> {
        &self.table
    }

    /// Replace the first component of `name` through the alias table.
    fn translate_alias(&self, name: &QualifiedName, kind: NameKind) -> Option<QualifiedName> {
        let aliases = self.aliases.read();
        match name.namespaces().split_first() {
            Some((first, rest)) => {
                let target = aliases.get(first)?;
                let mut namespaces = target.namespaces().to_vec();
                namespaces.push(target.name().clone());
                namespaces.extend(rest.iter().cloned());
                Some(QualifiedName::new(name.name().clone(), namespaces).fully_qualified())
            }
            None if kind.aliases_simple_names() => aliases
                .get(name.name())
                .map(|target| target.clone().fully_qualified()),
            None => None,
        }
    }

    fn lookup<T>(
        &self,
        name: &QualifiedName,
        namespace: Option<&QualifiedName>,
        kind: NameKind,
        find: impl Fn(&QualifiedName) -> Option<T>,
    ) -> NameLookup<T> {
        if name.is_fully_qualified() {
            return match find(name) {
                Some(found) => NameLookup::Found(found),
                None => NameLookup::Missing { alias: None },
            };
        }

        let local = namespace.map(|ns| name.within(ns));

        if let Some(translated) = self.translate_alias(name, kind) {
            let via_alias = find(&translated);
            let conflicting = local
                .as_ref()
                .filter(|l| **l != translated && via_alias.is_some() && find(l).is_some());
            if let Some(local_name) = conflicting {
                return NameLookup::Ambiguous {
                    candidates: vec![translated, local_name.clone()],
                };
            }
            return match via_alias {
                Some(found) => NameLookup::Found(found),
                None => NameLookup::Missing {
                    alias: Some(translated),
                },
            };
        }

        if let Some(found) = local.as_ref().and_then(&find) {
            return NameLookup::Found(found);
        }

        if namespace.is_none() || (name.is_simple_name() && kind.falls_back_to_global()) {
            if let Some(found) = find(name) {
                return NameLookup::Found(found);
            }
        }

        NameLookup::Missing { alias: None }
    }
}

impl SourceUnit for UnitCatalog {
    fn id(&self) -> SourceId {
        self.id
    }

    fn current_namespace(&self) -> Option<QualifiedName> {
        self.namespace.clone()
    }

    fn resolve_function_name(
        &self,
        name: &QualifiedName,
        namespace: Option<&QualifiedName>,
        scope: Scope,
    ) -> NameLookup<Arc<Routine>> {
        self.lookup(name, namespace, NameKind::Function, |qn| self.table.function(qn, scope))
    }

    fn resolve_type_name(
        &self,
        name: &QualifiedName,
        namespace: Option<&QualifiedName>,
        scope: Scope,
    ) -> NameLookup<DType> {
        self.lookup(name, namespace, NameKind::Type, |qn| {
            self.table.type_decl(qn, scope).map(DType::Known)
        })
    }

    fn resolve_constant_name(
        &self,
        name: &QualifiedName,
        namespace: Option<&QualifiedName>,
        scope: Scope,
    ) -> NameLookup<Arc<GlobalConstant>> {
        self.lookup(name, namespace, NameKind::Constant, |qn| self.table.constant(qn, scope))
    }

    fn declare_function(&self, name: QualifiedName, routine: Arc<Routine>) {
        self.table.add_function(name, routine);
    }

    fn declare_type(&self, decl: Arc<TypeDecl>) {
        self.table.add_type(decl);
    }

    fn declare_constant(&self, constant: Arc<GlobalConstant>) {
        self.table.add_constant(constant);
    }
}
