//! Constructed (generic-instantiated) types and their cache.
//!
//! For a definite generic definition the cache hands out one shared
//! [`ConstructedType`] per distinct argument list, so repeated uses compare
//! by pointer. Indefinite definitions have no stable key and get a fresh
//! instance on every request.

use std::fmt;
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use tracing::trace;

use super::symbols::{DType, UnknownType};
use crate::base::{PrimitiveType, SourceId, Span};

/// Where a constructed type was first written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Origin {
    pub source: SourceId,
    pub span: Span,
}

/// Finalized shape of a constructed type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstructedShape {
    pub display_name: String,
    /// Generic parameter count of the definition, when it is known.
    pub expected_arity: Option<usize>,
    pub actual_arity: usize,
}

impl ConstructedShape {
    pub fn arity_matches(&self) -> bool {
        self.expected_arity.is_none_or(|n| n == self.actual_arity)
    }
}

pub struct ConstructedType {
    generic_type: DType,
    arguments: Vec<DType>,
    origin: OnceLock<Origin>,
    shape: OnceLock<ConstructedShape>,
}

impl ConstructedType {
    pub fn new(generic_type: DType, arguments: Vec<DType>) -> Self {
        Self {
            generic_type,
            arguments,
            origin: OnceLock::new(),
            shape: OnceLock::new(),
        }
    }

    pub fn generic_type(&self) -> &DType {
        &self.generic_type
    }

    pub fn arguments(&self) -> &[DType] {
        &self.arguments
    }

    /// Record the first place this instantiation was written. Later calls
    /// are ignored.
    pub fn record_origin(&self, origin: Origin) {
        let _ = self.origin.set(origin);
    }

    pub fn origin(&self) -> Option<Origin> {
        self.origin.get().copied()
    }

    pub fn display_name(&self) -> String {
        let args: Vec<String> = self.arguments.iter().map(DType::full_name).collect();
        format!("{}<{}>", self.generic_type.full_name(), args.join(", "))
    }

    pub fn is_finalized(&self) -> bool {
        self.shape.get().is_some()
    }

    pub fn shape(&self) -> Option<&ConstructedShape> {
        self.shape.get()
    }

    /// Compute the final shape. Returns it only on the first call.
    pub fn finalize(&self) -> Option<&ConstructedShape> {
        let mut fresh = false;
        let shape = self.shape.get_or_init(|| {
            fresh = true;
            let expected_arity = match &self.generic_type {
                DType::Known(decl) if decl.is_definite() => Some(decl.generic_params().len()),
                _ => None,
            };
            ConstructedShape {
                display_name: self.display_name(),
                expected_arity,
                actual_arity: self.arguments.len(),
            }
        });
        fresh.then_some(shape)
    }
}

impl fmt::Debug for ConstructedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructedType")
            .field("name", &self.display_name())
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

/// Identity of a type inside a cache key. Shared symbols compare by address;
/// the cache keeps them alive, so addresses are not reused.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum TypeKey {
    Decl(usize),
    Primitive(PrimitiveType),
    GenericParam(usize),
    Constructed(usize),
    LateStatic,
    Unknown(UnknownType),
}

impl TypeKey {
    fn of(ty: &DType) -> Self {
        match ty {
            DType::Known(decl) => TypeKey::Decl(Arc::as_ptr(decl) as usize),
            DType::Primitive(p) => TypeKey::Primitive(*p),
            DType::GenericParam(p) => TypeKey::GenericParam(Arc::as_ptr(p) as usize),
            DType::Constructed(c) => TypeKey::Constructed(Arc::as_ptr(c) as usize),
            DType::LateStatic => TypeKey::LateStatic,
            DType::Unknown(u) => TypeKey::Unknown(u.clone()),
        }
    }
}

type CacheKey = (TypeKey, Vec<TypeKey>);

/// Memo table of constructed types, owned by one analyzer.
#[derive(Debug, Default)]
pub struct ConstructedTypeCache {
    types: IndexMap<CacheKey, Arc<ConstructedType>, FxBuildHasher>,
    finalized_upto: usize,
}

impl ConstructedTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate `generic_type` with the first `count` of `arguments`.
    pub fn create(&mut self, generic_type: &DType, mut arguments: Vec<DType>, count: usize) -> Arc<ConstructedType> {
        arguments.truncate(count);

        if !generic_type.is_definite() {
            trace!(generic = %generic_type.full_name(), "uncached constructed type");
            return Arc::new(ConstructedType::new(generic_type.clone(), arguments));
        }

        let key = (
            TypeKey::of(generic_type),
            arguments.iter().map(TypeKey::of).collect(),
        );
        if let Some(existing) = self.types.get(&key) {
            trace!(name = %existing.display_name(), "constructed type cache hit");
            return Arc::clone(existing);
        }

        let created = Arc::new(ConstructedType::new(generic_type.clone(), arguments));
        self.types.insert(key, Arc::clone(&created));
        created
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ConstructedType>> {
        self.types.values()
    }

    /// Finalize every cached type added since the last call. Types already
    /// finalized elsewhere are skipped. Returns the types finalized now.
    pub fn finalize_pending(&mut self) -> Vec<Arc<ConstructedType>> {
        let mut finalized = Vec::new();
        while let Some((_, ty)) = self.types.get_index(self.finalized_upto) {
            if ty.finalize().is_some() {
                finalized.push(Arc::clone(ty));
            }
            self.finalized_upto += 1;
        }
        finalized
    }
}
