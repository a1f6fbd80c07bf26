//! Identifier model: simple names, variable names, qualified and generic names.
//!
//! | identifier            | representation     | comparison        |
//! |-----------------------|--------------------|-------------------|
//! | function, class       | [`QualifiedName`]  | case-insensitive  |
//! | method, ns component  | [`Name`]           | case-insensitive  |
//! | variable, field       | [`VariableName`]   | case-sensitive    |
//! | class constant, label | [`VariableName`]   | case-sensitive    |

use std::fmt;
use std::hash::{Hash, Hasher};

use smol_str::SmolStr;
use thiserror::Error;

/// Namespace separator used by the source language.
pub const SEPARATOR: char = '\\';

// ============================================================================
// NAME
// ============================================================================

/// Case-insensitive simple name.
///
/// Keeps the original spelling for display and a lowercase copy that drives
/// equality, ordering and hashing.
#[derive(Clone)]
pub struct Name {
    value: SmolStr,
    lower: SmolStr,
}

impl Name {
    pub const EMPTY: Name = Name::special("", "");
    pub const SELF: Name = Name::special("self", "self");
    pub const PARENT: Name = Name::special("parent", "parent");
    pub const STATIC: Name = Name::special("static", "static");
    pub const CONSTRUCT: Name = Name::special("__construct", "__construct");
    pub const DESTRUCT: Name = Name::special("__destruct", "__destruct");
    pub const CLONE: Name = Name::special("__clone", "__clone");
    pub const CALL: Name = Name::special("__call", "__call");
    pub const CALL_STATIC: Name = Name::special("__callStatic", "__callstatic");
    pub const AUTOLOAD: Name = Name::special("__autoload", "__autoload");
    pub const LAMBDA: Name = Name::special("<Lambda>", "<lambda>");

    const fn special(value: &'static str, lower: &'static str) -> Self {
        Self {
            value: SmolStr::new_inline(value),
            lower: SmolStr::new_inline(lower),
        }
    }

    /// Create a name from its source spelling.
    pub fn new(value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        Self {
            value: SmolStr::new(value),
            lower: SmolStr::new(value.to_lowercase()),
        }
    }

    /// The name as written in source.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// The normalized (lowercase) form used for identity.
    #[inline]
    pub fn lowercase(&self) -> &str {
        &self.lower
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Case-insensitive comparison against a raw string.
    pub fn eq_str(&self, other: &str) -> bool {
        self.lower == other.to_lowercase()
    }

    pub fn is_construct_name(&self) -> bool {
        *self == Self::CONSTRUCT
    }

    pub fn is_destruct_name(&self) -> bool {
        *self == Self::DESTRUCT
    }

    pub fn is_clone_name(&self) -> bool {
        *self == Self::CLONE
    }

    pub fn is_call_name(&self) -> bool {
        *self == Self::CALL
    }

    pub fn is_call_static_name(&self) -> bool {
        *self == Self::CALL_STATIC
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lower.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.lower.cmp(&other.lower)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.value.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

// ============================================================================
// VARIABLE NAME
// ============================================================================

/// Superglobals: always visible, never recorded in a routine's variable table.
const AUTO_GLOBALS: &[&str] = &[
    "GLOBALS", "_SERVER", "_GET", "_POST", "_COOKIE", "_FILES", "_ENV", "_REQUEST", "_SESSION",
];

/// Case-sensitive simple name for variables, fields, class constants and labels.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableName(SmolStr);

impl VariableName {
    pub const THIS: VariableName = VariableName(SmolStr::new_inline("this"));

    pub fn new(value: impl AsRef<str>) -> Self {
        Self(SmolStr::new(value.as_ref()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_this(&self) -> bool {
        *self == Self::THIS
    }

    pub fn is_auto_global(&self) -> bool {
        AUTO_GLOBALS.contains(&self.0.as_str())
    }
}

impl fmt::Debug for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl fmt::Display for VariableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariableName {
    fn from(value: &str) -> Self {
        VariableName::new(value)
    }
}

// ============================================================================
// QUALIFIED NAME
// ============================================================================

/// Error produced when parsing a qualified name from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("empty qualified name")]
    Empty,
    #[error("empty namespace component in '{0}'")]
    EmptyComponent(String),
    #[error("'{component}' is not a valid identifier in '{text}'")]
    InvalidIdentifier { text: String, component: String },
}

/// Namespace-qualified, case-insensitive name.
///
/// The outermost namespace comes first. A namespace itself is represented with
/// an empty base name. Equality and hashing ignore the `fully_qualified` flag:
/// `\A\B` and `A\B` denote the same entity once resolved.
#[derive(Clone)]
pub struct QualifiedName {
    namespaces: Vec<Name>,
    name: Name,
    fully_qualified: bool,
}

impl QualifiedName {
    pub const ERROR: QualifiedName = QualifiedName::sentinel("<error>", "<error>");
    pub const GLOBAL: QualifiedName = QualifiedName::sentinel("<Global>", "<global>");
    pub const NULL: QualifiedName = QualifiedName::sentinel("null", "null");
    pub const TRUE: QualifiedName = QualifiedName::sentinel("true", "true");
    pub const FALSE: QualifiedName = QualifiedName::sentinel("false", "false");
    pub const ARRAY: QualifiedName = QualifiedName::sentinel("array", "array");
    pub const OBJECT: QualifiedName = QualifiedName::sentinel("object", "object");
    pub const INTEGER: QualifiedName = QualifiedName::sentinel("int", "int");
    pub const LONG_INTEGER: QualifiedName = QualifiedName::sentinel("int64", "int64");
    pub const STRING: QualifiedName = QualifiedName::sentinel("string", "string");
    pub const BOOLEAN: QualifiedName = QualifiedName::sentinel("bool", "bool");
    pub const DOUBLE: QualifiedName = QualifiedName::sentinel("double", "double");
    pub const RESOURCE: QualifiedName = QualifiedName::sentinel("resource", "resource");
    pub const SELF_CLASS: QualifiedName = QualifiedName::sentinel("self", "self");
    pub const PARENT_CLASS: QualifiedName = QualifiedName::sentinel("parent", "parent");
    pub const STATIC_CLASS: QualifiedName = QualifiedName::sentinel("static", "static");

    const fn sentinel(value: &'static str, lower: &'static str) -> Self {
        Self {
            namespaces: Vec::new(),
            name: Name::special(value, lower),
            fully_qualified: false,
        }
    }

    /// A name without namespace components.
    pub fn simple(name: impl Into<Name>) -> Self {
        Self {
            namespaces: Vec::new(),
            name: name.into(),
            fully_qualified: false,
        }
    }

    pub fn new(name: Name, namespaces: Vec<Name>) -> Self {
        Self {
            namespaces,
            name,
            fully_qualified: false,
        }
    }

    /// A namespace path (empty base name).
    pub fn namespace(components: Vec<Name>) -> Self {
        Self::new(Name::EMPTY, components)
    }

    /// Read the whole name as a namespace path: `App\Models` names the
    /// `App\Models` namespace rather than `Models` inside `App`.
    pub fn into_namespace(self) -> Self {
        if self.is_namespace() {
            return self;
        }
        let mut components = self.namespaces;
        components.push(self.name);
        Self::namespace(components)
    }

    /// Mark the name as written with a leading separator.
    pub fn fully_qualified(mut self) -> Self {
        self.fully_qualified = true;
        self
    }

    /// Parse `A\B\c` (optionally with a leading `\`).
    pub fn parse(text: &str) -> Result<Self, NameError> {
        let (fully_qualified, body) = match text.strip_prefix(SEPARATOR) {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        if body.is_empty() {
            return Err(NameError::Empty);
        }

        let mut components = Vec::new();
        for part in body.split(SEPARATOR) {
            if part.is_empty() {
                return Err(NameError::EmptyComponent(text.to_string()));
            }
            if !is_identifier(part) {
                return Err(NameError::InvalidIdentifier {
                    text: text.to_string(),
                    component: part.to_string(),
                });
            }
            components.push(Name::new(part));
        }

        // `split` yields at least one element for non-empty input
        let name = components.pop().unwrap_or(Name::EMPTY);
        Ok(Self {
            namespaces: components,
            name,
            fully_qualified,
        })
    }

    /// Combine a (possibly partially qualified) name with a namespace path.
    ///
    /// Used when a declaration nested in a namespace needs its full name.
    pub fn within(&self, namespace: &QualifiedName) -> Self {
        debug_assert!(namespace.is_namespace(), "expected a namespace path");
        let mut namespaces = namespace.namespaces.clone();
        namespaces.extend(self.namespaces.iter().cloned());
        Self {
            namespaces,
            name: self.name.clone(),
            fully_qualified: true,
        }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn namespaces(&self) -> &[Name] {
        &self.namespaces
    }

    pub fn is_fully_qualified(&self) -> bool {
        self.fully_qualified
    }

    pub fn is_simple_name(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn is_namespace(&self) -> bool {
        self.name.is_empty()
    }

    pub fn is_self_class_name(&self) -> bool {
        self.is_simple_name() && self.name == Name::SELF
    }

    pub fn is_parent_class_name(&self) -> bool {
        self.is_simple_name() && self.name == Name::PARENT
    }

    pub fn is_static_class_name(&self) -> bool {
        self.is_simple_name() && self.name == Name::STATIC
    }

    /// `self`, `parent` or `static`.
    pub fn is_reserved_class_name(&self) -> bool {
        self.is_self_class_name() || self.is_parent_class_name() || self.is_static_class_name()
    }

    pub fn is_autoload_name(&self) -> bool {
        self.is_simple_name() && self.name == Name::AUTOLOAD
    }

    /// Render as `Type::member` (static) or `Type->member` (instance).
    pub fn to_member_string(&self, member: &str, instance: bool) -> String {
        format!("{}{}{}", self, if instance { "->" } else { "::" }, member)
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first == '_' || unicode_ident::is_xid_start(first) => {
            chars.all(unicode_ident::is_xid_continue)
        }
        _ => false,
    }
}

impl PartialEq for QualifiedName {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.namespaces == other.namespaces
    }
}

impl Eq for QualifiedName {}

impl Hash for QualifiedName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespaces.len().hash(state);
        for ns in &self.namespaces {
            ns.hash(state);
        }
        self.name.hash(state);
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ns) in self.namespaces.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{ns}")?;
        }
        if !self.name.is_empty() {
            if !self.namespaces.is_empty() {
                write!(f, "{SEPARATOR}")?;
            }
            write!(f, "{}", self.name)?;
        }
        Ok(())
    }
}

impl fmt::Debug for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QualifiedName({self})")
    }
}

// ============================================================================
// PRIMITIVE TYPES & GENERIC NAMES
// ============================================================================

/// Built-in type keywords usable in type hints and generic arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Integer,
    LongInteger,
    Double,
    String,
    Resource,
    Array,
    Object,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Integer,
        PrimitiveType::LongInteger,
        PrimitiveType::Double,
        PrimitiveType::String,
        PrimitiveType::Resource,
        PrimitiveType::Array,
        PrimitiveType::Object,
    ];

    pub fn qualified_name(self) -> QualifiedName {
        match self {
            PrimitiveType::Boolean => QualifiedName::BOOLEAN,
            PrimitiveType::Integer => QualifiedName::INTEGER,
            PrimitiveType::LongInteger => QualifiedName::LONG_INTEGER,
            PrimitiveType::Double => QualifiedName::DOUBLE,
            PrimitiveType::String => QualifiedName::STRING,
            PrimitiveType::Resource => QualifiedName::RESOURCE,
            PrimitiveType::Array => QualifiedName::ARRAY,
            PrimitiveType::Object => QualifiedName::OBJECT,
        }
    }

    /// Map a simple keyword name to a primitive type.
    pub fn from_name(name: &QualifiedName) -> Option<Self> {
        if !name.is_simple_name() {
            return None;
        }
        Self::ALL.into_iter().find(|p| p.qualified_name() == *name)
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified_name())
    }
}

/// A generic argument: either a primitive keyword or another generic name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    Primitive(PrimitiveType),
    Generic(GenericQualifiedName),
}

/// Qualified name with an ordered list of generic arguments (`List<int, Foo>`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericQualifiedName {
    pub qualified_name: QualifiedName,
    pub generic_params: Vec<TypeArgument>,
}

impl GenericQualifiedName {
    pub fn new(qualified_name: QualifiedName, generic_params: Vec<TypeArgument>) -> Self {
        Self {
            qualified_name,
            generic_params,
        }
    }

    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

impl From<QualifiedName> for GenericQualifiedName {
    fn from(qualified_name: QualifiedName) -> Self {
        Self::new(qualified_name, Vec::new())
    }
}
