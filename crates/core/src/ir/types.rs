//! Type graph nodes.
//!
//! A [`Type`] is one node of the closed-world type graph handed over by the
//! upstream project compiler. Nodes reference each other only through
//! [`TypeId`] keys, so the graph may be cyclic.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::project::Variable;

/// Opaque key identifying one node in the type graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(String);

impl TypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A node in the type graph.
#[derive(Debug, Clone, Deserialize)]
pub struct Type {
    /// Package path owning the type, absent for builtins.
    #[serde(default)]
    pub package: Option<String>,
    /// Declared name, absent for anonymous composites.
    #[serde(default)]
    pub name: Option<String>,
    pub kind: TypeKind,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub doc: Option<String>,
}

impl Type {
    /// Package and name, when the type has a distinct identity.
    pub fn identity(&self) -> Option<(&str, &str)> {
        match (self.package.as_deref(), self.name.as_deref()) {
            (Some(package), Some(name)) if !package.is_empty() && !name.is_empty() => {
                Some((package, name))
            }
            _ => None,
        }
    }

    pub fn is_named(&self) -> bool {
        self.identity().is_some()
    }

    /// Key used to look the type up in the substitution table (`pkg.Name`).
    pub fn qualified_key(&self) -> Option<String> {
        self.identity()
            .map(|(package, name)| format!("{package}.{name}"))
    }
}

/// Kind-specific payload of a [`Type`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Scalar(Scalar),
    Struct(StructType),
    Interface(InterfaceType),
    Alias(AliasType),
    Array(ArrayType),
    Map(MapType),
    Channel(ChannelType),
    Function(Signature),
    Any,
}

/// Builtin scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
}

impl Scalar {
    /// Parse a builtin spelling, including the `byte` and `rune` aliases.
    pub fn from_builtin_name(name: &str) -> Option<Self> {
        let scalar = match name {
            "bool" => Self::Bool,
            "int" => Self::Int,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" | "rune" => Self::Int32,
            "int64" => Self::Int64,
            "uint" => Self::Uint,
            "uint8" | "byte" => Self::Uint8,
            "uint16" => Self::Uint16,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "uintptr" => Self::Uintptr,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            "complex64" => Self::Complex64,
            "complex128" => Self::Complex128,
            "string" => Self::String,
            _ => return None,
        };
        Some(scalar)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int
                | Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Uint
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
                | Self::Uintptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    pub fn is_complex(self) -> bool {
        matches!(self, Self::Complex64 | Self::Complex128)
    }
}

/// Struct payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructType {
    #[serde(default)]
    pub fields: Vec<StructField>,
}

/// A struct field: a [`Variable`] plus serialization tags and docs.
#[derive(Debug, Clone, Deserialize)]
pub struct StructField {
    #[serde(flatten)]
    pub var: Variable,
    /// Raw struct tag, e.g. `json:"id,omitempty"`.
    #[serde(default)]
    pub tags: String,
    /// Anonymous (embedded) field.
    #[serde(default)]
    pub embedded: bool,
    #[serde(default)]
    pub doc: Option<String>,
}

impl StructField {
    /// Exported fields start with an uppercase letter.
    pub fn is_exported(&self) -> bool {
        self.var
            .name
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase())
    }
}

/// Interface payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterfaceType {
    /// Embedded interfaces whose method sets are merged in.
    #[serde(default)]
    pub embeds: Vec<TypeId>,
    #[serde(default)]
    pub methods: Vec<InterfaceMethod>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceMethod {
    pub name: String,
    #[serde(flatten)]
    pub signature: Signature,
}

/// Parameter and result lists of a function or method.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<Variable>,
    #[serde(default)]
    pub results: Vec<Variable>,
}

/// Alias payload. Any link may be missing; the resolver walks the links in
/// declaration order and falls back to the next one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AliasType {
    #[serde(default)]
    pub target: Option<TypeId>,
    #[serde(default)]
    pub underlying: Option<TypeId>,
    #[serde(default)]
    pub underlying_kind: Option<KindTag>,
    /// Source spelling of the base type, e.g. `int64` or `[]byte`.
    #[serde(default)]
    pub raw_kind: Option<String>,
}

/// Coarse kind label reported for alias bases whose type node is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindTag {
    Scalar(Scalar),
    Struct,
    Interface,
    Array,
    Slice,
    Map,
    Channel,
    Function,
    Any,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArrayType {
    pub elem: TypeId,
    /// Fixed length; `None` for slices.
    #[serde(default)]
    pub len: Option<usize>,
    #[serde(default)]
    pub elem_pointers: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapType {
    pub key: TypeId,
    pub value: TypeId,
    #[serde(default)]
    pub value_pointers: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelType {
    pub elem: TypeId,
}

/// A type's declared ability to control its own wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    MarshalJson,
    UnmarshalJson,
    MarshalText,
    UnmarshalText,
}

impl Capability {
    const ALL: [Self; 4] = [
        Self::MarshalJson,
        Self::UnmarshalJson,
        Self::MarshalText,
        Self::UnmarshalText,
    ];

    pub const fn flag(self) -> Capabilities {
        match self {
            Self::MarshalJson => Capabilities::MARSHAL_JSON,
            Self::UnmarshalJson => Capabilities::UNMARSHAL_JSON,
            Self::MarshalText => Capabilities::MARSHAL_TEXT,
            Self::UnmarshalText => Capabilities::UNMARSHAL_TEXT,
        }
    }
}

bitflags! {
    /// Closed set of [`Capability`] flags, attached at IR construction time.
    ///
    /// Serialized as the list of capability names.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    #[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
    pub struct Capabilities: u8 {
        const MARSHAL_JSON = 1;
        const UNMARSHAL_JSON = 1 << 1;
        const MARSHAL_TEXT = 1 << 2;
        const UNMARSHAL_TEXT = 1 << 3;

        const MARSHAL = Self::MARSHAL_JSON.bits() | Self::MARSHAL_TEXT.bits();
        const UNMARSHAL = Self::UNMARSHAL_JSON.bits() | Self::UNMARSHAL_TEXT.bits();
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Capability>> for Capabilities {
    fn from(list: Vec<Capability>) -> Self {
        list.into_iter()
            .fold(Self::empty(), |set, capability| set | capability.flag())
    }
}

impl From<Capabilities> for Vec<Capability> {
    fn from(set: Capabilities) -> Self {
        Capability::ALL
            .into_iter()
            .filter(|capability| set.contains(capability.flag()))
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_type_kind_deserializes_tagged_variants() {
        let ty: Type = serde_json::from_str(
            r#"{ "package": "example.com/app", "name": "UserID", "kind": { "scalar": "int64" } }"#,
        )
        .unwrap();
        assert!(matches!(ty.kind, TypeKind::Scalar(Scalar::Int64)));
        assert_eq!(ty.qualified_key().as_deref(), Some("example.com/app.UserID"));

        let any: Type = serde_json::from_str(r#"{ "kind": "any" }"#).unwrap();
        assert!(matches!(any.kind, TypeKind::Any));
        assert!(!any.is_named());
    }

    #[test]
    fn test_builtin_scalars_are_not_named() {
        let ty: Type =
            serde_json::from_str(r#"{ "name": "int64", "kind": { "scalar": "int64" } }"#).unwrap();
        assert!(ty.identity().is_none());
    }

    #[test]
    fn test_capabilities_round_through_flag_set() {
        let ty: Type = serde_json::from_str(
            r#"{ "kind": "any", "capabilities": ["unmarshal_json", "marshal_json"] }"#,
        )
        .unwrap();
        assert_eq!(
            ty.capabilities,
            Capabilities::MARSHAL_JSON | Capabilities::UNMARSHAL_JSON
        );
        assert!(!ty.capabilities.contains(Capabilities::MARSHAL_TEXT));
        let listed: Vec<Capability> = ty.capabilities.into();
        assert_eq!(
            listed,
            vec![Capability::MarshalJson, Capability::UnmarshalJson]
        );
    }

    #[test]
    fn test_scalar_builtin_aliases() {
        assert_eq!(Scalar::from_builtin_name("byte"), Some(Scalar::Uint8));
        assert_eq!(Scalar::from_builtin_name("rune"), Some(Scalar::Int32));
        assert_eq!(Scalar::from_builtin_name("Time"), None);
        assert!(Scalar::Uintptr.is_integer());
        assert!(Scalar::Float32.is_float());
    }

    #[test]
    fn test_struct_field_flattens_variable() {
        let field: StructField = serde_json::from_str(
            r#"{ "name": "Children", "type": "example.com/app.Tree", "slice": true, "elem_pointers": 1, "tags": "json:\"children\"" }"#,
        )
        .unwrap();
        assert!(field.var.slice);
        assert_eq!(field.var.elem_pointers, 1);
        assert!(field.is_exported());
        assert_eq!(field.tags, "json:\"children\"");
    }
}
