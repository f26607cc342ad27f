//! Resolved type descriptors.
//!
//! A [`Descriptor`] is the engine's target-neutral answer for one
//! (TypeID, call-site modifiers) pair:
//! - [`Shape`]: builtins, native substitutes, containers, named references
//! - [`Property`]: a resolved struct field as it appears on the wire
//! - [`QualifiedName`]: the `(namespace, name)` key of a registry entry
//!
//! Descriptors are request-scoped values. Named types are never inlined into
//! them; they appear as [`Shape::Named`] and live in the registry.

use std::fmt;

use serde::Serialize;

/// Canonical `(namespace, name)` key of a named definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct QualifiedName {
    pub namespace: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// Target types every backend provides natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Builtin {
    Boolean,
    Integer,
    Number,
    String,
    /// Byte sequences, carried as base64 text on the wire.
    Bytes,
}

/// Host-native equivalents of well-known runtime types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Native {
    Date,
    Duration,
    Uuid,
    Decimal,
    BigInt,
}

/// Structure of a resolved type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum Shape {
    Builtin(Builtin),
    Native(Native),
    /// Wire format unknown to the engine. `alias` names the registry entry
    /// the opaque type was registered under, if any.
    Opaque { alias: Option<QualifiedName> },
    Array(Box<Descriptor>),
    Map {
        key: Box<Descriptor>,
        value: Box<Descriptor>,
    },
    /// Reference to a registry entry.
    Named(QualifiedName),
    /// Anonymous struct, inlined at the use site.
    Object(Vec<Property>),
    /// Anonymous interface, inlined at the use site.
    Interface(Vec<MethodShape>),
    Function(FunctionShape),
}

/// Resolved type descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Descriptor {
    pub shape: Shape,
    /// The value may be absent (pointer, or inherently optional).
    pub nullable: bool,
}

impl Descriptor {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            nullable: false,
        }
    }

    pub fn builtin(builtin: Builtin) -> Self {
        Self::new(Shape::Builtin(builtin))
    }

    pub fn native(native: Native) -> Self {
        Self::new(Shape::Native(native))
    }

    /// Opaque values are always nullable.
    pub fn opaque() -> Self {
        Self {
            shape: Shape::Opaque { alias: None },
            nullable: true,
        }
    }

    pub fn opaque_alias(name: QualifiedName) -> Self {
        Self {
            shape: Shape::Opaque { alias: Some(name) },
            nullable: true,
        }
    }

    pub fn named(name: QualifiedName) -> Self {
        Self::new(Shape::Named(name))
    }

    pub fn array(elem: Self) -> Self {
        Self::new(Shape::Array(Box::new(elem)))
    }

    pub fn map(key: Self, value: Self) -> Self {
        Self::new(Shape::Map {
            key: Box::new(key),
            value: Box::new(value),
        })
    }

    pub fn object(properties: Vec<Property>) -> Self {
        Self::new(Shape::Object(properties))
    }

    /// Mark the value as possibly absent when `pointers > 0`.
    pub fn with_pointers(mut self, pointers: u8) -> Self {
        if pointers > 0 {
            self.nullable = true;
        }
        self
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self.shape, Shape::Opaque { .. })
    }

    /// The registry entry this descriptor points at directly, if any.
    pub fn named_ref(&self) -> Option<&QualifiedName> {
        match &self.shape {
            Shape::Named(name) => Some(name),
            Shape::Opaque { alias } => alias.as_ref(),
            _ => None,
        }
    }

    /// Every registry entry referenced anywhere inside this descriptor.
    pub fn references(&self) -> Vec<&QualifiedName> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'d>(&'d self, out: &mut Vec<&'d QualifiedName>) {
        match &self.shape {
            Shape::Builtin(_) | Shape::Native(_) => {}
            Shape::Opaque { alias } => out.extend(alias.iter()),
            Shape::Named(name) => out.push(name),
            Shape::Array(elem) => elem.collect_references(out),
            Shape::Map { key, value } => {
                key.collect_references(out);
                value.collect_references(out);
            }
            Shape::Object(properties) => {
                for property in properties {
                    property.ty.collect_references(out);
                }
            }
            Shape::Interface(methods) => {
                for method in methods {
                    method.signature.collect_references(out);
                }
            }
            Shape::Function(signature) => signature.collect_references(out),
        }
    }
}

/// A resolved struct field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    /// Public (wire) name.
    pub name: String,
    /// Declared field name in the source type.
    pub field: String,
    pub ty: Descriptor,
    /// The key may be omitted from the payload.
    pub optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// Named parameter or result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: Descriptor,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionShape {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
}

impl FunctionShape {
    fn collect_references<'d>(&'d self, out: &mut Vec<&'d QualifiedName>) {
        for param in self.params.iter().chain(&self.results) {
            param.ty.collect_references(out);
        }
    }
}

/// One method of a resolved interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodShape {
    pub name: String,
    #[serde(flatten)]
    pub signature: FunctionShape,
}
