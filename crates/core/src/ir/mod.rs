//! Intermediate representation consumed by the engine.
//!
//! The IR is produced upstream by a project compiler and arrives as JSON:
//! - `types`: type graph nodes ([`Type`], [`TypeKind`], [`Capabilities`])
//! - `project`: contracts, methods and call-site variables ([`Project`])
//!
//! The engine never mutates the IR; everything it derives lives in
//! descriptors and the definition registry.

mod project;
mod types;

pub use project::{Annotations, Contract, Method, Project, Variable};
pub use types::{
    AliasType, ArrayType, Capabilities, Capability, ChannelType, InterfaceMethod, InterfaceType,
    KindTag, MapType, Scalar, Signature, StructField, StructType, Type, TypeId, TypeKind,
};
