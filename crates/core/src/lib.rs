//! Type-resolution core of a multi-target API client generator.
//!
//! Given a project IR (contracts, methods and the full type graph they
//! reference), the engine decides what every referenced type becomes in
//! generated code:
//!
//! - [`reachability`]: the minimal set of named types a contract needs
//! - [`resolve`]: one type reference plus call-site modifiers to a
//!   [`Descriptor`]
//! - [`registry`]: named definitions, merged during a pass and consumed once
//! - [`arity`]: pointer-arity glue between call sites and wire fields
//! - [`render`]: a preview of the result
//!
//! [`pipeline::generate`] runs all of it over a project.

#![forbid(unsafe_code)]
#![deny(unused_must_use, missing_debug_implementations)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

pub mod arity;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod ir;
pub mod pipeline;
pub mod reachability;
pub mod registry;
pub mod render;
pub mod resolve;
pub mod substitution;
pub mod tags;
pub mod utils;

pub use config::{CollectPolicy, GeneratorConfig};
pub use descriptor::{Builtin, Descriptor, Native, Property, QualifiedName, Shape};
pub use error::{Error, Result};
pub use ir::{Project, TypeId};
pub use pipeline::{ContractOutput, Generation, Generator, MethodOutput, generate};
pub use reachability::Collector;
pub use registry::{Definition, DefinitionBody, Definitions, Registry};
pub use render::{Render, Scope};
pub use resolve::{Direction, Resolver, ResolverContext};
