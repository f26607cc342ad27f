//! Type resolution.
//!
//! [`Resolver::resolve`] turns one type reference plus a pointer depth into a
//! [`Descriptor`]. The first matching rule wins:
//!
//! 1. a type missing from the project falls back to a builtin guess;
//! 2. a type that controls its own wire format in the current [`Direction`]
//!    is opaque, registered under its name;
//! 3. a well-known runtime type is replaced from the substitution table;
//! 4. otherwise the type's kind decides (see `structural`).
//!
//! Call-site containers are handled by [`Resolver::resolve_variable`].
//! Named types are registered in the context's registry and referenced by
//! name, never inlined.

mod context;
mod structural;

pub use context::{Direction, ResolverContext};

use tracing::{debug, warn};

use crate::config::GeneratorConfig;
use crate::descriptor::{Builtin, Descriptor, QualifiedName};
use crate::ir::{Project, Scalar, Type, TypeId, TypeKind, Variable};
use crate::substitution::SubstitutionTable;

#[derive(Debug)]
pub struct Resolver<'p> {
    project: &'p Project,
    substitutions: SubstitutionTable,
    tag_key: String,
}

impl<'p> Resolver<'p> {
    pub fn new(project: &'p Project, config: &GeneratorConfig) -> Self {
        Self {
            project,
            substitutions: config.substitution_table(),
            tag_key: config.tag_key.clone(),
        }
    }

    pub fn project(&self) -> &'p Project {
        self.project
    }

    pub fn substitutions(&self) -> &SubstitutionTable {
        &self.substitutions
    }

    /// Resolve `id` behind `pointers` levels of indirection.
    pub fn resolve(&self, id: &TypeId, pointers: u8, ctx: &mut ResolverContext<'_>) -> Descriptor {
        self.resolve_type(id, ctx).with_pointers(pointers)
    }

    /// Resolve a method argument, result or struct field with its call-site
    /// modifiers.
    pub fn resolve_variable(&self, var: &Variable, ctx: &mut ResolverContext<'_>) -> Descriptor {
        if var.is_sequence() {
            if var.array_len.is_none()
                && var.elem_pointers == 0
                && !var.is_map()
                && self.is_byte(&var.type_id)
            {
                return Descriptor::builtin(Builtin::Bytes).with_pointers(var.pointers);
            }
            let elem = self.resolve_variable(&var.element(), ctx);
            return Descriptor::array(elem).with_pointers(var.pointers);
        }

        if let (Some(key), Some(value)) = (&var.map_key, &var.map_value) {
            let named_map = self
                .project
                .get(&var.type_id)
                .is_some_and(|ty| ty.is_named() && matches!(ty.kind, TypeKind::Map(_)));
            if named_map {
                return self.resolve(&var.type_id, var.pointers, ctx);
            }
            let key = self.resolve(key, 0, ctx);
            let value = self.resolve(value, var.elem_pointers, ctx);
            return Descriptor::map(key, value).with_pointers(var.pointers);
        }

        self.resolve(&var.type_id, var.pointers, ctx)
    }

    fn resolve_type(&self, id: &TypeId, ctx: &mut ResolverContext<'_>) -> Descriptor {
        let Some(ty) = self.project.get(id) else {
            debug!(type_id = %id, "type missing from project, guessing from its id");
            return self.guess(id.as_str());
        };

        let substitute = ty
            .qualified_key()
            .and_then(|key| self.substitutions.get(&key).copied());

        if substitute.is_none() && ctx.direction().is_overridden_by(ty.capabilities) {
            debug!(
                type_id = %id,
                direction = ?ctx.direction(),
                "type controls its own wire format, resolving to opaque"
            );
            return match qualified_name(ty) {
                Some(name) => structural::define_opaque(id, ty, name, ctx),
                None => Descriptor::opaque(),
            };
        }

        if let Some(substitute) = substitute {
            return substitute.descriptor();
        }

        // Named types guard themselves in `define`; anonymous nodes have no
        // name to refer back to.
        if ty.is_named() {
            return self.resolve_kind(id, ty, ctx);
        }
        if ctx.is_processing(id) {
            debug!(type_id = %id, "cycle through an anonymous type, resolving to opaque");
            return Descriptor::opaque();
        }
        ctx.enter(id);
        let descriptor = self.resolve_kind(id, ty, ctx);
        ctx.leave(id);
        descriptor
    }

    /// Builtin guess for a type known only by its spelling.
    fn guess(&self, raw: &str) -> Descriptor {
        let raw = raw.trim();
        if let Some(scalar) = Scalar::from_builtin_name(raw) {
            return scalar_descriptor(scalar).unwrap_or_else(Descriptor::opaque);
        }
        match raw {
            "[]byte" | "[]uint8" => return Descriptor::builtin(Builtin::Bytes),
            "any" | "interface{}" | "interface {}" => return Descriptor::opaque(),
            _ => {}
        }
        if let Some(inner) = raw.strip_prefix('*') {
            return self.guess(inner).with_pointers(1);
        }
        if let Some(elem) = raw.strip_prefix("[]") {
            return Descriptor::array(self.guess(elem));
        }
        if let Some((key, value)) = split_map(raw) {
            return Descriptor::map(self.guess(key), self.guess(value));
        }
        if let Some(substitute) = self.substitutions.get(raw) {
            return substitute.descriptor();
        }
        warn!(type_id = raw, "unresolvable type, falling back to opaque");
        Descriptor::opaque()
    }

    /// An unnamed `uint8`, present in the project or spelled as a builtin.
    fn is_byte(&self, id: &TypeId) -> bool {
        match self.project.get(id) {
            Some(ty) => !ty.is_named() && matches!(ty.kind, TypeKind::Scalar(Scalar::Uint8)),
            None => Scalar::from_builtin_name(id.as_str()) == Some(Scalar::Uint8),
        }
    }
}

fn qualified_name(ty: &Type) -> Option<QualifiedName> {
    ty.identity()
        .map(|(package, name)| QualifiedName::new(package, name))
}

/// Builtin target of a scalar; complex numbers have none.
fn scalar_descriptor(scalar: Scalar) -> Option<Descriptor> {
    let builtin = match scalar {
        Scalar::Bool => Builtin::Boolean,
        Scalar::String => Builtin::String,
        s if s.is_integer() => Builtin::Integer,
        s if s.is_float() => Builtin::Number,
        _ => return None,
    };
    Some(Descriptor::builtin(builtin))
}

/// Split `map[K]V` into `K` and `V`, honoring nested brackets in the key.
fn split_map(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("map[")?;
    let mut depth = 1usize;
    for (i, c) in rest.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&rest[..i], &rest[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}
