//! Kind-driven resolution: one function per [`TypeKind`] variant.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::{Resolver, ResolverContext, qualified_name, scalar_descriptor};
use crate::arity::Slot;
use crate::descriptor::{
    Builtin, Descriptor, FunctionShape, MethodShape, Param, Property, QualifiedName, Shape,
};
use crate::ir::{
    AliasType, ArrayType, InterfaceType, KindTag, MapType, Signature, StructField, StructType,
    Type, TypeId, TypeKind, Variable,
};
use crate::registry::{Definition, DefinitionBody, Registry};
use crate::tags::{FieldRole, WireField, field_role};

impl Resolver<'_> {
    pub(super) fn resolve_kind(
        &self,
        id: &TypeId,
        ty: &Type,
        ctx: &mut ResolverContext<'_>,
    ) -> Descriptor {
        let name = qualified_name(ty);
        match &ty.kind {
            TypeKind::Scalar(scalar) => match scalar_descriptor(*scalar) {
                Some(base) => self.aliased(id, ty, name, ctx, |_, _| base),
                None => opaque_or_named(id, ty, name, ctx),
            },
            TypeKind::Struct(st) => match name {
                Some(name) => self.define(id, ty, name, ctx, |this, ctx| {
                    DefinitionBody::Struct {
                        properties: this.properties(st, ctx),
                    }
                }),
                None => Descriptor::object(self.properties(st, ctx)),
            },
            TypeKind::Alias(alias) => {
                self.aliased(id, ty, name, ctx, |this, ctx| this.alias_base(id, alias, ctx))
            }
            TypeKind::Interface(iface) => match name {
                Some(name) => self.define(id, ty, name, ctx, |this, ctx| {
                    DefinitionBody::Interface {
                        methods: this.method_set(iface, ctx),
                    }
                }),
                None => {
                    let methods = self.method_set(iface, ctx);
                    if methods.is_empty() {
                        Descriptor::opaque()
                    } else {
                        Descriptor::new(Shape::Interface(methods))
                    }
                }
            },
            TypeKind::Array(array) => {
                self.aliased(id, ty, name, ctx, |this, ctx| this.array_shape(array, ctx))
            }
            TypeKind::Map(map) => {
                self.aliased(id, ty, name, ctx, |this, ctx| this.map_shape(map, ctx))
            }
            TypeKind::Function(signature) => self.aliased(id, ty, name, ctx, |this, ctx| {
                Descriptor::new(Shape::Function(this.signature(signature, ctx)))
            }),
            TypeKind::Channel(_) | TypeKind::Any => opaque_or_named(id, ty, name, ctx),
        }
    }

    /// Named types become `Name = shape` indirections; anonymous ones are the
    /// shape itself.
    fn aliased<F>(
        &self,
        id: &TypeId,
        ty: &Type,
        name: Option<QualifiedName>,
        ctx: &mut ResolverContext<'_>,
        shape: F,
    ) -> Descriptor
    where
        F: FnOnce(&Self, &mut ResolverContext<'_>) -> Descriptor,
    {
        match name {
            Some(name) => self.define(id, ty, name, ctx, |this, ctx| DefinitionBody::Alias {
                target: shape(this, ctx),
            }),
            None => shape(self, ctx),
        }
    }

    /// Expand a named type once per direction and return a reference to it.
    fn define<F>(
        &self,
        id: &TypeId,
        ty: &Type,
        name: QualifiedName,
        ctx: &mut ResolverContext<'_>,
        expand: F,
    ) -> Descriptor
    where
        F: FnOnce(&Self, &mut ResolverContext<'_>) -> DefinitionBody,
    {
        if ctx.is_processing(id) {
            debug!(type_id = %id, name = %name, "cycle detected, referencing by name");
            if let Some(stub) = stub_body(&ty.kind) {
                let stub = Definition::new(name.clone(), id.clone(), stub).with_doc(ty.doc.clone());
                ctx.registry_mut().merge(stub);
            }
            return ctx.reference(name);
        }
        if ctx.registry().is_expanded(id, ctx.direction()) {
            return ctx.reference(name);
        }

        ctx.enter(id);
        let body = ctx.within(&name.namespace, |ctx| expand(self, ctx));
        ctx.leave(id);

        let direction = ctx.direction();
        let registry = ctx.registry_mut();
        registry.merge(Definition::new(name.clone(), id.clone(), body).with_doc(ty.doc.clone()));
        registry.mark_expanded(id.clone(), direction);
        ctx.reference(name)
    }

    fn properties(&self, st: &StructType, ctx: &mut ResolverContext<'_>) -> Vec<Property> {
        let mut entries: Vec<(Property, bool)> = Vec::new();
        for field in &st.fields {
            match field_role(field, &self.tag_key) {
                FieldRole::Skip => {}
                FieldRole::Property(wire) => entries.push((self.property(field, wire, ctx), false)),
                FieldRole::Splice { fallback } => match self.promoted(field, ctx) {
                    Some(promoted) => entries.extend(promoted.into_iter().map(|p| (p, true))),
                    None if field.is_exported() => {
                        entries.push((self.property(field, fallback, ctx), false));
                    }
                    None => {
                        debug!(field = %field.var.name, "unexported embedded field has no struct body, skipping");
                    }
                },
            }
        }

        // Own fields shadow promoted ones; otherwise the first occurrence wins.
        let own: HashSet<String> = entries
            .iter()
            .filter(|(_, promoted)| !promoted)
            .map(|(p, _)| p.name.clone())
            .collect();
        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter(|(p, promoted)| !(*promoted && own.contains(&p.name)))
            .filter_map(|(p, _)| seen.insert(p.name.clone()).then_some(p))
            .collect()
    }

    fn property(
        &self,
        field: &StructField,
        wire: WireField,
        ctx: &mut ResolverContext<'_>,
    ) -> Property {
        let mut ty = self.resolve_variable(&field.var, ctx);
        if wire.as_string {
            ty = string_encoded(ty, ctx.registry());
        }
        Property {
            name: wire.name,
            field: field.var.name.clone(),
            ty,
            optional: wire.omit_empty,
            doc: field.doc.clone(),
        }
    }

    /// Properties of an embedded struct, promoted into the parent.
    fn promoted(&self, field: &StructField, ctx: &mut ResolverContext<'_>) -> Option<Vec<Property>> {
        if field.var.is_sequence() || field.var.is_map() {
            return None;
        }
        let resolved = self.resolve(&field.var.type_id, 0, ctx);
        let properties = match &resolved.shape {
            Shape::Object(properties) => properties.clone(),
            Shape::Named(name) => struct_body(ctx.registry(), name)?.to_vec(),
            _ => return None,
        };
        let through_pointer = field.var.pointers > 0;
        Some(
            properties
                .into_iter()
                .map(|p| Property {
                    optional: p.optional || through_pointer,
                    ..p
                })
                .collect(),
        )
    }

    /// Base of an alias: target, then underlying id, then the reported kind,
    /// then the raw spelling.
    fn alias_base(&self, id: &TypeId, alias: &AliasType, ctx: &mut ResolverContext<'_>) -> Descriptor {
        for link in [&alias.target, &alias.underlying].into_iter().flatten() {
            if link != id && self.project.get(link).is_some() {
                return self.resolve(link, 0, ctx);
            }
        }
        if let Some(kind) = alias.underlying_kind {
            return kind_descriptor(kind);
        }
        if let Some(raw) = &alias.raw_kind {
            return self.guess(raw);
        }
        match alias.target.as_ref().or(alias.underlying.as_ref()) {
            Some(link) if link != id => self.guess(link.as_str()),
            _ => {
                debug!(type_id = %id, "alias has no usable base, resolving to opaque");
                Descriptor::opaque()
            }
        }
    }

    /// Declared methods plus those of embedded interfaces, sorted by name.
    fn method_set(&self, iface: &InterfaceType, ctx: &mut ResolverContext<'_>) -> Vec<MethodShape> {
        let mut methods = BTreeMap::new();
        for method in &iface.methods {
            let signature = self.signature(&method.signature, ctx);
            methods.insert(
                method.name.clone(),
                MethodShape {
                    name: method.name.clone(),
                    signature,
                },
            );
        }
        for embed in &iface.embeds {
            for method in self.embedded_methods(embed, ctx) {
                methods.entry(method.name.clone()).or_insert(method);
            }
        }
        methods.into_values().collect()
    }

    fn embedded_methods(&self, embed: &TypeId, ctx: &mut ResolverContext<'_>) -> Vec<MethodShape> {
        let resolved = self.resolve(embed, 0, ctx);
        match resolved.shape {
            Shape::Interface(methods) => methods,
            Shape::Named(name) => match ctx.registry().get(&name).map(|d| &d.body) {
                Some(DefinitionBody::Interface { methods }) => methods.clone(),
                _ => Vec::new(),
            },
            _ => {
                debug!(type_id = %embed, "embedded type is not an interface, ignoring");
                Vec::new()
            }
        }
    }

    fn signature(&self, signature: &Signature, ctx: &mut ResolverContext<'_>) -> FunctionShape {
        let params = self.params(Slot::Request, &signature.params, ctx);
        let results = self.params(Slot::Response, &signature.results, ctx);
        FunctionShape { params, results }
    }

    fn params(&self, slot: Slot, vars: &[Variable], ctx: &mut ResolverContext<'_>) -> Vec<Param> {
        vars.iter()
            .enumerate()
            .map(|(i, var)| Param {
                name: if var.name.is_empty() {
                    slot.positional_name(i)
                } else {
                    var.name.clone()
                },
                ty: self.resolve_variable(var, ctx),
            })
            .collect()
    }

    fn array_shape(&self, array: &ArrayType, ctx: &mut ResolverContext<'_>) -> Descriptor {
        if array.len.is_none() && array.elem_pointers == 0 && self.is_byte(&array.elem) {
            return Descriptor::builtin(Builtin::Bytes);
        }
        Descriptor::array(self.resolve(&array.elem, array.elem_pointers, ctx))
    }

    fn map_shape(&self, map: &MapType, ctx: &mut ResolverContext<'_>) -> Descriptor {
        let key = self.resolve(&map.key, 0, ctx);
        let value = self.resolve(&map.value, map.value_pointers, ctx);
        Descriptor::map(key, value)
    }
}

/// Register an opaque type under its name so others can refer to it.
pub(super) fn define_opaque(
    id: &TypeId,
    ty: &Type,
    name: QualifiedName,
    ctx: &mut ResolverContext<'_>,
) -> Descriptor {
    let definition = Definition::new(
        name.clone(),
        id.clone(),
        DefinitionBody::Alias {
            target: Descriptor::opaque(),
        },
    )
    .with_doc(ty.doc.clone());
    ctx.registry_mut().merge(definition);
    ctx.opaque_reference(name)
}

fn opaque_or_named(
    id: &TypeId,
    ty: &Type,
    name: Option<QualifiedName>,
    ctx: &mut ResolverContext<'_>,
) -> Descriptor {
    match name {
        Some(name) => define_opaque(id, ty, name, ctx),
        None => Descriptor::opaque(),
    }
}

/// Placeholder registered when a cycle reaches a type still being expanded.
fn stub_body(kind: &TypeKind) -> Option<DefinitionBody> {
    match kind {
        TypeKind::Struct(_) => Some(DefinitionBody::Struct {
            properties: Vec::new(),
        }),
        TypeKind::Interface(_) => Some(DefinitionBody::Interface {
            methods: Vec::new(),
        }),
        _ => None,
    }
}

/// Struct properties behind `name`, following named aliases.
fn struct_body<'r>(registry: &'r Registry, name: &QualifiedName) -> Option<&'r [Property]> {
    let mut seen = HashSet::new();
    let mut current = name;
    loop {
        if !seen.insert(current) {
            return None;
        }
        match &registry.get(current)?.body {
            DefinitionBody::Struct { properties } => return Some(properties),
            DefinitionBody::Alias { target } => match &target.shape {
                Shape::Named(next) => current = next,
                _ => return None,
            },
            DefinitionBody::Interface { .. } => return None,
        }
    }
}

/// Apply the `string` tag option: integers, numbers and booleans travel as
/// strings.
fn string_encoded(ty: Descriptor, registry: &Registry) -> Descriptor {
    let quotable = |d: &Descriptor| {
        matches!(
            d.shape,
            Shape::Builtin(Builtin::Integer | Builtin::Number | Builtin::Boolean)
        )
    };
    let quoted = match &ty.shape {
        Shape::Named(name) => matches!(
            registry.get(name).map(|d| &d.body),
            Some(DefinitionBody::Alias { target }) if quotable(target)
        ),
        _ => quotable(&ty),
    };
    if quoted {
        Descriptor {
            shape: Shape::Builtin(Builtin::String),
            nullable: ty.nullable,
        }
    } else {
        ty
    }
}

/// Best descriptor for an alias base known only by its kind.
fn kind_descriptor(kind: KindTag) -> Descriptor {
    match kind {
        KindTag::Scalar(scalar) => scalar_descriptor(scalar).unwrap_or_else(Descriptor::opaque),
        KindTag::Array | KindTag::Slice => Descriptor::array(Descriptor::opaque()),
        KindTag::Map => Descriptor::map(Descriptor::builtin(Builtin::String), Descriptor::opaque()),
        KindTag::Struct
        | KindTag::Interface
        | KindTag::Channel
        | KindTag::Function
        | KindTag::Any => Descriptor::opaque(),
    }
}
