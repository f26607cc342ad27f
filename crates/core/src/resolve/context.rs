use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::descriptor::{Descriptor, QualifiedName};
use crate::ir::{Capabilities, TypeId};
use crate::registry::Registry;

/// Whether a value is being serialized or deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Client -> server: method arguments.
    Outbound,
    /// Server -> client: results and errors.
    Inbound,
}

impl Direction {
    /// Capabilities that take over the wire format in this direction.
    pub fn overriding(self) -> Capabilities {
        match self {
            Self::Outbound => Capabilities::MARSHAL,
            Self::Inbound => Capabilities::UNMARSHAL,
        }
    }

    pub fn is_overridden_by(self, capabilities: Capabilities) -> bool {
        capabilities.intersects(self.overriding())
    }
}

/// State threaded through one resolution call chain.
///
/// A context is created per root (one argument, result or error of one
/// method). The cycle guard lives here; definitions go to the borrowed
/// [`Registry`], which outlives the chain.
#[derive(Debug)]
pub struct ResolverContext<'r> {
    namespace: String,
    direction: Direction,
    processing: HashSet<TypeId>,
    registry: &'r mut Registry,
    imports: BTreeSet<String>,
}

impl<'r> ResolverContext<'r> {
    pub fn new(namespace: impl Into<String>, direction: Direction, registry: &'r mut Registry) -> Self {
        Self {
            namespace: namespace.into(),
            direction,
            processing: HashSet::new(),
            registry,
            imports: BTreeSet::new(),
        }
    }

    /// Namespace being generated into.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn registry(&self) -> &Registry {
        &*self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut *self.registry
    }

    /// Foreign namespaces referenced by the root's descriptor.
    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    pub fn into_imports(self) -> BTreeSet<String> {
        self.imports
    }

    /// Named reference, recorded as an import when foreign.
    pub(crate) fn reference(&mut self, name: QualifiedName) -> Descriptor {
        self.note(&name);
        Descriptor::named(name)
    }

    /// Opaque value rendered by its registered name.
    pub(crate) fn opaque_reference(&mut self, name: QualifiedName) -> Descriptor {
        self.note(&name);
        Descriptor::opaque_alias(name)
    }

    fn note(&mut self, name: &QualifiedName) {
        if name.namespace != self.namespace {
            self.imports.insert(name.namespace.clone());
        }
    }

    pub(crate) fn is_processing(&self, id: &TypeId) -> bool {
        self.processing.contains(id)
    }

    pub(crate) fn enter(&mut self, id: &TypeId) {
        self.processing.insert(id.clone());
    }

    pub(crate) fn leave(&mut self, id: &TypeId) {
        self.processing.remove(id);
    }

    /// Run `f` as if generating into `namespace`. References made inside are
    /// part of that namespace's definitions, not of the root descriptor.
    pub(crate) fn within<T>(&mut self, namespace: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        let namespace = std::mem::replace(&mut self.namespace, namespace.to_string());
        let imports = std::mem::take(&mut self.imports);
        let out = f(self);
        self.namespace = namespace;
        self.imports = imports;
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::Capability;

    #[test]
    fn test_direction_picks_matching_capabilities() {
        let marshal = Capabilities::MARSHAL_JSON;
        assert!(Direction::Outbound.is_overridden_by(marshal));
        assert!(!Direction::Inbound.is_overridden_by(marshal));

        let text = Capability::UnmarshalText.flag();
        assert!(Direction::Inbound.is_overridden_by(text));
        assert!(!Direction::Outbound.is_overridden_by(Capabilities::empty()));
    }

    #[test]
    fn test_references_record_foreign_imports_only() {
        let mut registry = Registry::new();
        let mut ctx = ResolverContext::new("example.com/app", Direction::Outbound, &mut registry);
        ctx.reference(QualifiedName::new("example.com/app", "User"));
        ctx.reference(QualifiedName::new("example.com/billing", "Invoice"));
        ctx.within("example.com/billing", |ctx| {
            ctx.reference(QualifiedName::new("example.com/money", "Amount"));
        });
        assert_eq!(
            ctx.into_imports().into_iter().collect::<Vec<_>>(),
            vec!["example.com/billing".to_string()]
        );
    }
}
