//! Definition registry: one entry per named type, merged during a pass and
//! consumed once at the end of it.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::descriptor::{Descriptor, MethodShape, Property, QualifiedName, Shape};
use crate::ir::TypeId;
use crate::resolve::Direction;
use crate::utils::sanitize_identifier;

/// Body of a named definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DefinitionBody {
    Struct { properties: Vec<Property> },
    /// Named indirection `Name = target`.
    Alias { target: Descriptor },
    Interface { methods: Vec<MethodShape> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Definition {
    pub name: QualifiedName,
    pub type_id: TypeId,
    pub body: DefinitionBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Definition {
    pub fn new(name: QualifiedName, type_id: TypeId, body: DefinitionBody) -> Self {
        Self {
            name,
            type_id,
            body,
            doc: None,
        }
    }

    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    /// How much of the type's body is known.
    pub fn completeness(&self) -> usize {
        match &self.body {
            DefinitionBody::Struct { properties } => properties.len(),
            DefinitionBody::Interface { methods } => methods.len(),
            DefinitionBody::Alias { target } => usize::from(!target.is_opaque()),
        }
    }

    /// `Name = opaque`: the type's wire format is not derived from its body.
    pub fn is_opaque(&self) -> bool {
        matches!(
            &self.body,
            DefinitionBody::Alias { target } if matches!(target.shape, Shape::Opaque { alias: None })
        )
    }

    /// Namespaces referenced from the body, other than the definition's own.
    pub fn foreign_namespaces(&self) -> BTreeSet<&str> {
        let descriptors: Vec<&Descriptor> = match &self.body {
            DefinitionBody::Struct { properties } => properties.iter().map(|p| &p.ty).collect(),
            DefinitionBody::Alias { target } => vec![target],
            DefinitionBody::Interface { methods } => methods
                .iter()
                .flat_map(|m| m.signature.params.iter().chain(&m.signature.results))
                .map(|p| &p.ty)
                .collect(),
        };
        descriptors
            .into_iter()
            .flat_map(Descriptor::references)
            .map(|q| q.namespace.as_str())
            .filter(|ns| *ns != self.name.namespace)
            .collect()
    }
}

/// Result of [`Registry::merge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    /// The new body was strictly more complete.
    Replaced,
    Kept,
}

/// Mutable table of named definitions for one generation pass.
#[derive(Debug, Default)]
pub struct Registry {
    definitions: BTreeMap<QualifiedName, Definition>,
    by_type: HashMap<TypeId, QualifiedName>,
    expanded: HashSet<(TypeId, Direction)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert on first sight; afterwards replace only with a strictly more
    /// complete body. An opaque entry always wins: once a type is opaque in
    /// one direction its body is never exposed.
    pub fn merge(&mut self, definition: Definition) -> MergeOutcome {
        let name = definition.name.clone();
        match self.definitions.get_mut(&name) {
            None => {
                debug!(name = %name, "registering definition");
                self.by_type
                    .insert(definition.type_id.clone(), name.clone());
                self.definitions.insert(name, definition);
                MergeOutcome::Inserted
            }
            Some(existing) if existing.is_opaque() => MergeOutcome::Kept,
            Some(existing) if definition.is_opaque() => {
                debug!(name = %name, "definition overridden by an opaque wire format");
                *existing = definition;
                MergeOutcome::Replaced
            }
            Some(existing) if definition.completeness() > existing.completeness() => {
                debug!(
                    name = %name,
                    before = existing.completeness(),
                    after = definition.completeness(),
                    "replacing definition with a more complete one"
                );
                *existing = definition;
                MergeOutcome::Replaced
            }
            Some(_) => MergeOutcome::Kept,
        }
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&Definition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.definitions.contains_key(name)
    }

    /// Whether some entry was registered for the type `id`.
    pub fn contains_type(&self, id: &TypeId) -> bool {
        self.by_type.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub(crate) fn mark_expanded(&mut self, id: TypeId, direction: Direction) {
        self.expanded.insert((id, direction));
    }

    pub(crate) fn is_expanded(&self, id: &TypeId, direction: Direction) -> bool {
        self.expanded.contains(&(id.clone(), direction))
    }

    /// Close the pass. The returned [`Definitions`] are read-only.
    pub fn finalize(self) -> Definitions {
        let definitions: Vec<Definition> = self.definitions.into_values().collect();

        let mut imports: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for definition in &definitions {
            let entry = imports
                .entry(definition.name.namespace.clone())
                .or_default();
            entry.extend(definition.foreign_namespaces().into_iter().map(String::from));
        }

        let aliases = NamespaceAliases::assign(
            definitions
                .iter()
                .map(|d| d.name.namespace.as_str())
                .chain(imports.values().flatten().map(String::as_str)),
        );

        Definitions {
            definitions,
            imports,
            aliases,
        }
    }
}

/// Finalized definitions of one pass, sorted by qualified name.
#[derive(Debug, Clone, Serialize)]
pub struct Definitions {
    definitions: Vec<Definition>,
    imports: BTreeMap<String, BTreeSet<String>>,
    aliases: NamespaceAliases,
}

impl Definitions {
    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.iter()
    }

    pub fn get(&self, name: &QualifiedName) -> Option<&Definition> {
        self.definitions
            .binary_search_by(|d| d.name.cmp(name))
            .ok()
            .map(|i| &self.definitions[i])
    }

    /// Definitions owned by `namespace`.
    pub fn in_namespace<'d>(&'d self, namespace: &'d str) -> impl Iterator<Item = &'d Definition> {
        self.definitions
            .iter()
            .filter(move |d| d.name.namespace == namespace)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.imports.keys().map(String::as_str)
    }

    /// Namespaces the definitions of `namespace` refer to.
    pub fn imports_of(&self, namespace: &str) -> Option<&BTreeSet<String>> {
        self.imports.get(namespace)
    }

    pub fn aliases(&self) -> &NamespaceAliases {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Unique identifier per namespace, used to qualify foreign names.
///
/// The alias is the last path segment; colliding namespaces are widened with
/// preceding segments (`a/models`, `b/models` -> `a_models`, `b_models`) and
/// numbered only when the full path still collides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NamespaceAliases(BTreeMap<String, String>);

impl NamespaceAliases {
    pub fn assign<'a>(namespaces: impl IntoIterator<Item = &'a str>) -> Self {
        let namespaces: BTreeSet<&str> = namespaces.into_iter().collect();
        let mut depth: BTreeMap<&str, usize> = namespaces.iter().map(|ns| (*ns, 1)).collect();

        loop {
            let mut groups: BTreeMap<String, Vec<&str>> = BTreeMap::new();
            for (ns, d) in &depth {
                groups.entry(candidate(ns, *d)).or_default().push(*ns);
            }
            let mut widened = false;
            for members in groups.values().filter(|members| members.len() > 1) {
                for ns in members {
                    if let Some(d) = depth.get_mut(ns) {
                        if *d < segments(ns).len() {
                            *d += 1;
                            widened = true;
                        }
                    }
                }
            }
            if !widened {
                break;
            }
        }

        let mut used = HashSet::new();
        let mut aliases = BTreeMap::new();
        for (ns, d) in depth {
            let base = candidate(ns, d);
            let mut alias = base.clone();
            let mut n = 2;
            while !used.insert(alias.clone()) {
                alias = format!("{base}{n}");
                n += 1;
            }
            aliases.insert(ns.to_string(), alias);
        }
        Self(aliases)
    }

    pub fn get(&self, namespace: &str) -> Option<&str> {
        self.0.get(namespace).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(ns, alias)| (ns.as_str(), alias.as_str()))
    }
}

fn segments(namespace: &str) -> Vec<&str> {
    namespace.split('/').filter(|s| !s.is_empty()).collect()
}

fn candidate(namespace: &str, depth: usize) -> String {
    let segments = segments(namespace);
    let start = segments.len().saturating_sub(depth);
    sanitize_identifier(&segments[start..].join("_"))
}
