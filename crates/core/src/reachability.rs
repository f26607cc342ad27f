//! Reachability: the minimal set of named types a contract needs.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::config::{CollectPolicy, GeneratorConfig};
use crate::ir::{Contract, Method, Project, TypeId, TypeKind, Variable};
use crate::resolve::Direction;
use crate::substitution::SubstitutionTable;

/// A traversal root and the direction its values travel in.
pub type Root = (TypeId, Direction);

#[derive(Debug)]
pub struct Collector<'p> {
    project: &'p Project,
    substitutions: SubstitutionTable,
    policy: CollectPolicy,
    context_types: Vec<TypeId>,
    error_types: Vec<TypeId>,
}

impl<'p> Collector<'p> {
    pub fn new(project: &'p Project, config: &GeneratorConfig) -> Self {
        Self {
            project,
            substitutions: config.substitution_table(),
            policy: config.policy,
            context_types: config.context_types.clone(),
            error_types: config.error_types.clone(),
        }
    }

    pub fn with_policy(mut self, policy: CollectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> CollectPolicy {
        self.policy
    }

    /// Roots of one method: payload arguments travel outbound; payload
    /// results, declared errors and the default error travel inbound.
    pub fn method_roots(&self, method: &Method) -> Vec<Root> {
        let mut roots = Vec::new();
        for var in method.payload_args(&self.context_types) {
            roots.extend(variable_ids(var).map(|id| (id.clone(), Direction::Outbound)));
        }
        for var in method.payload_results(&self.error_types) {
            roots.extend(variable_ids(var).map(|id| (id.clone(), Direction::Inbound)));
        }
        roots.extend(
            method
                .errors
                .iter()
                .chain(&method.annotations.default_error)
                .map(|id| (id.clone(), Direction::Inbound)),
        );
        roots
    }

    pub fn contract_roots(&self, contract: &Contract) -> Vec<Root> {
        contract
            .methods
            .iter()
            .flat_map(|method| self.method_roots(method))
            .collect()
    }

    pub fn collect_contract(&self, contract: &Contract) -> BTreeSet<TypeId> {
        self.collect(self.contract_roots(contract))
    }

    /// Named types reachable from `roots`.
    ///
    /// Missing types are leaves. Substituted types are leaves too, and are
    /// only collected under [`CollectPolicy::Materialize`]. Types that control
    /// their own wire format in the traversal direction are collected but not
    /// descended into.
    pub fn collect(&self, roots: impl IntoIterator<Item = Root>) -> BTreeSet<TypeId> {
        let mut visited: HashSet<Root> = HashSet::new();
        let mut collected = BTreeSet::new();
        let mut stack: Vec<Root> = roots.into_iter().collect();

        while let Some((id, direction)) = stack.pop() {
            if !visited.insert((id.clone(), direction)) {
                continue;
            }

            let Some(ty) = self.project.get(&id) else {
                debug!(type_id = %id, "type missing from project, treating as a leaf");
                continue;
            };

            let substituted = ty
                .qualified_key()
                .is_some_and(|key| self.substitutions.contains(&key));
            if substituted {
                // The replacement stands in for the whole subtree.
                if self.policy == CollectPolicy::Materialize {
                    collected.insert(id.clone());
                }
                continue;
            }
            if ty.is_named() {
                collected.insert(id.clone());
            }
            if direction.is_overridden_by(ty.capabilities) {
                continue;
            }

            let mut push = |child: &TypeId| stack.push((child.clone(), direction));
            match &ty.kind {
                TypeKind::Scalar(_) | TypeKind::Channel(_) | TypeKind::Any => {}
                TypeKind::Array(array) => push(&array.elem),
                TypeKind::Map(map) => {
                    push(&map.key);
                    push(&map.value);
                }
                TypeKind::Alias(alias) => {
                    alias.target.iter().chain(&alias.underlying).for_each(&mut push);
                }
                TypeKind::Struct(st) => {
                    for field in &st.fields {
                        variable_ids(&field.var).for_each(&mut push);
                    }
                }
                TypeKind::Interface(iface) => {
                    iface.embeds.iter().for_each(&mut push);
                    for method in &iface.methods {
                        let signature = &method.signature;
                        for var in signature.params.iter().chain(&signature.results) {
                            variable_ids(var).for_each(&mut push);
                        }
                    }
                }
                TypeKind::Function(signature) => {
                    for var in signature.params.iter().chain(&signature.results) {
                        variable_ids(var).for_each(&mut push);
                    }
                }
            }
        }

        debug!(count = collected.len(), policy = ?self.policy, "collected reachable types");
        collected
    }
}

/// Every type id a variable mentions.
fn variable_ids(var: &Variable) -> impl Iterator<Item = &TypeId> {
    std::iter::once(&var.type_id)
        .chain(&var.map_key)
        .chain(&var.map_value)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const PROJECT: &str = r#"{
        "module": "example.com/app",
        "contracts": [ {
            "name": "Orders",
            "package": "example.com/app",
            "methods": [ {
                "name": "Place",
                "args": [
                    { "name": "ctx", "type": "context.Context" },
                    { "name": "order", "type": "example.com/app.Order", "pointers": 1 }
                ],
                "results": [
                    { "name": "receipt", "type": "example.com/app.Receipt" },
                    { "name": "err", "type": "error" }
                ],
                "errors": ["example.com/app.OrderError"]
            } ]
        } ],
        "types": {
            "context.Context": { "package": "context", "name": "Context", "kind": { "interface": {} } },
            "error": { "name": "error", "kind": { "interface": { "methods": [ { "name": "Error", "results": [ { "type": "string" } ] } ] } } },
            "string": { "name": "string", "kind": { "scalar": "string" } },
            "example.com/app.Order": {
                "package": "example.com/app",
                "name": "Order",
                "kind": { "struct": { "fields": [
                    { "name": "Lines", "type": "example.com/app.Line", "slice": true },
                    { "name": "Tags", "type": "map[string]example.com/app.Tag", "map_key": "string", "map_value": "example.com/app.Tag" },
                    { "name": "PlacedAt", "type": "time.Time" },
                    { "name": "Total", "type": "example.com/app.Money" }
                ] } }
            },
            "example.com/app.Line": {
                "package": "example.com/app",
                "name": "Line",
                "kind": { "struct": { "fields": [ { "name": "SKU", "type": "string" } ] } }
            },
            "example.com/app.Tag": { "package": "example.com/app", "name": "Tag", "kind": { "scalar": "string" } },
            "example.com/app.Money": {
                "package": "example.com/app",
                "name": "Money",
                "kind": { "struct": { "fields": [ { "name": "Cents", "type": "example.com/app.Cents" } ] } },
                "capabilities": ["marshal_json"]
            },
            "example.com/app.Cents": { "package": "example.com/app", "name": "Cents", "kind": { "scalar": "int64" } },
            "example.com/app.Receipt": {
                "package": "example.com/app",
                "name": "Receipt",
                "kind": { "struct": { "fields": [ { "name": "Order", "type": "example.com/app.Order" } ] } }
            },
            "example.com/app.OrderError": {
                "package": "example.com/app",
                "name": "OrderError",
                "kind": { "struct": { "fields": [ { "name": "Code", "type": "string" } ] } }
            },
            "example.com/app.Unused": {
                "package": "example.com/app",
                "name": "Unused",
                "kind": { "struct": {} }
            },
            "time.Time": {
                "package": "time",
                "name": "Time",
                "kind": { "struct": { "fields": [ { "name": "loc", "type": "time.Location", "pointers": 1 } ] } }
            },
            "time.Location": { "package": "time", "name": "Location", "kind": { "struct": {} } }
        }
    }"#;

    fn ids(names: &[&str]) -> BTreeSet<TypeId> {
        names.iter().map(|n| TypeId::from(*n)).collect()
    }

    #[test]
    fn test_collects_minimal_closure() {
        let project = Project::from_json(PROJECT).unwrap();
        let collector = Collector::new(&project, &GeneratorConfig::default());
        let contract = project.contract("Orders").unwrap();
        assert_eq!(
            collector.collect_contract(contract),
            ids(&[
                "example.com/app.Cents",
                "example.com/app.Line",
                "example.com/app.Money",
                "example.com/app.Order",
                "example.com/app.OrderError",
                "example.com/app.Receipt",
                "example.com/app.Tag",
            ])
        );
    }

    #[test]
    fn test_marshaler_stops_only_in_its_direction() {
        let project = Project::from_json(PROJECT).unwrap();
        let collector = Collector::new(&project, &GeneratorConfig::default());
        let money = TypeId::from("example.com/app.Money");

        let outbound = collector.collect([(money.clone(), Direction::Outbound)]);
        assert_eq!(outbound, ids(&["example.com/app.Money"]));

        let inbound = collector.collect([(money, Direction::Inbound)]);
        assert_eq!(
            inbound,
            ids(&["example.com/app.Cents", "example.com/app.Money"])
        );
    }

    #[test]
    fn test_materialize_policy_keeps_substituted_types_as_leaves() {
        let project = Project::from_json(PROJECT).unwrap();
        let config = GeneratorConfig::default().with_policy(CollectPolicy::Materialize);
        let collector = Collector::new(&project, &config);
        let reachable = collector.collect([(TypeId::from("time.Time"), Direction::Inbound)]);
        assert_eq!(reachable, ids(&["time.Time"]));

        let contract = project.contract("Orders").unwrap();
        let reachable = collector.collect_contract(contract);
        assert!(reachable.contains(&TypeId::from("time.Time")));
        assert!(!reachable.contains(&TypeId::from("time.Location")));

        let native = collector.with_policy(CollectPolicy::Native);
        assert!(
            native
                .collect([(TypeId::from("time.Time"), Direction::Inbound)])
                .is_empty()
        );
    }

    #[test]
    fn test_missing_types_are_leaves() {
        let project = Project::from_json(PROJECT).unwrap();
        let collector = Collector::new(&project, &GeneratorConfig::default());
        let reachable = collector.collect([(TypeId::from("example.com/gone.Type"), Direction::Inbound)]);
        assert!(reachable.is_empty());
    }
}
