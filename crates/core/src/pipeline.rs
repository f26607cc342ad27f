//! One generation pass over a project's contracts.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::arity::{Exchange, Slot};
use crate::config::GeneratorConfig;
use crate::descriptor::{Descriptor, Param};
use crate::ir::{Contract, Method, Project, TypeId, Variable};
use crate::reachability::Collector;
use crate::registry::{Definitions, Registry};
use crate::resolve::{Direction, Resolver, ResolverContext};

/// Resolved signature of one method.
#[derive(Debug, Clone, Serialize)]
pub struct MethodOutput {
    pub name: String,
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    /// Declared error types, plus the default error when it is not declared.
    pub errors: Vec<Descriptor>,
    pub exchange: Exchange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractOutput {
    pub name: String,
    pub namespace: String,
    /// Named types the contract needs, under the configured policy.
    pub reachable: BTreeSet<TypeId>,
    pub methods: Vec<MethodOutput>,
    /// Foreign namespaces the method signatures refer to.
    pub imports: BTreeSet<String>,
}

/// Result of [`generate`].
#[derive(Debug, Serialize)]
pub struct Generation {
    pub contracts: Vec<ContractOutput>,
    pub definitions: Definitions,
}

/// Drives one pass: every contract shares the registry, which is finalized
/// by [`Generator::finish`].
#[derive(Debug)]
pub struct Generator<'p> {
    project: &'p Project,
    config: GeneratorConfig,
    resolver: Resolver<'p>,
    collector: Collector<'p>,
    registry: Registry,
}

impl<'p> Generator<'p> {
    pub fn new(project: &'p Project, config: GeneratorConfig) -> Self {
        Self {
            project,
            resolver: Resolver::new(project, &config),
            collector: Collector::new(project, &config),
            registry: Registry::new(),
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn generate_contract(&mut self, contract: &Contract) -> ContractOutput {
        info!(contract = %contract.name, methods = contract.methods.len(), "generating contract");
        let namespace = contract.package.as_str();
        let reachable = self.collector.collect_contract(contract);

        let mut imports = BTreeSet::new();
        let mut methods = Vec::with_capacity(contract.methods.len());
        for method in &contract.methods {
            methods.push(self.method(namespace, method, &mut imports));
        }
        self.backfill(contract, &reachable);

        ContractOutput {
            name: contract.name.clone(),
            namespace: namespace.to_string(),
            reachable,
            methods,
            imports,
        }
    }

    /// Close the pass.
    pub fn finish(self) -> Definitions {
        let definitions = self.registry.finalize();
        info!(definitions = definitions.len(), "generation pass finished");
        definitions
    }

    fn method(
        &mut self,
        namespace: &str,
        method: &Method,
        imports: &mut BTreeSet<String>,
    ) -> MethodOutput {
        debug!(method = %method.name, "resolving method signature");
        let args = method.payload_args(&self.config.context_types);
        let results = method.payload_results(&self.config.error_types);

        let arg_types = self.resolve_variables(namespace, Direction::Outbound, args, imports);
        let result_types = self.resolve_variables(namespace, Direction::Inbound, results, imports);

        let mut error_ids: Vec<&TypeId> = method.errors.iter().collect();
        if let Some(default) = &method.annotations.default_error {
            if !error_ids.contains(&default) {
                error_ids.push(default);
            }
        }
        let errors = error_ids
            .into_iter()
            .map(|id| {
                let mut ctx = ResolverContext::new(namespace, Direction::Inbound, &mut self.registry);
                let descriptor = self.resolver.resolve(id, 0, &mut ctx);
                imports.extend(ctx.into_imports());
                descriptor
            })
            .collect();

        MethodOutput {
            name: method.name.clone(),
            params: named_params(Slot::Request, args, &arg_types),
            results: named_params(Slot::Response, results, &result_types),
            errors,
            exchange: Exchange::build(
                args.iter().zip(arg_types),
                results.iter().zip(result_types),
            ),
            doc: method.doc.clone(),
        }
    }

    /// Resolve each variable as its own root chain.
    fn resolve_variables(
        &mut self,
        namespace: &str,
        direction: Direction,
        vars: &[Variable],
        imports: &mut BTreeSet<String>,
    ) -> Vec<Descriptor> {
        vars.iter()
            .map(|var| {
                let mut ctx = ResolverContext::new(namespace, direction, &mut self.registry);
                let descriptor = self.resolver.resolve_variable(var, &mut ctx);
                imports.extend(ctx.into_imports());
                descriptor
            })
            .collect()
    }

    /// Every reachable named type must have a registry entry unless it is
    /// substituted. Resolve the stragglers on their own.
    fn backfill(&mut self, contract: &Contract, reachable: &BTreeSet<TypeId>) {
        for id in reachable {
            if self.registry.contains_type(id) {
                continue;
            }
            let Some(ty) = self.project.get(id) else {
                continue;
            };
            let substituted = ty
                .qualified_key()
                .is_some_and(|key| self.resolver.substitutions().contains(&key));
            let Some(namespace) = ty.package.clone().filter(|_| !substituted) else {
                continue;
            };
            warn!(
                type_id = %id,
                contract = %contract.name,
                "reachable type missing from registry, resolving it directly"
            );
            let mut ctx = ResolverContext::new(namespace, Direction::Inbound, &mut self.registry);
            self.resolver.resolve(id, 0, &mut ctx);
        }
    }
}

fn named_params(slot: Slot, vars: &[Variable], types: &[Descriptor]) -> Vec<Param> {
    vars.iter()
        .zip(types)
        .enumerate()
        .map(|(i, (var, ty))| Param {
            name: if var.name.is_empty() || var.name == "_" {
                slot.positional_name(i)
            } else {
                var.name.clone()
            },
            ty: ty.clone(),
        })
        .collect()
}

/// Run a full pass over every contract of `project`.
pub fn generate(project: &Project, config: GeneratorConfig) -> Generation {
    let mut generator = Generator::new(project, config);
    let contracts = project
        .contracts
        .iter()
        .map(|contract| generator.generate_contract(contract))
        .collect();
    Generation {
        contracts,
        definitions: generator.finish(),
    }
}
