//! Printing a [`Generation`] in the formats the front end offers.

use std::fmt::Write as _;

use clientgen_core::descriptor::Param;
use clientgen_core::pipeline::ContractOutput;
use clientgen_core::render::render_namespace;
use clientgen_core::{Generation, Render, Result, Scope};

use crate::Format;

pub(crate) fn render(generation: &Generation, format: Format) -> Result<String> {
    match format {
        Format::Summary => Ok(summary(generation)),
        Format::Json => {
            let mut json = serde_json::to_string_pretty(generation)?;
            json.push('\n');
            Ok(json)
        }
        Format::Preview => Ok(preview(generation)),
    }
}

fn summary(generation: &Generation) -> String {
    let mut out = String::new();
    for contract in &generation.contracts {
        contract_summary(&mut out, contract, generation);
    }

    let definitions = &generation.definitions;
    let _ = writeln!(
        out,
        "definitions: {} in {} namespaces",
        definitions.len(),
        definitions.namespaces().count()
    );
    for namespace in definitions.namespaces() {
        let names: Vec<_> = definitions
            .in_namespace(namespace)
            .map(|d| d.name.name.as_str())
            .collect();
        let _ = writeln!(out, "  {namespace}: {}", names.join(", "));
    }
    out
}

fn contract_summary(out: &mut String, contract: &ContractOutput, generation: &Generation) {
    let scope = Scope::new(&contract.namespace, generation.definitions.aliases());
    let _ = writeln!(
        out,
        "contract {} ({}): {} methods, {} reachable types",
        contract.name,
        contract.namespace,
        contract.methods.len(),
        contract.reachable.len()
    );
    for method in &contract.methods {
        let params: Vec<_> = method.params.iter().map(|p| p.render(&scope)).collect();
        let _ = write!(
            out,
            "  {}({}): {}",
            method.name,
            params.join(", "),
            results(&method.results, &scope)
        );
        if !method.errors.is_empty() {
            let errors: Vec<_> = method.errors.iter().map(|e| e.render(&scope)).collect();
            let _ = write!(out, " throws {}", errors.join(" | "));
        }
        out.push('\n');
    }
}

fn results(results: &[Param], scope: &Scope<'_>) -> String {
    match results {
        [] => "void".to_string(),
        [single] => single.ty.render(scope),
        many => {
            let parts: Vec<_> = many.iter().map(|p| p.ty.render(scope)).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

fn preview(generation: &Generation) -> String {
    let mut out = String::new();
    for namespace in generation.definitions.namespaces() {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "// {namespace}");
        out.push_str(&render_namespace(&generation.definitions, namespace));
    }
    out
}
