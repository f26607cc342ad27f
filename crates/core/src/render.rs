//! TypeScript-flavored preview of resolved descriptors and definitions.
//!
//! The preview exists to inspect the engine's output; it is not an emitter.
//! Everything renders relative to a [`Scope`]: names owned by the scope's
//! namespace are bare, foreign names are qualified by the namespace alias.

use crate::descriptor::{
    Builtin, Descriptor, FunctionShape, MethodShape, Native, Param, Property, QualifiedName, Shape,
};
use crate::registry::{Definition, DefinitionBody, Definitions, NamespaceAliases};
use crate::utils::{last_segment, quote_if_needed, sanitize_identifier};

/// Namespace being rendered and the aliases of every other namespace.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub namespace: &'a str,
    pub aliases: Option<&'a NamespaceAliases>,
}

impl<'a> Scope<'a> {
    pub fn new(namespace: &'a str, aliases: &'a NamespaceAliases) -> Self {
        Self {
            namespace,
            aliases: Some(aliases),
        }
    }

    /// Scope without aliases; foreign namespaces use their last segment.
    pub fn bare(namespace: &'a str) -> Self {
        Self {
            namespace,
            aliases: None,
        }
    }

    pub fn alias_of(&self, namespace: &str) -> String {
        self.aliases
            .and_then(|aliases| aliases.get(namespace))
            .map_or_else(
                || sanitize_identifier(last_segment(namespace)),
                str::to_string,
            )
    }

    pub fn name(&self, name: &QualifiedName) -> String {
        if name.namespace == self.namespace {
            name.name.clone()
        } else {
            format!("{}.{}", self.alias_of(&name.namespace), name.name)
        }
    }
}

/// Render a value to preview syntax.
pub trait Render {
    fn render(&self, scope: &Scope<'_>) -> String;
}

impl Render for Builtin {
    fn render(&self, _scope: &Scope<'_>) -> String {
        match self {
            Builtin::Boolean => "boolean",
            Builtin::Integer | Builtin::Number => "number",
            Builtin::String | Builtin::Bytes => "string",
        }
        .to_string()
    }
}

impl Render for Native {
    fn render(&self, _scope: &Scope<'_>) -> String {
        match self {
            Native::Date => "Date",
            Native::Duration => "number",
            Native::Uuid | Native::Decimal => "string",
            Native::BigInt => "bigint",
        }
        .to_string()
    }
}

impl Render for Shape {
    fn render(&self, scope: &Scope<'_>) -> String {
        match self {
            Shape::Builtin(builtin) => builtin.render(scope),
            Shape::Native(native) => native.render(scope),
            Shape::Opaque { alias: None } => "unknown".to_string(),
            Shape::Opaque { alias: Some(name) } | Shape::Named(name) => scope.name(name),
            Shape::Array(elem) => {
                let inner = elem.render(scope);
                if needs_parens(elem) {
                    format!("({inner})[]")
                } else {
                    format!("{inner}[]")
                }
            }
            Shape::Map { key, value } => {
                format!("Record<{}, {}>", key.render(scope), value.render(scope))
            }
            Shape::Object(properties) => {
                if properties.is_empty() {
                    "{}".to_string()
                } else {
                    let parts: Vec<_> = properties.iter().map(|p| p.render(scope)).collect();
                    format!("{{ {} }}", parts.join("; "))
                }
            }
            Shape::Interface(methods) => {
                let parts: Vec<_> = methods.iter().map(|m| m.render(scope)).collect();
                format!("{{ {} }}", parts.join("; "))
            }
            Shape::Function(signature) => {
                format!(
                    "({}) => {}",
                    render_params(&signature.params, scope),
                    render_results(signature, scope)
                )
            }
        }
    }
}

impl Render for Descriptor {
    fn render(&self, scope: &Scope<'_>) -> String {
        let inner = self.shape.render(scope);
        if self.nullable && !matches!(self.shape, Shape::Opaque { alias: None }) {
            format!("{inner} | null")
        } else {
            inner
        }
    }
}

impl Render for Property {
    fn render(&self, scope: &Scope<'_>) -> String {
        let opt = if self.optional { "?" } else { "" };
        format!("{}{}: {}", quote_if_needed(&self.name), opt, self.ty.render(scope))
    }
}

impl Render for Param {
    fn render(&self, scope: &Scope<'_>) -> String {
        format!("{}: {}", self.name, self.ty.render(scope))
    }
}

impl Render for MethodShape {
    fn render(&self, scope: &Scope<'_>) -> String {
        format!(
            "{}({}): {}",
            self.name,
            render_params(&self.signature.params, scope),
            render_results(&self.signature, scope)
        )
    }
}

impl Render for Definition {
    fn render(&self, scope: &Scope<'_>) -> String {
        let mut output = String::new();
        if let Some(doc) = &self.doc {
            output.push_str(&format!("/** {} */\n", doc.trim()));
        }
        let name = &self.name.name;
        match &self.body {
            DefinitionBody::Struct { properties } => {
                output.push_str(&format!("export interface {name} {{\n"));
                for prop in properties {
                    output.push_str(&format!("  {};\n", prop.render(scope)));
                }
                output.push_str("}\n");
            }
            DefinitionBody::Interface { methods } => {
                output.push_str(&format!("export interface {name} {{\n"));
                for method in methods {
                    output.push_str(&format!("  {};\n", method.render(scope)));
                }
                output.push_str("}\n");
            }
            DefinitionBody::Alias { target } => {
                output.push_str(&format!("export type {name} = {};\n", target.render(scope)));
            }
        }
        output
    }
}

fn needs_parens(d: &Descriptor) -> bool {
    matches!(d.shape, Shape::Function(_))
        || (d.nullable && !matches!(d.shape, Shape::Opaque { alias: None }))
}

fn render_params(params: &[Param], scope: &Scope<'_>) -> String {
    params
        .iter()
        .map(|p| p.render(scope))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_results(signature: &FunctionShape, scope: &Scope<'_>) -> String {
    match signature.results.as_slice() {
        [] => "void".to_string(),
        [single] => single.ty.render(scope),
        many => {
            let parts: Vec<_> = many.iter().map(|p| p.ty.render(scope)).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}

/// Preview of every definition owned by `namespace`, with its imports.
pub fn render_namespace(definitions: &Definitions, namespace: &str) -> String {
    let scope = Scope::new(namespace, definitions.aliases());
    let mut output = String::new();
    for import in definitions.imports_of(namespace).into_iter().flatten() {
        output.push_str(&format!(
            "import type * as {} from \"{}\";\n",
            scope.alias_of(import),
            import
        ));
    }
    for definition in definitions.in_namespace(namespace) {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&definition.render(&scope));
    }
    output
}
