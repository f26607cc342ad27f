#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use clientgen_core::{
    Builtin, DefinitionBody, Descriptor, GeneratorConfig, Native, Project, QualifiedName, Render,
    Scope, Shape, TypeId, generate,
};

const USERS: &str = r#"{
    "module": "example.com/app",
    "contracts": [ {
        "name": "Users",
        "package": "example.com/app",
        "methods": [ {
            "name": "Get",
            "args": [
                { "name": "ctx", "type": "context.Context" },
                { "name": "id", "type": "int64" }
            ],
            "results": [
                { "name": "profile", "type": "example.com/app.UserProfile", "pointers": 1 },
                { "name": "err", "type": "error" }
            ]
        } ]
    } ],
    "types": {
        "int64": { "name": "int64", "kind": { "scalar": "int64" } },
        "uint64": { "name": "uint64", "kind": { "scalar": "uint64" } },
        "string": { "name": "string", "kind": { "scalar": "string" } },
        "context.Context": { "package": "context", "name": "Context", "kind": { "interface": {} } },
        "error": {
            "name": "error",
            "kind": { "interface": { "methods": [ { "name": "Error", "results": [ { "type": "string" } ] } ] } }
        },
        "example.com/app.UserProfile": {
            "package": "example.com/app",
            "name": "UserProfile",
            "kind": { "struct": { "fields": [
                { "name": "ID", "type": "int64", "tags": "json:\"id\"" },
                { "name": "Name", "type": "string", "tags": "json:\"name\"" },
                { "name": "Meta", "type": "map[string]string", "map_key": "string", "map_value": "string", "tags": "json:\"meta\"" },
                { "name": "CreatedAt", "type": "time.Time", "tags": "json:\"created_at\"" }
            ] } }
        },
        "time.Time": {
            "package": "time",
            "name": "Time",
            "kind": { "struct": { "fields": [ { "name": "wall", "type": "uint64" } ] } },
            "capabilities": ["marshal_json", "unmarshal_json"]
        }
    }
}"#;

const TREES: &str = r#"{
    "module": "example.com/app",
    "contracts": [ {
        "name": "Trees",
        "package": "example.com/app",
        "methods": [ {
            "name": "Walk",
            "args": [ { "name": "root", "type": "example.com/app.Tree", "pointers": 1 } ],
            "results": [ { "type": "example.com/app.Tree", "slice": true, "elem_pointers": 1 } ]
        } ]
    } ],
    "types": {
        "int": { "name": "int", "kind": { "scalar": "int" } },
        "example.com/app.Tree": {
            "package": "example.com/app",
            "name": "Tree",
            "kind": { "struct": { "fields": [
                { "name": "Value", "type": "int" },
                { "name": "Children", "type": "example.com/app.Tree", "slice": true, "elem_pointers": 1 }
            ] } }
        }
    }
}"#;

fn app(name: &str) -> QualifiedName {
    QualifiedName::new("example.com/app", name)
}

#[test]
fn test_get_user_profile() {
    let project = Project::from_json(USERS).unwrap();
    let generation = generate(&project, GeneratorConfig::default());

    let contract = &generation.contracts[0];
    assert_eq!(
        contract.reachable.iter().collect::<Vec<_>>(),
        vec![&TypeId::from("example.com/app.UserProfile")]
    );

    let get = &contract.methods[0];
    assert_eq!(get.params.len(), 1);
    assert_eq!(get.params[0].ty, Descriptor::builtin(Builtin::Integer));
    assert_eq!(get.results.len(), 1);
    assert_eq!(get.results[0].ty, Descriptor::named(app("UserProfile")).with_pointers(1));
    assert!(get.exchange.is_consistent());

    let definitions = &generation.definitions;
    assert_eq!(definitions.len(), 1);
    let profile = definitions.get(&app("UserProfile")).unwrap();
    let DefinitionBody::Struct { properties } = &profile.body else {
        panic!("UserProfile should be a struct");
    };
    let fields: Vec<_> = properties
        .iter()
        .map(|p| (p.name.as_str(), p.ty.clone()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("id", Descriptor::builtin(Builtin::Integer)),
            ("name", Descriptor::builtin(Builtin::String)),
            (
                "meta",
                Descriptor::map(
                    Descriptor::builtin(Builtin::String),
                    Descriptor::builtin(Builtin::String)
                )
            ),
            ("created_at", Descriptor::native(Native::Date)),
        ]
    );
}

#[test]
fn test_recursive_tree() {
    let project = Project::from_json(TREES).unwrap();
    let generation = generate(&project, GeneratorConfig::default());

    let definitions = &generation.definitions;
    assert_eq!(definitions.len(), 1);
    let tree = definitions.get(&app("Tree")).unwrap();
    let DefinitionBody::Struct { properties } = &tree.body else {
        panic!("Tree should be a struct");
    };
    assert_eq!(properties.len(), 2);
    assert_eq!(properties[0].ty, Descriptor::builtin(Builtin::Integer));
    assert_eq!(
        properties[1].ty,
        Descriptor::array(Descriptor::named(app("Tree")).with_pointers(1))
    );

    let walk = &generation.contracts[0].methods[0];
    assert_eq!(walk.results[0].name, "result");
    assert_eq!(
        walk.results[0].ty.render(&Scope::bare("example.com/app")),
        "(Tree | null)[]"
    );
}

#[test]
fn test_tree_preview() {
    let project = Project::from_json(TREES).unwrap();
    let generation = generate(&project, GeneratorConfig::default());
    let preview =
        clientgen_core::render::render_namespace(&generation.definitions, "example.com/app");
    assert_eq!(
        preview,
        "export interface Tree {\n  Value: number;\n  Children: (Tree | null)[];\n}\n"
    );
}

#[test]
fn test_exchange_reconciles_pointer_arity() {
    let project = Project::from_json(TREES).unwrap();
    let generation = generate(&project, GeneratorConfig::default());
    let exchange = &generation.contracts[0].methods[0].exchange;

    let root = &exchange.request[0];
    assert_eq!(root.field_name, "Root");
    assert_eq!(root.wire_name, "root");
    assert_eq!(root.wire_pointers, 1);
    assert_eq!(root.to_wire, clientgen_core::arity::ArityConversion::Direct);

    let result = &exchange.response[0];
    assert_eq!(result.wire_pointers, 0);
    assert!(matches!(result.ty.shape, Shape::Array(_)));
    assert!(exchange.is_consistent());
}
