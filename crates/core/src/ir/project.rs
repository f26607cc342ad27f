//! Project-level IR: contracts, methods and call-site variables.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::types::{Type, TypeId};
use crate::error::{Error, Result};

/// Root of the IR produced by the upstream project compiler.
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    /// Module path of the project being generated.
    pub module: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub types: HashMap<TypeId, Type>,
}

impl Project {
    /// Parse a project from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a project file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn get(&self, id: &TypeId) -> Option<&Type> {
        self.types.get(id)
    }

    pub fn contract(&self, name: &str) -> Result<&Contract> {
        self.contracts
            .iter()
            .find(|contract| contract.name == name)
            .ok_or_else(|| Error::UnknownContract(name.to_string()))
    }
}

/// A named group of methods exposed by one package.
#[derive(Debug, Clone, Deserialize)]
pub struct Contract {
    pub name: String,
    /// Namespace the contract is generated into.
    pub package: String,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Variable>,
    #[serde(default)]
    pub results: Vec<Variable>,
    /// Declared error types the method may return.
    #[serde(default)]
    pub errors: Vec<TypeId>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(default)]
    pub doc: Option<String>,
}

impl Method {
    /// Arguments without the implicit leading context parameter.
    pub fn payload_args<'m>(&'m self, context_types: &[TypeId]) -> &'m [Variable] {
        match self.args.split_first() {
            Some((first, rest)) if first.is_plain() && context_types.contains(&first.type_id) => {
                rest
            }
            _ => &self.args,
        }
    }

    /// Results without the trailing error slot.
    pub fn payload_results<'m>(&'m self, error_types: &[TypeId]) -> &'m [Variable] {
        match self.results.split_last() {
            Some((last, rest)) if last.is_plain() && error_types.contains(&last.type_id) => rest,
            _ => &self.results,
        }
    }
}

/// Free-form method annotations; only the default error target is interpreted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub default_error: Option<TypeId>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// A method argument or result, also the base shape of a struct field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Variable {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_id: TypeId,
    /// Pointer depth of the variable itself.
    #[serde(default)]
    pub pointers: u8,
    #[serde(default)]
    pub slice: bool,
    #[serde(default)]
    pub array_len: Option<usize>,
    /// Variadic parameter (`...T`).
    #[serde(default)]
    pub ellipsis: bool,
    /// Pointer depth of slice/array elements and map values.
    #[serde(default)]
    pub elem_pointers: u8,
    #[serde(default)]
    pub map_key: Option<TypeId>,
    #[serde(default)]
    pub map_value: Option<TypeId>,
}

impl Variable {
    pub fn new(name: impl Into<String>, type_id: impl Into<TypeId>) -> Self {
        Self {
            name: name.into(),
            type_id: type_id.into(),
            ..Self::default()
        }
    }

    pub fn is_sequence(&self) -> bool {
        self.slice || self.ellipsis || self.array_len.is_some()
    }

    pub fn is_map(&self) -> bool {
        self.map_key.is_some() && self.map_value.is_some()
    }

    /// Neither pointer nor container: a bare reference to `type_id`.
    pub fn is_plain(&self) -> bool {
        self.pointers == 0 && !self.is_sequence() && !self.is_map()
    }

    /// The element of a call-site sequence, carrying the element pointer depth
    /// as its own depth. Map ids stay attached so `[]map[K]V` keeps its shape.
    pub fn element(&self) -> Self {
        Self {
            name: self.name.clone(),
            type_id: self.type_id.clone(),
            pointers: self.elem_pointers,
            slice: false,
            array_len: None,
            ellipsis: false,
            elem_pointers: 0,
            map_key: self.map_key.clone(),
            map_value: self.map_value.clone(),
        }
    }
}
