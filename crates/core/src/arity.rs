//! Pointer-arity reconciliation between call-site values and wire fields.
//!
//! Every method gets an [`Exchange`]: the request fields built from its
//! payload arguments and the response fields its payload results are read
//! from. On the wire a pointer chain collapses to a single optional level and
//! containers are never pointers, so a call-site `**T` travels as `*T` and a
//! `*[]T` travels as `[]T`. Generated glue applies [`ExchangeField::to_wire`]
//! when building a request and [`ExchangeField::from_wire`] when extracting a
//! response; the two are always mirror images.

use std::cmp::Ordering;

use serde::Serialize;

use crate::descriptor::Descriptor;
use crate::ir::Variable;
use crate::utils::{capitalize_first, lower_first};

/// Conversion between two pointer depths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "depth", rename_all = "snake_case")]
pub enum ArityConversion {
    Direct,
    /// Take the address `n` times.
    AddressOf(u8),
    /// Dereference `n` times.
    Deref(u8),
}

impl ArityConversion {
    /// Conversion turning a value of depth `from` into one of depth `to`.
    pub fn between(from: u8, to: u8) -> Self {
        match from.cmp(&to) {
            Ordering::Equal => Self::Direct,
            Ordering::Less => Self::AddressOf(to - from),
            Ordering::Greater => Self::Deref(from - to),
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            Self::Direct => Self::Direct,
            Self::AddressOf(n) => Self::Deref(n),
            Self::Deref(n) => Self::AddressOf(n),
        }
    }

    /// Dereferencing a possibly-nil value needs a guard.
    pub fn requires_nil_check(self) -> bool {
        matches!(self, Self::Deref(_))
    }
}

/// Which half of the exchange a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Request,
    Response,
}

impl Slot {
    /// Name used for an unnamed argument or result at `index`.
    pub fn positional_name(self, index: usize) -> String {
        match (self, index) {
            (Self::Request, i) => format!("arg{i}"),
            (Self::Response, 0) => "result".to_string(),
            (Self::Response, i) => format!("result{i}"),
        }
    }
}

/// One field of a request or response exchange struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeField {
    /// Call-site parameter or result name.
    pub param_name: String,
    /// Exported field name on the exchange struct.
    pub field_name: String,
    /// Public name on the wire.
    pub wire_name: String,
    pub param_pointers: u8,
    pub wire_pointers: u8,
    /// Call-site value -> wire field.
    pub to_wire: ArityConversion,
    /// Wire field -> call-site value.
    pub from_wire: ArityConversion,
    pub ty: Descriptor,
}

impl ExchangeField {
    pub fn new(slot: Slot, index: usize, var: &Variable, ty: Descriptor) -> Self {
        let param_name = if var.name.is_empty() || var.name == "_" {
            slot.positional_name(index)
        } else {
            var.name.clone()
        };
        let param_pointers = var.pointers;
        let wire_pointers = canonical_wire_pointers(var);
        let to_wire = ArityConversion::between(param_pointers, wire_pointers);
        Self {
            field_name: capitalize_first(&param_name),
            wire_name: lower_first(&param_name),
            param_name,
            param_pointers,
            wire_pointers,
            to_wire,
            from_wire: to_wire.inverse(),
            ty,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.from_wire == self.to_wire.inverse()
            && ArityConversion::between(self.param_pointers, self.wire_pointers) == self.to_wire
    }
}

/// Pointer depth of the wire field carrying `var`.
pub fn canonical_wire_pointers(var: &Variable) -> u8 {
    if var.is_sequence() || var.is_map() {
        0
    } else {
        var.pointers.min(1)
    }
}

/// Request and response fields of one method.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Exchange {
    pub request: Vec<ExchangeField>,
    pub response: Vec<ExchangeField>,
}

impl Exchange {
    /// Build an exchange from resolved arguments and results, in order.
    pub fn build<'v>(
        args: impl IntoIterator<Item = (&'v Variable, Descriptor)>,
        results: impl IntoIterator<Item = (&'v Variable, Descriptor)>,
    ) -> Self {
        Self {
            request: slot_fields(Slot::Request, args),
            response: slot_fields(Slot::Response, results),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &ExchangeField> {
        self.request.iter().chain(&self.response)
    }

    pub fn is_consistent(&self) -> bool {
        self.fields().all(ExchangeField::is_consistent)
    }
}

fn slot_fields<'v>(
    slot: Slot,
    items: impl IntoIterator<Item = (&'v Variable, Descriptor)>,
) -> Vec<ExchangeField> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, (var, ty))| ExchangeField::new(slot, i, var, ty))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::descriptor::{Builtin, QualifiedName};

    fn profile() -> Descriptor {
        Descriptor::named(QualifiedName::new("example.com/app", "UserProfile"))
    }

    #[test]
    fn test_conversion_between_depths() {
        assert_eq!(ArityConversion::between(1, 1), ArityConversion::Direct);
        assert_eq!(ArityConversion::between(0, 1), ArityConversion::AddressOf(1));
        assert_eq!(ArityConversion::between(3, 1), ArityConversion::Deref(2));
        assert!(ArityConversion::Deref(1).requires_nil_check());
        assert!(!ArityConversion::AddressOf(1).requires_nil_check());
    }

    #[test]
    fn test_inverse_is_an_involution() {
        for c in [
            ArityConversion::Direct,
            ArityConversion::AddressOf(2),
            ArityConversion::Deref(1),
        ] {
            assert_eq!(c.inverse().inverse(), c);
        }
    }

    #[test]
    fn test_pointer_chain_collapses_to_one_level() {
        let var = Variable {
            pointers: 2,
            ..Variable::new("profile", "example.com/app.UserProfile")
        };
        let field = ExchangeField::new(Slot::Response, 0, &var, profile().with_pointers(2));
        assert_eq!(field.wire_pointers, 1);
        assert_eq!(field.to_wire, ArityConversion::Deref(1));
        assert_eq!(field.from_wire, ArityConversion::AddressOf(1));
        assert!(field.is_consistent());
    }

    #[test]
    fn test_containers_are_never_pointers_on_the_wire() {
        let var = Variable {
            pointers: 1,
            slice: true,
            ..Variable::new("ids", "int64")
        };
        assert_eq!(canonical_wire_pointers(&var), 0);
        let field = ExchangeField::new(
            Slot::Request,
            0,
            &var,
            Descriptor::array(Descriptor::builtin(Builtin::Integer)),
        );
        assert_eq!(field.to_wire, ArityConversion::Deref(1));
    }

    #[test]
    fn test_positional_and_exported_names() {
        let unnamed = Variable::new("", "int64");
        let exchange = Exchange::build(
            [
                (&unnamed, Descriptor::builtin(Builtin::Integer)),
                (&unnamed, Descriptor::builtin(Builtin::Integer)),
            ],
            [
                (&unnamed, profile()),
                (&unnamed, Descriptor::builtin(Builtin::String)),
            ],
        );
        let names: Vec<_> = exchange.fields().map(|f| f.param_name.as_str()).collect();
        assert_eq!(names, vec!["arg0", "arg1", "result", "result1"]);

        let named = Variable::new("UserID", "int64");
        let field = ExchangeField::new(
            Slot::Request,
            0,
            &named,
            Descriptor::builtin(Builtin::Integer),
        );
        assert_eq!(field.field_name, "UserID");
        assert_eq!(field.wire_name, "userID");
        assert!(exchange.is_consistent());
    }
}
