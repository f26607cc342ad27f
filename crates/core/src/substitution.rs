//! Well-known runtime types and their native replacements.
//!
//! Timestamps, durations, UUIDs, decimals, big numbers and nullable wrappers
//! are replaced by a fixed target type regardless of their field layout.

use std::collections::HashMap;
use std::str::FromStr;

use serde::Deserialize;

use crate::descriptor::{Builtin, Descriptor, Native};
use crate::error::Error;

/// What a substituted type becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstituteTarget {
    Builtin(Builtin),
    Native(Native),
    Opaque,
}

/// Replacement for one well-known type.
///
/// Spelled `date`, `uuid`, `string`, ... in configuration; a trailing `?`
/// marks a nullable wrapper (`string?`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Substitute {
    pub target: SubstituteTarget,
    pub nullable: bool,
}

impl Substitute {
    pub const fn native(native: Native) -> Self {
        Self {
            target: SubstituteTarget::Native(native),
            nullable: false,
        }
    }

    pub const fn nullable(target: SubstituteTarget) -> Self {
        Self {
            target,
            nullable: true,
        }
    }

    pub fn descriptor(&self) -> Descriptor {
        let descriptor = match self.target {
            SubstituteTarget::Builtin(builtin) => Descriptor::builtin(builtin),
            SubstituteTarget::Native(native) => Descriptor::native(native),
            SubstituteTarget::Opaque => Descriptor::opaque(),
        };
        Descriptor {
            nullable: descriptor.nullable || self.nullable,
            ..descriptor
        }
    }
}

impl FromStr for Substitute {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (spelling, nullable) = match s.trim().strip_suffix('?') {
            Some(inner) => (inner, true),
            None => (s.trim(), false),
        };
        let target = match spelling {
            "date" | "time" | "timestamp" => SubstituteTarget::Native(Native::Date),
            "duration" => SubstituteTarget::Native(Native::Duration),
            "uuid" => SubstituteTarget::Native(Native::Uuid),
            "decimal" => SubstituteTarget::Native(Native::Decimal),
            "bigint" => SubstituteTarget::Native(Native::BigInt),
            "string" => SubstituteTarget::Builtin(Builtin::String),
            "integer" => SubstituteTarget::Builtin(Builtin::Integer),
            "number" => SubstituteTarget::Builtin(Builtin::Number),
            "boolean" => SubstituteTarget::Builtin(Builtin::Boolean),
            "bytes" => SubstituteTarget::Builtin(Builtin::Bytes),
            "any" => SubstituteTarget::Opaque,
            _ => return Err(Error::UnknownSubstitute(s.to_string())),
        };
        Ok(Self { target, nullable })
    }
}

impl TryFrom<String> for Substitute {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Lookup table keyed by qualified name (`pkg/path.Name`).
#[derive(Debug, Clone, Default)]
pub struct SubstitutionTable {
    entries: HashMap<String, Substitute>,
}

impl SubstitutionTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The well-known runtime types every backend substitutes.
    pub fn builtin() -> Self {
        use SubstituteTarget::{Builtin as B, Native as N};

        let entries = [
            ("time.Time", Substitute::native(Native::Date)),
            ("time.Duration", Substitute::native(Native::Duration)),
            ("github.com/google/uuid.UUID", Substitute::native(Native::Uuid)),
            ("github.com/gofrs/uuid.UUID", Substitute::native(Native::Uuid)),
            ("github.com/satori/go.uuid.UUID", Substitute::native(Native::Uuid)),
            (
                "github.com/shopspring/decimal.Decimal",
                Substitute::native(Native::Decimal),
            ),
            ("math/big.Int", Substitute::native(Native::BigInt)),
            ("math/big.Float", Substitute::native(Native::Decimal)),
            ("math/big.Rat", Substitute::native(Native::Decimal)),
            (
                "database/sql.NullString",
                Substitute::nullable(B(Builtin::String)),
            ),
            (
                "database/sql.NullBool",
                Substitute::nullable(B(Builtin::Boolean)),
            ),
            (
                "database/sql.NullByte",
                Substitute::nullable(B(Builtin::Integer)),
            ),
            (
                "database/sql.NullInt16",
                Substitute::nullable(B(Builtin::Integer)),
            ),
            (
                "database/sql.NullInt32",
                Substitute::nullable(B(Builtin::Integer)),
            ),
            (
                "database/sql.NullInt64",
                Substitute::nullable(B(Builtin::Integer)),
            ),
            (
                "database/sql.NullFloat64",
                Substitute::nullable(B(Builtin::Number)),
            ),
            ("database/sql.NullTime", Substitute::nullable(N(Native::Date))),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|(key, substitute)| (key.to_string(), substitute))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, substitute: Substitute) {
        self.entries.insert(key.into(), substitute);
    }

    pub fn get(&self, key: &str) -> Option<&Substitute> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::descriptor::Shape;

    #[test]
    fn test_parse_substitute_spellings() {
        let date: Substitute = "date".parse().unwrap();
        assert_eq!(date, Substitute::native(Native::Date));

        let nullable: Substitute = "string?".parse().unwrap();
        assert!(nullable.nullable);
        assert_eq!(nullable.target, SubstituteTarget::Builtin(Builtin::String));

        let err = "datetime".parse::<Substitute>().unwrap_err();
        assert!(matches!(err, Error::UnknownSubstitute(s) if s == "datetime"));
    }

    #[test]
    fn test_builtin_table_covers_runtime_types() {
        let table = SubstitutionTable::builtin();
        assert!(table.contains("time.Time"));
        assert!(table.contains("github.com/google/uuid.UUID"));
        assert!(table.contains("database/sql.NullString"));
        assert!(!table.contains("example.com/app.User"));
    }

    #[test]
    fn test_nullable_wrapper_descriptor() {
        let table = SubstitutionTable::builtin();
        let d = table.get("database/sql.NullTime").unwrap().descriptor();
        assert_eq!(d.shape, Shape::Native(Native::Date));
        assert!(d.nullable);

        let d = table.get("time.Time").unwrap().descriptor();
        assert!(!d.nullable);
    }
}
