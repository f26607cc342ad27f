//! Struct tags and public field names.
//!
//! Tags use the conventional `key:"value" key2:"value2"` grammar. For the
//! configured key (normally `json`) the value is `name,opt1,opt2`:
//! - `-` skips the field; `-,` names it literally `-`
//! - an empty or invalid name falls back to the declared field name
//! - `omitempty`/`omitzero` make the property optional
//! - `string` carries a scalar as its string encoding
//! - `inline` splices the field's properties into the parent

use crate::ir::StructField;

/// Raw struct tag, looked up by key.
#[derive(Debug, Clone, Copy)]
pub struct StructTag<'t>(&'t str);

impl<'t> StructTag<'t> {
    pub fn new(raw: &'t str) -> Self {
        Self(raw)
    }

    /// Value stored under `key`, unquoted. Malformed tags end the scan.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut rest = self.0;
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                return None;
            }
            let bytes = rest.as_bytes();

            let mut i = 0;
            while i < bytes.len()
                && bytes[i] > b' '
                && bytes[i] != b':'
                && bytes[i] != b'"'
                && bytes[i] != 0x7f
            {
                i += 1;
            }
            if i == 0 || i + 1 >= bytes.len() || bytes[i] != b':' || bytes[i + 1] != b'"' {
                return None;
            }
            let name = &rest[..i];
            rest = &rest[i + 1..];
            let bytes = rest.as_bytes();

            let mut j = 1;
            while j < bytes.len() && bytes[j] != b'"' {
                if bytes[j] == b'\\' {
                    j += 1;
                }
                j += 1;
            }
            if j >= bytes.len() {
                return None;
            }
            let quoted = &rest[..=j];
            rest = &rest[j + 1..];

            if name == key {
                return unquote(quoted);
            }
        }
    }
}

fn unquote(quoted: &str) -> Option<String> {
    let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            _ => return None,
        }
    }
    Some(out)
}

/// Parsed tag value: optional name plus comma-separated options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagValue {
    pub name: Option<String>,
    pub options: Vec<String>,
}

impl TagValue {
    pub fn parse(value: &str) -> Self {
        let mut parts = value.split(',');
        let name = parts
            .next()
            .filter(|name| !name.is_empty() && is_valid_name(name))
            .map(str::to_string);
        Self {
            name,
            options: parts.map(str::to_string).collect(),
        }
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }
}

fn is_valid_name(name: &str) -> bool {
    name.chars().all(|c| {
        c.is_alphanumeric() || "!#$%&()*+-./:;<=>?@[]^_{|}~ ".contains(c)
    })
}

/// Public wire identity of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireField {
    pub name: String,
    pub omit_empty: bool,
    /// Scalar carried as its string encoding.
    pub as_string: bool,
}

/// How a struct field takes part in the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRole {
    Skip,
    /// Promote the field's properties into the parent when it resolves to a
    /// struct; otherwise use `fallback` (or skip it if unexported).
    Splice { fallback: WireField },
    Property(WireField),
}

/// Decide the role of `field` under tag key `tag_key`.
///
/// Precedence: explicit tag name, then the skip sentinel, then the declared
/// name.
pub fn field_role(field: &StructField, tag_key: &str) -> FieldRole {
    let raw = StructTag::new(&field.tags).lookup(tag_key);
    if raw.as_deref() == Some("-") {
        return FieldRole::Skip;
    }
    let tag = TagValue::parse(raw.as_deref().unwrap_or_default());
    let wire = WireField {
        name: tag.name.clone().unwrap_or_else(|| field.var.name.clone()),
        omit_empty: tag.has_option("omitempty") || tag.has_option("omitzero"),
        as_string: tag.has_option("string"),
    };

    if tag.has_option("inline") || (field.embedded && tag.name.is_none()) {
        return FieldRole::Splice { fallback: wire };
    }
    if !field.is_exported() {
        return FieldRole::Skip;
    }
    FieldRole::Property(wire)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ir::Variable;

    fn field(name: &str, tags: &str) -> StructField {
        StructField {
            var: Variable::new(name, "string"),
            tags: tags.to_string(),
            embedded: false,
            doc: None,
        }
    }

    #[test]
    fn test_lookup_finds_key_among_several() {
        let tag = StructTag::new(r#"db:"user_id" json:"id,omitempty" yaml:"uid""#);
        assert_eq!(tag.lookup("json").as_deref(), Some("id,omitempty"));
        assert_eq!(tag.lookup("db").as_deref(), Some("user_id"));
        assert_eq!(tag.lookup("yaml").as_deref(), Some("uid"));
        assert_eq!(tag.lookup("xml"), None);
    }

    #[test]
    fn test_lookup_unescapes_values() {
        let tag = StructTag::new(r#"json:"a\"b""#);
        assert_eq!(tag.lookup("json").as_deref(), Some("a\"b"));
    }

    #[test]
    fn test_lookup_stops_at_malformed_tag() {
        assert_eq!(StructTag::new(r#"json:id"#).lookup("json"), None);
        assert_eq!(StructTag::new(r#"json:"unterminated"#).lookup("json"), None);
        assert_eq!(StructTag::new(r#"bad json:"id""#).lookup("json"), None);
    }

    #[test]
    fn test_tag_value_parse() {
        let value = TagValue::parse("id,omitempty,string");
        assert_eq!(value.name.as_deref(), Some("id"));
        assert!(value.has_option("omitempty"));
        assert!(value.has_option("string"));

        let unnamed = TagValue::parse(",omitempty");
        assert_eq!(unnamed.name, None);

        let invalid = TagValue::parse("bad\u{7}name");
        assert_eq!(invalid.name, None);
    }

    #[test]
    fn test_field_role_precedence() {
        assert_eq!(
            field_role(&field("UserName", r#"json:"user_name""#), "json"),
            FieldRole::Property(WireField {
                name: "user_name".into(),
                omit_empty: false,
                as_string: false,
            })
        );
        assert_eq!(
            field_role(&field("Secret", r#"json:"-""#), "json"),
            FieldRole::Skip
        );
        assert_eq!(
            field_role(&field("Dash", r#"json:"-,""#), "json"),
            FieldRole::Property(WireField {
                name: "-".into(),
                omit_empty: false,
                as_string: false,
            })
        );
        assert_eq!(
            field_role(&field("Name", ""), "json"),
            FieldRole::Property(WireField {
                name: "Name".into(),
                omit_empty: false,
                as_string: false,
            })
        );
    }

    #[test]
    fn test_field_role_respects_tag_key() {
        let f = field("Name", r#"json:"name" yaml:"full_name""#);
        let FieldRole::Property(wire) = field_role(&f, "yaml") else {
            panic!("expected property");
        };
        assert_eq!(wire.name, "full_name");
    }

    #[test]
    fn test_unexported_fields_are_skipped() {
        assert_eq!(field_role(&field("secret", ""), "json"), FieldRole::Skip);
    }

    #[test]
    fn test_embedded_and_inline_fields_splice() {
        let mut embedded = field("Base", "");
        embedded.embedded = true;
        assert!(matches!(
            field_role(&embedded, "json"),
            FieldRole::Splice { .. }
        ));

        let mut named_embedded = field("Base", r#"json:"base""#);
        named_embedded.embedded = true;
        assert!(matches!(
            field_role(&named_embedded, "json"),
            FieldRole::Property(_)
        ));

        let inline = field("Extra", r#"json:",inline""#);
        assert!(matches!(
            field_role(&inline, "json"),
            FieldRole::Splice { .. }
        ));
    }
}
