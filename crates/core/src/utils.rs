//! Identifier helpers shared by the resolver, the exchange builder and the
//! preview renderer.

/// Words an ES module cannot bind as an import alias (strict mode).
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

/// Check if a property name must be quoted.
///
/// Returns true if the name:
/// - Is empty
/// - Doesn't start with a letter, underscore, or dollar sign
/// - Contains characters other than alphanumeric, underscore, or dollar sign
pub fn needs_quoting(name: &str) -> bool {
    name.is_empty()
        || !name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Escape backslashes and double quotes for a string literal.
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a property key if it is not a valid identifier.
pub fn quote_if_needed(name: &str) -> String {
    if needs_quoting(name) {
        format!("\"{}\"", escape_string(name))
    } else {
        name.to_string()
    }
}

/// Turn an arbitrary namespace fragment into an identifier.
/// - Replaces every non-alphanumeric character with `_`
/// - Prepends `_` if it starts with a digit
/// - Escapes reserved words with a `_` prefix
pub fn sanitize_identifier(name: &str) -> String {
    let mut result: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if result.is_empty() {
        return "_empty".to_string();
    }

    if result.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        result = format!("_{result}");
    }

    if RESERVED_WORDS.contains(&result.as_str()) {
        result = format!("_{result}");
    }

    result
}

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Lowercase the leading run of capitals: `ID` -> `id`, `UserID` -> `userID`,
/// `HTTPServer` -> `httpServer`.
pub fn lower_first(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let run = chars.iter().take_while(|c| c.is_uppercase()).count();
    let lowered = match run {
        0 => return s.to_string(),
        n if n == chars.len() || n == 1 => n,
        // keep the last capital of a run when it starts the next word
        n => n - 1,
    };
    chars
        .iter()
        .enumerate()
        .flat_map(|(i, c)| {
            if i < lowered {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                vec![*c]
            }
        })
        .collect()
}

/// Last `/`-separated segment of a package path.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_quoting() {
        assert!(!needs_quoting("foo"));
        assert!(!needs_quoting("_foo"));
        assert!(!needs_quoting("$foo"));
        assert!(!needs_quoting("foo123"));

        assert!(needs_quoting(""));
        assert!(needs_quoting("123foo"));
        assert!(needs_quoting("foo-bar"));
        assert!(needs_quoting("foo.bar"));
        assert!(needs_quoting("foo bar"));
    }

    #[test]
    fn test_quote_if_needed() {
        assert_eq!(quote_if_needed("foo"), "foo");
        assert_eq!(quote_if_needed("foo-bar"), "\"foo-bar\"");
        assert_eq!(quote_if_needed("say \"hi\""), "\"say \\\"hi\\\"\"");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("app"), "app");
        assert_eq!(sanitize_identifier("go.uuid"), "go_uuid");
        assert_eq!(sanitize_identifier("v2"), "v2");
        assert_eq!(sanitize_identifier("2fa"), "_2fa");
        assert_eq!(sanitize_identifier("default"), "_default");
        assert_eq!(sanitize_identifier("package"), "_package");
        assert_eq!(sanitize_identifier("async"), "async");
        assert_eq!(sanitize_identifier(""), "_empty");
    }

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("foo"), "Foo");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("ABC"), "ABC");
    }

    #[test]
    fn test_lower_first() {
        assert_eq!(lower_first("Name"), "name");
        assert_eq!(lower_first("ID"), "id");
        assert_eq!(lower_first("UserID"), "userID");
        assert_eq!(lower_first("HTTPServer"), "httpServer");
        assert_eq!(lower_first("already"), "already");
        assert_eq!(lower_first(""), "");
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(last_segment("example.com/app/models"), "models");
        assert_eq!(last_segment("time"), "time");
    }
}
