use lazy_static::lazy_static;
use regex::Regex;

use crate::error::CompileError;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();
}

/// Strict and reserved keywords of every edition up to 2024.
const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn",
    "else", "enum", "extern", "false", "fn", "for", "if", "impl",
    "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "self", "Self", "static", "struct", "super", "trait",
    "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "gen", "macro", "override",
    "priv", "try", "typeof", "unsized", "virtual", "yield",
];

pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn error(msg: &str, line: u32, column: u32) -> CompileError {
    CompileError::ParseError {
        msg: msg.to_string(),
        line,
        column,
    }
}

/// Returns `Err(CompileError::InvalidName)` unless `name` becomes a valid
/// identifier once dashes are replaced. Names must start with a letter, which
/// keeps the `_`/`__` prefixes free for generated bindings.
pub fn check_name(name: &str) -> Result<(), CompileError> {
    if IDENTIFIER.is_match(&name.replace('-', "_")) {
        Ok(())
    } else {
        Err(CompileError::InvalidName(quote(name)))
    }
}

/// [check_name] for names that become `let` bindings and parameters. An
/// uppercase binding would be read as a pattern (`None`, a constant) instead.
pub fn check_binding_name(name: &str) -> Result<(), CompileError> {
    check_name(name)?;
    if name.starts_with(|c: char| c.is_ascii_lowercase()) {
        Ok(())
    } else {
        Err(CompileError::InvalidName(quote(name)))
    }
}

/// Escapes Rust reserved keywords by suffixing with an underscore.
fn escape_rust_keyword(s: &str) -> String {
    if RUST_KEYWORDS.contains(&s) {
        format!("{}_", s)
    } else {
        s.to_string()
    }
}

/// Schema name to a value/function identifier: `no-wait` → `no_wait`, `type` → `type_`.
pub fn name_clean(name: &str) -> String {
    escape_rust_keyword(&name.replace('-', "_"))
}

/// Schema name to a constant identifier: `declare-ok` → `DECLARE_OK`.
pub fn name_upper(name: &str) -> String {
    name.replace('-', "_").to_uppercase()
}

/// Schema name to a type identifier: `declare-ok` → `DeclareOk`, `self` → `Self_`.
pub fn name_pascal(name: &str) -> String {
    escape_rust_keyword(&name_pascal_part(name))
}

/// [name_pascal] without keyword escaping, for the leading part of a longer
/// identifier (`Self` in `SelfHandlers`).
pub fn name_pascal_part(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().to_string() + &chars.as_str().to_lowercase(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_clean_escapes_keywords() {
        assert_eq!(name_clean("no-wait"), "no_wait");
        assert_eq!(name_clean("type"), "type_");
        assert_eq!(name_clean("return"), "return_");
        assert_eq!(name_clean("if-unused"), "if_unused");
        assert_eq!(name_clean("try"), "try_");
        assert_eq!(name_clean("yield"), "yield_");
        assert_eq!(name_clean("box"), "box_");
        assert_eq!(name_clean("self"), "self_");
    }

    #[test]
    fn test_name_upper_and_pascal() {
        assert_eq!(name_upper("declare-ok"), "DECLARE_OK");
        assert_eq!(name_pascal("declare-ok"), "DeclareOk");
        assert_eq!(name_pascal("basic"), "Basic");
        assert_eq!(name_pascal("tx"), "Tx");
        assert_eq!(name_pascal("self"), "Self_");
        assert_eq!(name_pascal_part("self"), "Self");
    }

    #[test]
    fn test_check_name() {
        assert!(check_name("queue-name").is_ok());
        assert!(matches!(check_name("_x"), Err(CompileError::InvalidName(_))));
        assert!(matches!(check_name("--tx"), Err(CompileError::InvalidName(_))));
        assert!(matches!(check_name("1st"), Err(CompileError::InvalidName(_))));
        assert!(matches!(check_name("a b"), Err(CompileError::InvalidName(_))));
        assert!(matches!(check_name(""), Err(CompileError::InvalidName(_))));
    }

    #[test]
    fn test_check_binding_name() {
        assert!(check_binding_name("delivery-tag").is_ok());
        assert!(check_binding_name("channel").is_ok());
        assert!(matches!(check_binding_name("None"), Err(CompileError::InvalidName(_))));
        assert!(matches!(check_binding_name("FRAME-END"), Err(CompileError::InvalidName(_))));
    }
}
