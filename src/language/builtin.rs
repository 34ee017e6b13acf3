//! Built-in language profiles.

use super::{DocStyle, FieldCase, LanguageProfile, RenderRules, TypeTable};

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "fixed", "float", "for",
    "foreach", "goto", "if", "implicit", "in", "int", "interface", "internal", "is", "lock",
    "long", "namespace", "new", "null", "object", "operator", "out", "override", "params",
    "private", "protected", "public", "readonly", "ref", "return", "sbyte", "sealed", "short",
    "sizeof", "stackalloc", "static", "string", "struct", "switch", "this", "throw", "true",
    "try", "typeof", "uint", "ulong", "unchecked", "unsafe", "ushort", "using", "virtual",
    "void", "volatile", "while",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
    "where", "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv",
    "typeof", "unsized", "virtual", "yield", "try", "gen",
];

// Keywords with no raw identifier form.
const RUST_PATH_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn some(s: &str) -> Option<String> {
    Some(s.to_string())
}

impl LanguageProfile {
    /// C#: public fields, `List<T>` arrays, XML doc summaries, CRLF line
    /// endings.
    pub fn csharp() -> Self {
        Self {
            name: "csharp".to_string(),
            types: TypeTable {
                int: some("int"),
                float: some("float"),
                bool: some("bool"),
                string: some("string"),
                enum_ref: some("{name}"),
                struct_ref: some("{name}"),
                array_of_primitive: some("List<{element}>"),
                array_of_struct: some("List<{element}>"),
            },
            render: RenderRules {
                file_header: strings(&["using System.Collections.Generic;"]),
                class_open: strings(&["public class {name}", "{"]),
                struct_open: strings(&["public struct {name}", "{"]),
                enum_open: strings(&["public enum {name}", "{"]),
                close: "}".to_string(),
                member: "public {type} {name};".to_string(),
                enum_member: "{name},".to_string(),
                doc: DocStyle {
                    open: some("/// <summary>"),
                    line: "/// {line}".to_string(),
                    close: some("/// </summary>"),
                },
                indent: "    ".to_string(),
                line_ending: "\r\n".to_string(),
                field_case: FieldCase::Keep,
                reserved_words: strings(CSHARP_KEYWORDS),
                escape: some("@{name}"),
                unescapable_words: Vec::new(),
                fallback_escape: None,
                orientation_note: None,
                separate_documented_members: true,
            },
        }
    }

    /// Rust: snake_case public fields, `Vec<T>` arrays, `///` docs that note
    /// array orientation.
    pub fn rust() -> Self {
        Self {
            name: "rust".to_string(),
            types: TypeTable {
                int: some("i32"),
                float: some("f32"),
                bool: some("bool"),
                string: some("String"),
                enum_ref: some("{name}"),
                struct_ref: some("{name}"),
                array_of_primitive: some("Vec<{element}>"),
                array_of_struct: some("Vec<{element}>"),
            },
            render: RenderRules {
                file_header: strings(&["// Generated by tablegen. Do not edit."]),
                class_open: strings(&["#[derive(Debug, Clone, PartialEq)]", "pub struct {name} {"]),
                struct_open: strings(&["#[derive(Debug, Clone, PartialEq)]", "pub struct {name} {"]),
                enum_open: strings(&[
                    "#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]",
                    "pub enum {name} {",
                ]),
                close: "}".to_string(),
                member: "pub {name}: {type},".to_string(),
                enum_member: "{name},".to_string(),
                doc: DocStyle {
                    open: None,
                    line: "/// {line}".to_string(),
                    close: None,
                },
                indent: "    ".to_string(),
                line_ending: "\n".to_string(),
                field_case: FieldCase::Snake,
                reserved_words: strings(RUST_KEYWORDS),
                escape: some("r#{name}"),
                unescapable_words: strings(RUST_PATH_KEYWORDS),
                fallback_escape: some("{name}_"),
                orientation_note: some("Array orientation: {orientation}."),
                separate_documented_members: true,
            },
        }
    }
}
