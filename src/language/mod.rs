//! Language profiles
//!
//! A target language is a value, not a type: a [`TypeTable`] for mapping field
//! types plus [`RenderRules`] for laying out declarations, members and doc
//! comments. One generic emitter walks the schema and consults the profile, so
//! adding a language means adding data.
//!
//! Profiles are either built in ([`LanguageProfile::builtin`]) or loaded from a
//! TOML file:
//!
//! ```toml
//! name = "csharp"
//!
//! [types]
//! int = "int"
//! float = "float"
//! bool = "bool"
//! string = "string"
//! enum = "{name}"
//! struct = "{name}"
//! array-of-primitive = "List<{element}>"
//! array-of-struct = "List<{element}>"
//!
//! [render]
//! file_header = ["using System.Collections.Generic;"]
//! class_open = ["public class {name}", "{"]
//! struct_open = ["public struct {name}", "{"]
//! enum_open = ["public enum {name}", "{"]
//! close = "}"
//! member = "public {type} {name};"
//! enum_member = "{name},"
//! indent = "    "
//! line_ending = "\r\n"
//!
//! [render.doc]
//! open = "/// <summary>"
//! line = "/// {line}"
//! close = "/// </summary>"
//! ```

mod builtin;

use std::fs;
use std::path::Path;

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoEnumIterator};

use crate::error::{ConfigError, TableGenError, TableGenResult};
use crate::mapper::TypeShape;

/// A complete target-language description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LanguageProfile {
    pub name: String,
    pub types: TypeTable,
    pub render: RenderRules,
}

/// Type templates for each [`TypeShape`]. `{name}` is replaced with the
/// referenced type name and `{element}` with the mapped element type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TypeTable {
    pub int: Option<String>,
    pub float: Option<String>,
    pub bool: Option<String>,
    pub string: Option<String>,
    #[serde(rename = "enum")]
    pub enum_ref: Option<String>,
    #[serde(rename = "struct")]
    pub struct_ref: Option<String>,
    pub array_of_primitive: Option<String>,
    pub array_of_struct: Option<String>,
}

impl TypeTable {
    pub fn template(&self, shape: TypeShape) -> Option<&str> {
        let entry = match shape {
            TypeShape::Int => &self.int,
            TypeShape::Float => &self.float,
            TypeShape::Bool => &self.bool,
            TypeShape::String => &self.string,
            TypeShape::Enum => &self.enum_ref,
            TypeShape::Struct => &self.struct_ref,
            TypeShape::ArrayOfPrimitive => &self.array_of_primitive,
            TypeShape::ArrayOfStruct => &self.array_of_struct,
        };
        entry.as_deref()
    }
}

/// Layout rules for declarations and members.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RenderRules {
    /// Lines written once at the top of every unit, followed by a blank line
    #[serde(default)]
    pub file_header: Vec<String>,
    pub class_open: Vec<String>,
    pub struct_open: Vec<String>,
    pub enum_open: Vec<String>,
    pub close: String,
    /// Uses `{type}` and `{name}`
    pub member: String,
    /// Uses `{name}`
    pub enum_member: String,
    pub doc: DocStyle,
    pub indent: String,
    pub line_ending: String,
    #[serde(default)]
    pub field_case: FieldCase,
    #[serde(default)]
    pub reserved_words: Vec<String>,
    /// Uses `{name}`; applied to member names that are reserved words
    pub escape: Option<String>,
    /// Reserved words `escape` cannot express; rendered with
    /// `fallback_escape` instead
    #[serde(default)]
    pub unescapable_words: Vec<String>,
    /// Uses `{name}`
    pub fallback_escape: Option<String>,
    /// Uses `{orientation}`; appended to the docs of array members
    pub orientation_note: Option<String>,
    /// Put a blank line between two members when either one has docs
    #[serde(default = "default_true")]
    pub separate_documented_members: bool,
}

/// Doc-comment layout. `line` uses `{line}` and is applied to every line of
/// the documentation text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DocStyle {
    pub open: Option<String>,
    pub line: String,
    pub close: Option<String>,
}

/// Case transform applied to member names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FieldCase {
    #[default]
    Keep,
    Camel,
    Pascal,
    Snake,
}

impl FieldCase {
    pub fn apply(self, name: &str) -> String {
        match self {
            FieldCase::Keep => name.to_string(),
            FieldCase::Camel => name.to_lower_camel_case(),
            FieldCase::Pascal => name.to_upper_camel_case(),
            FieldCase::Snake => name.to_snake_case(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl LanguageProfile {
    /// Names of the built-in profiles.
    pub const BUILTIN: [&'static str; 2] = ["csharp", "rust"];

    /// Look up a built-in profile by name.
    pub fn builtin(name: &str) -> Result<Self, ConfigError> {
        match name {
            "csharp" | "cs" => Ok(Self::csharp()),
            "rust" | "rs" => Ok(Self::rust()),
            other => Err(ConfigError::UnknownLanguage(other.to_string())),
        }
    }

    /// Resolve a profile from either a built-in name or a path to a TOML file.
    pub fn resolve(language: &str, base: Option<&Path>) -> TableGenResult<Self> {
        match Self::builtin(language) {
            Ok(profile) => Ok(profile),
            Err(ConfigError::UnknownLanguage(_)) if language.ends_with(".toml") => {
                let path = match base {
                    Some(base) => base.join(language),
                    None => Path::new(language).to_path_buf(),
                };
                Self::load(path)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Load and validate a profile from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> TableGenResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TableGenError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::from_toml_str(&content, &path.display().to_string())?)
    }

    /// Parse and validate a profile from a TOML string.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let profile: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            origin: origin.to_string(),
            message: e.to_string(),
        })?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check that every template carries its placeholders and that layout
    /// settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for shape in TypeShape::iter() {
            let placeholder = match shape {
                TypeShape::Enum | TypeShape::Struct => "{name}",
                TypeShape::ArrayOfPrimitive | TypeShape::ArrayOfStruct => "{element}",
                _ => continue,
            };
            if let Some(template) = self.types.template(shape) {
                require(&format!("types.{shape}"), template, placeholder)?;
            }
        }

        let render = &self.render;
        require_any("render.class_open", &render.class_open, "{name}")?;
        require_any("render.struct_open", &render.struct_open, "{name}")?;
        require_any("render.enum_open", &render.enum_open, "{name}")?;
        require("render.member", &render.member, "{type}")?;
        require("render.member", &render.member, "{name}")?;
        require("render.enum_member", &render.enum_member, "{name}")?;
        require("render.doc.line", &render.doc.line, "{line}")?;
        if let Some(escape) = &render.escape {
            require("render.escape", escape, "{name}")?;
        }
        if let Some(fallback) = &render.fallback_escape {
            require("render.fallback_escape", fallback, "{name}")?;
        }
        if !render.unescapable_words.is_empty() && render.fallback_escape.is_none() {
            return Err(self.invalid(
                "unescapable_words",
                "requires fallback_escape to be set",
            ));
        }
        if let Some(note) = &render.orientation_note {
            require("render.orientation_note", note, "{orientation}")?;
        }

        if render.indent.is_empty() {
            return Err(self.invalid("indent", "must not be empty"));
        }
        if render.line_ending != "\n" && render.line_ending != "\r\n" {
            return Err(self.invalid("line_ending", "must be \"\\n\" or \"\\r\\n\""));
        }

        Ok(())
    }

    fn invalid(&self, setting: &'static str, message: &str) -> ConfigError {
        ConfigError::InvalidSetting {
            profile: self.name.clone(),
            setting,
            message: message.to_string(),
        }
    }

    /// Render a member name: case transform, then escape reserved words.
    pub fn member_name(&self, field_name: &str) -> String {
        self.escape_reserved(self.render.field_case.apply(field_name))
    }

    /// Escape `name` if it is a reserved word, keeping its case.
    pub fn escape_reserved(&self, name: String) -> String {
        let render = &self.render;
        let is = |words: &[String]| words.iter().any(|w| *w == name);
        let template = if is(&render.unescapable_words) {
            render.fallback_escape.as_deref()
        } else if is(&render.reserved_words) {
            render.escape.as_deref()
        } else {
            None
        };
        match template {
            Some(template) => template.replace("{name}", &name),
            None => name,
        }
    }
}

fn require(entry: &str, template: &str, placeholder: &'static str) -> Result<(), ConfigError> {
    if template.contains(placeholder) {
        Ok(())
    } else {
        Err(ConfigError::MissingPlaceholder {
            entry: entry.to_string(),
            placeholder,
            template: template.to_string(),
        })
    }
}

fn require_any(entry: &str, lines: &[String], placeholder: &'static str) -> Result<(), ConfigError> {
    if lines.iter().any(|line| line.contains(placeholder)) {
        Ok(())
    } else {
        Err(ConfigError::MissingPlaceholder {
            entry: entry.to_string(),
            placeholder,
            template: lines.join(" / "),
        })
    }
}
