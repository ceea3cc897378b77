//! Render [`Declaration`]s as a Rust module of serde data types.
//!
//! - structs derive `Serialize`/`Deserialize`; fields are snake_case with a
//!   `#[serde(rename)]` back to the schema key when they differ
//! - aliases become `pub type`
//! - enum values become `pub const <Enum>_<value>`
use std::collections::HashSet;
use std::fmt::Write as _;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::Declaration;
use crate::error::{Error, Result};
use crate::ir::{Field, SerdeTag, Storage, Type};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Module (package) the generated file belongs to.
    pub package: String,
    /// Schema file the declarations came from, echoed in the header.
    pub source: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { package: "model".to_string(), source: None }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

pub fn render(declarations: &[Declaration], options: &RenderOptions) -> Result<String> {
    let mut out = String::new();
    let package = &options.package;
    match &options.source {
        Some(source) => {
            let _ = writeln!(
                out,
                "// Code generated by json-dbgen from `{source}` (package `{package}`). DO NOT EDIT."
            );
        }
        None => {
            let _ = writeln!(
                out,
                "// Code generated by json-dbgen (package `{package}`). DO NOT EDIT."
            );
        }
    }
    out.push_str("#![allow(dead_code)]\n\nuse serde::{Deserialize, Serialize};\n");

    let mut consts = HashSet::new();
    for decl in declarations {
        out.push('\n');
        match decl {
            Declaration::Struct { name, comment, fields } => {
                render_struct(&mut out, name, comment, fields)?
            }
            Declaration::Alias { name, comment, base } => {
                write_doc(&mut out, "", comment);
                let _ = writeln!(out, "pub type {} = {};", type_ident(name), render_type(base));
            }
            Declaration::Const { name, ty, value } => {
                let ident = sanitize(name);
                if !consts.insert(ident.clone()) {
                    return Err(Error::Emit {
                        entity: ty.clone(),
                        message: format!("two values render as the constant `{ident}`"),
                    });
                }
                render_const(&mut out, &ident, ty, value, declarations);
            }
        }
    }
    Ok(out)
}

fn render_struct(out: &mut String, name: &str, comment: &str, fields: &[Field]) -> Result<()> {
    write_doc(out, "", comment);
    out.push_str("#[derive(Debug, Clone, Default, Serialize, Deserialize)]\n");
    if fields.is_empty() {
        let _ = writeln!(out, "pub struct {} {{}}", type_ident(name));
        return Ok(());
    }
    let _ = writeln!(out, "pub struct {} {{", type_ident(name));

    let mut taken: HashSet<String> = HashSet::new();
    for field in fields {
        let mut ident = field_ident(&field.name);
        if taken.contains(&ident) {
            // Synthetic keys give way to schema fields of the same spelling.
            if !is_key(field) {
                return Err(Error::Emit {
                    entity: name.to_string(),
                    message: format!(
                        "field `{}` renders as `{ident}`, which is already taken",
                        field.name
                    ),
                });
            }
            while taken.contains(&ident) {
                ident.push('_');
            }
        }
        taken.insert(ident.clone());
        render_field(out, &ident, field);
    }
    out.push_str("}\n");
    Ok(())
}

fn render_field(out: &mut String, ident: &str, field: &Field) {
    const INDENT: &str = "    ";
    write_doc(out, INDENT, &field.comment);
    if let Some(marker) = field.storage_marker() {
        let _ = writeln!(out, "{INDENT}// storage: {}", marker.as_str());
    }

    let mut attrs = Vec::new();
    match field.serde_tag() {
        Some(SerdeTag::Skip) => attrs.push("skip".to_string()),
        Some(SerdeTag::Key { key, omit_empty }) => {
            if key != ident.trim_start_matches("r#") {
                attrs.push(format!("rename = {key:?}"));
            }
            if omit_empty {
                if field.ty.nilable {
                    attrs.push("skip_serializing_if = \"Option::is_none\"".to_string());
                } else if field.ty.is_array {
                    attrs.push("default".to_string());
                    attrs.push("skip_serializing_if = \"Vec::is_empty\"".to_string());
                }
            }
        }
        None if field.ty.is_array => attrs.push("default".to_string()),
        None => {}
    }
    if !attrs.is_empty() {
        let _ = writeln!(out, "{INDENT}#[serde({})]", attrs.join(", "));
    }
    let _ = writeln!(out, "{INDENT}pub {ident}: {},", render_type(&field.ty));
}

fn render_const(
    out: &mut String,
    ident: &str,
    alias: &str,
    value: &Value,
    declarations: &[Declaration],
) {
    let base = declarations.iter().find_map(|d| match d {
        Declaration::Alias { name, base, .. } if name == alias => Some(base),
        _ => None,
    });
    let Some((ty, literal)) = base.and_then(|base| const_literal(alias, base, value)) else {
        tracing::warn!(constant = ident, %value, "enum value has no Rust constant form, skipped");
        return;
    };
    out.push_str("#[allow(non_upper_case_globals)]\n");
    let _ = writeln!(out, "pub const {ident}: {ty} = {literal};");
}

/// Constant type and literal for one enum value, if the alias base can hold it.
fn const_literal(alias: &str, base: &Type, value: &Value) -> Option<(String, String)> {
    if base.domain.is_some() || base.is_array || base.nilable {
        return None;
    }
    let alias = type_ident(alias);
    match (base.name.as_str(), value) {
        ("String", Value::String(s)) => Some(("&str".to_string(), format!("{s:?}"))),
        ("i64", Value::Number(n)) => n.as_i64().map(|i| (alias, i.to_string())),
        ("f64", Value::Number(n)) => n.as_f64().map(|f| (alias, format!("{f:?}"))),
        ("bool", Value::Bool(b)) => Some((alias, b.to_string())),
        _ => None,
    }
}

fn is_key(field: &Field) -> bool {
    matches!(field.storage_marker(), Some(Storage::PrimaryKey | Storage::ForeignKey))
}

fn render_type(ty: &Type) -> String {
    let mut rendered = match &ty.domain {
        Some(domain) => format!("{domain}::{}", ty.name),
        None => type_ident(&ty.name),
    };
    if ty.is_array {
        rendered = format!("Vec<{rendered}>");
    }
    if ty.nilable {
        rendered = format!("Option<{rendered}>");
    }
    rendered
}

fn write_doc(out: &mut String, indent: &str, comment: &str) {
    for line in comment.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            let _ = writeln!(out, "{indent}///");
        } else {
            let _ = writeln!(out, "{indent}/// {line}");
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NAMES
// ————————————————————————————————————————————————————————————————————————————

static IDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|_| unreachable!()));

/// Make `raw` a plain ASCII identifier: invalid characters become `_`, and a
/// leading digit gets a `_` prefix.
fn sanitize(raw: &str) -> String {
    if IDENT.is_match(raw) {
        return raw.to_string();
    }
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn type_ident(name: &str) -> String {
    let ident = sanitize(name);
    if is_rust_keyword(&ident) { format!("{ident}_") } else { ident }
}

fn field_ident(name: &str) -> String {
    let ident = sanitize(&to_snake_case(name));
    match ident.as_str() {
        // cannot be raw identifiers
        "self" | "Self" | "super" | "crate" | "_" => format!("{ident}_"),
        s if is_rust_keyword(s) => format!("r#{ident}"),
        _ => ident,
    }
}

/// `OrderLinesItemID` → `order_lines_item_id`. Acronym runs stay together.
fn to_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                result.push('_');
            }
            result.extend(c.to_lowercase());
            prev_lower = false;
        } else if c == '-' || c == ' ' {
            result.push('_');
            prev_lower = false;
        } else {
            result.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    result
}

fn is_rust_keyword(s: &str) -> bool {
    matches!(
        s,
        "as" | "async" | "await" | "break" | "const" | "continue" | "crate" | "dyn" |
        "else" | "enum" | "extern" | "false" | "fn" | "for" | "gen" | "if" | "impl" |
        "in" | "let" | "loop" | "match" | "mod" | "move" | "mut" | "pub" |
        "ref" | "return" | "self" | "Self" | "static" | "struct" | "super" |
        "trait" | "true" | "type" | "unsafe" | "use" | "where" | "while" |
        "abstract" | "become" | "box" | "do" | "final" | "macro" | "override" |
        "priv" | "try" | "typeof" | "unsized" | "virtual" | "yield"
    )
}
