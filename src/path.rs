//! Logical schema paths and the names derived from them.
//!
//! A path is `<base URI>#<fragment>`, rooted at the document's `$id`. Each
//! property step appends `/<property>` (JSON-pointer escaped) and each array
//! step appends `/item`. Entity names are a pure function of the path:
//!
//! ```text
//! order.json#/items/item  →  Order + Items + Item  →  OrderItemsItem
//! ```
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::schema::{Definitions, SubSchema};

/// Path segment appended when descending into an array's `items`.
pub const ITEM_SEGMENT: &str = "item";

pub fn root_path(id: &str) -> String {
    format!("{id}#")
}

pub fn child_path(path: &str, property: &str) -> String {
    format!("{path}/{}", escape_segment(property))
}

pub fn item_path(path: &str) -> String {
    format!("{path}/{ITEM_SEGMENT}")
}

/// The last fragment segment, unescaped. Falls back to the seed token when the
/// fragment is empty.
pub fn last_segment(path: &str) -> String {
    let (base, fragment) = split_path(path);
    match fragment.rsplit_once('/') {
        Some((_, last)) => unescape_segment(last),
        None => seed_token(base).to_string(),
    }
}

/// Derive an entity name from a path.
///
/// Seed token: last segment of the base URI, cut at its first `.`. Then every
/// fragment segment is appended in capitalized form.
pub fn path_to_name(path: &str) -> String {
    let (base, fragment) = split_path(path);
    let mut name = capitalize(seed_token(base));
    for segment in fragment.split('/') {
        name.push_str(&capitalize(&unescape_segment(segment)));
    }
    name
}

/// Upper-case the first character of each alphanumeric run and join the runs:
/// `foo_bar` → `FooBar`, `a` → `A`, `OrderID` → `OrderID`.
pub fn capitalize(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for word in token.split(|c: char| !c.is_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

pub fn pluralize(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| lower.ends_with(suffix)) {
        return format!("{name}es");
    }
    if let Some(stem) = name.strip_suffix(['y', 'Y']) {
        let before_y = stem.chars().last();
        if before_y.is_some_and(|c| !"aeiouAEIOU".contains(c)) {
            return format!("{stem}ies");
        }
    }
    format!("{name}s")
}

fn split_path(path: &str) -> (&str, &str) {
    path.split_once('#').unwrap_or((path, ""))
}

fn seed_token(base: &str) -> &str {
    let base = base.split(['?']).next().unwrap_or(base);
    let file = base.rsplit('/').next().unwrap_or(base);
    file.split('.').next().unwrap_or(file)
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

// ————————————————————————————————————————————————————————————————————————————
// REFS
// ————————————————————————————————————————————————————————————————————————————

/// Resolves same-document `$ref` fragments against one document's
/// definitions. Scoped to a single compile; never stored globally.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    definitions: &'a Definitions,
}

impl<'a> Resolver<'a> {
    pub fn new(definitions: &'a Definitions) -> Self {
        Self { definitions }
    }

    /// Accepts exactly `#/$defs/<name>` or the legacy `#/definitions/<name>`.
    pub fn resolve(&self, reference: &str) -> Result<&'a SubSchema> {
        let unsupported = || Error::UnsupportedRef { reference: reference.to_string() };
        let fragment = reference.strip_prefix('#').ok_or_else(unsupported)?;
        let segments: Vec<&str> = fragment.split('/').collect();
        let name = match segments.as_slice() {
            ["", "$defs" | "definitions", name] if !name.is_empty() => unescape_segment(name),
            _ => return Err(unsupported()),
        };
        self.definitions.get(&name).ok_or_else(|| Error::RefResolution {
            reference: reference.to_string(),
            name,
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NAME REGISTRY
// ————————————————————————————————————————————————————————————————————————————

/// Remembers which path claimed each entity name during one compile.
#[derive(Debug, Default)]
pub struct NameRegistry {
    claimed: HashMap<String, String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, name: &str, path: &str) -> Result<()> {
        if name.is_empty() {
            return Ok(());
        }
        match self.claimed.get(name) {
            Some(first) if first != path => Err(Error::NameCollision {
                name: name.to_string(),
                first: first.clone(),
                second: path.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.claimed.insert(name.to_string(), path.to_string());
                Ok(())
            }
        }
    }
}
