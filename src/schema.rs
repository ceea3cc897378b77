//! JSON Schema document model (draft 2020-12, with draft-04 fallbacks).
//!
//! Decoding rules:
//! - boolean schemas: `true` ⇒ `{}`, `false` ⇒ `{"not": {}}`
//! - `$defs` falls back to legacy `definitions`; `$id` falls back to legacy `id`
//! - `type` may be a string or a list; both become a [`TypeSet`]
//!
//! Validation keywords are decoded so documents round-trip through the model,
//! but nothing here enforces them.
pub mod ty;

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::path::Resolver;

pub use ty::{SchemaType, TypeSet};

pub type Definitions = IndexMap<String, SubSchema>;

// ————————————————————————————————————————————————————————————————————————————
// DOCUMENT
// ————————————————————————————————————————————————————————————————————————————

/// A whole input document: root schema plus its definitions map.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(from = "RawDocument")]
pub struct SchemaDocument {
    pub definitions: Definitions,
    /// `$schema`
    pub version: Option<String>,
    pub root: SubSchema,
}

#[derive(serde::Deserialize)]
struct RawDocument {
    #[serde(rename = "$defs", default)]
    defs: Option<Definitions>,
    #[serde(default)]
    definitions: Option<Definitions>,
    #[serde(rename = "$schema", default)]
    version: Option<String>,
    #[serde(flatten)]
    root: SubSchema,
}

impl From<RawDocument> for SchemaDocument {
    fn from(raw: RawDocument) -> Self {
        SchemaDocument {
            definitions: raw.defs.or(raw.definitions).unwrap_or_default(),
            version: raw.version,
            root: raw.root,
        }
    }
}

impl FromStr for SchemaDocument {
    type Err = Error;

    fn from_str(src: &str) -> Result<Self> {
        crate::path_de::from_str_with_path(src)
    }
}

impl SchemaDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        crate::path_de::from_slice_with_path(bytes)
    }

    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        crate::path_de::from_reader_with_path(reader)
    }

    /// Give the root an identity when the document declares none.
    pub fn ensure_id(&mut self, fallback: &str) {
        if self.root.id.is_none() {
            self.root.id = Some(fallback.to_string());
        }
    }

    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.definitions)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SUBSCHEMA
// ————————————————————————————————————————————————————————————————————————————

/// `exclusiveMinimum` / `exclusiveMaximum`: a number since draft-06, a flag
/// modifying `minimum` / `maximum` in draft-04.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum ExclusiveBound {
    Limit(f64),
    Flag(bool),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubSchema {
    // identity
    pub id: Option<String>,
    pub reference: Option<String>,

    // metadata
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub deprecated: bool,
    pub read_only: bool,
    pub write_only: bool,
    pub examples: Vec<Value>,

    // validation, any instance
    pub types: TypeSet,
    pub enum_values: Option<Vec<Value>>,
    pub const_value: Option<Value>,
    // numeric
    pub multiple_of: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_maximum: Option<ExclusiveBound>,
    pub minimum: Option<f64>,
    pub exclusive_minimum: Option<ExclusiveBound>,
    // string
    pub max_length: Option<u64>,
    pub min_length: Option<u64>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    // array
    pub max_items: Option<u64>,
    pub min_items: Option<u64>,
    pub unique_items: bool,
    pub max_contains: Option<u64>,
    pub min_contains: Option<u64>,
    // object
    pub max_properties: Option<u64>,
    pub min_properties: Option<u64>,
    pub required: Vec<String>,
    pub dependent_required: IndexMap<String, Vec<String>>,

    // applicators
    pub all_of: Vec<SubSchema>,
    pub any_of: Vec<SubSchema>,
    pub one_of: Vec<SubSchema>,
    pub not: Option<Box<SubSchema>>,
    pub prefix_items: Vec<SubSchema>,
    pub items: Option<Box<SubSchema>>,
    pub contains: Option<Box<SubSchema>>,
    pub properties: IndexMap<String, SubSchema>,
    pub pattern_properties: IndexMap<String, SubSchema>,
    pub additional_properties: Option<Box<SubSchema>>,
    pub property_names: Option<Box<SubSchema>>,
}

impl SubSchema {
    /// The `false` schema.
    pub fn nothing() -> Self {
        SubSchema { not: Some(Box::default()), ..SubSchema::default() }
    }

    pub fn is_object(&self) -> bool {
        self.types.contains(SchemaType::Object) || !self.properties.is_empty()
    }

    pub fn is_primitive(&self) -> bool {
        self.types.iter().any(SchemaType::is_primitive)
    }

    pub fn is_array(&self) -> bool {
        self.types.contains(SchemaType::Array)
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|name| name == property)
    }

    /// `title: description`, or whichever of the two is present.
    pub fn comment(&self) -> String {
        match (self.title.as_deref(), self.description.as_deref()) {
            (Some(title), Some(description)) if !title.is_empty() && !description.is_empty() => {
                format!("{title}: {description}")
            }
            (Some(title), _) if !title.is_empty() => title.to_string(),
            (_, Some(description)) => description.to_string(),
            _ => String::new(),
        }
    }
}

impl<'de> Deserialize<'de> for SubSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SubSchemaVisitor;

        impl<'de> Visitor<'de> for SubSchemaVisitor {
            type Value = SubSchema;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a schema object or a boolean schema")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<SubSchema, E> {
                Ok(if v { SubSchema::default() } else { SubSchema::nothing() })
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                map: A,
            ) -> std::result::Result<SubSchema, A::Error> {
                let raw = RawSubSchema::deserialize(de::value::MapAccessDeserializer::new(map))?;
                Ok(raw.into())
            }
        }

        deserializer.deserialize_any(SubSchemaVisitor)
    }
}

#[derive(serde::Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct RawSubSchema {
    #[serde(rename = "$id")]
    id: Option<String>,
    #[serde(rename = "id")]
    legacy_id: Option<String>,
    #[serde(rename = "$ref")]
    reference: Option<String>,

    title: Option<String>,
    description: Option<String>,
    default: Option<Value>,
    deprecated: bool,
    read_only: bool,
    write_only: bool,
    examples: Vec<Value>,

    #[serde(rename = "type")]
    types: TypeSet,
    #[serde(rename = "enum")]
    enum_values: Option<Vec<Value>>,
    #[serde(rename = "const")]
    const_value: Option<Value>,
    multiple_of: Option<f64>,
    maximum: Option<f64>,
    exclusive_maximum: Option<ExclusiveBound>,
    minimum: Option<f64>,
    exclusive_minimum: Option<ExclusiveBound>,
    max_length: Option<u64>,
    min_length: Option<u64>,
    pattern: Option<String>,
    format: Option<String>,
    max_items: Option<u64>,
    min_items: Option<u64>,
    unique_items: bool,
    max_contains: Option<u64>,
    min_contains: Option<u64>,
    max_properties: Option<u64>,
    min_properties: Option<u64>,
    required: Vec<String>,
    dependent_required: IndexMap<String, Vec<String>>,

    all_of: Vec<SubSchema>,
    any_of: Vec<SubSchema>,
    one_of: Vec<SubSchema>,
    not: Option<Box<SubSchema>>,
    prefix_items: Vec<SubSchema>,
    items: Option<Box<SubSchema>>,
    contains: Option<Box<SubSchema>>,
    properties: IndexMap<String, SubSchema>,
    pattern_properties: IndexMap<String, SubSchema>,
    additional_properties: Option<Box<SubSchema>>,
    property_names: Option<Box<SubSchema>>,
}

impl From<RawSubSchema> for SubSchema {
    fn from(raw: RawSubSchema) -> Self {
        let id = raw.id.filter(|id| !id.is_empty()).or(raw.legacy_id.filter(|id| !id.is_empty()));
        SubSchema {
            id,
            reference: raw.reference.filter(|r| !r.is_empty()),
            title: raw.title,
            description: raw.description,
            default: raw.default,
            deprecated: raw.deprecated,
            read_only: raw.read_only,
            write_only: raw.write_only,
            examples: raw.examples,
            types: raw.types,
            enum_values: raw.enum_values,
            const_value: raw.const_value,
            multiple_of: raw.multiple_of,
            maximum: raw.maximum,
            exclusive_maximum: raw.exclusive_maximum,
            minimum: raw.minimum,
            exclusive_minimum: raw.exclusive_minimum,
            max_length: raw.max_length,
            min_length: raw.min_length,
            pattern: raw.pattern,
            format: raw.format,
            max_items: raw.max_items,
            min_items: raw.min_items,
            unique_items: raw.unique_items,
            max_contains: raw.max_contains,
            min_contains: raw.min_contains,
            max_properties: raw.max_properties,
            min_properties: raw.min_properties,
            required: raw.required,
            dependent_required: raw.dependent_required,
            all_of: raw.all_of,
            any_of: raw.any_of,
            one_of: raw.one_of,
            not: raw.not,
            prefix_items: raw.prefix_items,
            items: raw.items,
            contains: raw.contains,
            properties: raw.properties,
            pattern_properties: raw.pattern_properties,
            additional_properties: raw.additional_properties,
            property_names: raw.property_names,
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> SchemaDocument {
        value.to_string().parse().unwrap()
    }

    #[test]
    fn boolean_schemas() {
        let d = doc(json!({
            "type": "object",
            "properties": { "anything": true, "nothing": false }
        }));
        assert_eq!(d.root.properties["anything"], SubSchema::default());
        assert_eq!(d.root.properties["nothing"], SubSchema::nothing());
        assert_eq!(d.root.properties["nothing"].not.as_deref(), Some(&SubSchema::default()));
    }

    #[test]
    fn defs_preferred_over_legacy_definitions() {
        let d = doc(json!({
            "$defs": { "A": { "type": "string" } },
            "definitions": { "B": { "type": "string" } },
            "type": "object"
        }));
        assert!(d.definitions.contains_key("A"));
        assert!(!d.definitions.contains_key("B"));
    }

    #[test]
    fn legacy_definitions_used_when_defs_absent() {
        let d = doc(json!({
            "definitions": { "B": { "type": "integer" } },
            "type": "object"
        }));
        assert!(d.definitions["B"].types.contains(SchemaType::Integer));
    }

    #[test]
    fn legacy_id_fallback() {
        let d = doc(json!({ "id": "legacy.json", "type": "object" }));
        assert_eq!(d.root.id.as_deref(), Some("legacy.json"));

        let d = doc(json!({ "$id": "modern.json", "id": "legacy.json", "type": "object" }));
        assert_eq!(d.root.id.as_deref(), Some("modern.json"));
    }

    #[test]
    fn version_and_metadata() {
        let d = doc(json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "$id": "order.json",
            "title": "Order",
            "description": "A customer order",
            "type": "object"
        }));
        assert_eq!(d.version.as_deref(), Some("https://json-schema.org/draft/2020-12/schema"));
        assert_eq!(d.root.comment(), "Order: A customer order");
    }

    #[test]
    fn comment_falls_back_to_whichever_is_present() {
        let only_title = SubSchema { title: Some("T".into()), ..SubSchema::default() };
        let only_desc = SubSchema { description: Some("D".into()), ..SubSchema::default() };
        assert_eq!(only_title.comment(), "T");
        assert_eq!(only_desc.comment(), "D");
        assert_eq!(SubSchema::default().comment(), "");
    }

    #[test]
    fn constraint_keywords_are_decoded() {
        let d = doc(json!({
            "type": "object",
            "properties": {
                "n": { "type": "number", "minimum": 0, "exclusiveMaximum": 10.5 },
                "legacy": { "type": "number", "maximum": 3, "exclusiveMaximum": true },
                "s": { "type": "string", "maxLength": 8, "pattern": "^[a-z]+$" },
                "a": { "type": "array", "minItems": 1, "uniqueItems": true, "items": { "type": "string" } }
            },
            "required": ["n"]
        }));
        let n = &d.root.properties["n"];
        assert_eq!(n.minimum, Some(0.0));
        assert_eq!(n.exclusive_maximum, Some(ExclusiveBound::Limit(10.5)));
        assert_eq!(d.root.properties["legacy"].exclusive_maximum, Some(ExclusiveBound::Flag(true)));
        assert_eq!(d.root.properties["s"].max_length, Some(8));
        let a = &d.root.properties["a"];
        assert!(a.unique_items);
        assert!(a.items.as_ref().unwrap().types.contains(SchemaType::String));
        assert!(d.root.is_required("n"));
    }

    #[test]
    fn properties_keep_document_order() {
        let src = r#"{"type":"object","properties":{"z":{"type":"string"},"a":{"type":"string"}}}"#;
        let d: SchemaDocument = src.parse().unwrap();
        let keys: Vec<_> = d.root.properties.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a"]);
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = "{\"type\": ".parse::<SchemaDocument>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn bad_envelope_is_parse_error() {
        let err = r#"{"type":"object","properties":{"a":{"type":"strnig"}}}"#
            .parse::<SchemaDocument>()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);

        let err = "[1, 2]".parse::<SchemaDocument>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn ensure_id_only_fills_missing() {
        let mut d = doc(json!({ "type": "object" }));
        d.ensure_id("fallback.json");
        assert_eq!(d.root.id.as_deref(), Some("fallback.json"));

        let mut d = doc(json!({ "$id": "order.json", "type": "object" }));
        d.ensure_id("fallback.json");
        assert_eq!(d.root.id.as_deref(), Some("order.json"));
    }
}
