//! Schema → entity tree.
//!
//! Every call returns an [`Object`]: named for object schemas, a minimal
//! unnamed wrapper holding one field (primitives) or one sub relation (arrays)
//! otherwise. `normalize` collapses the wrappers afterwards.

use tracing::trace;

use crate::error::{Error, Result, ResultExt};
use crate::ir::{Alias, Definition, Enum, Field, Object, Storage, Type, scalar};
use crate::path::{self, NameRegistry, Resolver};
use crate::schema::{SchemaDocument, SchemaType, SubSchema};

/// Per-step context: is the current node required by its parent, and where is it.
#[derive(Debug, Clone)]
pub struct Cursor {
    pub require: bool,
    pub path: String,
}

impl Cursor {
    pub fn root(id: &str) -> Self {
        Self { require: false, path: path::root_path(id) }
    }

    fn property(&self, name: &str, require: bool) -> Self {
        Self { require, path: path::child_path(&self.path, name) }
    }

    fn item(&self) -> Self {
        Self { require: false, path: path::item_path(&self.path) }
    }
}

pub struct TreeBuilder<'a> {
    resolver: Resolver<'a>,
    names: NameRegistry,
    expanding: Vec<String>, // refs currently being expanded
}

impl<'a> TreeBuilder<'a> {
    pub fn new(resolver: Resolver<'a>) -> Self {
        Self { resolver, names: NameRegistry::new(), expanding: Vec::new() }
    }

    /// Build the root entity of a document. The root must be a named object.
    pub fn build_document(doc: &'a SchemaDocument) -> Result<Object> {
        let id = doc.root.id.as_deref().unwrap_or_default();
        let cursor = Cursor::root(id);
        if !doc.root.is_object() {
            return Err(Error::structure(&cursor.path, "root schema must be an object"));
        }
        let root = TreeBuilder::new(doc.resolver()).build(&cursor, &doc.root)?;
        if !root.is_named() {
            return Err(Error::structure(
                &cursor.path,
                "root schema has no `$id` to derive a name from",
            ));
        }
        Ok(root)
    }

    pub fn build(&mut self, cursor: &Cursor, schema: &SubSchema) -> Result<Object> {
        if schema.is_object() {
            trace!(path = %cursor.path, "object");
            self.build_object(cursor, schema)
        } else if schema.is_primitive() {
            trace!(path = %cursor.path, "primitive");
            self.build_primitive(cursor, schema)
        } else if schema.is_array() {
            trace!(path = %cursor.path, "array");
            self.build_array(cursor, schema)
        } else if let Some(reference) = schema.reference.as_deref() {
            trace!(path = %cursor.path, reference, "ref");
            self.build_ref(cursor, reference)
        } else {
            Err(Error::structure(&cursor.path, "node is not an object, primitive, array or $ref"))
        }
    }

    fn build_object(&mut self, cursor: &Cursor, schema: &SubSchema) -> Result<Object> {
        let name = path::path_to_name(&cursor.path);
        self.names.claim(&name, &cursor.path)?;
        let mut obj = Object::named(name, schema.comment());

        for (property, property_schema) in &schema.properties {
            let require = schema.is_required(property);
            let child = self
                .build(&cursor.property(property, require), property_schema)
                .within(|| format!("property `{property}`"))?;

            if child.is_named() {
                let nilable = !require;
                let ty = Type::builtin(child.name.clone()).nilable(nilable);
                let field = Field::new(path::capitalize(property), ty)
                    .serialized_as(property, nilable)
                    .storage(Storage::Embedded);
                obj.fields.push(field);
            }
            obj.definitions.push(Definition::Object(child));
        }
        Ok(obj)
    }

    fn build_primitive(&mut self, cursor: &Cursor, schema: &SubSchema) -> Result<Object> {
        let mut obj = Object::default();
        let nilable = !cursor.require;
        let mut ty = primitive_type(schema)
            .ok_or_else(|| Error::structure(&cursor.path, "no primitive type"))?;

        if let Some(values) = schema.enum_values.as_ref().filter(|v| !v.is_empty()) {
            let name = path::path_to_name(&cursor.path);
            self.names.claim(&name, &cursor.path)?;
            let alias = Alias { name: name.clone(), comment: schema.comment(), base: ty };
            obj.definitions.push(Definition::Enum(Enum { alias, values: values.clone() }));
            ty = Type::builtin(name);
        }

        let key = path::last_segment(&cursor.path);
        let field = Field::new(path::capitalize(&key), ty.nilable(nilable))
            .serialized_as(&key, nilable)
            .with_comment(schema.comment());
        obj.fields.push(field);
        Ok(obj)
    }

    fn build_array(&mut self, cursor: &Cursor, schema: &SubSchema) -> Result<Object> {
        let items = schema
            .items
            .as_deref()
            .ok_or_else(|| Error::structure(&cursor.path, "array without `items`"))?;
        let key = path::last_segment(&cursor.path);
        let item = self.build(&cursor.item(), items).within(|| format!("items of `{key}`"))?;

        let ty = Type::builtin(item.name.clone()).array();
        let field = Field::new(path::pluralize(&item.name), ty)
            .serialized_as(&key, false)
            .storage(Storage::HasMany)
            .with_comment(schema.comment());

        let mut obj = Object::default();
        obj.fields.push(field);
        obj.sub_relations.push(item);
        Ok(obj)
    }

    /// Expand the referenced definition in place of the referencing node:
    /// same cursor, so the result takes the referencing node's name.
    fn build_ref(&mut self, cursor: &Cursor, reference: &str) -> Result<Object> {
        if self.expanding.iter().any(|r| r == reference) {
            return Err(Error::RecursiveRef { reference: reference.to_string() });
        }
        let target = self.resolver.resolve(reference)?;
        self.expanding.push(reference.to_string());
        let result = self.build(cursor, target).within(|| format!("$ref `{reference}`"));
        self.expanding.pop();
        result
    }
}

fn primitive_type(schema: &SubSchema) -> Option<Type> {
    let types = &schema.types;
    if types.contains(SchemaType::String) {
        Some(match schema.format.as_deref() {
            Some("date") => scalar::date(),
            Some("date-time") => scalar::date_time(),
            _ => scalar::text(),
        })
    } else if types.contains(SchemaType::Integer) {
        Some(scalar::integer())
    } else if types.contains(SchemaType::Number) {
        Some(scalar::float())
    } else if types.contains(SchemaType::Boolean) {
        Some(scalar::boolean())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ir::{SerdeTag, TagKey};
    use serde_json::json;

    fn document(value: serde_json::Value) -> SchemaDocument {
        value.to_string().parse().unwrap()
    }

    fn build(value: serde_json::Value) -> Result<Object> {
        let doc = document(value);
        TreeBuilder::build_document(&doc)
    }

    fn child(obj: &Object, i: usize) -> &Object {
        match &obj.definitions[i] {
            Definition::Object(o) => o,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn primitives_are_wrapped_in_unnamed_objects() {
        let root = build(json!({
            "$id": "order.json",
            "type": "object",
            "required": ["id"],
            "properties": { "id": { "type": "string" }, "qty": { "type": "integer" } }
        }))
        .unwrap();

        assert_eq!(root.name, "Order");
        assert!(root.fields.is_empty());
        assert_eq!(root.definitions.len(), 2);

        let id = child(&root, 0);
        assert!(!id.is_named());
        assert_eq!(id.fields.len(), 1);
        assert_eq!(id.fields[0].name, "Id");
        assert_eq!(id.fields[0].ty, scalar::text());
        assert_eq!(id.fields[0].serde_tag(), Some(SerdeTag::Key { key: "id", omit_empty: false }));

        let qty = &child(&root, 1).fields[0];
        assert_eq!(qty.ty, scalar::integer().nilable(true));
        assert_eq!(qty.tags[&TagKey::Serde], "qty,omitempty");
    }

    #[test]
    fn scalar_mapping() {
        let root = build(json!({
            "$id": "t.json",
            "type": "object",
            "required": ["s", "i", "n", "b", "d", "dt"],
            "properties": {
                "s": { "type": "string" },
                "i": { "type": "integer" },
                "n": { "type": "number" },
                "b": { "type": "boolean" },
                "d": { "type": "string", "format": "date" },
                "dt": { "type": "string", "format": "date-time" }
            }
        }))
        .unwrap();
        let tys: Vec<Type> = (0..6).map(|i| child(&root, i).fields[0].ty.clone()).collect();
        assert_eq!(
            tys,
            vec![
                scalar::text(),
                scalar::integer(),
                scalar::float(),
                scalar::boolean(),
                scalar::date(),
                scalar::date_time(),
            ]
        );
        assert_eq!(tys[4].domain.as_deref(), Some("chrono"));
    }

    #[test]
    fn nullability_rules() {
        let root = build(json!({
            "$id": "t.json",
            "type": "object",
            "required": ["req", "req_null"],
            "properties": {
                "req": { "type": "string" },
                "req_null": { "type": ["string", "null"] },
                "opt": { "type": "string" }
            }
        }))
        .unwrap();
        assert!(!child(&root, 0).fields[0].ty.nilable);
        // required wins over an explicit null
        let req_null = &child(&root, 1).fields[0];
        assert!(!req_null.ty.nilable);
        assert_eq!(req_null.tags[&TagKey::Serde], "req_null");
        assert!(child(&root, 2).fields[0].ty.nilable);
    }

    #[test]
    fn enum_becomes_alias_definition() {
        let root = build(json!({
            "$id": "root.json",
            "type": "object",
            "properties": { "color": { "type": "string", "enum": ["A", "B"], "description": "paint" } }
        }))
        .unwrap();
        let wrapper = child(&root, 0);
        let Definition::Enum(e) = &wrapper.definitions[0] else { panic!("expected enum") };
        assert_eq!(e.name(), "RootColor");
        assert_eq!(e.alias.base, scalar::text());
        assert_eq!(e.alias.comment, "paint");
        assert_eq!(e.values, vec![json!("A"), json!("B")]);
        assert_eq!(wrapper.fields[0].ty, Type::builtin("RootColor").nilable(true));
    }

    #[test]
    fn empty_enum_is_plain_scalar() {
        let root = build(json!({
            "$id": "root.json",
            "type": "object",
            "properties": { "color": { "type": "string", "enum": [] } }
        }))
        .unwrap();
        let wrapper = child(&root, 0);
        assert!(wrapper.definitions.is_empty());
        assert_eq!(wrapper.fields[0].ty.name, "String");
    }

    #[test]
    fn nested_object_gets_embedded_field() {
        let root = build(json!({
            "$id": "user.json",
            "type": "object",
            "required": ["address"],
            "properties": {
                "address": { "type": "object", "properties": { "city": { "type": "string" } } },
                "billing": { "type": "object", "properties": { "zip": { "type": "string" } } }
            }
        }))
        .unwrap();
        assert_eq!(root.fields.len(), 2);
        let address = &root.fields[0];
        assert_eq!(address.name, "Address");
        assert_eq!(address.ty, Type::builtin("UserAddress"));
        assert_eq!(address.storage_marker(), Some(Storage::Embedded));
        assert_eq!(address.serde_tag(), Some(SerdeTag::Key { key: "address", omit_empty: false }));

        let billing = &root.fields[1];
        assert!(billing.ty.nilable);
        assert_eq!(billing.serde_tag(), Some(SerdeTag::Key { key: "billing", omit_empty: true }));
        assert_eq!(child(&root, 1).name, "UserBilling");
    }

    #[test]
    fn array_becomes_sub_relation() {
        let root = build(json!({
            "$id": "order.json",
            "type": "object",
            "properties": {
                "items": { "type": "array", "items": { "type": "object", "properties": { "sku": { "type": "string" } } } }
            }
        }))
        .unwrap();
        let wrapper = child(&root, 0);
        assert!(!wrapper.is_named());
        assert_eq!(wrapper.sub_relations.len(), 1);
        assert_eq!(wrapper.sub_relations[0].name, "OrderItemsItem");

        let field = &wrapper.fields[0];
        assert_eq!(field.name, "OrderItemsItems");
        assert_eq!(field.ty, Type::builtin("OrderItemsItem").array());
        assert_eq!(field.storage_marker(), Some(Storage::HasMany));
        assert_eq!(field.serde_tag(), Some(SerdeTag::Key { key: "items", omit_empty: false }));
    }

    #[test]
    fn ref_is_transparent() {
        let referenced = build(json!({
            "$id": "doc.json",
            "type": "object",
            "$defs": { "Address": { "type": "object", "properties": { "city": { "type": "string" } } } },
            "properties": { "home": { "$ref": "#/$defs/Address" } }
        }))
        .unwrap();
        let inlined = build(json!({
            "$id": "doc.json",
            "type": "object",
            "properties": { "home": { "type": "object", "properties": { "city": { "type": "string" } } } }
        }))
        .unwrap();
        assert_eq!(referenced, inlined);
        assert_eq!(child(&referenced, 0).name, "DocHome");
    }

    #[test]
    fn one_definition_referenced_twice_gets_two_names() {
        let root = build(json!({
            "$id": "doc.json",
            "type": "object",
            "$defs": { "Address": { "type": "object", "properties": { "city": { "type": "string" } } } },
            "properties": {
                "home": { "$ref": "#/$defs/Address" },
                "work": { "$ref": "#/definitions/Address" }
            }
        }))
        .unwrap();
        assert_eq!(child(&root, 0).name, "DocHome");
        assert_eq!(child(&root, 1).name, "DocWork");
    }

    #[test]
    fn untyped_node_is_structure_error_with_breadcrumbs() {
        let err = build(json!({
            "$id": "doc.json",
            "type": "object",
            "properties": { "a": { "type": "object", "properties": { "b": { "description": "??" } } } }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);
        assert_eq!(err.breadcrumbs(), vec!["property `a`", "property `b`"]);
        assert!(err.to_string().contains("doc.json#/a/b"));
    }

    #[test]
    fn ref_errors() {
        let err = build(json!({
            "$id": "doc.json",
            "type": "object",
            "properties": { "a": { "$ref": "other.json#/$defs/A" } }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedRef);

        let err = build(json!({
            "$id": "doc.json",
            "type": "object",
            "properties": { "a": { "$ref": "#/$defs/Missing" } }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RefResolution);
    }

    #[test]
    fn recursive_ref_is_rejected() {
        let err = build(json!({
            "$id": "tree.json",
            "type": "object",
            "$defs": {
                "Node": { "type": "object", "properties": { "child": { "$ref": "#/$defs/Node" } } }
            },
            "properties": { "root": { "$ref": "#/$defs/Node" } }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecursiveRef);
        assert_eq!(err.breadcrumbs()[0], "property `root`");
    }

    #[test]
    fn name_collision_is_rejected() {
        let err = build(json!({
            "$id": "doc.json",
            "type": "object",
            "properties": {
                "a_b": { "type": "object", "properties": { "x": { "type": "string" } } },
                "aB": { "type": "object", "properties": { "y": { "type": "string" } } }
            }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NameCollision);
    }

    #[test]
    fn root_must_be_a_named_object() {
        let err = build(json!({ "$id": "doc.json", "type": "string" })).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);

        let err = build(json!({ "type": "object", "properties": { "a": { "type": "string" } } }))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);
    }

    #[test]
    fn array_without_items_fails() {
        let err = build(json!({
            "$id": "doc.json",
            "type": "object",
            "properties": { "tags": { "type": "array" } }
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);
    }
}
