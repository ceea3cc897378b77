//! Emitter boundary: flatten a finished entity tree into declarations.
//!
//! This is a read-only walk; every field property (key, nilability, storage
//! marker, comment) comes straight from the IR. Rendering to source text is
//! left to a backend such as [`rust`].
pub mod rust;

use serde_json::Value;

use crate::ir::{Alias, Definition, Enum, Field, Object, Storage, Type};
use crate::path;

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Struct {
        name: String,
        comment: String,
        fields: Vec<Field>,
    },
    Alias {
        name: String,
        comment: String,
        base: Type,
    },
    Const {
        name: String,
        /// Alias the constant belongs to.
        ty: String,
        value: Value,
    },
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Struct { name, .. }
            | Declaration::Alias { name, .. }
            | Declaration::Const { name, .. } => name,
        }
    }
}

/// Declarations for a whole tree, in emission order: an object, then its
/// definitions, then its sub relations, recursively.
pub fn declarations(root: &Object) -> Vec<Declaration> {
    let mut out = Vec::new();
    emit_object(root, &mut out);
    out
}

fn emit_object(obj: &Object, out: &mut Vec<Declaration>) {
    let mut fields = obj.fields.clone();
    for sub in &obj.sub_relations {
        if !has_collection_field(obj, &sub.name) {
            fields.push(
                Field::new(path::pluralize(&sub.name), Type::builtin(sub.name.clone()).array())
                    .storage(Storage::HasMany)
                    .with_comment(format!("sub relation of {}", obj.name)),
            );
        }
    }
    out.push(Declaration::Struct {
        name: obj.name.clone(),
        comment: obj.comment.clone(),
        fields,
    });

    for def in &obj.definitions {
        emit_definition(def, out);
    }
    for sub in &obj.sub_relations {
        emit_object(sub, out);
    }
}

fn emit_definition(def: &Definition, out: &mut Vec<Declaration>) {
    match def {
        Definition::Object(obj) => emit_object(obj, out),
        Definition::Alias(alias) => emit_alias(alias, out),
        Definition::Enum(e) => emit_enum(e, out),
    }
}

fn emit_alias(alias: &Alias, out: &mut Vec<Declaration>) {
    out.push(Declaration::Alias {
        name: alias.name.clone(),
        comment: alias.comment.clone(),
        base: alias.base.clone(),
    });
}

fn emit_enum(e: &Enum, out: &mut Vec<Declaration>) {
    emit_alias(&e.alias, out);
    for value in &e.values {
        out.push(Declaration::Const {
            name: format!("{}_{}", e.name(), literal_text(value)),
            ty: e.name().to_string(),
            value: value.clone(),
        });
    }
}

/// Builder-produced trees already carry a `has_many` field per relation.
fn has_collection_field(obj: &Object, relation: &str) -> bool {
    obj.fields.iter().any(|f| f.ty.is_array && f.ty.name == relation)
}

fn literal_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
