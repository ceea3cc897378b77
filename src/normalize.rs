//! Collapse anonymous wrapper objects into their owners.
//!
//! Post-order: children are normalized before their parent looks at them, so
//! chains of unnamed wrappers fold away in a single pass. After this pass the
//! only `Definition::Object`s left are named, and every sub relation is named.

use crate::error::{Error, Result, ResultExt};
use crate::ir::{Definition, Object};

pub fn normalize(mut obj: Object) -> Result<Object> {
    let mut sub_relations = Vec::with_capacity(obj.sub_relations.len());
    for sub in std::mem::take(&mut obj.sub_relations) {
        let name = sub.name.clone();
        sub_relations.push(normalize(sub).within(|| format!("collection `{name}`"))?);
    }
    obj.sub_relations = sub_relations;

    let mut definitions = Vec::with_capacity(obj.definitions.len());
    for def in std::mem::take(&mut obj.definitions) {
        let child = match def {
            Definition::Object(child) => {
                normalize(child).within(|| format!("inside `{}`", display_name(&obj)))?
            }
            other => {
                definitions.push(other);
                continue;
            }
        };
        if child.is_named() {
            definitions.push(Definition::Object(child));
        } else {
            obj.fields.extend(child.fields);
            obj.sub_relations.extend(child.sub_relations);
            definitions.extend(child.definitions);
        }
    }
    obj.definitions = definitions;

    if obj.sub_relations.iter().any(|sub| !sub.is_named()) {
        return Err(Error::structure(
            display_name(&obj),
            "collection element type has no name; array items must be objects",
        ));
    }
    Ok(obj)
}

fn display_name(obj: &Object) -> String {
    if obj.is_named() { obj.name.clone() } else { "<anonymous>".to_string() }
}
