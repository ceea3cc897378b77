//! Wire identity and foreign keys into a normalized tree.
//!
//! Pre-order from the root with `owner` = root name:
//! - the object named `owner` gets an identity field
//! - nested named definitions are visited with the same `owner`
//! - every sub relation gets `<owner>ID`, then starts its own scope

use crate::ir::{Definition, Field, Object};

pub fn associate(mut root: Object) -> Object {
    let owner = root.name.clone();
    synthesize(&mut root, &owner);
    root
}

fn synthesize(obj: &mut Object, owner: &str) {
    if obj.name == owner {
        obj.fields.push(Field::identity());
    }

    for def in &mut obj.definitions {
        if let Definition::Object(nested) = def {
            synthesize(nested, owner);
        }
    }

    for sub in &mut obj.sub_relations {
        sub.fields.push(Field::foreign_key(owner));
        let scope = sub.name.clone();
        synthesize(sub, &scope);
    }
}
