//! Compile a JSON Schema document into a relational entity model.
//!
//! ```text
//! schema ──build──▶ raw tree ──normalize──▶ named tree ──associate──▶ model
//! ```
//!
//! The model ([`ir::Object`]) is handed to [`codegen::declarations`] and from
//! there to a renderer such as [`codegen::rust::render`].
pub mod associate;
pub mod build;
pub mod cli;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod normalize;
pub mod path;
pub mod path_de;
pub mod schema;

use tracing::debug;

pub use error::{Error, ErrorKind, Result};
pub use ir::Object;
pub use schema::SchemaDocument;

/// build → normalize → associate.
pub fn compile(doc: &SchemaDocument) -> Result<Object> {
    let raw = build::TreeBuilder::build_document(doc)?;
    debug!(
        root = %raw.name,
        definitions = raw.definitions.len(),
        relations = raw.sub_relations.len(),
        "built"
    );

    let normalized = normalize::normalize(raw)?;
    debug!(
        root = %normalized.name,
        fields = normalized.fields.len(),
        relations = normalized.sub_relations.len(),
        "normalized"
    );

    let model = associate::associate(normalized);
    debug!(root = %model.name, "associated");
    Ok(model)
}

/// Decode and compile. `fallback_id` names the root when it has no `$id`.
pub fn compile_str(source: &str, fallback_id: &str) -> Result<Object> {
    let mut doc: SchemaDocument = source.parse()?;
    doc.ensure_id(fallback_id);
    compile(&doc)
}
