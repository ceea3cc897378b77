//! Error types for the schema → model pipeline.
//!
//! Errors raised deep inside the tree builder are wrapped in [`Error::Context`]
//! on the way out, one layer per recursive step, so the rendered message reads
//! as a breadcrumb from the schema root down to the failing node.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Malformed JSON, or JSON that does not decode into a schema document.
    #[error("parse error at JSON path {path} → {message}")]
    Parse { path: String, message: String },

    /// Malformed JSON with no value path to point at; serde_json's message
    /// already carries the line and column.
    #[error("parse error: {message}")]
    Syntax { message: String },

    /// Node that matches none of the object / primitive / array / ref rules,
    /// or a collection whose element type is still unnamed after normalization.
    #[error("structure error at {path}: {message}")]
    Structure { path: String, message: String },

    #[error(
        "unsupported $ref `{reference}`: only same-document `#/$defs/<name>` refs are resolved"
    )]
    UnsupportedRef { reference: String },

    #[error("cannot resolve $ref `{reference}`: no definition named `{name}`")]
    RefResolution { reference: String, name: String },

    #[error("$ref `{reference}` refers back to itself")]
    RecursiveRef { reference: String },

    #[error("entity name `{name}` derived from both `{first}` and `{second}`")]
    NameCollision { name: String, first: String, second: String },

    #[error("cannot emit `{entity}`: {message}")]
    Emit { entity: String, message: String },

    #[error("{context} → {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Flat classification of an [`Error`], ignoring any breadcrumb wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Structure,
    UnsupportedRef,
    RefResolution,
    RecursiveRef,
    NameCollision,
    Emit,
}

impl Error {
    pub fn structure(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Structure { path: path.into(), message: message.into() }
    }

    /// Push one breadcrumb onto this error.
    pub fn within(self, context: impl Into<String>) -> Self {
        Error::Context { context: context.into(), source: Box::new(self) }
    }

    /// The innermost error, with every breadcrumb peeled off.
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Breadcrumbs from the outermost (closest to the schema root) inward.
    pub fn breadcrumbs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut current = self;
        while let Error::Context { context, source } = current {
            out.push(context.as_str());
            current = source;
        }
        out
    }

    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            Error::Parse { .. } | Error::Syntax { .. } => ErrorKind::Parse,
            Error::Structure { .. } => ErrorKind::Structure,
            Error::UnsupportedRef { .. } => ErrorKind::UnsupportedRef,
            Error::RefResolution { .. } => ErrorKind::RefResolution,
            Error::RecursiveRef { .. } => ErrorKind::RecursiveRef,
            Error::NameCollision { .. } => ErrorKind::NameCollision,
            Error::Emit { .. } => ErrorKind::Emit,
            Error::Context { .. } => unreachable!("root_cause never returns a context layer"),
        }
    }
}

/// `.within(..)` for results, so call sites read `build(..).within(..)?`.
pub trait ResultExt<T> {
    fn within(self, context: impl FnOnce() -> String) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn within(self, context: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|error| error.within(context()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breadcrumbs_render_root_first() {
        let error = Error::structure("order.json#/a/b", "node has no type")
            .within("property `b`")
            .within("property `a`");
        assert_eq!(error.breadcrumbs(), vec!["property `a`", "property `b`"]);
        assert_eq!(error.kind(), ErrorKind::Structure);
        assert_eq!(
            error.to_string(),
            "property `a` → property `b` → structure error at order.json#/a/b: node has no type"
        );
    }

    #[test]
    fn unwrapped_error_has_no_breadcrumbs() {
        let error = Error::UnsupportedRef { reference: "other.json#/$defs/X".into() };
        assert!(error.breadcrumbs().is_empty());
        assert_eq!(error.kind(), ErrorKind::UnsupportedRef);
    }
}
