// Entity IR for codegen. No schema types here.

use indexmap::IndexMap;
use serde_json::Value;

/// Name of the synthetic identity field added to every identity scope.
pub const IDENTITY_FIELD: &str = "ID";
/// Scalar type of identity and foreign-key fields.
pub const KEY_TYPE: &str = "u64";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    pub name: String, // empty ⇒ anonymous, gets inlined by normalize
    pub comment: String,
    pub fields: Vec<Field>, // stored order is emitted order
    pub definitions: Vec<Definition>,
    pub sub_relations: Vec<Object>, // owned one-to-many collections
}

impl Object {
    pub fn named(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self { name: name.into(), comment: comment.into(), ..Self::default() }
    }

    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn sub_relation(&self, name: &str) -> Option<&Object> {
        self.sub_relations.iter().find(|o| o.name == name)
    }

    /// Nested compound definitions (skips aliases and enums).
    pub fn nested_objects(&self) -> impl Iterator<Item = &Object> {
        self.definitions.iter().filter_map(|d| match d {
            Definition::Object(o) => Some(o),
            _ => None,
        })
    }
}

/// Closed set of declarable IR kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Object(Object),
    Alias(Alias),
    Enum(Enum),
}

impl Definition {
    pub fn name(&self) -> &str {
        match self {
            Definition::Object(o) => &o.name,
            Definition::Alias(a) => &a.name,
            Definition::Enum(e) => &e.alias.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub tags: Tags,
    pub comment: String,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), ty, tags: Tags::new(), comment: String::new() }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Serialization key; `omit_empty` appends the omit-if-empty marker.
    pub fn serialized_as(mut self, key: &str, omit_empty: bool) -> Self {
        let value = if omit_empty { format!("{key},{OMIT_EMPTY}") } else { key.to_string() };
        self.tags.insert(TagKey::Serde, value);
        self
    }

    pub fn not_serialized(mut self) -> Self {
        self.tags.insert(TagKey::Serde, SKIP.to_string());
        self
    }

    pub fn storage(mut self, marker: Storage) -> Self {
        self.tags.insert(TagKey::Storage, marker.as_str().to_string());
        self
    }

    /// The synthetic primary identity of an identity scope.
    pub fn identity() -> Self {
        Field::new(IDENTITY_FIELD, Type::builtin(KEY_TYPE))
            .not_serialized()
            .storage(Storage::PrimaryKey)
            .with_comment("primary key")
    }

    /// Back-reference from an owned collection element to its owner.
    pub fn foreign_key(owner: &str) -> Self {
        Field::new(format!("{owner}{IDENTITY_FIELD}"), Type::builtin(KEY_TYPE))
            .not_serialized()
            .storage(Storage::ForeignKey)
            .with_comment(format!("foreign key to {owner}"))
    }

    pub fn serde_tag(&self) -> Option<SerdeTag<'_>> {
        let raw = self.tags.get(&TagKey::Serde)?;
        if raw == SKIP {
            return Some(SerdeTag::Skip);
        }
        Some(match raw.split_once(',') {
            Some((key, OMIT_EMPTY)) => SerdeTag::Key { key, omit_empty: true },
            _ => SerdeTag::Key { key: raw.as_str(), omit_empty: false },
        })
    }

    pub fn storage_marker(&self) -> Option<Storage> {
        self.tags.get(&TagKey::Storage).and_then(|s| Storage::parse(s))
    }
}

pub type Tags = IndexMap<TagKey, String>;

const SKIP: &str = "-";
const OMIT_EMPTY: &str = "omitempty";

/// Serialization concern a tag value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagKey {
    /// External (JSON) key: `name`, `name,omitempty`, or `-`.
    Serde,
    /// Relational storage marker, see [`Storage`].
    Storage,
}

/// Decoded [`TagKey::Serde`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerdeTag<'a> {
    Key { key: &'a str, omit_empty: bool },
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Embedded,
    HasMany,
    PrimaryKey,
    ForeignKey,
}

impl Storage {
    pub fn as_str(self) -> &'static str {
        match self {
            Storage::Embedded => "embedded",
            Storage::HasMany => "has_many",
            Storage::PrimaryKey => "primary_key",
            Storage::ForeignKey => "foreign_key",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "embedded" => Some(Storage::Embedded),
            "has_many" => Some(Storage::HasMany),
            "primary_key" => Some(Storage::PrimaryKey),
            "foreign_key" => Some(Storage::ForeignKey),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub name: String,
    pub comment: String,
    pub base: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    pub alias: Alias,
    pub values: Vec<Value>, // verbatim from the schema, order preserved
}

impl Enum {
    pub fn name(&self) -> &str {
        &self.alias.name
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Type {
    pub name: String,
    pub domain: Option<String>, // qualifying namespace; None = built-in or local
    pub nilable: bool,
    pub is_array: bool,
}

impl Type {
    pub fn builtin(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn qualified(domain: impl Into<String>, name: impl Into<String>) -> Self {
        Self { name: name.into(), domain: Some(domain.into()), ..Self::default() }
    }

    pub fn nilable(mut self, nilable: bool) -> Self {
        self.nilable = nilable;
        self
    }

    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }
}

// Scalar targets for schema primitives.
pub mod scalar {
    use super::Type;

    pub fn text() -> Type {
        Type::builtin("String")
    }

    pub fn integer() -> Type {
        Type::builtin("i64")
    }

    pub fn float() -> Type {
        Type::builtin("f64")
    }

    pub fn boolean() -> Type {
        Type::builtin("bool")
    }

    pub fn date() -> Type {
        Type::qualified("chrono", "NaiveDate")
    }

    pub fn date_time() -> Type {
        Type::qualified("chrono", "DateTime<chrono::Utc>")
    }
}
