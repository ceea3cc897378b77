use std::collections::BTreeSet;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, SeqAccess, Visitor};

/// One JSON Schema `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    Array,
    Object,
}

impl SchemaType {
    /// Tags that map onto a scalar field type. `null` alone does not.
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            SchemaType::String | SchemaType::Integer | SchemaType::Number | SchemaType::Boolean
        )
    }
}

/// The `type` keyword: a single tag or a list of tags, membership-tested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeSet(BTreeSet<SchemaType>);

impl TypeSet {
    pub fn contains(&self, ty: SchemaType) -> bool {
        self.0.contains(&ty)
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = SchemaType> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<SchemaType> for TypeSet {
    fn from_iter<I: IntoIterator<Item = SchemaType>>(iter: I) -> Self {
        TypeSet(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for TypeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TypeSetVisitor;

        impl<'de> Visitor<'de> for TypeSetVisitor {
            type Value = TypeSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a type name or a list of type names")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TypeSet, E> {
                // `"type": ""` carries no constraint
                if v.is_empty() {
                    return Ok(TypeSet::default());
                }
                let ty = SchemaType::deserialize(de::value::StrDeserializer::<E>::new(v))?;
                Ok(TypeSet(BTreeSet::from([ty])))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<TypeSet, A::Error> {
                let mut out = BTreeSet::new();
                while let Some(ty) = seq.next_element::<SchemaType>()? {
                    out.insert(ty);
                }
                Ok(TypeSet(out))
            }
        }

        deserializer.deserialize_any(TypeSetVisitor)
    }
}
