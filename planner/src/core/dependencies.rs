//! Task dependency values and their storage normalization.
//!
//! Generators return dependencies either as a string or as a list of
//! prerequisite descriptions. Storage keeps a single string column, so lists are
//! JSON-encoded on write and rendered back as a comma-joined string on read.
//! A task with no `dependencies` value at all is modelled one level up, as
//! `Option<DependencySpec>` on the task.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Literal used for "no prerequisites" on the wire and in storage.
pub const NO_DEPENDENCIES: &str = "None";

/// Prerequisites of a task.
///
/// Wire form: `"None"` is [`DependencySpec::None`]; any other string is
/// [`DependencySpec::Text`]; an array is [`DependencySpec::List`]. Number and
/// boolean list items are kept as their JSON text (`[1, 2]` reads as `"1"`, `"2"`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DependencySpec {
    #[default]
    None,
    Text(String),
    List(Vec<String>),
}

impl DependencySpec {
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value == NO_DEPENDENCIES {
            DependencySpec::None
        } else {
            DependencySpec::Text(value)
        }
    }

    /// Storage form of the dependencies.
    pub fn to_stored(&self) -> String {
        match self {
            DependencySpec::None => NO_DEPENDENCIES.to_string(),
            DependencySpec::Text(text) => text.clone(),
            // Encoding a list of strings cannot fail.
            DependencySpec::List(items) => {
                serde_json::to_string(items).unwrap_or_else(|_| items.join(", "))
            }
        }
    }
}

/// Render a stored dependencies string for API responses.
///
/// A JSON array of strings becomes `"A, B"`; anything else (e.g. `"None"` or
/// free text) is returned unchanged.
pub fn render_stored_dependencies(stored: &str) -> String {
    match serde_json::from_str::<Vec<String>>(stored) {
        Ok(items) => items.join(", "),
        Err(_) => stored.to_string(),
    }
}

impl Serialize for DependencySpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DependencySpec::None => serializer.serialize_str(NO_DEPENDENCIES),
            DependencySpec::Text(text) => serializer.serialize_str(text),
            DependencySpec::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for DependencySpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DependencySpecVisitor)
    }
}

struct DependencySpecVisitor;

impl<'de> Visitor<'de> for DependencySpecVisitor {
    type Value = DependencySpec;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or a list of strings, numbers or booleans")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(DependencySpec::text(value))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(DependencySpec::text(value))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            let item = match item {
                Value::String(text) => text,
                scalar @ (Value::Number(_) | Value::Bool(_)) => scalar.to_string(),
                _ => {
                    return Err(de::Error::invalid_type(
                        de::Unexpected::Other("null, array or object list item"),
                        &self,
                    ));
                }
            };
            items.push(item);
        }
        Ok(DependencySpec::List(items))
    }
}
