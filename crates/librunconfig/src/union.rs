//! Values that may be written as a single scalar or as a list of scalars.
//!
//! Older documents carry `"Entrypoint": "bash"` while newer ones carry
//! `"Entrypoint": ["bash"]`. Both decode into the same ordered sequence and
//! always encode back to the list form.

use std::fmt;
use std::ops::Deref;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected a scalar or a list of scalars, found {found}")]
pub struct ShapeError {
    pub found: String,
}

impl ShapeError {
    pub fn new<S: Into<String>>(found: S) -> Self {
        Self {
            found: found.into(),
        }
    }

    /// Describes the JSON kind that failed to decode.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let found = match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "a list with non-scalar or mixed elements",
            serde_json::Value::Object(_) => "an object",
        };
        Self::new(found)
    }
}

/// An ordered sequence of `T` that accepts a bare `T` on decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct UnionValue<T>(Vec<T>);

/// Process entrypoint, `["/bin/sh", "-c"]` or the legacy `"/bin/sh"`.
pub type Entrypoint = UnionValue<String>;

/// Process command, `["echo", "hi"]` or the legacy `"echo"`.
pub type Command = UnionValue<String>;

impl<T> UnionValue<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn slice(&self) -> &[T] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T: for<'de> Deserialize<'de>> UnionValue<T> {
    /// Decodes an already parsed JSON value, keeping the shape failure apart
    /// from other decode errors.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ShapeError> {
        Self::deserialize(value).map_err(|_| ShapeError::from_json(value))
    }
}

impl<T> Deref for UnionValue<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> From<Vec<T>> for UnionValue<T> {
    fn from(values: Vec<T>) -> Self {
        Self(values)
    }
}

impl From<&str> for UnionValue<String> {
    fn from(value: &str) -> Self {
        Self(vec![value.to_owned()])
    }
}

impl<T> FromIterator<T> for UnionValue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T: fmt::Display> fmt::Display for UnionValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl<T: Serialize> Serialize for UnionValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Shape<T> {
    One(T),
    Many(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for UnionValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Shape::<T>::deserialize(deserializer) {
            Ok(Shape::One(v)) => Ok(Self(vec![v])),
            Ok(Shape::Many(v)) => Ok(Self(v)),
            Err(_) => Err(D::Error::custom(ShapeError::new("an unsupported value"))),
        }
    }
}
